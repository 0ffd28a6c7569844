//! Fakes shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use crate::{
    bitmap::Bitmap,
    error::Error,
    font::{Anchor, BoundingBox, GlyphMetrics, TrueTypeFont},
    transport::Transport,
};

/// Fixed-advance font: every character is `3/5 * size` wide and `size` tall,
/// drawn as a solid block.
pub struct MockFont;

impl MockFont {
    pub fn text_width(text: &str, size: u32) -> i32 {
        (text.chars().count() as u32 * size * 3 / 5) as i32
    }
}

impl GlyphMetrics for MockFont {
    fn bbox(&self, text: &str, size: u32, anchor: Anchor) -> BoundingBox {
        let w = Self::text_width(text, size);
        let h = size as i32;
        let (top, bottom) = match anchor {
            Anchor::Center => (-(h / 2), h - h / 2),
            Anchor::MiddleTop => (0, h),
        };
        BoundingBox {
            left: -(w / 2),
            top,
            right: w - w / 2,
            bottom,
        }
    }

    fn draw(&self, bitmap: &mut Bitmap, text: &str, position: (i32, i32), size: u32, anchor: Anchor) {
        let bb = self.bbox(text, size, anchor);
        for y in (position.1 + bb.top)..(position.1 + bb.bottom) {
            for x in (position.0 + bb.left)..(position.0 + bb.right) {
                if x >= 0 && y >= 0 {
                    bitmap.set_mark(x as u32, y as u32);
                }
            }
        }
    }
}

static DEJAVU_SANS: &[u8] = include_bytes!("../tests/fonts/DejaVuSans.ttf");

/// DejaVu Sans, for tests that need real glyph outlines.
pub fn dejavu_sans() -> TrueTypeFont {
    TrueTypeFont::from_bytes(DEJAVU_SANS.to_vec()).unwrap()
}

/// Transport that records every write into a shared log.
pub struct RecordingTransport {
    pub log: Arc<Mutex<Vec<Vec<u8>>>>,
    pub delay: Duration,
    pub short_write_at: Option<usize>,
    pub responses: VecDeque<Vec<u8>>,
    writes: usize,
}

impl RecordingTransport {
    pub fn new() -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport = RecordingTransport {
            log: log.clone(),
            delay: Duration::from_millis(0),
            short_write_at: None,
            responses: VecDeque::new(),
            writes: 0,
        };
        (transport, log)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_short_write_at(mut self, index: usize) -> Self {
        self.short_write_at = Some(index);
        self
    }

    pub fn with_response(mut self, response: Vec<u8>) -> Self {
        self.responses.push_back(response);
        self
    }
}

impl Transport for RecordingTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let index = self.writes;
        self.writes += 1;
        self.log.lock().unwrap().push(buf.to_vec());
        if self.short_write_at == Some(index) {
            Ok(buf.len() / 2)
        } else {
            Ok(buf.len())
        }
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let mut response = self.responses.pop_front().unwrap_or_default();
        response.truncate(len);
        Ok(response)
    }
}

/// Flatten a write log into one byte stream.
pub fn concat(log: &Arc<Mutex<Vec<Vec<u8>>>>) -> Vec<u8> {
    log.lock().unwrap().concat()
}
