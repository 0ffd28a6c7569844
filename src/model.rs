use crate::label::Padding;

/// Supported physical printers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// Dymo LabelWriter 450, Dymo raster protocol.
    LabelWriter450,
    /// Vretti 420B, TSPL protocol.
    Vretti420B,
}

impl Model {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dymo" | "labelwriter450" | "d450" => Some(Self::LabelWriter450),
            "tspl" | "vretti" | "vretti420b" => Some(Self::Vretti420B),
            _ => None,
        }
    }

    pub fn vid(&self) -> u16 {
        match self {
            Self::LabelWriter450 => 0x0922,
            Self::Vretti420B => 0x2D84,
        }
    }

    pub fn pid(&self) -> u16 {
        match self {
            Self::LabelWriter450 => 0x0020,
            Self::Vretti420B => 0x71A9,
        }
    }

    /// Print head resolution in dots per inch.
    pub fn dpi(&self) -> u32 {
        match self {
            Self::LabelWriter450 => 300,
            Self::Vretti420B => 203,
        }
    }

    /// Margins the layout must keep clear, in millimeters.
    pub fn padding_mm(&self) -> Padding {
        match self {
            Self::LabelWriter450 => Padding::new(2.0, 0.0, 2.0, 0.0),
            Self::Vretti420B => Padding::new(3.0, 0.0, 3.0, 0.0),
        }
    }
}
