//! Print job dispatcher.
//!
//! A [`Dispatcher`] owns one printer connection and runs at most one print
//! job on it at a time. A background job takes the transport with it into a
//! worker thread and hands it back when joined, so the connection is never
//! touched by two execution contexts at once. Starting a new job first joins
//! the previous one: there is no queue, just backpressure.

use log::{debug, warn};
use std::{
    sync::mpsc,
    thread::{self, JoinHandle},
};

use crate::{error::Error, transport::Transport};

// `None` when the worker never received the connection.
type Job<T> = JoinHandle<Option<(T, Result<(), Error>)>>;

pub struct Dispatcher<T: Transport + 'static> {
    transport: Option<T>,
    job: Option<Job<T>>,
    stack_size: Option<usize>,
}

impl<T: Transport + 'static> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Dispatcher {
            transport: Some(transport),
            job: None,
            stack_size: None,
        }
    }

    /// Stack size of the worker thread running background jobs.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Whether a background job has been started and not yet joined.
    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    /// Join the outstanding background job, if any, and return its result.
    pub fn wait(&mut self) -> Result<(), Error> {
        match self.job.take() {
            None => Ok(()),
            Some(handle) => match handle.join() {
                Ok(Some((transport, result))) => {
                    debug!("print job joined: {:?}", result);
                    self.transport = Some(transport);
                    result
                }
                Ok(None) => Err(Error::ConnectionLost),
                Err(_) => Err(Error::JobPanicked),
            },
        }
    }

    /// Run `work` against the connection.
    ///
    /// Any previous job is joined first; if it failed, its error is returned
    /// and `work` is not started. With `background` set, `work` runs on a
    /// worker thread and this call returns immediately.
    pub fn submit<F>(&mut self, work: F, background: bool) -> Result<(), Error>
    where
        F: FnOnce(&mut T) -> Result<(), Error> + Send + 'static,
    {
        self.wait()?;
        if background {
            self.spawn(work)
        } else {
            let transport = self.transport.as_mut().ok_or(Error::ConnectionLost)?;
            work(transport)
        }
    }

    // The connection is handed to the worker only once the thread exists, so
    // a failed spawn leaves it in place.
    fn spawn<F>(&mut self, work: F) -> Result<(), Error>
    where
        F: FnOnce(&mut T) -> Result<(), Error> + Send + 'static,
    {
        if self.transport.is_none() {
            return Err(Error::ConnectionLost);
        }

        let (tx, rx) = mpsc::channel::<(T, F)>();
        let mut builder = thread::Builder::new().name("print-job".to_string());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        let handle = builder.spawn(move || {
            let (mut transport, work) = rx.recv().ok()?;
            let result = work(&mut transport);
            Some((transport, result))
        })?;

        let transport = self.transport.take().ok_or(Error::ConnectionLost)?;
        debug!("starting background print job");
        if let Err(mpsc::SendError((transport, _))) = tx.send((transport, work)) {
            self.transport = Some(transport);
            return Err(Error::ConnectionLost);
        }
        self.job = Some(handle);
        Ok(())
    }

    /// Run `f` synchronously with the connection once it is idle.
    pub fn with_transport<R, F>(&mut self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut T) -> Result<R, Error>,
    {
        self.wait()?;
        let transport = self.transport.as_mut().ok_or(Error::ConnectionLost)?;
        f(transport)
    }

    /// Join any outstanding job and give back the connection.
    pub fn into_inner(mut self) -> Result<T, Error> {
        self.wait()?;
        self.transport.take().ok_or(Error::ConnectionLost)
    }
}

impl<T: Transport + 'static> Drop for Dispatcher<T> {
    fn drop(&mut self) {
        if let Err(err) = self.wait() {
            warn!("print job failed during shutdown: {}", err);
        }
    }
}
