//! The non-blocking byte source contract the scanner is driven by.
//!
//! An input never blocks: it exposes whatever bytes are ready right now and
//! lets one [`ReadHandler`] ask to be called back once more bytes arrive or
//! the input ends. At most one handler call is in flight per input, so
//! handlers hold plain `&mut` state and need no locking.

use bytes::Bytes;
use std::cmp;

/// What a [`ReadHandler`] wants after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Call the handler again once at least this many bytes are ready, or
    /// when the input ends.
    Bytes(usize),
    /// Deregister the handler.
    Done,
}

/// Receives readiness notifications from a [`NioInput`].
pub trait ReadHandler: Send {
    /// Called when the number of ready bytes reached the requested threshold.
    fn on_data_available(&mut self, input: &mut dyn NioInput) -> crate::Result<Interest>;

    /// Called once when the input ended. Bytes still ready are passed along
    /// and will be discarded afterwards.
    fn on_all_data_read(&mut self, input: &mut dyn NioInput) -> crate::Result<()>;

    /// Called when the input failed, or when one of the methods above returned
    /// an error. The handler is dropped afterwards.
    fn on_error(&mut self, err: crate::Error) {
        let _ = err;
    }
}

/// A non-blocking source of bytes.
pub trait NioInput {
    /// Number of bytes that can be read without waiting.
    fn ready_bytes(&self) -> usize;

    /// Whether no more bytes will arrive beyond the ready ones.
    fn is_at_end(&self) -> bool;

    /// All ready bytes, starting at the read cursor. The view may grow
    /// between calls, it never shrinks unless bytes are skipped.
    fn chunk(&self) -> &[u8];

    /// Moves the read cursor forward, returning how many bytes were skipped.
    fn skip(&mut self, n: usize) -> usize;

    /// Registers `handler` to be notified once `threshold` bytes are ready
    /// or the input ends. Replaces any registered handler.
    fn notify_available(&mut self, handler: Box<dyn ReadHandler>, threshold: usize);

    /// Whether the input ended and every byte was consumed.
    fn is_finished(&self) -> bool {
        self.is_at_end() && self.ready_bytes() == 0
    }

    /// Copies ready bytes into `dst`, returning how many were read.
    fn read(&mut self, dst: &mut [u8]) -> usize {
        let n = cmp::min(dst.len(), self.ready_bytes());
        dst[..n].copy_from_slice(&self.chunk()[..n]);
        self.skip(n)
    }

    /// Reads up to `max` ready bytes.
    fn read_bytes(&mut self, max: usize) -> Bytes {
        let n = cmp::min(max, self.ready_bytes());
        let bytes = Bytes::copy_from_slice(&self.chunk()[..n]);
        self.skip(n);
        bytes
    }
}

pub(crate) struct Registration {
    pub(crate) threshold: usize,
    pub(crate) handler: Box<dyn ReadHandler>,
}

pub(crate) enum Fired {
    /// The handler wants more bytes.
    Parked(Registration),
    Done,
    /// The handler failed and has been told so through `on_error`.
    Failed,
}

impl Registration {
    pub(crate) fn new(handler: Box<dyn ReadHandler>, threshold: usize) -> Self {
        Registration { threshold, handler }
    }

    /// Whether `input` is in a state this registration wants to hear about.
    pub(crate) fn is_ready(&self, input: &dyn NioInput) -> bool {
        input.is_at_end() || input.ready_bytes() >= self.threshold
    }

    pub(crate) fn fire(mut self, input: &mut dyn NioInput) -> Fired {
        let result = if input.is_at_end() {
            self.handler.on_all_data_read(input).map(|()| Interest::Done)
        } else {
            self.handler.on_data_available(input)
        };

        match result {
            Ok(Interest::Bytes(threshold)) if !input.is_at_end() => Fired::Parked(Registration {
                threshold,
                handler: self.handler,
            }),
            Ok(_) => Fired::Done,
            Err(err) => {
                self.handler.on_error(err);
                Fired::Failed
            }
        }
    }

    pub(crate) fn fail(mut self, err: crate::Error) {
        self.handler.on_error(err);
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").field("threshold", &self.threshold).finish()
    }
}
