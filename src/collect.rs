//! Handlers that buffer a whole part body before handing it over.

use bytes::{Bytes, BytesMut};

use crate::input::{Interest, NioInput, ReadHandler};
use crate::text::{TextInput, TextReadHandler};

/// Buffers a part body as bytes and passes it to a callback once complete.
///
/// The callback runs exactly once, with the body or with the error that
/// stopped the part.
pub struct BytesCollector<F> {
    buf: BytesMut,
    callback: Option<F>,
}

impl<F> BytesCollector<F>
where
    F: FnOnce(crate::Result<Bytes>) + Send,
{
    pub fn new(callback: F) -> Self {
        BytesCollector {
            buf: BytesMut::new(),
            callback: Some(callback),
        }
    }

    fn drain(&mut self, input: &mut dyn NioInput) {
        let n = input.ready_bytes();
        self.buf.extend_from_slice(&input.chunk()[..n]);
        input.skip(n);
    }
}

impl<F> ReadHandler for BytesCollector<F>
where
    F: FnOnce(crate::Result<Bytes>) + Send,
{
    fn on_data_available(&mut self, input: &mut dyn NioInput) -> crate::Result<Interest> {
        self.drain(input);
        Ok(Interest::Bytes(1))
    }

    fn on_all_data_read(&mut self, input: &mut dyn NioInput) -> crate::Result<()> {
        self.drain(input);

        if let Some(callback) = self.callback.take() {
            callback(Ok(self.buf.split().freeze()));
        }
        Ok(())
    }

    fn on_error(&mut self, err: crate::Error) {
        if let Some(callback) = self.callback.take() {
            callback(Err(err));
        }
    }
}

/// Buffers a part body as decoded text, see [`BytesCollector`].
pub struct TextCollector<F> {
    text: String,
    callback: Option<F>,
}

impl<F> TextCollector<F>
where
    F: FnOnce(crate::Result<String>) + Send,
{
    pub fn new(callback: F) -> Self {
        TextCollector {
            text: String::new(),
            callback: Some(callback),
        }
    }
}

impl<F> TextReadHandler for TextCollector<F>
where
    F: FnOnce(crate::Result<String>) + Send,
{
    fn on_text_available(&mut self, input: &mut TextInput<'_>) -> crate::Result<Interest> {
        input.read_to_string(&mut self.text);
        Ok(Interest::Bytes(1))
    }

    fn on_all_text_read(&mut self, input: &mut TextInput<'_>) -> crate::Result<()> {
        input.read_to_string(&mut self.text);

        if let Some(callback) = self.callback.take() {
            callback(Ok(std::mem::take(&mut self.text)));
        }
        Ok(())
    }

    fn on_error(&mut self, err: crate::Error) {
        if let Some(callback) = self.callback.take() {
            callback(Err(err));
        }
    }
}
