//! Reading a part body as decoded text.

use encoding_rs::{CoderResult, Decoder, Encoding};

use crate::input::{Interest, NioInput, ReadHandler};

/// Receives readiness notifications for a part read as text.
///
/// Thresholds in the returned [`Interest`] count encoded bytes, not chars.
pub trait TextReadHandler: Send {
    /// Called when the number of ready bytes reached the requested threshold.
    fn on_text_available(&mut self, input: &mut TextInput<'_>) -> crate::Result<Interest>;

    /// Called once when the part ended.
    fn on_all_text_read(&mut self, input: &mut TextInput<'_>) -> crate::Result<()>;

    /// Called when the part failed or one of the methods above returned an error.
    fn on_error(&mut self, err: crate::Error) {
        let _ = err;
    }
}

/// The body of one part, decoded while it is read.
///
/// Decoding is incremental: a multi-byte sequence split between two
/// notifications is kept by the decoder and completed by the next read.
pub struct TextInput<'a> {
    inner: &'a mut dyn NioInput,
    state: &'a mut TextState,
}

pub(crate) struct TextState {
    decoder: Decoder,
    flushed: bool,
}

impl TextInput<'_> {
    /// Encoded bytes that can be read without waiting.
    pub fn ready_bytes(&self) -> usize {
        self.inner.ready_bytes()
    }

    pub fn is_at_end(&self) -> bool {
        self.inner.is_at_end()
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.state.decoder.encoding()
    }

    /// Decodes every ready byte into `dst`, returning how many encoded bytes
    /// were consumed. Malformed sequences are replaced with U+FFFD.
    pub fn read_to_string(&mut self, dst: &mut String) -> usize {
        if self.state.flushed {
            return 0;
        }

        let last = self.inner.is_at_end();
        let mut read = 0;

        loop {
            let src = &self.inner.chunk()[read..];
            let needed = self
                .state
                .decoder
                .max_utf8_buffer_length(src.len())
                .unwrap_or_else(|| src.len());
            dst.reserve(needed);

            let (result, n, _) = self.state.decoder.decode_to_string(src, dst, last);
            read += n;

            if let CoderResult::InputEmpty = result {
                break;
            }
        }

        if last {
            self.state.flushed = true;
        }

        self.inner.skip(read)
    }

    /// Decodes every ready byte.
    pub fn read_string(&mut self) -> String {
        let mut text = String::new();
        self.read_to_string(&mut text);
        text
    }
}

pub(crate) struct TextAdapter<H> {
    state: TextState,
    handler: H,
}

impl<H: TextReadHandler> TextAdapter<H> {
    pub(crate) fn new(encoding: &'static Encoding, handler: H) -> Self {
        TextAdapter {
            state: TextState {
                decoder: encoding.new_decoder(),
                flushed: false,
            },
            handler,
        }
    }
}

impl<H: TextReadHandler> ReadHandler for TextAdapter<H> {
    fn on_data_available(&mut self, input: &mut dyn NioInput) -> crate::Result<Interest> {
        let mut text = TextInput {
            inner: input,
            state: &mut self.state,
        };
        self.handler.on_text_available(&mut text)
    }

    fn on_all_data_read(&mut self, input: &mut dyn NioInput) -> crate::Result<()> {
        let mut text = TextInput {
            inner: input,
            state: &mut self.state,
        };
        self.handler.on_all_text_read(&mut text)
    }

    fn on_error(&mut self, err: crate::Error) {
        self.handler.on_error(err);
    }
}
