use std::collections::HashMap;

use crate::constants;

/// Byte limits applied while scanning, see [`Constraints`](crate::Constraints).
///
/// Body limits count the bytes released to a part, which excludes the line
/// terminator in front of its closing boundary. The header limit counts the
/// raw header lines of one part.
#[derive(Debug, Clone)]
pub struct SizeLimit {
    pub(crate) whole_stream: u64,
    pub(crate) per_field: u64,
    pub(crate) header_block: usize,
    pub(crate) by_name: HashMap<String, u64>,
}

impl SizeLimit {
    /// No limit on stream or part bodies, 8 KiB per header block.
    pub fn new() -> SizeLimit {
        SizeLimit::default()
    }

    /// Limits the bytes fed to a [`StreamBuffer`](crate::StreamBuffer) or
    /// read from the stream given to [`Multipart`](crate::Multipart).
    pub fn whole_stream(mut self, limit: u64) -> SizeLimit {
        self.whole_stream = limit;
        self
    }

    /// Limits the body of every part.
    pub fn per_field(mut self, limit: u64) -> SizeLimit {
        self.per_field = limit;
        self
    }

    /// Limits the header block of every part, line terminators included.
    pub fn header_block(mut self, limit: usize) -> SizeLimit {
        self.header_block = limit;
        self
    }

    /// Limits the body of parts named `field_name` in their
    /// `Content-Disposition`, in place of the `per_field` limit.
    pub fn for_field<N: Into<String>>(mut self, field_name: N, limit: u64) -> SizeLimit {
        self.by_name.insert(field_name.into(), limit);
        self
    }

    pub(crate) fn extract_size_limit_for(&self, field: Option<&str>) -> u64 {
        match field.and_then(|name| self.by_name.get(name)) {
            Some(limit) => *limit,
            None => self.per_field,
        }
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit {
            whole_stream: constants::DEFAULT_WHOLE_STREAM_SIZE_LIMIT,
            per_field: constants::DEFAULT_PER_FIELD_SIZE_LIMIT,
            header_block: constants::DEFAULT_HEADER_BLOCK_SIZE_LIMIT,
            by_name: HashMap::new(),
        }
    }
}
