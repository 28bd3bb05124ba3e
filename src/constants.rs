pub(crate) const DEFAULT_WHOLE_STREAM_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_PER_FIELD_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_HEADER_BLOCK_SIZE_LIMIT: usize = 8 * 1024;

pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';

/// Content type of a part that carries no `Content-Type` header (RFC 2046, section 5.1).
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=US-ASCII";
pub(crate) const DEFAULT_CHARSET: &str = "utf-8";

/// Builds the `--boundary` delimiter every boundary line starts with.
pub(crate) fn delimiter(boundary: &str) -> Vec<u8> {
    let mut delimiter = Vec::with_capacity(BOUNDARY_EXT.len() + boundary.len());
    delimiter.extend_from_slice(BOUNDARY_EXT.as_bytes());
    delimiter.extend_from_slice(boundary.as_bytes());
    delimiter
}
