/// Removes one matching pair of surrounding `"` or `'`.
pub(crate) fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();

    if bytes.len() >= 2 && bytes[0] == bytes[bytes.len() - 1] && (bytes[0] == b'"' || bytes[0] == b'\'') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Splits a header line (terminator excluded) at the first `:`. The name is
/// trimmed and lowercased, the value trimmed. `None` for a line without name.
pub(crate) fn split_header_line(line: &[u8]) -> Option<(Vec<u8>, &[u8])> {
    let colon = memchr::memchr(b':', line)?;

    let name = trim(&line[..colon]);
    if name.is_empty() {
        return None;
    }

    Some((name.to_ascii_lowercase(), trim(&line[colon + 1..])))
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |idx| idx + 1);
    &bytes[start..end]
}
