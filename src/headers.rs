use std::fmt::{self, Debug, Formatter};

use http::header::{HeaderMap, HeaderName, HeaderValue};

/// The headers of one part, in the order they were received.
///
/// Names are lowercased when stored and matched case-insensitively, values are
/// kept byte for byte apart from surrounding whitespace. Nothing is validated
/// while scanning, so a name that is not an HTTP token or a value with control
/// bytes is stored like any other. [`to_header_map`](PartHeaders::to_header_map)
/// applies the HTTP rules when they are wanted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    entries: Vec<(String, Vec<u8>)>,
}

impl PartHeaders {
    pub fn new() -> Self {
        PartHeaders::default()
    }

    /// Number of header lines, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_bytes(name).is_some()
    }

    /// The first value of `name`, if it is valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_bytes(name).and_then(|value| std::str::from_utf8(value).ok())
    }

    /// The first value of `name`.
    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.get_all(name).next()
    }

    /// Every value of `name`, in order.
    pub fn get_all<'a: 'n, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a [u8]> + 'n {
        self.entries
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_slice())
    }

    /// Every header line as `(name, value)`, in the order received.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_slice()))
    }

    /// Converts the headers into an [`HeaderMap`], failing on the first name
    /// or value HTTP does not allow.
    pub fn to_header_map(&self) -> crate::Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.entries.len());

        for (name, value) in &self.entries {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| crate::Error::DecodeHeaderName {
                name: name.clone(),
                cause: err.into(),
            })?;

            let value = HeaderValue::from_bytes(value).map_err(|err| crate::Error::DecodeHeaderValue {
                value: value.clone(),
                cause: err.into(),
            })?;

            map.append(name, value);
        }

        Ok(map)
    }

    pub(crate) fn append(&mut self, name: &[u8], value: &[u8]) {
        let name = String::from_utf8_lossy(name).to_ascii_lowercase();
        self.entries.push((name, value.to_vec()));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Debug for PartHeaders {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, value)| (name, String::from_utf8_lossy(value))),
            )
            .finish()
    }
}
