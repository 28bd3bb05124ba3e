use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::ops::Range;

use once_cell::unsync::OnceCell;

use crate::helpers;

/// A parsed `Content-Disposition` header value, e.g.
/// `form-data; name="field"; filename="a.txt"`.
///
/// The value is only parsed on first access. Parameter names are matched
/// case-insensitively, values keep their raw (possibly quoted) form and can
/// also be read with one pair of surrounding quotes removed.
pub struct ContentDisposition {
    raw: String,
    parsed: OnceCell<Result<Parsed, String>>,
}

struct Parsed {
    disposition_type: String,
    params: HashMap<String, ParamValue>,
    names: Vec<String>,
}

/// A parameter value as written, with its unquoted form worked out on first
/// use.
struct ParamValue {
    raw: String,
    unquoted: OnceCell<Range<usize>>,
}

impl ParamValue {
    fn new(raw: String) -> Self {
        ParamValue {
            raw,
            unquoted: OnceCell::new(),
        }
    }

    fn unquoted(&self) -> &str {
        let range = self.unquoted.get_or_init(|| {
            let inner = helpers::unquote(&self.raw).len();
            let start = (self.raw.len() - inner) / 2;
            start..start + inner
        });

        &self.raw[range.clone()]
    }
}

impl ContentDisposition {
    pub fn new<T: Into<String>>(raw: T) -> Self {
        ContentDisposition {
            raw: raw.into(),
            parsed: OnceCell::new(),
        }
    }

    /// The header value as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The disposition type, e.g. `form-data` or `attachment`.
    pub fn disposition_type(&self) -> crate::Result<&str> {
        self.parsed().map(|parsed| parsed.disposition_type.as_str())
    }

    /// The raw value of a parameter, quotes included.
    pub fn param(&self, name: &str) -> crate::Result<Option<&str>> {
        self.value(name).map(|value| value.map(|value| value.raw.as_str()))
    }

    /// The value of a parameter with one matching pair of quotes removed.
    pub fn param_unquoted(&self, name: &str) -> crate::Result<Option<&str>> {
        self.value(name).map(|value| value.map(ParamValue::unquoted))
    }

    /// Parameter names in the order they appear, lowercased.
    pub fn param_names(&self) -> crate::Result<impl Iterator<Item = &str>> {
        self.parsed().map(|parsed| parsed.names.iter().map(|name| name.as_str()))
    }

    /// The unquoted `name` parameter.
    pub fn name(&self) -> crate::Result<Option<&str>> {
        self.param_unquoted("name")
    }

    /// The unquoted `filename` parameter.
    pub fn file_name(&self) -> crate::Result<Option<&str>> {
        self.param_unquoted("filename")
    }

    fn value(&self, name: &str) -> crate::Result<Option<&ParamValue>> {
        let parsed = self.parsed()?;
        Ok(parsed.params.get(&name.to_ascii_lowercase()))
    }

    fn parsed(&self) -> crate::Result<&Parsed> {
        self.parsed
            .get_or_init(|| parse(&self.raw))
            .as_ref()
            .map_err(|reason| crate::Error::DecodeContentDisposition {
                value: self.raw.clone(),
                reason: reason.clone(),
            })
    }
}

impl Debug for ContentDisposition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentDisposition").field(&self.raw).finish()
    }
}

fn parse(raw: &str) -> Result<Parsed, String> {
    let (disposition_type, rest) = match raw.find(';') {
        Some(idx) => (&raw[..idx], &raw[idx + 1..]),
        None => (raw, ""),
    };

    let mut params = HashMap::new();
    let mut names = Vec::new();

    for clause in split_params(rest) {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }

        let idx = clause
            .find('=')
            .ok_or_else(|| format!("parameter `{}` has no value", clause))?;

        let name = clause[..idx].trim();
        if name.is_empty() {
            return Err(format!("parameter `{}` has no name", clause));
        }

        let name = name.to_ascii_lowercase();
        if !params.contains_key(&name) {
            names.push(name.clone());
        }
        params.insert(name, ParamValue::new(clause[idx + 1..].trim().to_owned()));
    }

    Ok(Parsed {
        disposition_type: disposition_type.trim().to_owned(),
        params,
        names,
    })
}

/// Splits on `;` outside of quoted values.
fn split_params(section: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut quote = None;
    let mut start = 0;

    for (idx, ch) in section.char_indices() {
        match (quote, ch) {
            (None, '"') | (None, '\'') => quote = Some(ch),
            (Some(q), _) if q == ch => quote = None,
            (None, ';') => {
                clauses.push(&section[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    clauses.push(&section[start..]);

    clauses
}
