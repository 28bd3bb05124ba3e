use crate::constants;
use crate::size_limit::SizeLimit;

/// What to do with a part header line that has no name, e.g. `no colon here`
/// or `: value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Drop the line and keep parsing the header block.
    #[default]
    Skip,
    /// Fail the scan with [`Error::MalformedHeader`](crate::Error::MalformedHeader).
    Reject,
}

/// Represents some rules to be applied on the stream and field's content size
/// to prevent DoS attacks.
///
/// It's recommended to add some rules on field (specially text field) size to
/// avoid potential DoS attacks from attackers running the server out of memory.
/// This type provides some API to apply constraints on basis of a single field
/// and also on the whole stream.
///
/// # Examples
///
/// ```
/// use multiscan::{Constraints, HeaderPolicy, SizeLimit};
///
/// let constraints = Constraints::new()
///     .allowed_fields(vec!["my_text_field", "my_file_field"])
///     .size_limit(
///         SizeLimit::new()
///             .whole_stream(15 * 1024 * 1024)
///             .per_field(10 * 1024 * 1024)
///             .for_field("my_text_field", 30 * 1024),
///     )
///     .header_policy(HeaderPolicy::Reject);
/// # drop(constraints);
/// ```
#[derive(Debug, Clone)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
    pub(crate) allowed_fields: Option<Vec<String>>,
    pub(crate) header_policy: HeaderPolicy,
    pub(crate) max_headers: usize,
}

impl Constraints {
    /// Creates a set of rules with default behaviour.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies rules on the stream and field's content size.
    pub fn size_limit(self, size_limit: SizeLimit) -> Constraints {
        Constraints { size_limit, ..self }
    }

    /// Specifies which fields should be allowed, for any unknown field the
    /// scan fails with [`Error::UnknownField`](crate::Error::UnknownField).
    pub fn allowed_fields<N: Into<String>>(self, allowed_fields: Vec<N>) -> Constraints {
        let allowed_fields = allowed_fields.into_iter().map(|item| item.into()).collect();

        Constraints {
            allowed_fields: Some(allowed_fields),
            ..self
        }
    }

    /// Sets how a header line without a name is handled.
    pub fn header_policy(self, header_policy: HeaderPolicy) -> Constraints {
        Constraints { header_policy, ..self }
    }

    /// Sets how many headers a single part may carry.
    pub fn max_headers(self, max_headers: usize) -> Constraints {
        Constraints { max_headers, ..self }
    }

    pub(crate) fn is_it_allowed(&self, field: Option<&str>) -> bool {
        if let Some(ref allowed_fields) = self.allowed_fields {
            field
                .map(|field| allowed_fields.iter().any(|item| item == field))
                .unwrap_or(false)
        } else {
            true
        }
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            size_limit: SizeLimit::default(),
            allowed_fields: None,
            header_policy: HeaderPolicy::default(),
            max_headers: constants::MAX_HEADERS,
        }
    }
}
