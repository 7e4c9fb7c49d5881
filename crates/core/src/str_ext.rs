//! Empty-as-none semantics for client-supplied strings.
//!
//! Form fields arrive as strings where an empty value means "not supplied".

/// Extension trait for `Option<String>` fields supplied by clients.
pub trait OptionStrExt {
    /// Drops empty strings, keeping only meaningful values.
    #[must_use]
    fn non_empty(self) -> Option<String>;
}

impl OptionStrExt for Option<String> {
    #[inline]
    fn non_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}
