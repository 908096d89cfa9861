//! Canonical string construction.
//!
//! PayTR signs the notification by concatenating a fixed list of form
//! values and its merchant salt. The order is an external contract and has
//! to match the provider's documentation byte for byte.

use std::collections::HashMap;

/// Build the string PayTR signed.
///
/// Each field in `order` is looked up in `fields`; missing fields count as
/// empty strings and every value is trimmed. Values are joined without a
/// separator and `salt` is appended last.
pub fn build_canonical_string<S: AsRef<str>>(
    fields: &HashMap<String, String>,
    salt: &str,
    order: &[S],
) -> String {
    let mut canonical = String::new();

    for key in order {
        if let Some(value) = fields.get(key.as_ref()) {
            canonical.push_str(value.trim());
        }
    }

    canonical.push_str(salt);
    canonical
}
