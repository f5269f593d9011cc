//! Spec text formatting.
//!
//! Renders a field mapping into the tool's line-oriented spec form, the
//! stdin payload for `<cmd> -i` save operations.

use std::collections::HashMap;
use std::fmt::Write;

/// Render spec fields into the tool's line format.
///
/// Single-line values come out as `Name: value`; values with embedded
/// newlines come out as `Name:` followed by each non-blank sub-line
/// indented with one space. Every field ends with a blank line. Fields
/// render in map iteration order, so no cross-field ordering is
/// guaranteed (or needed, the tool keys on field names).
pub fn format_spec(fields: &HashMap<String, String>) -> String {
    let mut out = String::new();
    for (name, value) in fields {
        if value.contains('\n') {
            let _ = write!(out, "{name}:");
            for line in value.split('\n') {
                if !line.trim().is_empty() {
                    let _ = write!(out, "\n {line}");
                }
            }
            out.push_str("\n\n");
        } else {
            let _ = write!(out, "{name}: {value}\n\n");
        }
    }
    out
}
