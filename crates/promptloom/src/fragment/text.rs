//! String helpers shared by every fragment variant.
//!
//! These are the only places where prompt text is shaped: trimming,
//! prefix/postfix decoration, `(text:weight)` emphasis and `", "` joining.

/// Separator used between fragments in the composed prompt.
pub const SEPARATOR: &str = ", ";

/// Trim surrounding whitespace.
pub fn sanitize(s: &str) -> String {
    s.trim().to_string()
}

/// Wrap `s` with a prefix and postfix, each separated by a single space.
///
/// An empty `s` stays empty: decoration never produces text on its own.
pub fn decorate(s: &str, prefix: &str, postfix: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let prefix = prefix.trim();
    let postfix = postfix.trim();
    let mut out = if prefix.is_empty() {
        s.to_string()
    } else {
        format!("{prefix} {s}")
    };
    if !postfix.is_empty() {
        out.push(' ');
        out.push_str(postfix);
    }
    out
}

/// Apply an emphasis weight.
///
/// Weight 0 suppresses the text, weight 1 leaves it bare, anything else
/// renders as `(text:weight)`.
pub fn emphasize(s: &str, weight: f64) -> String {
    if s.is_empty() || weight == 0.0 {
        String::new()
    } else if weight == 1.0 {
        s.to_string()
    } else {
        format!("({s}:{})", format_weight(weight))
    }
}

/// Append `new` to `existing`, separated by `", "` (or a single space when
/// `space` is set). Empty operands are skipped.
pub fn join(existing: &str, new: &str, space: bool) -> String {
    if new.is_empty() {
        existing.to_string()
    } else if existing.is_empty() {
        new.to_string()
    } else if space {
        format!("{existing} {new}")
    } else {
        format!("{existing}{SEPARATOR}{new}")
    }
}

/// Format a weight the way generators expect it: shortest round-trip
/// representation, always with a fractional part (`2.0`, `1.25`).
pub fn format_weight(weight: f64) -> String {
    if weight.is_finite() && weight.fract() == 0.0 {
        format!("{weight:.1}")
    } else {
        format!("{weight}")
    }
}

/// Round to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
