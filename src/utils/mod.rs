//! Shared constants and small numeric helpers

pub mod constants;

/// Sign of `x` as used by the actuator hard-over fault: zero maps to +1.
#[inline]
pub fn sign(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Build an indexed property name such as `propulsion/engine[1]`.
///
/// Index zero keeps the bare name, matching how the first instance of a
/// repeated element is addressed.
pub fn indexed_property_name(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{base}[{index}]")
    }
}

/// Normalise a component name into a property path segment.
///
/// Lowercases, replaces spaces with dashes and drops characters that are
/// not valid in a property path.
pub fn make_property_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/') => {
                Some(c.to_ascii_lowercase())
            }
            _ => None,
        })
        .collect()
}
