//! Constant-time byte comparison for authentication tags.

/// Compare two byte slices without exiting early on the first difference.
///
/// Slices of different length compare unequal immediately; length is not
/// treated as secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}
