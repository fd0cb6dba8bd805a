//! Numeric comparison for dotted vendor version strings.
//!
//! Vulkan SDK releases use a `major.minor.patch.revision` scheme
//! (e.g. `1.3.250.1`). Ordering is purely numeric per segment: shorter
//! strings are padded with zeros, so `1.0` equals `1.0.0`, and leading
//! zeros are ignored. There are no semver pre-release rules.

use std::cmp::Ordering;

/// Compare two dotted version strings segment by segment, left to right.
///
/// Returns on the first differing segment. Missing trailing segments
/// count as zero. Non-numeric segments also compare as zero; explicit
/// version inputs are validated upstream (see [`crate::config`]), so a
/// malformed segment here is a caller error.
pub fn compare(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for i in 0..left.len().max(right.len()) {
        let x = left.get(i).copied().unwrap_or(0);
        let y = right.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }

    Ordering::Equal
}

/// True when `version` sorts strictly above `threshold`.
///
/// This is the predicate used by every packaging-boundary rule: the
/// threshold version itself still takes the older naming scheme.
pub fn is_above(version: &str, threshold: &str) -> bool {
    compare(version, threshold) == Ordering::Greater
}

/// True when `version` sorts at or above `threshold`.
pub fn is_at_least(version: &str, threshold: &str) -> bool {
    compare(version, threshold) != Ordering::Less
}

fn segments(version: &str) -> Vec<u64> {
    version.split('.').map(|s| s.parse().unwrap_or(0)).collect()
}
