//! # Byte Views
//!
//! Length-tagged views over arena-owned bytes and substring search.
//!
//! The search routines work on plain byte slices; [`crate::Arena::find_in`]
//! resolves two views and forwards here.

use bytemuck::{Pod, Zeroable};

use crate::memory::Allocation;

/// A (position, length) view over bytes owned by an arena.
///
/// Produced by [`crate::Arena::duplicate_bytes`] and friends. The default
/// value is the empty view. Views are plain data and can be stored in
/// arena-backed containers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct StrView(Allocation);

impl StrView {
    #[inline]
    #[must_use]
    pub(crate) const fn from_allocation(allocation: Allocation) -> Self {
        Self(allocation)
    }

    /// The arena range behind this view.
    #[inline]
    #[must_use]
    pub const fn allocation(&self) -> Allocation {
        self.0
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the view holds no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bytes this view accounts for in its arena.
    #[inline]
    #[must_use]
    pub const fn estimate_capacity(&self) -> usize {
        self.0.len()
    }
}

/// Offset of the first occurrence of `needle` in `haystack`.
///
/// Boundary conventions:
/// - an empty haystack never matches
/// - an empty needle matches at offset zero
/// - a needle longer than the haystack never matches
///
/// # Example
///
/// ```rust
/// use burrow_core::text::find;
///
/// assert_eq!(find(b"keep-alive", b"alive"), Some(5));
/// assert_eq!(find(b"keep-alive", b""), Some(0));
/// assert_eq!(find(b"", b""), None);
/// ```
#[must_use]
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    search(haystack, needle, |a, b| a == b)
}

/// ASCII case-insensitive [`find`].
///
/// Bytes outside the ASCII letters compare exactly.
#[must_use]
pub fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    search(haystack, needle, |a, b| a.eq_ignore_ascii_case(&b))
}

fn search(haystack: &[u8], needle: &[u8], eq: impl Fn(u8, u8) -> bool) -> Option<usize> {
    if haystack.is_empty() {
        return None;
    }
    if needle.is_empty() {
        return Some(0);
    }
    if haystack.len() < needle.len() {
        return None;
    }

    haystack
        .windows(needle.len())
        .position(|window| window.iter().zip(needle).all(|(&a, &b)| eq(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        assert_eq!(find(b"GET /index.html HTTP/1.1", b"HTTP"), Some(16));
        assert_eq!(find(b"abcabc", b"cab"), Some(2));
        assert_eq!(find(b"abc", b"abcd"), None);
        assert_eq!(find(b"abc", b"x"), None);
        assert_eq!(find(b"aaab", b"aab"), Some(1));
    }

    #[test]
    fn test_find_is_case_sensitive() {
        assert_eq!(find(b"Host: example", b"host"), None);
        assert_eq!(find_ignore_ascii_case(b"Host: example", b"host"), Some(0));
        assert_eq!(find_ignore_ascii_case(b"x-FORWARDED-for", b"Forwarded"), Some(2));
    }

    #[test]
    fn test_empty_conventions() {
        assert_eq!(find(b"abc", b""), Some(0));
        assert_eq!(find_ignore_ascii_case(b"abc", b""), Some(0));
        assert_eq!(find(b"", b"a"), None);
        assert_eq!(find(b"", b""), None);
    }

    #[test]
    fn test_default_view_is_empty() {
        let view = StrView::default();
        assert!(view.is_empty());
        assert_eq!(view.estimate_capacity(), 0);
    }
}
