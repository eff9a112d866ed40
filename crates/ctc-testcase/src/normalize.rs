//! Width normalization for file-like values
//!
//! A file or stdin value recorded in a test case must be exactly as wide as
//! its declaration: the replay side maps it back onto a buffer of that size.

/// Force `value` to exactly `width` bytes
///
/// Longer values lose their tail; shorter values are right-padded with zero
/// bytes.
///
/// # Examples
/// ```
/// use ctc_testcase::normalize_to_width;
///
/// assert_eq!(normalize_to_width(b"0123456789", 6), b"012345");
/// assert_eq!(normalize_to_width(b"ab", 4), b"ab\0\0");
/// ```
#[must_use]
pub fn normalize_to_width(value: &[u8], width: usize) -> Vec<u8> {
    let mut out = value[..value.len().min(width)].to_vec();
    out.resize(width, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn truncates_tail_not_head() {
        let value = b"ABCDEFGHIJ";
        assert_eq!(normalize_to_width(value, 6), b"ABCDEF".to_vec());
    }

    #[test]
    fn pads_with_zeros() {
        assert_eq!(normalize_to_width(b"xy", 5), vec![b'x', b'y', 0, 0, 0]);
    }

    #[test]
    fn exact_width_unchanged() {
        assert_eq!(normalize_to_width(b"four", 4), b"four".to_vec());
    }

    #[test]
    fn zero_width() {
        assert!(normalize_to_width(b"abc", 0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_output_has_declared_width(
            value in proptest::collection::vec(any::<u8>(), 0..128),
            width in 0usize..128,
        ) {
            let out = normalize_to_width(&value, width);
            prop_assert_eq!(out.len(), width);

            let kept = value.len().min(width);
            prop_assert_eq!(&out[..kept], &value[..kept]);
            prop_assert!(out[kept..].iter().all(|b| *b == 0));
        }
    }
}
