//! Query ranges and their restriction to the leaves of a tree.

use std::ops::Range;

/// Restricting query ranges to the positions a tree holds.
pub trait RangeExt {
    /// Whether some position lies in both ranges.
    fn intersects(&self, rhs: &Self) -> bool;

    /// Shrinks `self` to the positions it shares with `other`.
    /// Without a shared position `self` becomes empty, but never inverted.
    fn clamp_by(&mut self, other: &Self);
}

impl RangeExt for Range<isize> {
    fn intersects(&self, rhs: &Self) -> bool {
        self.start.max(rhs.start) < self.end.min(rhs.end)
    }

    fn clamp_by(&mut self, other: &Self) {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end).max(start);
        *self = start..end;
    }
}

#[cfg(test)]
mod tests {
    use super::RangeExt;
    use std::ops::Range;

    use proptest::prelude::*;

    fn clamped(mut range: Range<isize>, len: isize) -> Range<isize> {
        range.clamp_by(&(0..len));
        range
    }

    #[test]
    fn query_ranges_against_five_leaves() {
        let leaves = 0..5isize;
        assert!((1..4).intersects(&leaves));
        assert!((4..100).intersects(&leaves));
        assert!((-3..1).intersects(&leaves));
        assert!(!(5..9).intersects(&leaves));
        assert!(!(3..3).intersects(&leaves));
        assert!(!(4..2).intersects(&leaves));

        assert_eq!(clamped(1..4, 5), 1..4);
        assert_eq!(clamped(2..isize::MAX, 5), 2..5);
        assert_eq!(clamped(isize::MIN..1, 5), 0..1);
        assert!(clamped(7..9, 5).is_empty());
        assert!(clamped(4..2, 5).is_empty());
    }

    #[test]
    fn nothing_intersects_an_empty_tree() {
        let leaves = 0..0isize;
        assert!(!(0..1).intersects(&leaves));
        assert!(!(isize::MIN..isize::MAX).intersects(&leaves));
        assert!(clamped(0..10, 0).is_empty());
    }

    proptest! {
        #[test]
        fn clamping_keeps_exactly_the_shared_positions(
            start in -40isize..40,
            end in -40isize..40,
            len in 0isize..30,
        ) {
            let clamped = clamped(start..end, len);
            prop_assert!(clamped.start <= clamped.end);
            prop_assert_eq!((start..end).intersects(&(0..len)), !clamped.is_empty());
            for position in -41..41 {
                prop_assert_eq!(
                    clamped.contains(&position),
                    (start..end).contains(&position) && (0..len).contains(&position)
                );
            }
        }
    }
}
