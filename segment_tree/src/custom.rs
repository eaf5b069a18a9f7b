//! Segment trees over arbitrary values, combined by a closure.

use std::fmt::Debug;

use common::{StreeError, StreeResult};

use super::RangeTree;

/// A segment tree over arbitrary values with a user supplied combining function.
///
/// The function has to be associative but neither commutative nor equipped with
/// an identity: queries fold the covered nodes strictly from left to right.
/// Combining can not fail, so this tree never reports overflows.
/// # Example
/// ```
/// # use segment_tree::FnSegmentTree;
/// let words = vec!["seg".to_string(), "ment".into(), " ".into(), "tree".into()];
/// let mut tree = FnSegmentTree::new(words, |a: &String, b: &String| format!("{}{}", a, b));
/// assert_eq!(tree.query(0, 4).as_deref(), Some("segment tree"));
/// tree.update(2, "_".into()).unwrap();
/// assert_eq!(tree.query(1, 3).as_deref(), Some("ment_"));
/// ```
#[derive(Clone)]
pub struct FnSegmentTree<T, F> {
    size: usize,
    nodes: Vec<T>,
    func: F,
}

impl<T, F> FnSegmentTree<T, F>
where
    T: Clone,
    F: Fn(&T, &T) -> T,
{
    /// Builds a tree over `source`, combining with `func`.
    /// # Runtime
    /// O(n) calls of `func`
    pub fn new(source: Vec<T>, func: F) -> Self {
        let size = source.len();
        // Slots below `size` start as copies of the first leaf and all but
        // the unused slot 0 get overwritten below.
        let mut nodes = match source.first() {
            Some(first) => vec![first.clone(); size],
            None => Vec::new(),
        };
        nodes.extend(source);

        let mut tree = Self { size, nodes, func };
        for idx in (1..size).rev() {
            tree.recompute(idx);
        }
        tree
    }

    /// Gives the combination of the elements at `start..end` in order.
    /// `None` for empty, inverted or negative ranges, `end` is clamped to `len`.
    pub fn query(&self, start: isize, end: isize) -> Option<T> {
        let end = end.min(self.size as isize);
        if start < 0 || end <= start {
            return None;
        }

        let mut left_idx = start as usize + self.size;
        let mut right_idx = end as usize + self.size;
        let mut left_result: Option<T> = None;
        let mut right_result: Option<T> = None;

        while left_idx < right_idx {
            if left_idx % 2 == 1 {
                left_result = Some(self.combine_options(left_result.as_ref(), &self.nodes[left_idx]));
                left_idx += 1;
            }

            if right_idx % 2 == 1 {
                right_idx -= 1;
                right_result = Some(match right_result {
                    Some(right) => (self.func)(&self.nodes[right_idx], &right),
                    None => self.nodes[right_idx].clone(),
                });
            }

            left_idx >>= 1;
            right_idx >>= 1;
        }

        match (left_result, right_result) {
            (Some(left), Some(right)) => Some((self.func)(&left, &right)),
            (left, right) => left.or(right),
        }
    }

    /// Sets the element at `index` to `value` and recomputes all of its ancestors.
    /// # Errors
    /// [StreeError::IndexOutOfRange] if `index` is not in `0..len`.
    pub fn update(&mut self, index: isize, value: T) -> StreeResult<()> {
        if index < 0 || index as usize >= self.size {
            return Err(StreeError::IndexOutOfRange {
                index,
                len: self.size,
            });
        }

        let leaf = index as usize + self.size;
        self.nodes[leaf] = value;
        let mut parent = leaf >> 1;
        while parent > 0 {
            self.recompute(parent);
            parent >>= 1;
        }
        Ok(())
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the tree holds no element at all.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn combine_options(&self, left: Option<&T>, right: &T) -> T {
        match left {
            Some(left) => (self.func)(left, right),
            None => right.clone(),
        }
    }

    fn recompute(&mut self, idx: usize) {
        self.nodes[idx] = (self.func)(&self.nodes[idx << 1], &self.nodes[idx << 1 | 1]);
    }
}

impl<T: Debug, F> Debug for FnSegmentTree<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSegmentTree")
            .field("leaves", &&self.nodes[self.size..])
            .finish()
    }
}

impl<T, F> RangeTree<T> for FnSegmentTree<T, F>
where
    T: Clone,
    F: Fn(&T, &T) -> T,
{
    fn len(&self) -> usize {
        self.size
    }

    fn query(&self, start: isize, end: isize) -> StreeResult<Option<T>> {
        Ok(FnSegmentTree::query(self, start, end))
    }

    fn update(&mut self, index: isize, value: T) -> StreeResult<()> {
        FnSegmentTree::update(self, index, value)
    }
}
