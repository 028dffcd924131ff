use crate::{Dim, RVec, View, ViewError};

/// Exhaustion sentinel shared by every iterator kind.
pub const END: isize = -1;

/// One odometer digit. Cursors snapshot the descriptor they were built
/// from, so an in-flight iterator is unaffected by later view mutation.
#[derive(Debug, Clone)]
enum DimCursor {
    Strided {
        step: isize,
        size: usize,
        k: usize,
    },
    Indexed {
        /// `deltas[k]` moves the running offset from position `k - 1` to
        /// `k`; `deltas[0]` is 0.
        deltas: Vec<isize>,
        /// Offset distance from the last position back to the first.
        span: isize,
        size: usize,
        k: usize,
    },
}

impl DimCursor {
    fn build(dim: &Dim) -> Self {
        match dim {
            Dim::Strided { step, size, .. } => DimCursor::Strided {
                step: *step,
                size: *size,
                k: 0,
            },
            Dim::Indexed { offsets } => {
                let mut deltas = Vec::with_capacity(offsets.len());
                deltas.push(0);
                for pair in offsets.windows(2) {
                    deltas.push(pair[1] - pair[0]);
                }
                let span = match (offsets.first(), offsets.last()) {
                    (Some(first), Some(last)) => last - first,
                    _ => 0,
                };
                DimCursor::Indexed {
                    deltas,
                    span,
                    size: offsets.len(),
                    k: 0,
                }
            }
        }
    }

    /// Steps this digit, adjusting the running offset. Returns false on
    /// wraparound, with the digit reset and its offset contribution rolled
    /// back to the first position.
    fn advance(&mut self, offset: &mut isize) -> bool {
        match self {
            DimCursor::Strided { step, size, k } => {
                if *k + 1 < *size {
                    *k += 1;
                    *offset += *step;
                    true
                } else {
                    *offset -= *step * (*size as isize - 1);
                    *k = 0;
                    false
                }
            }
            DimCursor::Indexed {
                deltas,
                span,
                size,
                k,
            } => {
                if *k + 1 < *size {
                    *k += 1;
                    *offset += deltas[*k];
                    true
                } else {
                    *offset -= *span;
                    *k = 0;
                    false
                }
            }
        }
    }

    fn reset(&mut self) {
        match self {
            DimCursor::Strided { k, .. } => *k = 0,
            DimCursor::Indexed { k, .. } => *k = 0,
        }
    }

    fn position(&self) -> usize {
        match self {
            DimCursor::Strided { k, .. } => *k,
            DimCursor::Indexed { k, .. } => *k,
        }
    }
}

/// Full-view traversal over dimensions `start_dim..rank`, enumerating
/// absolute buffer offsets dimension-`start_dim`-fastest.
///
/// A generalized odometer: each digit has its own radix and addressing
/// mode, and wraparound carries to the next digit in an iterative loop, so
/// stepping is O(1) amortized with no recursion across rank.
#[derive(Debug, Clone)]
pub struct OffsetIterator {
    cursors: RVec<DimCursor>,
    /// Sum of the per-dimension first offsets.
    origin: isize,
    offset: isize,
    empty: bool,
    done: bool,
}

impl OffsetIterator {
    fn build(view: &View, start_dim: usize) -> Self {
        let dims = &view.dims()[start_dim..];
        let cursors = dims.iter().map(DimCursor::build).collect::<RVec<_>>();
        let origin = dims.iter().map(Dim::first).sum();
        let empty = dims.iter().any(|d| d.size() == 0);
        OffsetIterator {
            cursors,
            origin,
            offset: origin,
            empty,
            done: empty,
        }
    }

    /// Rewinds to the first addressed offset and returns it, or [`END`]
    /// when the traversal is empty.
    pub fn begin(&mut self) -> isize {
        for cursor in self.cursors.iter_mut() {
            cursor.reset();
        }
        self.offset = self.origin;
        self.done = self.empty;
        if self.done {
            END
        } else {
            self.offset
        }
    }

    /// Steps to the next addressed offset; [`END`] once exhausted.
    pub fn advance(&mut self) -> isize {
        if self.done {
            return END;
        }
        for cursor in self.cursors.iter_mut() {
            if cursor.advance(&mut self.offset) {
                return self.offset;
            }
            // Wrapped: carry into the next digit.
        }
        self.done = true;
        END
    }

    pub fn end(&self) -> isize {
        END
    }

    pub fn is_end(&self) -> bool {
        self.done
    }

    /// Per-dimension coordinates of the current position (debug use).
    pub fn position(&self) -> RVec<usize> {
        self.cursors.iter().map(DimCursor::position).collect()
    }
}

/// Single-dimension cursor for manual nested-loop composition. `begin`
/// re-anchors it against a base offset computed by an outer loop.
#[derive(Debug, Clone)]
pub enum SubIterator {
    Strided {
        first: isize,
        step: isize,
        size: usize,
        k: usize,
        cur: isize,
        end: isize,
    },
    Indexed {
        first: isize,
        /// Delta table per [`Dim::steps`]: leading 0, consecutive-pair
        /// deltas, trailing wrap delta landing on `base - 1`.
        deltas: Vec<isize>,
        k: usize,
        cur: isize,
        end: isize,
    },
}

impl SubIterator {
    fn build(dim: &Dim, base: isize) -> Self {
        let mut sub = match dim {
            Dim::Strided { first, step, size } => SubIterator::Strided {
                first: *first,
                step: *step,
                size: *size,
                k: 0,
                cur: 0,
                end: 0,
            },
            Dim::Indexed { offsets } => SubIterator::Indexed {
                first: offsets.first().copied().unwrap_or(-1),
                deltas: dim.steps(),
                k: 0,
                cur: 0,
                end: 0,
            },
        };
        sub.begin(base);
        sub
    }

    /// Anchors the cursor at `base` and returns the first offset. The
    /// sentinel is `base + first + size*step` for a strided dimension and
    /// `base - 1` for an indexed one (where the wrap delta lands).
    pub fn begin(&mut self, base: isize) -> isize {
        match self {
            SubIterator::Strided {
                first,
                step,
                size,
                k,
                cur,
                end,
            } => {
                *k = 0;
                *cur = base + *first;
                *end = base + *first + *size as isize * *step;
                *cur
            }
            SubIterator::Indexed {
                first,
                deltas,
                k,
                cur,
                end,
            } => {
                *k = 0;
                *end = base - 1;
                *cur = if deltas.is_empty() { *end } else { base + *first };
                *cur
            }
        }
    }

    /// Steps once; the offset sticks at the sentinel once exhausted.
    pub fn advance(&mut self) -> isize {
        match self {
            SubIterator::Strided {
                step, k, cur, end, ..
            } => {
                if *cur != *end {
                    *cur += *step;
                    *k += 1;
                }
                *cur
            }
            SubIterator::Indexed {
                deltas, k, cur, end, ..
            } => {
                if *k + 1 < deltas.len() {
                    *k += 1;
                    *cur += deltas[*k];
                } else {
                    *cur = *end;
                }
                *cur
            }
        }
    }

    pub fn end(&self) -> isize {
        match self {
            SubIterator::Strided { end, .. } => *end,
            SubIterator::Indexed { end, .. } => *end,
        }
    }

    pub fn is_end(&self) -> bool {
        match self {
            SubIterator::Strided { cur, end, .. } => cur == end,
            SubIterator::Indexed { cur, end, .. } => cur == end,
        }
    }

    /// Current coordinate along the dimension (debug use).
    pub fn position(&self) -> usize {
        match self {
            SubIterator::Strided { k, .. } => *k,
            SubIterator::Indexed { k, .. } => *k,
        }
    }
}

/// `Iterator` adapter over an [`OffsetIterator`], mapping the [`END`]
/// sentinel to exhaustion.
#[derive(Debug, Clone)]
pub struct Offsets {
    inner: OffsetIterator,
    next: isize,
}

impl Iterator for Offsets {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next < 0 {
            return None;
        }
        let cur = self.next;
        self.next = self.inner.advance();
        Some(cur as usize)
    }
}

impl View {
    /// Stateful traversal over dimensions `start_dim..rank`; `begin()` has
    /// already been called on the returned iterator.
    pub fn offset_iter(&self, start_dim: usize) -> Result<OffsetIterator, ViewError> {
        if start_dim >= self.rank() {
            return Err(ViewError::InvalidDimension {
                dim: start_dim,
                rank: self.rank(),
            });
        }
        Ok(OffsetIterator::build(self, start_dim))
    }

    /// Full-view offset enumeration, dimension 0 fastest.
    pub fn iter_offsets(&self) -> Offsets {
        // Rank is never below 2, so a full traversal always exists.
        let inner = OffsetIterator::build(self, 0);
        let next = if inner.is_end() { END } else { inner.offset };
        Offsets { inner, next }
    }

    /// Single-dimension cursor anchored at `base`, for manual nested-loop
    /// composition against an outer traversal.
    pub fn sub_iter(&self, dim: usize, base: isize) -> Result<SubIterator, ViewError> {
        Ok(SubIterator::build(self.dim(dim)?, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape;

    #[test]
    fn enumerates_dimension_zero_fastest() {
        let v = View::new(shape![3, 2]);
        assert_eq!(v.iter_offsets().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn carry_propagates_across_all_dimensions() {
        let v = View::new(shape![2, 2, 2]);
        assert_eq!(
            v.iter_offsets().collect::<Vec<_>>(),
            (0..8).collect::<Vec<_>>()
        );
    }

    #[test]
    fn mixed_mode_enumeration() {
        let mut v = View::new(shape![4, 3]);
        v.select_indices(0, &[3, 1]).unwrap();
        v.select_range(1, 2, -2, 0).unwrap();
        // Dim 0 offsets [3, 1]; dim 1 contributions 8, 0.
        assert_eq!(v.iter_offsets().collect::<Vec<_>>(), vec![11, 9, 3, 1]);
    }

    #[test]
    fn sentinel_protocol() {
        let v = View::new(shape![2, 1]);
        let mut it = v.offset_iter(0).unwrap();
        assert_eq!(it.begin(), 0);
        assert!(!it.is_end());
        assert_eq!(it.advance(), 1);
        assert_eq!(it.advance(), END);
        assert!(it.is_end());
        assert_eq!(it.advance(), END);
        assert_eq!(it.end(), END);
    }

    #[test]
    fn begin_rewinds() {
        let v = View::new(shape![2, 2]);
        let mut it = v.offset_iter(0).unwrap();
        while it.advance() != END {}
        assert_eq!(it.begin(), 0);
        assert_eq!(it.advance(), 1);
    }

    #[test]
    fn empty_dimension_exhausts_immediately() {
        let mut v = View::new(shape![3, 3]);
        v.select_indices(1, &[]).unwrap();
        let mut it = v.offset_iter(0).unwrap();
        assert_eq!(it.begin(), END);
        assert!(it.is_end());
        assert_eq!(v.iter_offsets().count(), 0);
    }

    #[test]
    fn position_tracks_coordinates() {
        let v = View::new(shape![2, 2]);
        let mut it = v.offset_iter(0).unwrap();
        it.begin();
        assert_eq!(it.position().to_vec(), vec![0, 0]);
        it.advance();
        assert_eq!(it.position().to_vec(), vec![1, 0]);
        it.advance();
        assert_eq!(it.position().to_vec(), vec![0, 1]);
    }

    #[test]
    fn traversal_from_inner_dimension() {
        let v = View::new(shape![4, 3]);
        let mut it = v.offset_iter(1).unwrap();
        assert_eq!(it.begin(), 0);
        assert_eq!(it.advance(), 4);
        assert_eq!(it.advance(), 8);
        assert_eq!(it.advance(), END);
    }

    #[test]
    fn strided_sub_iterator_anchors_at_base() {
        let v = View::new(shape![3, 4]);
        let mut sub = v.sub_iter(0, 8).unwrap();
        assert_eq!(sub.begin(8), 8);
        assert_eq!(sub.advance(), 9);
        assert_eq!(sub.advance(), 10);
        assert!(!sub.is_end());
        assert_eq!(sub.advance(), 11);
        assert!(sub.is_end());
        assert_eq!(sub.end(), 11);
    }

    #[test]
    fn strided_sub_iterator_position_is_base_independent() {
        let v = View::new(shape![3, 4]);
        let mut sub = v.sub_iter(0, 8).unwrap();
        assert_eq!(sub.begin(8), 8);
        assert_eq!(sub.position(), 0);
        sub.advance();
        assert_eq!(sub.position(), 1);
        sub.advance();
        assert_eq!(sub.position(), 2);
        // Re-anchoring rewinds the coordinate.
        assert_eq!(sub.begin(4), 4);
        assert_eq!(sub.position(), 0);
    }

    #[test]
    fn indexed_sub_iterator_wraps_to_base_minus_one() {
        let mut v = View::new(shape![5, 1]);
        v.select_indices(0, &[4, 0, 2]).unwrap();
        let mut sub = v.sub_iter(0, 100).unwrap();
        assert_eq!(sub.begin(100), 104);
        assert_eq!(sub.advance(), 100);
        assert_eq!(sub.position(), 1);
        assert_eq!(sub.advance(), 102);
        assert_eq!(sub.advance(), 99);
        assert!(sub.is_end());
        assert_eq!(sub.end(), 99);
        assert_eq!(sub.advance(), 99);
    }

    #[test]
    fn empty_indexed_sub_iterator_begins_exhausted() {
        let mut v = View::new(shape![3, 1]);
        v.select_indices(0, &[]).unwrap();
        let mut sub = v.sub_iter(0, 10).unwrap();
        assert_eq!(sub.begin(10), 9);
        assert!(sub.is_end());
    }

    #[test]
    fn iterator_snapshot_survives_view_mutation() {
        let mut v = View::new(shape![2, 2]);
        let mut it = v.offset_iter(0).unwrap();
        it.begin();
        v.flipud();
        assert_eq!(it.advance(), 1);
        assert_eq!(it.advance(), 2);
    }
}
