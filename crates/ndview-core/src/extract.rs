use crate::{Dim, View, ViewError, END};

// Buffers handed to the engine cannot alias under safe Rust, but callers
// can smuggle overlap through unsafe code; the documented contract rejects
// it either way.
fn ensure_disjoint<T>(src: &[T], dst: &[T]) -> Result<(), ViewError> {
    let a = src.as_ptr_range();
    let b = dst.as_ptr_range();
    if !src.is_empty() && !dst.is_empty() && a.start < b.end && b.start < a.end {
        return Err(ViewError::Aliasing);
    }
    Ok(())
}

fn check_len<T>(buf: &[T], expected: usize) -> Result<(), ViewError> {
    if buf.len() != expected {
        return Err(ViewError::LengthMismatch {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Gather/scatter between the view's addressed positions and dense buffers.
///
/// Enumeration is always dimension-0-fastest; the innermost loop is
/// specialized on dimension 0's addressing mode so the hot path carries no
/// mode branch.
impl View {
    /// Visits every addressed offset in enumeration order. Dimensions 1 and
    /// up run through the odometer; dimension 0 is unrolled per mode.
    fn for_each_offset(&self, mut f: impl FnMut(usize)) {
        // Rank is never below 2, so the outer traversal always exists.
        let Ok(mut outer) = self.offset_iter(1) else {
            return;
        };
        let mut base = outer.begin();
        match &self.dims()[0] {
            Dim::Strided { first, step, size } => {
                while base != END {
                    let mut p = base + first;
                    for _ in 0..*size {
                        f(p as usize);
                        p += step;
                    }
                    base = outer.advance();
                }
            }
            Dim::Indexed { offsets } => {
                while base != END {
                    for &o in offsets {
                        f((base + o) as usize);
                    }
                    base = outer.advance();
                }
            }
        }
    }

    /// Gathers the addressed elements of `source` into a fresh buffer of
    /// `len()` elements. `source` must be the original flat buffer
    /// (`initial_len()` elements).
    pub fn extract_from<T: Copy>(&self, source: &[T]) -> Result<Vec<T>, ViewError> {
        check_len(source, self.initial_len())?;
        log::trace!("extract_from: {} of {} elements", self.len(), source.len());
        let mut out = Vec::with_capacity(self.len());
        self.for_each_offset(|off| out.push(source[off]));
        Ok(out)
    }

    /// As [`View::extract_from`], filling a caller-supplied buffer of
    /// exactly `len()` elements.
    pub fn extract_from_into<T: Copy>(
        &self,
        source: &[T],
        dest: &mut [T],
    ) -> Result<(), ViewError> {
        check_len(source, self.initial_len())?;
        check_len(dest, self.len())?;
        ensure_disjoint(source, dest)?;
        let mut i = 0;
        self.for_each_offset(|off| {
            dest[i] = source[off];
            i += 1;
        });
        Ok(())
    }

    /// Scatters `source` (exactly `len()` elements, enumeration order) into
    /// the addressed positions of `dest` (the original flat buffer).
    pub fn scatter_to<T: Copy>(&self, source: &[T], dest: &mut [T]) -> Result<(), ViewError> {
        check_len(source, self.len())?;
        check_len(dest, self.initial_len())?;
        ensure_disjoint(source, dest)?;
        log::trace!("scatter_to: {} of {} elements", source.len(), dest.len());
        let mut i = 0;
        self.for_each_offset(|off| {
            dest[off] = source[i];
            i += 1;
        });
        Ok(())
    }

    /// Broadcasts a single scalar to every addressed position of `dest`.
    pub fn fill_to<T: Copy>(&self, value: T, dest: &mut [T]) -> Result<(), ViewError> {
        check_len(dest, self.initial_len())?;
        self.for_each_offset(|off| dest[off] = value);
        Ok(())
    }

    /// Copies `source[i] -> dest[j]` for corresponding enumeration positions
    /// of `self` and `dest_view`. The two views must enumerate the same
    /// number of elements; a count mismatch is rejected up front rather than
    /// silently truncated.
    pub fn extract_into_view<T: Copy>(
        &self,
        source: &[T],
        dest_view: &View,
        dest: &mut [T],
    ) -> Result<(), ViewError> {
        if self.len() != dest_view.len() {
            return Err(ViewError::LengthMismatch {
                expected: self.len(),
                actual: dest_view.len(),
            });
        }
        check_len(source, self.initial_len())?;
        check_len(dest, dest_view.initial_len())?;
        ensure_disjoint(source, dest)?;
        for (src_off, dst_off) in self.iter_offsets().zip(dest_view.iter_offsets()) {
            dest[dst_off] = source[src_off];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shape, Shape, View};
    use proptest::prelude::*;
    use proptest::strategy::BoxedStrategy;
    use test_strategy::proptest;

    fn iota(n: usize) -> Vec<u32> {
        let _ = env_logger::builder().is_test(true).try_init();
        (0..n as u32).collect()
    }

    #[test]
    fn gathers_indexed_rows_and_column() {
        let mut v = View::new(shape![5, 5]);
        v.select_indices(0, &[1, 3, 4]).unwrap();
        v.select_indices(1, &[2]).unwrap();
        assert_eq!(v.extract_from(&iota(25)).unwrap(), vec![11, 13, 14]);
    }

    #[test]
    fn permute_then_ipermute_round_trips_through_extraction() {
        let mut v = View::new(shape![2, 2, 2]);
        v.permute(&[2, 1, 0]).unwrap();
        assert_eq!(
            v.extract_from(&iota(8)).unwrap(),
            vec![0, 4, 2, 6, 1, 5, 3, 7]
        );
        v.ipermute(&[2, 1, 0]).unwrap();
        assert_eq!(v.extract_from(&iota(8)).unwrap(), iota(8));
    }

    #[test]
    fn circshift_moves_indicator_block_to_opposite_quadrant() {
        // 2x2 block of ones at the top-left of a 4x4.
        let mut data = vec![0u32; 16];
        for r in 0..2 {
            for c in 0..2 {
                data[r + 4 * c] = 1;
            }
        }
        let mut v = View::new(shape![4, 4]);
        v.circshift(&[2, -2]);
        let out = v.extract_from(&data).unwrap();
        for r in 0..4 {
            for c in 0..4 {
                let expected = u32::from(r >= 2 && c >= 2);
                assert_eq!(out[r + 4 * c], expected, "({}, {})", r, c);
            }
        }
    }

    #[test]
    fn extract_from_checks_source_length() {
        let v = View::new(shape![3, 3]);
        assert_eq!(
            v.extract_from(&iota(8)),
            Err(ViewError::LengthMismatch {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn extract_from_into_checks_dest_length() {
        let mut v = View::new(shape![3, 3]);
        v.select_range(0, 0, 1, 1).unwrap();
        let mut dest = vec![0u32; 5];
        assert_eq!(
            v.extract_from_into(&iota(9), &mut dest),
            Err(ViewError::LengthMismatch {
                expected: 6,
                actual: 5
            })
        );
        let mut dest = vec![0u32; 6];
        v.extract_from_into(&iota(9), &mut dest).unwrap();
        assert_eq!(dest, vec![0, 1, 3, 4, 6, 7]);
    }

    #[test]
    fn scatter_writes_enumeration_order() {
        let mut v = View::new(shape![3, 3]);
        v.select_indices(0, &[2, 0]).unwrap();
        v.select_range(1, 1, 1, 2).unwrap();
        let mut dest = vec![0u32; 9];
        v.scatter_to(&[10, 20, 30, 40], &mut dest).unwrap();
        assert_eq!(dest, vec![0, 0, 0, 20, 0, 10, 40, 0, 30]);
    }

    #[test]
    fn scalar_fill_broadcasts() {
        let mut v = View::new(shape![4, 4]);
        v.select_range(0, 1, 1, 2).unwrap();
        v.select_range(1, 1, 1, 2).unwrap();
        let mut dest = vec![0u32; 16];
        v.fill_to(7, &mut dest).unwrap();
        let ones = dest.iter().filter(|&&x| x == 7).count();
        assert_eq!(ones, 4);
        assert_eq!(dest[5], 7);
        assert_eq!(dest[6], 7);
        assert_eq!(dest[9], 7);
        assert_eq!(dest[10], 7);
    }

    #[test]
    fn transfer_copies_between_independent_views() {
        // Reverse a 2x3 into a differently-shaped 3x2 destination.
        let mut src_view = View::new(shape![2, 3]);
        src_view.flipud().fliplr();
        let dst_view = View::new(shape![3, 2]);
        let mut dest = vec![0u32; 6];
        src_view
            .extract_into_view(&iota(6), &dst_view, &mut dest)
            .unwrap();
        assert_eq!(dest, vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn transfer_rejects_count_mismatch() {
        let src_view = View::new(shape![2, 3]);
        let dst_view = View::new(shape![2, 2]);
        let mut dest = vec![0u32; 4];
        assert_eq!(
            src_view.extract_into_view(&iota(6), &dst_view, &mut dest),
            Err(ViewError::LengthMismatch {
                expected: 6,
                actual: 4
            })
        );
    }

    #[test]
    fn empty_selection_extracts_nothing() {
        let mut v = View::new(shape![3, 3]);
        v.select_indices(1, &[]).unwrap();
        assert_eq!(v.extract_from(&iota(9)).unwrap(), Vec::<u32>::new());
    }

    // ---- property suites --------------------------------------------------

    #[derive(Debug, Clone)]
    struct PermuteProblem {
        shape: Vec<usize>,
        order: Vec<usize>,
    }

    impl Arbitrary for PermuteProblem {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
            // Sizes >= 2 so normalization cannot trim the rank under the
            // generated order.
            proptest::collection::vec(2..5usize, 2..5)
                .prop_flat_map(|shape| {
                    let rank = shape.len();
                    let order = Just((0..rank).collect::<Vec<_>>()).prop_shuffle();
                    (Just(shape), order)
                })
                .prop_map(|(shape, order)| PermuteProblem { shape, order })
                .boxed()
        }
    }

    #[proptest(cases = 64)]
    fn permute_ipermute_is_identity(prob: PermuteProblem) {
        let PermuteProblem { shape, order } = prob;
        let data = iota(shape.iter().product());
        let mut v = View::new(Shape::from(shape));
        let before = v.extract_from(&data).unwrap();
        v.permute(&order).unwrap().ipermute(&order).unwrap();
        prop_assert_eq!(v.extract_from(&data).unwrap(), before);
    }

    #[derive(Debug, Clone)]
    struct CircshiftProblem {
        shape: Vec<usize>,
        shifts: Vec<isize>,
    }

    impl Arbitrary for CircshiftProblem {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
            proptest::collection::vec(1..6usize, 2..4)
                .prop_flat_map(|shape| {
                    let rank = shape.len();
                    let shifts = proptest::collection::vec(-7..7isize, 1..=rank);
                    (Just(shape), shifts)
                })
                .prop_map(|(shape, shifts)| CircshiftProblem { shape, shifts })
                .boxed()
        }
    }

    #[proptest(cases = 64)]
    fn circshift_back_and_forth_is_identity(prob: CircshiftProblem) {
        let CircshiftProblem { shape, shifts } = prob;
        let data = iota(shape.iter().product());
        let mut v = View::new(Shape::from(shape));
        let before = v.extract_from(&data).unwrap();
        let back = shifts.iter().map(|s| -s).collect::<Vec<_>>();
        v.circshift(&shifts).circshift(&back);
        prop_assert_eq!(v.extract_from(&data).unwrap(), before);
    }

    #[proptest(cases = 32)]
    fn save_restore_preserves_enumeration(
        #[strategy(proptest::collection::vec(1..6usize, 2..4))] shape: Vec<usize>,
        #[strategy(-3..4isize)] shift: isize,
    ) {
        let data = iota(shape.iter().product());
        let mut v = View::new(Shape::from(shape));
        let before = v.extract_from(&data).unwrap();
        v.save();
        v.flipud().circshift_dim(shift, 1);
        v.restore();
        prop_assert_eq!(v.extract_from(&data).unwrap(), before);
    }

    #[proptest(cases = 32)]
    fn gather_scatter_restores_addressed_positions(
        #[strategy(proptest::collection::vec(2..5usize, 2..4))] shape: Vec<usize>,
    ) {
        let data = iota(shape.iter().product());
        let mut v = View::new(Shape::from(shape.clone()));
        v.select_range(0, 0, 2, shape[0] as isize - 1).unwrap();
        let gathered = v.extract_from(&data).unwrap();
        let mut rebuilt = data.clone();
        v.scatter_to(&gathered, &mut rebuilt).unwrap();
        prop_assert_eq!(rebuilt, data);
    }
}
