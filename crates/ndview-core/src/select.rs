use crate::ViewError;

/// A per-dimension selection spec, constructed explicitly by the caller.
///
/// Negative positions in `Single` and `Range` resolve against the current
/// dimension length (`-1` is the last element). `Indices` entries are plain
/// dimension-local positions and must lie in `[0, size)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Keep the dimension as-is.
    All,
    /// A single element, collapsing the dimension to size 1.
    Single(isize),
    /// Inclusive `(start, step, end)` range.
    Range {
        start: isize,
        step: isize,
        end: isize,
    },
    /// Explicit dimension-local positions, in order, repeats allowed.
    Indices(Vec<usize>),
    /// Boolean mask; length must equal the dimension size exactly.
    Mask(Vec<bool>),
}

impl Selection {
    /// Inclusive range with unit step.
    pub fn range(start: isize, end: isize) -> Self {
        Selection::Range {
            start,
            step: 1,
            end,
        }
    }
}

impl From<isize> for Selection {
    fn from(i: isize) -> Self {
        Selection::Single(i)
    }
}

/// A colon spec after normalization: in-bounds inclusive endpoints and a
/// direction-consistent nonzero step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub struct ResolvedRange {
    pub start: isize,
    pub step: isize,
    pub end: isize,
}

impl ResolvedRange {
    /// Normalizes a raw `(start, step, end)` colon spec against a dimension
    /// of length `len`, resolving negative endpoints.
    pub fn resolve(
        dim: usize,
        start: isize,
        step: isize,
        end: isize,
        len: usize,
    ) -> Result<Self, ViewError> {
        let n = len as isize;
        let start = if start < 0 { start + n } else { start };
        let end = if end < 0 { end + n } else { end };
        let resolved = ResolvedRange { start, step, end };
        resolved.validate(dim, len)?;
        Ok(resolved)
    }

    /// Bounds and direction checks for an already-resolved spec.
    pub fn validate(&self, dim: usize, len: usize) -> Result<(), ViewError> {
        let n = len as isize;
        if self.step == 0 {
            return Err(ViewError::invalid_selection(dim, "step must be nonzero"));
        }
        if self.start < 0 || self.start >= n || self.end < 0 || self.end >= n {
            return Err(ViewError::invalid_selection(
                dim,
                format!(
                    "range {}:{}:{} out of bounds for size {}",
                    self.start, self.step, self.end, len
                ),
            ));
        }
        if (self.end - self.start).signum() * self.step.signum() < 0 {
            return Err(ViewError::invalid_selection(
                dim,
                format!(
                    "range {}:{}:{} runs against its step",
                    self.start, self.step, self.end
                ),
            ));
        }
        Ok(())
    }

    /// Number of addressed positions: `floor((end - start) / step) + 1`.
    pub fn count(&self) -> usize {
        ((self.end - self.start) / self.step) as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_negative_endpoints() {
        let r = ResolvedRange::resolve(0, -3, 1, -1, 5).unwrap();
        assert_eq!(r, ResolvedRange::new(2, 1, 4));
        assert_eq!(r.count(), 3);
    }

    #[test]
    fn reversed_range_counts_inclusively() {
        let r = ResolvedRange::resolve(0, 4, -2, 0, 5).unwrap();
        assert_eq!(r.count(), 3); // 4, 2, 0
    }

    #[test]
    fn zero_step_is_rejected() {
        let err = ResolvedRange::resolve(1, 0, 0, 3, 5).unwrap_err();
        assert!(matches!(err, ViewError::InvalidSelection { dim: 1, .. }));
    }

    #[test]
    fn direction_mismatch_is_rejected() {
        assert!(ResolvedRange::resolve(0, 3, 1, 0, 5).is_err());
        assert!(ResolvedRange::resolve(0, 0, -1, 3, 5).is_err());
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        assert!(ResolvedRange::resolve(0, 0, 1, 5, 5).is_err());
        assert!(ResolvedRange::resolve(0, -6, 1, 4, 5).is_err());
    }
}
