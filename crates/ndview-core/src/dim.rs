use crate::ResolvedRange;

/// Per-dimension addressing state.
///
/// A dimension is either arithmetic (`Strided`) or carries an explicit list
/// of absolute offsets into the original flat buffer (`Indexed`). Index-list
/// and mask selections flip a dimension to `Indexed`; the switch is sticky
/// until the owning view is restored past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    Strided {
        first: isize,
        step: isize,
        size: usize,
    },
    Indexed {
        offsets: Vec<isize>,
    },
}

impl Dim {
    pub fn strided(first: isize, step: isize, size: usize) -> Self {
        Dim::Strided { first, step, size }
    }

    /// The trailing padding dimension: one element at offset 0.
    pub fn singleton() -> Self {
        Dim::Strided {
            first: 0,
            step: 1,
            size: 1,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Dim::Strided { size, .. } => *size,
            Dim::Indexed { offsets } => offsets.len(),
        }
    }

    /// Offset of the first addressed element; `-1` for an empty index list.
    pub fn first(&self) -> isize {
        match self {
            Dim::Strided { first, .. } => *first,
            Dim::Indexed { offsets } => offsets.first().copied().unwrap_or(-1),
        }
    }

    /// One-past-the-last offset for `Strided` (`first + size*step`, the
    /// iterator sentinel); the documented `-1` sentinel for `Indexed`.
    pub fn end(&self) -> isize {
        match self {
            Dim::Strided { first, step, size } => first + *size as isize * step,
            Dim::Indexed { .. } => -1,
        }
    }

    pub fn step(&self) -> Option<isize> {
        match self {
            Dim::Strided { step, .. } => Some(*step),
            Dim::Indexed { .. } => None,
        }
    }

    pub fn offsets(&self) -> Option<&[isize]> {
        match self {
            Dim::Strided { .. } => None,
            Dim::Indexed { offsets } => Some(offsets),
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Dim::Indexed { .. })
    }

    /// Delta table for uniform additive stepping: a forced leading 0, one
    /// delta per consecutive pair of addressed offsets, and a trailing wrap
    /// delta `-(last + 1)` that lands a cursor on the `-1` sentinel relative
    /// to its base. Empty for a size-0 dimension.
    pub fn steps(&self) -> Vec<isize> {
        match self {
            Dim::Strided { first, step, size } => {
                if *size == 0 {
                    return Vec::new();
                }
                let last = first + (*size as isize - 1) * step;
                let mut deltas = vec![*step; *size + 1];
                deltas[0] = 0;
                deltas[*size] = -(last + 1);
                deltas
            }
            Dim::Indexed { offsets } => {
                if offsets.is_empty() {
                    return Vec::new();
                }
                let mut deltas = Vec::with_capacity(offsets.len() + 1);
                deltas.push(0);
                for pair in offsets.windows(2) {
                    deltas.push(pair[1] - pair[0]);
                }
                deltas.push(-(offsets[offsets.len() - 1] + 1));
                deltas
            }
        }
    }

    /// Narrows the dimension to an already-validated inclusive range.
    /// Strided dimensions stay strided; indexed ones gather through the
    /// existing offset list.
    pub fn select_range(&mut self, r: &ResolvedRange) {
        match self {
            Dim::Strided { first, step, size } => {
                *first += r.start * *step;
                *step *= r.step;
                *size = r.count();
            }
            Dim::Indexed { offsets } => {
                let mut gathered = Vec::with_capacity(r.count());
                let mut i = r.start;
                loop {
                    gathered.push(offsets[i as usize]);
                    if i == r.end {
                        break;
                    }
                    i += r.step;
                }
                *offsets = gathered;
            }
        }
    }

    /// Replaces the dimension by the listed positions (already validated
    /// against `size`), folding through any existing offset list. Always
    /// leaves the dimension `Indexed`.
    pub fn select_positions(&mut self, list: &[usize]) {
        let gathered = match self {
            Dim::Strided { first, step, .. } => list
                .iter()
                .map(|&i| *first + i as isize * *step)
                .collect::<Vec<_>>(),
            Dim::Indexed { offsets } => list.iter().map(|&i| offsets[i]).collect(),
        };
        *self = Dim::Indexed { offsets: gathered };
    }
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dim::Strided { first, step, size } => {
                write!(f, "{}:{}x{}", first, step, size)
            }
            Dim::Indexed { offsets } => write!(f, "{:?}", offsets),
        }
    }
}
