use crate::{Dim, ResolvedRange, RVec, ScalarHint, Selection, Shape, ViewError};

/// A logical, mutable, multi-dimensional index over a flat contiguous buffer.
///
/// A view never touches element data: it is an ordered list of [`Dim`]
/// descriptors addressing positions of the original buffer, dimension 0
/// fastest. All selection and transform operations mutate in place and
/// return `&mut Self` so they chain; [`View::save`] / [`View::restore`]
/// checkpoint the descriptor state on an explicit stack.
#[derive(Debug, Clone)]
pub struct View {
    dims: RVec<Dim>,
    initial: RVec<Dim>,
    stack: Vec<RVec<Dim>>,
    initial_len: usize,
}

impl View {
    /// Fresh view over a buffer of `shape.numel()` elements, dimension 0
    /// fastest. The shape is normalized to rank >= 2 first.
    pub fn new(shape: impl Into<Shape>) -> Self {
        let shape = shape.into().normalized();
        let mut dims = RVec::with_capacity(shape.rank());
        let mut stride = 1isize;
        for &size in shape.iter() {
            dims.push(Dim::strided(0, stride, size));
            stride *= size as isize;
        }
        View {
            initial: dims.clone(),
            dims,
            stack: Vec::new(),
            initial_len: shape.numel(),
        }
    }

    /// Fresh view over a single scalar extent, widened per `hint`.
    pub fn from_scalar(n: usize, hint: ScalarHint) -> Self {
        Self::new(Shape::from_scalar(n, hint))
    }

    /// Copy-construction from another view's *current* state. The fork's
    /// initial snapshot is that current state, not the source's own initial;
    /// its stack starts empty. Both views address the same original buffer,
    /// so the original flat length carries over.
    pub fn fork(&self) -> Self {
        View {
            dims: self.dims.clone(),
            initial: self.dims.clone(),
            stack: Vec::new(),
            initial_len: self.initial_len,
        }
    }

    // ---- accessors ------------------------------------------------------

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Addressed element count per dimension.
    pub fn sizes(&self) -> Shape {
        self.dims.iter().map(Dim::size).collect()
    }

    pub fn size(&self, dim: usize) -> Result<usize, ViewError> {
        Ok(self.dim(dim)?.size())
    }

    /// Total addressed element count.
    pub fn len(&self) -> usize {
        self.dims.iter().map(Dim::size).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element count of the original flat buffer this view addresses.
    pub fn initial_len(&self) -> usize {
        self.initial_len
    }

    pub fn first(&self, dim: usize) -> Result<isize, ViewError> {
        Ok(self.dim(dim)?.first())
    }

    pub fn step(&self, dim: usize) -> Result<isize, ViewError> {
        self.dim(dim)?
            .step()
            .ok_or(ViewError::DimensionModeConflict { dim })
    }

    /// `first + size*step` for a strided dimension (the one-past iterator
    /// sentinel); the documented `-1` sentinel for an indexed one. Unlike
    /// [`View::step`], never an error.
    pub fn end(&self, dim: usize) -> Result<isize, ViewError> {
        Ok(self.dim(dim)?.end())
    }

    /// Absolute offset list of an indexed dimension; `None` when strided.
    pub fn indices(&self, dim: usize) -> Result<Option<&[isize]>, ViewError> {
        Ok(self.dim(dim)?.offsets())
    }

    /// Additive delta table for the dimension (see [`Dim::steps`]).
    pub fn steps(&self, dim: usize) -> Result<Vec<isize>, ViewError> {
        Ok(self.dim(dim)?.steps())
    }

    pub fn is_indexed(&self, dim: usize) -> Result<bool, ViewError> {
        Ok(self.dim(dim)?.is_indexed())
    }

    pub(crate) fn dim(&self, dim: usize) -> Result<&Dim, ViewError> {
        self.dims.get(dim).ok_or(ViewError::InvalidDimension {
            dim,
            rank: self.rank(),
        })
    }

    pub(crate) fn dims(&self) -> &[Dim] {
        &self.dims
    }

    pub(crate) fn dims_mut(&mut self) -> &mut RVec<Dim> {
        &mut self.dims
    }

    // ---- selection ------------------------------------------------------

    /// Narrows dimension `dim` to an inclusive `(start, step, end)` range,
    /// resolving negative endpoints against the current size.
    pub fn select_range(
        &mut self,
        dim: usize,
        start: isize,
        step: isize,
        end: isize,
    ) -> Result<&mut Self, ViewError> {
        let size = self.size(dim)?;
        let resolved = ResolvedRange::resolve(dim, start, step, end, size)?;
        self.apply_range(dim, &resolved)
    }

    /// Narrows dimension `dim` to an externally-resolved range. Bounds are
    /// re-checked against the current size before any mutation.
    pub fn apply_range(
        &mut self,
        dim: usize,
        range: &ResolvedRange,
    ) -> Result<&mut Self, ViewError> {
        range.validate(dim, self.size(dim)?)?;
        self.dims[dim].select_range(range);
        Ok(self)
    }

    /// Replaces dimension `dim` by the listed positions. Forces the
    /// dimension into indexed mode; an empty list yields a size-0 dimension
    /// whose `first` reports the `-1` sentinel.
    pub fn select_indices(&mut self, dim: usize, list: &[usize]) -> Result<&mut Self, ViewError> {
        let size = self.size(dim)?;
        if let Some(&bad) = list.iter().find(|&&i| i >= size) {
            return Err(ViewError::invalid_selection(
                dim,
                format!("index {} out of bounds for size {}", bad, size),
            ));
        }
        self.dims[dim].select_positions(list);
        Ok(self)
    }

    /// Keeps the positions of dimension `dim` where `mask` is true. The mask
    /// length must equal the dimension size exactly.
    pub fn select_mask(&mut self, dim: usize, mask: &[bool]) -> Result<&mut Self, ViewError> {
        let size = self.size(dim)?;
        if mask.len() != size {
            return Err(ViewError::invalid_selection(
                dim,
                format!("mask length {} != size {}", mask.len(), size),
            ));
        }
        let positions = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect::<Vec<_>>();
        self.dims[dim].select_positions(&positions);
        Ok(self)
    }

    /// Applies one [`Selection`] per dimension, front to back. Rank extends
    /// with trailing singletons if more specs than dimensions are given.
    /// Validation of every spec precedes the first mutation.
    pub fn select(&mut self, specs: &[Selection]) -> Result<&mut Self, ViewError> {
        enum Plan {
            Keep,
            Range(ResolvedRange),
            Positions(Vec<usize>),
        }
        // Resolve everything first so a late failure cannot leave a
        // half-selected view behind. Dimensions past the current rank are
        // validated against the implied trailing singletons, which are only
        // pushed once every spec has passed.
        let mut plans = Vec::with_capacity(specs.len());
        for (dim, spec) in specs.iter().enumerate() {
            let size = if dim < self.rank() { self.size(dim)? } else { 1 };
            let plan = match spec {
                Selection::All => Plan::Keep,
                Selection::Single(i) => {
                    Plan::Range(ResolvedRange::resolve(dim, *i, 1, *i, size)?)
                }
                Selection::Range { start, step, end } => {
                    Plan::Range(ResolvedRange::resolve(dim, *start, *step, *end, size)?)
                }
                Selection::Indices(list) => {
                    if let Some(&bad) = list.iter().find(|&&i| i >= size) {
                        return Err(ViewError::invalid_selection(
                            dim,
                            format!("index {} out of bounds for size {}", bad, size),
                        ));
                    }
                    Plan::Positions(list.clone())
                }
                Selection::Mask(mask) => {
                    if mask.len() != size {
                        return Err(ViewError::invalid_selection(
                            dim,
                            format!("mask length {} != size {}", mask.len(), size),
                        ));
                    }
                    Plan::Positions(
                        mask.iter()
                            .enumerate()
                            .filter_map(|(i, &keep)| keep.then_some(i))
                            .collect(),
                    )
                }
            };
            plans.push(plan);
        }
        if specs.len() > self.rank() {
            let missing = specs.len() - self.rank();
            self.push_singleton_dims(missing);
        }
        for (dim, plan) in plans.into_iter().enumerate() {
            match plan {
                Plan::Keep => {}
                Plan::Range(range) => self.dims[dim].select_range(&range),
                Plan::Positions(positions) => self.dims[dim].select_positions(&positions),
            }
        }
        Ok(self)
    }

    /// Appends `n` trailing `{first: 0, step: 1, size: 1}` dimensions.
    pub fn push_singleton_dims(&mut self, n: usize) -> &mut Self {
        for _ in 0..n {
            self.dims.push(Dim::singleton());
        }
        self
    }

    // ---- checkpointing --------------------------------------------------

    /// Pushes a deep copy of the current descriptor state.
    pub fn save(&mut self) -> &mut Self {
        log::trace!("save: depth {} -> {}", self.stack.len(), self.stack.len() + 1);
        self.stack.push(self.dims.clone());
        self
    }

    /// Pops the snapshot stack; once the stack is empty, resets to the
    /// construction-time state (idempotent from there on).
    pub fn restore(&mut self) -> &mut Self {
        match self.stack.pop() {
            Some(dims) => self.dims = dims,
            None => self.dims = self.initial.clone(),
        }
        log::trace!("restore: depth {}", self.stack.len());
        self
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "View{:?}(", self.sizes())?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", dim)?;
        }
        write!(f, ")")
    }
}
