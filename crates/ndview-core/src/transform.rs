use crate::{Dim, ResolvedRange, View, ViewError};

fn validate_permutation(order: &[usize], rank: usize) -> Result<(), ViewError> {
    let bad = || ViewError::InvalidPermutation {
        order: order.to_vec(),
        rank,
    };
    if order.len() != rank {
        return Err(bad());
    }
    let mut seen = vec![false; rank];
    for &target in order {
        if target >= rank || seen[target] {
            return Err(bad());
        }
        seen[target] = true;
    }
    Ok(())
}

/// Positions of a circular content shift by `amount` over `size` elements:
/// position i of the result reads element `(i - amount) mod size`.
fn rotated_positions(size: usize, amount: isize) -> Vec<usize> {
    let n = size as isize;
    let split = (((-amount) % n) + n) % n;
    (split as usize..size).chain(0..split as usize).collect()
}

/// Axis-order and content transforms, all compositions of the selection
/// primitives in [`View`].
impl View {
    /// Exchanges the descriptors at `a` and `b`, extending rank with
    /// trailing singletons first if either lies beyond it.
    pub fn swap_dims(&mut self, a: usize, b: usize) -> &mut Self {
        let needed = a.max(b) + 1;
        if needed > self.rank() {
            self.push_singleton_dims(needed - self.rank());
        }
        self.dims_mut().swap(a, b);
        self
    }

    /// Rotates the axis order circularly by `n` positions (`n > 0` moves
    /// axis `n` to the front); `n < 0` instead pads `|n|` leading singleton
    /// axes. `|n|` must be below the current rank.
    pub fn shift_dim(&mut self, n: isize) -> Result<&mut Self, ViewError> {
        let rank = self.rank();
        if n.unsigned_abs() >= rank {
            return Err(ViewError::InvalidShift { amount: n, rank });
        }
        if n >= 0 {
            self.dims_mut().rotate_left(n as usize);
        } else {
            for _ in 0..n.unsigned_abs() {
                self.dims_mut().insert(0, Dim::singleton());
            }
        }
        Ok(self)
    }

    /// Strips leading size-1 axes until a non-singleton is found, never
    /// shrinking below rank 2: an all-singleton view terminates at `[1, 1]`
    /// and further calls are no-ops.
    pub fn squeeze_leading(&mut self) -> &mut Self {
        while self.rank() > 1 && self.dims()[0].size() == 1 {
            self.dims_mut().remove(0);
        }
        if self.rank() < 2 {
            self.push_singleton_dims(2 - self.rank());
        }
        self
    }

    /// Reorders axes so that axis `i` of the result is axis `order[i]` of
    /// the current view. `order` must be a bijection on `[0, rank)`.
    ///
    /// Applied as one swap per cycle step of the decomposition of `order`,
    /// `rank - cycles` swaps in total.
    pub fn permute(&mut self, order: &[usize]) -> Result<&mut Self, ViewError> {
        validate_permutation(order, self.rank())?;
        let mut visited = vec![false; order.len()];
        for start in 0..order.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut prev = start;
            let mut cur = order[start];
            while cur != start {
                visited[cur] = true;
                self.dims_mut().swap(prev, cur);
                prev = cur;
                cur = order[cur];
            }
        }
        Ok(self)
    }

    /// Undoes [`View::permute`] with the same `order`: permutes by the
    /// argsort (inverse) of `order`.
    pub fn ipermute(&mut self, order: &[usize]) -> Result<&mut Self, ViewError> {
        validate_permutation(order, self.rank())?;
        let mut inverse = vec![0usize; order.len()];
        for (i, &target) in order.iter().enumerate() {
            inverse[target] = i;
        }
        self.permute(&inverse)
    }

    /// Reverses the addressed order of dimension `dim`.
    pub fn flip(&mut self, dim: usize) -> Result<&mut Self, ViewError> {
        let size = self.size(dim)?;
        if size == 0 {
            return Ok(self);
        }
        self.apply_range(dim, &ResolvedRange::new(size as isize - 1, -1, 0))
    }

    /// Reverses dimension 0 (rows).
    pub fn flipud(&mut self) -> &mut Self {
        self.flip_unchecked(0);
        self
    }

    /// Reverses dimension 1 (columns).
    pub fn fliplr(&mut self) -> &mut Self {
        self.flip_unchecked(1);
        self
    }

    // Rank is always >= 2, so flipping dimension 0 or 1 cannot fail.
    fn flip_unchecked(&mut self, dim: usize) {
        let size = self.dims()[dim].size();
        if size > 0 {
            self.dims_mut()[dim].select_range(&ResolvedRange::new(size as isize - 1, -1, 0));
        }
    }

    /// Rotates the leading two axes by `k` quarter turns counterclockwise;
    /// any integer `k` is taken mod 4.
    pub fn rot90(&mut self, k: isize) -> &mut Self {
        match ((k % 4) + 4) % 4 {
            1 => {
                self.swap_dims(0, 1);
                self.flipud()
            }
            2 => self.flipud().fliplr(),
            3 => {
                self.swap_dims(0, 1);
                self.fliplr()
            }
            _ => self,
        }
    }

    /// Circularly shifts the content of each leading dimension by the given
    /// amount; positive shifts move content toward higher positions.
    ///
    /// Every targeted dimension is forced into indexed mode, even though the
    /// shift is a pure permutation of a strided dimension.
    pub fn circshift(&mut self, shifts: &[isize]) -> &mut Self {
        if shifts.len() > self.rank() {
            self.push_singleton_dims(shifts.len() - self.rank());
        }
        for (dim, &amount) in shifts.iter().enumerate() {
            self.rotate_dim(dim, amount);
        }
        self
    }

    /// Single-dimension form of [`View::circshift`].
    pub fn circshift_dim(&mut self, amount: isize, dim: usize) -> &mut Self {
        if dim >= self.rank() {
            self.push_singleton_dims(dim + 1 - self.rank());
        }
        self.rotate_dim(dim, amount);
        self
    }

    fn rotate_dim(&mut self, dim: usize, amount: isize) {
        let size = self.dims()[dim].size();
        if size == 0 {
            return;
        }
        let positions = rotated_positions(size, amount);
        self.dims_mut()[dim].select_positions(&positions);
    }
}
