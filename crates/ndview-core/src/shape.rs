use crate::{rvec, RVec};

/// How a single scalar extent is widened into a rank-2 shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarHint {
    /// `n` becomes `[1, n]`.
    Row,
    /// `n` becomes `[n, 1]`.
    #[default]
    Column,
    /// `n` becomes `[n, n]`.
    Square,
    /// `n` becomes `[n]`, normalized to `[n, 1]`.
    Vector,
}

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(RVec<usize>);

impl Shape {
    pub fn new(shape: RVec<usize>) -> Self {
        Self(shape)
    }

    /// Expands a bare scalar extent according to `hint`.
    pub fn from_scalar(n: usize, hint: ScalarHint) -> Self {
        let mut shape = match hint {
            ScalarHint::Row => Shape(rvec![1, n]),
            ScalarHint::Column => Shape(rvec![n, 1]),
            ScalarHint::Square => Shape(rvec![n, n]),
            ScalarHint::Vector => Shape(rvec![n]),
        };
        shape.normalize();
        shape
    }

    /// Trims trailing singleton extents down to rank 2 and pads short shapes
    /// up to rank 2. The element count is unaffected.
    pub fn normalize(&mut self) {
        while self.0.len() > 2 && self.0.last() == Some(&1) {
            self.0.pop();
        }
        while self.0.len() < 2 {
            self.0.push(1);
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn inner(&self) -> &RVec<usize> {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&usize> {
        self.0.get(index)
    }

    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rank(&self) -> usize {
        self.len()
    }

    pub fn push(&mut self, dim: usize) {
        self.0.push(dim);
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut shape = format!("[{}", self.0.first().unwrap_or(&0));
        for dim in self.0.iter().skip(1) {
            shape.push_str(&format!("x{}", dim));
        }
        write!(f, "{}]", shape)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::ops::Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Shape {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl From<Vec<usize>> for Shape {
    fn from(shape: Vec<usize>) -> Self {
        Self(shape.into())
    }
}

impl From<&[usize]> for Shape {
    fn from(slice: &[usize]) -> Self {
        Shape(slice.into())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Shape(iter.into_iter().collect())
    }
}
