//! Mixed-radix indexing of a product of cyclic groups.
//!
//! A signature `(d_0, ..., d_{n-1})` describes the hypercube
//! `Z/d_0 x ... x Z/d_{n-1}`. Linear indices run over `0..prod(d_i)` with the
//! last dimension varying fastest, so
//! `idx = sum_i coord_i * prod(d_{i+1..})`.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CubeSignature {
    dims: Vec<usize>,
    /// `prods[i] = prod(dims[i..])`, with `prods[n] = 1`.
    prods: Vec<usize>,
}

impl CubeSignature {
    pub fn new(dims: &[usize]) -> Self {
        assert!(
            dims.iter().all(|&d| d > 0),
            "CubeSignature::new: dimensions must be positive"
        );
        let mut prods = vec![1usize; dims.len() + 1];
        for i in (0..dims.len()).rev() {
            prods[i] = prods[i + 1] * dims[i];
        }
        Self {
            dims: dims.to_vec(),
            prods,
        }
    }

    /// Number of points, `prod(dims)`.
    pub fn size(&self) -> usize {
        self.prods[0]
    }

    pub fn num_dims(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// `prod(dims[i..])`; `prod(num_dims())` is `1`.
    pub fn prod(&self, i: usize) -> usize {
        self.prods[i]
    }

    /// Coordinate `i` of index `k`.
    pub fn coord(&self, k: usize, i: usize) -> usize {
        assert!(k < self.size(), "coord: index {k} out of range");
        (k % self.prods[i]) / self.prods[i + 1]
    }

    pub fn to_coords(&self, k: usize) -> Vec<usize> {
        (0..self.num_dims()).map(|i| self.coord(k, i)).collect()
    }

    pub fn from_coords(&self, coords: &[usize]) -> usize {
        assert_eq!(coords.len(), self.num_dims(), "from_coords: wrong arity");
        coords
            .iter()
            .zip(&self.dims)
            .zip(&self.prods[1..])
            .map(|((&c, &d), &stride)| {
                assert!(c < d, "from_coords: coordinate {c} out of range {d}");
                c * stride
            })
            .sum()
    }

    /// Advances `coords` to the next point in index order. At the last point
    /// returns `false` and leaves `coords` unchanged.
    pub fn increment_coords(&self, coords: &mut [usize]) -> bool {
        assert_eq!(coords.len(), self.num_dims(), "increment_coords: wrong arity");
        let Some(pos) = (0..coords.len()).rev().find(|&i| coords[i] + 1 < self.dims[i]) else {
            return false;
        };
        coords[pos] += 1;
        for c in coords.iter_mut().skip(pos + 1) {
            *c = 0;
        }
        true
    }

    /// The index of `k` with coordinate `i` shifted by `offset`, cyclically.
    pub fn add_coord(&self, i: usize, k: usize, offset: i64) -> usize {
        let d = self.dims[i];
        let c = self.coord(k, i) as i64;
        let shifted = (c + offset).rem_euclid(d as i64) as usize;
        k - self.coord(k, i) * self.prods[i + 1] + shifted * self.prods[i + 1]
    }

    /// Splits `idx` into its index in the hypercube with dimension `dim`
    /// removed and its coordinate along `dim`.
    pub fn break_index_by_dim(&self, idx: usize, dim: usize) -> (usize, usize) {
        assert!(idx < self.size(), "break_index_by_dim: index {idx} out of range");
        let hi = idx / self.prods[dim];
        let lo = idx % self.prods[dim + 1];
        (hi * self.prods[dim + 1] + lo, self.coord(idx, dim))
    }

    /// Inverse of [`break_index_by_dim`](Self::break_index_by_dim).
    pub fn assemble_index_by_dim(&self, (rest, coord): (usize, usize), dim: usize) -> usize {
        assert!(coord < self.dims[dim], "assemble_index_by_dim: coordinate out of range");
        let stride = self.prods[dim + 1];
        let hi = rest / stride;
        let lo = rest % stride;
        hi * self.prods[dim] + coord * stride + lo
    }

    /// Iterates over all coordinate tuples in index order.
    pub fn iter_coords(&self) -> CoordIter<'_> {
        CoordIter {
            sig: self,
            next: (self.size() > 0).then(|| vec![0; self.num_dims()]),
        }
    }
}

pub struct CoordIter<'a> {
    sig: &'a CubeSignature,
    next: Option<Vec<usize>>,
}

impl Iterator for CoordIter<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut advanced = current.clone();
        if self.sig.increment_coords(&mut advanced) {
            self.next = Some(advanced);
        }
        Some(current)
    }
}

impl fmt::Display for CubeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dims.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", dims.join(" x "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_round_trip_in_index_order() {
        let sig = CubeSignature::new(&[3, 2, 4]);
        assert_eq!(sig.size(), 24);
        for (k, coords) in sig.iter_coords().enumerate() {
            assert_eq!(sig.to_coords(k), coords);
            assert_eq!(sig.from_coords(&coords), k);
        }
        assert_eq!(sig.iter_coords().count(), 24);
    }

    #[test]
    fn increment_stops_at_last_point() {
        let sig = CubeSignature::new(&[2, 3]);
        let mut coords = vec![1, 1];
        assert!(sig.increment_coords(&mut coords));
        assert_eq!(coords, vec![1, 2]);
        assert!(!sig.increment_coords(&mut coords));
        assert_eq!(coords, vec![1, 2]);
    }

    #[test]
    fn add_coord_wraps_one_dimension() {
        let sig = CubeSignature::new(&[4, 2]);
        let k = sig.from_coords(&[3, 1]);
        assert_eq!(sig.to_coords(sig.add_coord(0, k, 1)), vec![0, 1]);
        assert_eq!(sig.to_coords(sig.add_coord(0, k, -5)), vec![2, 1]);
        assert_eq!(sig.to_coords(sig.add_coord(1, k, 1)), vec![3, 0]);
    }

    #[test]
    fn break_and_assemble_are_inverse() {
        let sig = CubeSignature::new(&[3, 4, 2]);
        for dim in 0..sig.num_dims() {
            for idx in 0..sig.size() {
                let (rest, coord) = sig.break_index_by_dim(idx, dim);
                assert!(rest < sig.size() / sig.dim(dim));
                assert_eq!(coord, sig.coord(idx, dim));
                assert_eq!(sig.assemble_index_by_dim((rest, coord), dim), idx);
            }
        }
    }

    #[test]
    fn empty_signature_has_one_point() {
        let sig = CubeSignature::new(&[]);
        assert_eq!(sig.size(), 1);
        assert_eq!(sig.iter_coords().count(), 1);
        assert_eq!(sig.from_coords(&[]), 0);
        assert_eq!(sig.to_string(), "[]");
    }
}
