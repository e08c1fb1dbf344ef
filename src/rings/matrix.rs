use core::fmt;

use crate::math::{add_mod, mod_inverse, mul_mod, sub_mod};

/// A dense row-major matrix over `Z/qZ`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZqMatrix {
    rows: usize,
    cols: usize,
    data: Vec<u64>,
    modulus: u64,
}

impl ZqMatrix {
    pub fn zero(rows: usize, cols: usize, modulus: u64) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
            modulus,
        }
    }

    pub fn identity(n: usize, modulus: u64) -> Self {
        let mut id = Self::zero(n, n, modulus);
        for i in 0..n {
            id.set(i, i, 1);
        }
        id
    }

    /// Builds a matrix whose `j`-th column is `columns[j]`, zero-padded to
    /// `rows` entries.
    pub fn from_columns(rows: usize, columns: &[Vec<u64>], modulus: u64) -> Self {
        let mut mat = Self::zero(rows, columns.len(), modulus);
        for (j, col) in columns.iter().enumerate() {
            assert!(col.len() <= rows, "from_columns: column {j} is too long");
            for (i, &v) in col.iter().enumerate() {
                mat.set(i, j, v);
            }
        }
        mat
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: u64) {
        self.data[i * self.cols + j] = value % self.modulus;
    }

    pub fn mul_vec(&self, v: &[u64]) -> Vec<u64> {
        assert_eq!(v.len(), self.cols, "mul_vec: dimension mismatch");
        let q = self.modulus;
        (0..self.rows)
            .map(|i| {
                v.iter()
                    .enumerate()
                    .fold(0, |acc, (j, &x)| add_mod(acc, mul_mod(self.get(i, j), x, q), q))
            })
            .collect()
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }

    /// A left inverse `L` (`cols x rows`) with `L * self = I`, for a matrix
    /// of full column rank modulo the prime `p` underlying `q = p^r`.
    ///
    /// Gauss-Jordan on `[self | I]` with unit pivots; the transform applied to
    /// the identity block maps `self` onto `[I; 0]`, so its first `cols` rows
    /// form a left inverse. `None` when some column has no unit pivot.
    pub fn left_inverse(&self, p: u64) -> Option<Self> {
        let q = self.modulus;
        let (n, k) = (self.rows, self.cols);
        if k > n {
            return None;
        }
        let mut a = self.clone();
        let mut e = Self::identity(n, q);

        for col in 0..k {
            let pivot = (col..n).find(|&r| a.get(r, col) % p != 0)?;
            a.swap_rows(col, pivot);
            e.swap_rows(col, pivot);

            let inv = mod_inverse(a.get(col, col), q)?;
            for j in 0..k {
                a.set(col, j, mul_mod(a.get(col, j), inv, q));
            }
            for j in 0..n {
                e.set(col, j, mul_mod(e.get(col, j), inv, q));
            }

            for r in 0..n {
                let factor = a.get(r, col);
                if r == col || factor == 0 {
                    continue;
                }
                for j in 0..k {
                    let v = sub_mod(a.get(r, j), mul_mod(factor, a.get(col, j), q), q);
                    a.set(r, j, v);
                }
                for j in 0..n {
                    let v = sub_mod(e.get(r, j), mul_mod(factor, e.get(col, j), q), q);
                    e.set(r, j, v);
                }
            }
        }

        let mut inv = Self::zero(k, n, q);
        for i in 0..k {
            for j in 0..n {
                inv.set(i, j, e.get(i, j));
            }
        }
        Some(inv)
    }
}

impl fmt::Display for ZqMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let row: Vec<String> = (0..self.cols).map(|j| self.get(i, j).to_string()).collect();
            writeln!(f, "[{}]", row.join(" "))?;
        }
        Ok(())
    }
}
