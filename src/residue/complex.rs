use std::sync::Arc;

use num_complex::Complex64;

use crate::algebra::IndexAlgebra;
use crate::errors::{AlgebraError, AlgebraResult};

/// Largest supported precision, in bits.
const MAX_PRECISION_BITS: u32 = 62;

/// Coder for approximate numbers: slots are the canonical embedding, paired
/// up by complex conjugation. `r` is the precision in bits.
#[derive(Debug, Clone)]
pub struct ComplexCoder {
    zm_star: Arc<IndexAlgebra>,
    r: u32,
}

impl ComplexCoder {
    pub fn new(zm_star: Arc<IndexAlgebra>, r: u32) -> AlgebraResult<Self> {
        if r > MAX_PRECISION_BITS {
            return Err(AlgebraError::InvalidExponent { p: 2, r });
        }
        Ok(Self { zm_star, r })
    }

    pub fn zm_star(&self) -> &Arc<IndexAlgebra> {
        &self.zm_star
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p_pow_r(&self) -> u64 {
        1 << self.r
    }

    pub fn n_slots(&self) -> usize {
        self.zm_star.n_slots()
    }

    /// `a(zeta^j)` for every `j` in `(Z/mZ)^*`, in increasing order.
    pub fn canonical_embedding(&self, coeffs: &[f64]) -> Vec<Complex64> {
        self.zm_star.spectral().canonical_embedding(coeffs)
    }
}
