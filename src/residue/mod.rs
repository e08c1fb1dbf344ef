//! Plaintext algebras: the index algebra paired with a coefficient modulus.

pub mod coder;
pub mod complex;
pub mod crt_tree;
pub mod mapping;

use std::sync::Arc;

pub use coder::ResidueCoder;
pub use complex::ComplexCoder;
pub use crt_tree::CrtTree;
pub use mapping::MappingData;

use crate::algebra::IndexAlgebra;
use crate::errors::{AlgebraError, AlgebraResult};
use crate::rings::cyclotomic::IntPoly;

/// Coefficient representation of a plaintext algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoderTag {
    /// `p = 2`, `r = 1`.
    Gf2,
    /// `Z/p^rZ` for any other prime power.
    Zzp,
    /// Approximate complex numbers.
    Complex,
}

/// The plaintext algebra of one context, fixed at construction.
#[derive(Debug, Clone)]
pub enum PlaintextAlgebra {
    Gf2(Arc<ResidueCoder>),
    Zzp(Arc<ResidueCoder>),
    Complex(ComplexCoder),
}

impl PlaintextAlgebra {
    /// Picks the representation from the algebra and `r`: complex algebras get
    /// a [`ComplexCoder`] with `r` bits of precision, everything else a
    /// [`ResidueCoder`] modulo `p^r`.
    pub fn new(zm_star: Arc<IndexAlgebra>, r: u32) -> AlgebraResult<Self> {
        if zm_star.is_complex() {
            return Ok(Self::Complex(ComplexCoder::new(zm_star, r)?));
        }
        let coder = Arc::new(ResidueCoder::new(zm_star, r)?);
        Ok(match coder.tag() {
            CoderTag::Gf2 => Self::Gf2(coder),
            _ => Self::Zzp(coder),
        })
    }

    pub fn tag(&self) -> CoderTag {
        match self {
            Self::Gf2(_) => CoderTag::Gf2,
            Self::Zzp(_) => CoderTag::Zzp,
            Self::Complex(_) => CoderTag::Complex,
        }
    }

    pub fn zm_star(&self) -> &Arc<IndexAlgebra> {
        match self {
            Self::Gf2(c) | Self::Zzp(c) => c.zm_star(),
            Self::Complex(c) => c.zm_star(),
        }
    }

    pub fn r(&self) -> u32 {
        match self {
            Self::Gf2(c) | Self::Zzp(c) => c.r(),
            Self::Complex(c) => c.r(),
        }
    }

    pub fn p_pow_r(&self) -> u64 {
        match self {
            Self::Gf2(c) | Self::Zzp(c) => c.p_pow_r(),
            Self::Complex(c) => c.p_pow_r(),
        }
    }

    pub fn n_slots(&self) -> usize {
        self.zm_star().n_slots()
    }

    pub fn factors_over_zz(&self) -> AlgebraResult<&[IntPoly]> {
        Ok(self.as_residue("factors_over_zz")?.factors_over_zz())
    }

    /// Balanced coefficients of `mask(i, j)`; `None` when out of range.
    pub fn mask_zzx(&self, i: usize, j: usize) -> AlgebraResult<Option<Vec<i64>>> {
        Ok(self.as_residue("mask_zzx")?.mask_zzx(i, j))
    }

    pub fn as_residue(&self, operation: &'static str) -> AlgebraResult<&ResidueCoder> {
        match self {
            Self::Gf2(c) | Self::Zzp(c) => Ok(c),
            Self::Complex(_) => Err(AlgebraError::UnsupportedOperation {
                operation,
                tag: CoderTag::Complex,
            }),
        }
    }

    pub fn as_complex(&self) -> AlgebraResult<&ComplexCoder> {
        match self {
            Self::Complex(c) => Ok(c),
            other => Err(AlgebraError::UnsupportedOperation {
                operation: "as_complex",
                tag: other.tag(),
            }),
        }
    }
}

impl PartialEq for PlaintextAlgebra {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag() && self.r() == other.r() && self.zm_star() == other.zm_star()
    }
}

impl Eq for PlaintextAlgebra {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::AlgebraParams;

    #[test]
    fn tag_follows_prime_and_exponent() {
        let gf2 = AlgebraParams::new(15, 2, 1).plaintext_algebra().unwrap();
        assert_eq!(gf2.tag(), CoderTag::Gf2);
        let zzp = AlgebraParams::new(15, 2, 2).plaintext_algebra().unwrap();
        assert_eq!(zzp.tag(), CoderTag::Zzp);
        assert_eq!(zzp.p_pow_r(), 4);
        assert_ne!(gf2, zzp);
    }

    #[test]
    fn complex_rejects_residue_queries() {
        let mut params = AlgebraParams::new(16, 0, 30);
        params.complex = true;
        let alg = params.plaintext_algebra().unwrap();
        assert_eq!(alg.tag(), CoderTag::Complex);
        assert!(matches!(
            alg.mask_zzx(0, 0),
            Err(AlgebraError::UnsupportedOperation {
                operation: "mask_zzx",
                tag: CoderTag::Complex
            })
        ));
        assert!(alg.as_complex().is_ok());
    }

    #[test]
    fn residue_rejects_complex_downcast() {
        let alg = AlgebraParams::new(15, 2, 1).plaintext_algebra().unwrap();
        assert!(matches!(
            alg.as_complex(),
            Err(AlgebraError::UnsupportedOperation { tag: CoderTag::Gf2, .. })
        ));
        let masks = alg.mask_zzx(0, 0).unwrap().unwrap();
        // Threshold zero selects every slot.
        assert_eq!(masks, vec![1]);
    }
}
