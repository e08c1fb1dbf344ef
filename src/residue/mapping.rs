//! Identification of each slot ring `R[X]/F_t` with a common extension
//! `R[X]/G`.
//!
//! A root `w_1` of `G` in `R[X]/F_1` embeds `R[X]/G` into the first slot:
//! `alpha(X) -> alpha(w_1)`. The other slots are reached through the
//! Frobenius relation between the factors, `w_t = w_1(X^t) mod F_t`. In
//! coordinates each embedding is a `ordP x deg(G)` matrix whose columns are
//! the powers of `w_t`; decoding applies a left inverse of that matrix.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::errors::{AlgebraError, AlgebraResult};
use crate::rings::extension::ExtRing;
use crate::rings::matrix::ZqMatrix;
use crate::rings::poly::ModPoly;

/// The slot maps for one extension polynomial `G`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingData {
    g: ModPoly,
    deg_g: usize,
    /// `w_t` in `R[X]/F_t`, per slot. Empty when `deg(G) = 1`.
    maps: Vec<ModPoly>,
    /// Columns are `w_t^j mod F_t` for `j < deg(G)`.
    matrix_maps: Vec<ZqMatrix>,
    /// Left inverses of `matrix_maps`.
    rmaps: Vec<ZqMatrix>,
}

impl MappingData {
    pub fn g(&self) -> &ModPoly {
        &self.g
    }

    pub fn deg_g(&self) -> usize {
        self.deg_g
    }

    pub fn maps(&self) -> &[ModPoly] {
        &self.maps
    }

    /// Slot values are plain constants.
    pub fn is_trivial(&self) -> bool {
        self.deg_g == 1
    }

    /// Image of `alpha in R[X]/G` in slot `i`.
    pub(crate) fn embed(&self, i: usize, alpha: &ModPoly) -> ModPoly {
        let q = self.g.modulus();
        let alpha = alpha.rem(&self.g);
        if self.is_trivial() {
            return ModPoly::constant(alpha.coeff(0), q);
        }
        let image = self.matrix_maps[i].mul_vec(&alpha.padded_coeffs(self.deg_g));
        ModPoly::from_coeffs(&image, q)
    }

    /// Preimage in `R[X]/G` of the slot residue `value` (reduced mod `F_i`).
    pub(crate) fn decode(&self, i: usize, value: &ModPoly) -> ModPoly {
        let q = self.g.modulus();
        if self.is_trivial() {
            return ModPoly::constant(value.coeff(0), q);
        }
        let rmap = &self.rmaps[i];
        let alpha = rmap.mul_vec(&value.padded_coeffs(rmap.cols()));
        ModPoly::from_coeffs(&alpha, q)
    }
}

fn invalid(reason: impl Into<String>) -> AlgebraError {
    AlgebraError::InvalidMapping {
        reason: reason.into(),
    }
}

/// Checks `G` against the coder's modulus and degree constraints.
pub(crate) fn validate_g(
    g: &ModPoly,
    q: u64,
    p: u64,
    r: u32,
    ord_p: u64,
    base_factor: &ModPoly,
) -> AlgebraResult<usize> {
    if g.modulus() != q {
        return Err(AlgebraError::ModulusMismatch {
            expected: q,
            actual: g.modulus(),
        });
    }
    if !g.is_monic() {
        return Err(invalid("G must be monic"));
    }
    let deg = match g.degree() {
        Some(d) if d >= 1 => d,
        _ => return Err(invalid("G must have positive degree")),
    };
    if ord_p % deg as u64 != 0 {
        return Err(invalid(format!(
            "deg(G) = {deg} does not divide ord(p) = {ord_p}"
        )));
    }
    if !g.to_modulus(p).is_irreducible() {
        return Err(invalid("G is not irreducible mod p"));
    }
    if r > 1 && deg != 1 && g != base_factor {
        return Err(invalid(
            "for r > 1, G must have degree 1 or equal the first slot factor",
        ));
    }
    Ok(deg)
}

/// Builds the slot maps for `G`. `factors[i]` is the factor of slot `i`,
/// `reps[i]` its representative; `deg` is the validated degree of `G`.
pub(crate) fn build_mapping(
    g: &ModPoly,
    deg: usize,
    p: u64,
    factors: &[ModPoly],
    reps: &[u64],
) -> AlgebraResult<MappingData> {
    if deg == 1 {
        return Ok(MappingData {
            g: g.clone(),
            deg_g: 1,
            maps: Vec::new(),
            matrix_maps: Vec::new(),
            rmaps: Vec::new(),
        });
    }

    let q = g.modulus();
    let f1 = &factors[0];
    let w1 = if g == f1 {
        ModPoly::x(q)
    } else {
        // Only reachable with r = 1.
        let field = ExtRing::new(f1.clone(), p);
        let mut rng = ChaCha8Rng::seed_from_u64(g.coeffs().iter().fold(q, |acc, &c| {
            acc.wrapping_mul(0x100_0000_01b3) ^ c
        }));
        field
            .find_root(g, &mut rng)
            .ok_or_else(|| invalid("no root of G found in the first slot"))?
    };

    let d = f1.degree().unwrap_or(0);
    let mut maps = Vec::with_capacity(factors.len());
    let mut matrix_maps = Vec::with_capacity(factors.len());
    let mut rmaps = Vec::with_capacity(factors.len());
    for (i, (ft, &t)) in factors.iter().zip(reps).enumerate() {
        let xt = ModPoly::monomial(1, t as usize, q).rem(ft);
        let wt = w1.compose_mod(&xt, ft);

        let mut columns = Vec::with_capacity(deg);
        let mut power = ModPoly::one(q);
        for _ in 0..deg {
            columns.push(power.padded_coeffs(d));
            power = power.mul_mod(&wt, ft);
        }
        let matrix = ZqMatrix::from_columns(d, &columns, q);
        let rmap = matrix
            .left_inverse(p)
            .ok_or_else(|| invalid(format!("slot map {i} is not injective")))?;

        maps.push(wt);
        matrix_maps.push(matrix);
        rmaps.push(rmap);
    }

    Ok(MappingData {
        g: g.clone(),
        deg_g: deg,
        maps,
        matrix_maps,
        rmaps,
    })
}
