use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, instrument};

use super::crt_tree::CrtTree;
use super::mapping::{MappingData, build_mapping, validate_g};
use super::CoderTag;
use crate::algebra::IndexAlgebra;
use crate::errors::{AlgebraError, AlgebraResult};
use crate::math::gcd;
use crate::rings::cyclotomic::IntPoly;
use crate::rings::extension::ExtRing;
use crate::rings::factor::hensel_lift_all;
use crate::rings::poly::ModPoly;

/// Largest supported `p^r`.
const MAX_P_POW_R: u64 = 1 << 62;

/// The plaintext ring `(Z/p^rZ)[X] / Phi_m(X)` split into its slots.
///
/// Slot `i` is `(Z/p^rZ)[X] / F_i(X)`, where `F_i` is the factor belonging to
/// the representative `T[i]`. The coder converts between ring elements and
/// slot vectors, and caches one [`MappingData`] per extension polynomial.
#[derive(Debug)]
pub struct ResidueCoder {
    zm_star: Arc<IndexAlgebra>,
    r: u32,
    p_pow_r: u64,
    phim_x_mod: ModPoly,
    factors: Vec<ModPoly>,
    factors_over_zz: Vec<IntPoly>,
    crt_coeffs: Vec<ModPoly>,
    crt_tree: CrtTree,
    mask_table: Vec<Vec<ModPoly>>,
    mappings: Mutex<HashMap<ModPoly, Arc<MappingData>>>,
}

impl ResidueCoder {
    #[instrument(skip(zm_star), fields(m = zm_star.m(), p = zm_star.p()))]
    pub fn new(zm_star: Arc<IndexAlgebra>, r: u32) -> AlgebraResult<Self> {
        if zm_star.is_complex() {
            return Err(AlgebraError::UnsupportedOperation {
                operation: "residue coding",
                tag: CoderTag::Complex,
            });
        }
        let p = zm_star.p();
        let p_pow_r = (r >= 1)
            .then(|| p.checked_pow(r))
            .flatten()
            .filter(|&q| q < MAX_P_POW_R)
            .ok_or(AlgebraError::InvalidExponent { p, r })?;

        let phim_x_mod = zm_star.phim_x().to_mod(p_pow_r);
        let factors = hensel_lift_all(&phim_x_mod, zm_star.frobenius_factors(), p, r)?;
        let factors_over_zz: Vec<IntPoly> = factors
            .iter()
            .map(|f| IntPoly::new(f.balanced()))
            .collect();

        let mut crt_coeffs = Vec::with_capacity(factors.len());
        for (slot, f) in factors.iter().enumerate() {
            let cofactor = phim_x_mod
                .exact_div(f)
                .ok_or(AlgebraError::NonInvertibleCrt { slot })?;
            let coeff = cofactor
                .rem(f)
                .inverse_mod(f, p)
                .ok_or(AlgebraError::NonInvertibleCrt { slot })?;
            crt_coeffs.push(coeff);
        }
        debug!(slots = factors.len(), "crt coefficients ready");

        let crt_tree = CrtTree::new(&factors);
        let mut coder = Self {
            zm_star,
            r,
            p_pow_r,
            phim_x_mod,
            factors,
            factors_over_zz,
            crt_coeffs,
            crt_tree,
            mask_table: Vec::new(),
            mappings: Mutex::new(HashMap::new()),
        };
        coder.mask_table = coder.build_masks()?;
        debug!(dims = coder.mask_table.len(), "mask table ready");

        info!(
            m = coder.zm_star.m(),
            p,
            r,
            n_slots = coder.n_slots(),
            ord_p = coder.zm_star.ord_p(),
            "residue coder ready"
        );
        Ok(coder)
    }

    fn build_masks(&self) -> AlgebraResult<Vec<Vec<ModPoly>>> {
        let q = self.p_pow_r;
        let zms = &self.zm_star;
        (0..zms.num_gens())
            .map(|i| {
                (0..=zms.order_of(i))
                    .map(|j| {
                        let slots: Vec<ModPoly> = (0..zms.n_slots())
                            .map(|idx| {
                                let bit = u64::from(zms.coordinate(i, idx) >= j);
                                ModPoly::constant(bit, q)
                            })
                            .collect();
                        self.crt_reconstruct(&slots)
                    })
                    .collect::<AlgebraResult<Vec<_>>>()
            })
            .collect()
    }

    pub fn zm_star(&self) -> &Arc<IndexAlgebra> {
        &self.zm_star
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p_pow_r(&self) -> u64 {
        self.p_pow_r
    }

    pub fn n_slots(&self) -> usize {
        self.zm_star.n_slots()
    }

    pub fn tag(&self) -> CoderTag {
        if self.zm_star.p() == 2 && self.r == 1 {
            CoderTag::Gf2
        } else {
            CoderTag::Zzp
        }
    }

    pub fn phim_x_mod(&self) -> &ModPoly {
        &self.phim_x_mod
    }

    /// `F_i mod p^r`, in representative order.
    pub fn factors(&self) -> &[ModPoly] {
        &self.factors
    }

    /// The factors with balanced integer coefficients.
    pub fn factors_over_zz(&self) -> &[IntPoly] {
        &self.factors_over_zz
    }

    pub fn crt_coeffs(&self) -> &[ModPoly] {
        &self.crt_coeffs
    }

    /// The element that is one in every slot whose coordinate along dimension
    /// `i` is at least `j`, and zero elsewhere.
    pub fn mask(&self, i: usize, j: usize) -> Option<&ModPoly> {
        self.mask_table.get(i)?.get(j)
    }

    pub fn mask_table(&self) -> &[Vec<ModPoly>] {
        &self.mask_table
    }

    pub fn mask_zzx(&self, i: usize, j: usize) -> Option<Vec<i64>> {
        self.mask(i, j).map(ModPoly::balanced)
    }

    fn check_modulus(&self, h: &ModPoly) -> AlgebraResult<()> {
        if h.modulus() == self.p_pow_r {
            Ok(())
        } else {
            Err(AlgebraError::ModulusMismatch {
                expected: self.p_pow_r,
                actual: h.modulus(),
            })
        }
    }

    /// `h mod F_i` for every slot.
    pub fn crt_decompose(&self, h: &ModPoly) -> AlgebraResult<Vec<ModPoly>> {
        self.check_modulus(h)?;
        Ok(self.crt_tree.reduce(h))
    }

    /// The element of degree below `phi(m)` with the given slot residues.
    pub fn crt_reconstruct(&self, slots: &[ModPoly]) -> AlgebraResult<ModPoly> {
        if slots.len() != self.n_slots() {
            return Err(AlgebraError::SlotCountMismatch {
                expected: self.n_slots(),
                actual: slots.len(),
            });
        }
        let mut leaves = Vec::with_capacity(slots.len());
        for ((s, f), c) in slots.iter().zip(&self.factors).zip(&self.crt_coeffs) {
            self.check_modulus(s)?;
            leaves.push(s.mul_mod(c, f));
        }
        Ok(self.crt_tree.evaluate(&leaves))
    }

    /// Slot maps for `G`, built on first request and cached.
    ///
    /// `G` must be monic mod `p^r`, irreducible mod `p`, and of degree dividing
    /// `ord(p)`. For `r > 1` it must also have degree one or be the factor of
    /// the first slot.
    #[instrument(skip(self, g), fields(deg = ?g.degree()))]
    pub fn map_to_slots(&self, g: &ModPoly) -> AlgebraResult<Arc<MappingData>> {
        let cached = self
            .mappings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(g)
            .cloned();
        if let Some(md) = cached {
            return Ok(md);
        }

        let deg = validate_g(
            g,
            self.p_pow_r,
            self.zm_star.p(),
            self.r,
            self.zm_star.ord_p(),
            &self.factors[0],
        )?;
        let built = Arc::new(build_mapping(
            g,
            deg,
            self.zm_star.p(),
            &self.factors,
            self.zm_star.reps(),
        )?);
        debug!(deg, "slot mapping built");

        let mut mappings = self.mappings.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(mappings.entry(g.clone()).or_insert(built).clone())
    }

    fn check_mapping(&self, md: &MappingData) -> AlgebraResult<()> {
        self.check_modulus(md.g())?;
        if !md.is_trivial() && md.maps().len() != self.n_slots() {
            return Err(AlgebraError::SlotCountMismatch {
                expected: self.n_slots(),
                actual: md.maps().len(),
            });
        }
        Ok(())
    }

    /// The element whose slot `i` holds `alphas[i] in R[X]/G`.
    pub fn embed_in_slots(&self, alphas: &[ModPoly], md: &MappingData) -> AlgebraResult<ModPoly> {
        self.check_mapping(md)?;
        if alphas.len() != self.n_slots() {
            return Err(AlgebraError::SlotCountMismatch {
                expected: self.n_slots(),
                actual: alphas.len(),
            });
        }
        let mut slots = Vec::with_capacity(alphas.len());
        for (i, alpha) in alphas.iter().enumerate() {
            self.check_modulus(alpha)?;
            slots.push(md.embed(i, alpha));
        }
        self.crt_reconstruct(&slots)
    }

    pub fn embed_in_all_slots(&self, alpha: &ModPoly, md: &MappingData) -> AlgebraResult<ModPoly> {
        self.embed_in_slots(&vec![alpha.clone(); self.n_slots()], md)
    }

    /// The slot values of `h`, each as an element of `R[X]/G`.
    pub fn decode_plaintext(&self, h: &ModPoly, md: &MappingData) -> AlgebraResult<Vec<ModPoly>> {
        self.check_mapping(md)?;
        let residues = self.crt_decompose(h)?;
        Ok(residues
            .iter()
            .enumerate()
            .map(|(i, v)| md.decode(i, v))
            .collect())
    }

    /// Coefficients `C` with `M(h) = sum_j C[j] * h(X^(p^j)) mod G`, where the
    /// linear map `M` on `R[X]/G` is given by `L[j] = M(X^j mod G)`.
    pub fn build_lin_poly_coeffs(
        &self,
        l: &[ModPoly],
        md: &MappingData,
    ) -> AlgebraResult<Vec<ModPoly>> {
        self.check_modulus(md.g())?;
        let d = md.deg_g();
        if l.len() != d {
            return Err(AlgebraError::SlotCountMismatch {
                expected: d,
                actual: l.len(),
            });
        }
        for entry in l {
            self.check_modulus(entry)?;
        }

        let ext = ExtRing::new(md.g().clone(), self.zm_star.p());
        let rhs: Vec<ModPoly> = l.iter().map(|entry| ext.reduce(entry)).collect();
        if d == 1 {
            return Ok(rhs);
        }

        // Row i, column j: (X^(p^j))^i.
        let mut frob_x = Vec::with_capacity(d);
        let mut y = ext.reduce(&ModPoly::x(self.p_pow_r));
        for _ in 0..d {
            let next = ext.frobenius(&y);
            frob_x.push(std::mem::replace(&mut y, next));
        }
        let mut matrix = Vec::with_capacity(d);
        let mut row = vec![ext.one(); d];
        for _ in 0..d {
            let next = row.iter().zip(&frob_x).map(|(a, y)| ext.mul(a, y)).collect();
            matrix.push(std::mem::replace(&mut row, next));
        }

        ext.solve_linear(&matrix, &rhs)
            .ok_or_else(|| AlgebraError::InvalidMapping {
                reason: "Frobenius Vandermonde system is singular".to_string(),
            })
    }

    /// `h(X^k) mod Phi_m` for a unit `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k` is not coprime to `m`.
    pub fn apply_automorphism(&self, h: &ModPoly, k: u64) -> AlgebraResult<ModPoly> {
        self.check_modulus(h)?;
        let m = self.zm_star.m();
        assert_eq!(gcd(k % m, m), 1, "apply_automorphism: {k} is not a unit mod {m}");
        let q = self.p_pow_r;
        let mut out = vec![0u64; m as usize];
        for (i, &c) in h.coeffs().iter().enumerate() {
            let slot = &mut out[((i as u64 * (k % m)) % m) as usize];
            *slot = (*slot + c) % q;
        }
        Ok(ModPoly::from_coeffs(&out, q).rem(&self.phim_x_mod))
    }

    /// Applies `X -> X^(p^j)`; negative `j` counts backwards.
    pub fn frobenius(&self, h: &ModPoly, j: i64) -> AlgebraResult<ModPoly> {
        self.apply_automorphism(h, self.zm_star.frobenius_pow(j))
    }

    /// Rotates the slots of `h` by `k` along dimension `i`: the slot with
    /// coordinate `c` receives the value at coordinate `c - k`.
    ///
    /// Native dimensions need one automorphism. Otherwise the slots that wrap
    /// around are taken from a second automorphism and merged in with
    /// `mask(i, k)`.
    pub fn rotate_1d(&self, h: &ModPoly, i: usize, k: i64) -> AlgebraResult<ModPoly> {
        self.check_modulus(h)?;
        let zms = &self.zm_star;
        let ord = zms.order_of(i) as i64;
        let k = k.rem_euclid(ord);
        if k == 0 {
            return Ok(h.rem(&self.phim_x_mod));
        }

        let forward = self.apply_automorphism(h, zms.gen_to_pow(i, k))?;
        if zms.same_ord(i) {
            return Ok(forward);
        }
        let wrapped = self.apply_automorphism(h, zms.gen_to_pow(i, k - ord))?;
        let mask = &self.mask_table[i][k as usize];
        let keep = forward.mul_mod(mask, &self.phim_x_mod);
        let fill = (&wrapped - &wrapped.mul_mod(mask, &self.phim_x_mod)).rem(&self.phim_x_mod);
        Ok(&keep + &fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::IndexAlgebraBuilder;

    fn coder(m: u64, p: u64, r: u32) -> ResidueCoder {
        let alg = IndexAlgebraBuilder::new(m).prime(p).build().unwrap();
        ResidueCoder::new(alg, r).unwrap()
    }

    #[test]
    fn rejects_oversized_exponent() {
        let alg = IndexAlgebraBuilder::new(15).prime(2).build().unwrap();
        assert!(matches!(
            ResidueCoder::new(alg.clone(), 0),
            Err(AlgebraError::InvalidExponent { p: 2, r: 0 })
        ));
        assert!(matches!(
            ResidueCoder::new(alg, 62),
            Err(AlgebraError::InvalidExponent { p: 2, r: 62 })
        ));
    }

    #[test]
    fn crt_coefficients_invert_cofactors() {
        let coder = coder(15, 2, 1);
        for (f, c) in coder.factors().iter().zip(coder.crt_coeffs()) {
            let cofactor = coder.phim_x_mod().exact_div(f).unwrap();
            assert!(cofactor.mul_mod(c, f).is_one());
        }
    }

    #[test]
    fn lifted_factors_multiply_to_phi() {
        let coder = coder(15, 2, 3);
        assert_eq!(coder.p_pow_r(), 8);
        assert_eq!(coder.tag(), CoderTag::Zzp);
        let product = coder
            .factors()
            .iter()
            .fold(ModPoly::one(8), |acc, f| &acc * f);
        assert_eq!(&product, coder.phim_x_mod());
    }

    #[test]
    fn identity_automorphism_reduces_mod_phi() {
        let coder = coder(15, 2, 1);
        let h = ModPoly::monomial(1, 9, 2);
        let reduced = h.rem(coder.phim_x_mod());
        assert_eq!(coder.apply_automorphism(&h, 1).unwrap(), reduced);
        assert_eq!(coder.frobenius(&h, 0).unwrap(), reduced);
    }

    #[test]
    fn mapping_is_cached() {
        let coder = coder(15, 2, 1);
        let g = coder.factors()[0].clone();
        let a = coder.map_to_slots(&g).unwrap();
        let b = coder.map_to_slots(&g).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
