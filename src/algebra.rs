//! The structure of `(Z/mZ)^*` relative to the subgroup generated by `p`.
//!
//! The quotient `(Z/mZ)^* / <p>` is written as a direct product of cyclic
//! groups `<g_0> x ... x <g_{n-1}>`, and every slot is labelled by the
//! representative `T[idx] = prod_i g_i^{coord_i(idx)} mod m` of its coset.
//! A generator is *native* when its order in the quotient equals its order
//! in `(Z/mZ)^*`; otherwise `g_i^{ord_i} = p^j` for a nonzero `j`, its
//! Frobenius perturbation.
//!
//! Derived generators are chosen greedily: each round takes a candidate of
//! maximal order modulo the subgroup spanned so far, then divides out the
//! earlier generators from its power so that `g_i^{ord_i}` lands in `<p>`.
//! Candidates are the CRT lifts of the generators of each prime-power
//! component of `m`, followed by every unit in increasing order.

use core::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::encoding::spectral::{SpectralTables, fft_size_needed};
use crate::errors::{AlgebraError, AlgebraResult};
use crate::hypercube::CubeSignature;
use crate::math::utils::crt_lift_component;
use crate::math::{
    euler_phi, factorize, gcd, is_prime, mod_inverse, mod_pow, mul_mod, multiplicative_order,
    primitive_root_mod_prime_power,
};
use crate::residue::PlaintextAlgebra;
use crate::rings::cyclotomic::{IntPoly, cyclotomic};
use crate::rings::factor::{find_factor, frobenius_orbit_factors};
use crate::rings::poly::ModPoly;

/// Largest supported ring modulus; the index tables are dense in `[0, m)`.
pub const MAX_M: u64 = 1 << 20;

/// A subgroup of `(Z/mZ)^*` with every member's exponent vector relative to
/// its generators, stored as a little-endian mixed-radix index.
struct Subgroup {
    m: u64,
    generators: Vec<u64>,
    radices: Vec<usize>,
    elements: Vec<u64>,
    index: Vec<Option<u32>>,
}

impl Subgroup {
    fn cyclic(g: u64, m: u64) -> Self {
        let mut sub = Self {
            m,
            generators: Vec::new(),
            radices: Vec::new(),
            elements: vec![1 % m],
            index: vec![None; m as usize],
        };
        sub.index[(1 % m) as usize] = Some(0);
        let order = multiplicative_order(g, m).unwrap_or(1) as usize;
        sub.extend(g % m, order);
        sub
    }

    fn order(&self) -> usize {
        self.elements.len()
    }

    fn contains(&self, x: u64) -> bool {
        self.index[(x % self.m) as usize].is_some()
    }

    /// Smallest `k >= 1` with `g^k` in the subgroup.
    fn quotient_order(&self, g: u64) -> usize {
        let g = g % self.m;
        let mut x = g;
        let mut k = 1;
        while !self.contains(x) {
            x = mul_mod(x, g, self.m);
            k += 1;
        }
        k
    }

    /// Exponents of `x` with respect to the generators, if `x` is a member.
    fn exponents(&self, x: u64) -> Option<Vec<usize>> {
        let mut idx = self.index[(x % self.m) as usize]? as usize;
        Some(
            self.radices
                .iter()
                .map(|&r| {
                    let e = idx % r;
                    idx /= r;
                    e
                })
                .collect(),
        )
    }

    /// Adjoins `g`, whose quotient order is `k`.
    fn extend(&mut self, g: u64, k: usize) {
        let base = self.order();
        let mut power = 1u64;
        for c in 1..k {
            power = mul_mod(power, g, self.m);
            for i in 0..base {
                let y = mul_mod(self.elements[i], power, self.m);
                self.index[y as usize] = Some((c * base + i) as u32);
                self.elements.push(y);
            }
        }
        self.generators.push(g);
        self.radices.push(k);
    }
}

/// Candidate generators: CRT lifts of generators of each `(Z/q^eZ)^*`.
fn component_generators(m: u64) -> Vec<u64> {
    let mut out = Vec::new();
    for (q, e) in factorize(m) {
        let qe = q.pow(e);
        let local: Vec<u64> = match (q, e) {
            (2, 1) => Vec::new(),
            (2, 2) => vec![3],
            (2, _) => vec![5, qe - 1],
            _ => vec![primitive_root_mod_prime_power(q, e)],
        };
        out.extend(local.into_iter().map(|a| crt_lift_component(a, qe, m)));
    }
    out
}

fn derive_generators(m: u64, p: u64, phi_m: u64) -> (Vec<u64>, Vec<usize>) {
    let mut sub = Subgroup::cyclic(p, m);
    let mut gens = Vec::new();
    let mut ords = Vec::new();
    let components = component_generators(m);

    while (sub.order() as u64) < phi_m {
        let target = phi_m as usize / sub.order();
        let candidates = components
            .iter()
            .copied()
            .chain((2..m).filter(|&u| gcd(u, m) == 1));

        let mut best: Option<(u64, usize)> = None;
        for c in candidates {
            if sub.contains(c) {
                continue;
            }
            let k = sub.quotient_order(c);
            if best.is_none_or(|(_, bk)| k > bk) {
                best = Some((c, k));
                if k == target {
                    break;
                }
            }
        }
        // The loop only runs while units remain outside the subgroup.
        let Some((h, k)) = best else { break };

        // h^k = p^j * prod g_l^{a_l}; with k maximal every a_l is a multiple
        // of k, so dividing out g_l^{a_l / k} pushes h^k into <p>.
        let mut g = h;
        if let Some(exps) = sub.exponents(mod_pow(h, k as u64, m)) {
            for (l, &a) in exps.iter().enumerate().skip(1) {
                if a % k == 0 {
                    let inv = mod_inverse(sub.generators[l], m).unwrap_or(1);
                    g = mul_mod(g, mod_pow(inv, (a / k) as u64, m), m);
                }
            }
            if exps[0] % k == 0 {
                let inv_p = mod_inverse(p, m).unwrap_or(1);
                g = mul_mod(g, mod_pow(inv_p, (exps[0] / k) as u64, m), m);
            }
        }
        debug!(generator = g, order = k, "selected generator");
        sub.extend(g, k);
        gens.push(g);
        ords.push(k);
    }
    (gens, ords)
}

/// Quotient orders of caller-supplied generators, each relative to `p` and
/// the generators before it.
fn quotient_orders(m: u64, p: u64, gens: &[u64]) -> Vec<usize> {
    let mut sub = Subgroup::cyclic(p, m);
    gens.iter()
        .map(|&g| {
            let k = if sub.contains(g) { 1 } else { sub.quotient_order(g) };
            if k > 1 {
                sub.extend(g % m, k);
            }
            k
        })
        .collect()
}

/// Heuristic norm constants: `(normBnd, polyNormBnd, cM)`.
fn norm_bounds(m: u64) -> (f64, f64, f64) {
    let odd: Vec<u64> = factorize(m)
        .into_iter()
        .map(|(q, _)| q)
        .filter(|&q| q != 2)
        .collect();
    let norm_bnd: f64 = odd
        .iter()
        .map(|&q| 2.0 * (q - 1) as f64 / q as f64)
        .product();
    let poly_norm_bnd = if odd.len() >= 2 {
        norm_bnd * (1u64 << (odd.len() - 1)) as f64
    } else {
        norm_bnd
    };
    let c_m = odd
        .iter()
        .map(|&q| (2.0 * (q - 1) as f64 / q as f64).sqrt())
        .product();
    (norm_bnd, poly_norm_bnd, c_m)
}

/// `(Z/mZ)^* / <p>` with its hypercube, representative tables, the
/// cyclotomic polynomial and its factors modulo `p`.
///
/// Cloning is cheap: the polynomial data and spectral tables are shared.
#[derive(Debug, Clone)]
pub struct IndexAlgebra {
    m: u64,
    p: u64,
    complex: bool,
    phi_m: u64,
    ord_p: u64,
    n_factors: usize,
    rad_m: u64,
    pow2: u32,
    norm_bnd: f64,
    poly_norm_bnd: f64,
    c_m: f64,
    gens: Vec<u64>,
    native: Vec<bool>,
    frob_perturb: Vec<Option<u64>>,
    cube: CubeSignature,
    t: Vec<u64>,
    t_idx: Vec<Option<usize>>,
    zms_idx: Vec<Option<usize>>,
    zms_rep: Vec<u64>,
    phim_x: Arc<IntPoly>,
    factors: Arc<Vec<ModPoly>>,
    spectral: Arc<SpectralTables>,
}

pub struct IndexAlgebraBuilder {
    m: u64,
    p: u64,
    gens: Option<Vec<u64>>,
    ords: Option<Vec<usize>>,
    complex: bool,
}

impl IndexAlgebraBuilder {
    pub fn new(m: u64) -> Self {
        Self {
            m,
            p: 2,
            gens: None,
            ords: None,
            complex: false,
        }
    }

    pub fn prime(mut self, p: u64) -> Self {
        self.p = p;
        self
    }

    pub fn generators(mut self, gens: Vec<u64>) -> Self {
        self.gens = Some(gens);
        self
    }

    pub fn orders(mut self, ords: Vec<usize>) -> Self {
        self.ords = Some(ords);
        self
    }

    /// Builds the algebra for approximate numbers: `p = -1 (mod m)`, so the
    /// quotient is taken by complex conjugation and no factor tables exist.
    pub fn complex(mut self) -> Self {
        self.complex = true;
        self
    }

    #[instrument(skip(self), fields(m = self.m, p = self.p, complex = self.complex))]
    pub fn build(self) -> AlgebraResult<Arc<IndexAlgebra>> {
        let m = self.m;
        if !(2..=MAX_M).contains(&m) {
            return Err(AlgebraError::InvalidModulus { m });
        }
        let p = if self.complex { m - 1 } else { self.p };
        if !self.complex {
            if !is_prime(p) {
                return Err(AlgebraError::NotPrime { p });
            }
            if m.is_multiple_of(p) {
                return Err(AlgebraError::PrimeDividesModulus { p, m });
            }
        }

        let factorization = factorize(m);
        let phi_m = euler_phi(&factorization);
        let ord_p = multiplicative_order(p, m).ok_or(AlgebraError::PrimeDividesModulus { p, m })?;
        let n_slots = (phi_m / ord_p) as usize;
        let pow2 = match factorization.as_slice() {
            [(2, e)] => *e,
            _ => 0,
        };

        let (gens, ords) = match (self.gens, self.ords) {
            (None, None) => derive_generators(m, p % m, phi_m),
            (Some(gens), None) => {
                let ords = quotient_orders(m, p % m, &gens);
                (gens, ords)
            }
            (Some(gens), Some(ords)) if gens.len() == ords.len() => (gens, ords),
            (gens, ords) => {
                return Err(AlgebraError::GeneratorOrderMismatch {
                    gens: gens.map_or(0, |g| g.len()),
                    orders: ords.map_or(0, |o| o.len()),
                });
            }
        };
        let gens: Vec<u64> = gens.into_iter().map(|g| g % m).collect();
        debug!(?gens, ?ords, "generators");

        let non_spanning = || AlgebraError::NonSpanningGenerators {
            m,
            p,
            gens: gens.clone(),
        };
        if gens.iter().any(|&g| gcd(g, m) != 1) || ords.contains(&0) {
            return Err(non_spanning());
        }
        let cube = CubeSignature::new(&ords);
        if cube.size() != n_slots {
            return Err(non_spanning());
        }

        // Representatives in hypercube order; their cosets must be distinct.
        let mut t = Vec::with_capacity(n_slots);
        let mut t_idx = vec![None; m as usize];
        let mut coset_seen = vec![false; m as usize];
        for coords in cube.iter_coords() {
            let rep = coords
                .iter()
                .zip(&gens)
                .fold(1 % m, |acc, (&c, &g)| mul_mod(acc, mod_pow(g, c as u64, m), m));
            let mut x = rep;
            for _ in 0..ord_p {
                if coset_seen[x as usize] {
                    return Err(non_spanning());
                }
                coset_seen[x as usize] = true;
                x = mul_mod(x, p % m, m);
            }
            t_idx[rep as usize] = Some(t.len());
            t.push(rep);
        }

        let native: Vec<bool> = gens
            .iter()
            .zip(&ords)
            .map(|(&g, &o)| multiplicative_order(g, m) == Some(o as u64))
            .collect();
        let frob_perturb: Vec<Option<u64>> = gens
            .iter()
            .zip(&ords)
            .map(|(&g, &o)| {
                let target = mod_pow(g, o as u64, m);
                (0..ord_p).find(|&j| mod_pow(p, j, m) == target)
            })
            .collect();
        // Rotations along a dimension need g^ord inside <p>.
        if let Some(i) = frob_perturb.iter().position(Option::is_none) {
            return Err(AlgebraError::InvalidGeneratorOrder {
                m,
                p,
                generator: gens[i],
                order: ords[i],
            });
        }

        let mut zms_idx = vec![None; m as usize];
        let mut zms_rep = Vec::with_capacity(phi_m as usize);
        for u in 1..m {
            if gcd(u, m) == 1 {
                zms_idx[u as usize] = Some(zms_rep.len());
                zms_rep.push(u);
            }
        }

        let phim_x = cyclotomic(m);
        let factors = if self.complex {
            Vec::new()
        } else {
            let phi_p = phim_x.to_mod(p);
            let mut rng = ChaCha8Rng::seed_from_u64(m.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ p);
            let f1 = find_factor(&phi_p, ord_p as usize, &mut rng)?;
            debug!(degree = ord_p, "base factor found");
            frobenius_orbit_factors(&phi_p, &f1, m, &t)
        };

        let (norm_bnd, poly_norm_bnd, c_m) = norm_bounds(m);
        let algebra = IndexAlgebra {
            m,
            p,
            complex: self.complex,
            phi_m,
            ord_p,
            n_factors: factorization.len(),
            rad_m: factorization.iter().map(|&(q, _)| q).product(),
            pow2,
            norm_bnd,
            poly_norm_bnd,
            c_m,
            gens,
            native,
            frob_perturb,
            cube,
            t,
            t_idx,
            zms_idx,
            zms_rep,
            phim_x: Arc::new(phim_x),
            factors: Arc::new(factors),
            spectral: Arc::new(SpectralTables::new(m as usize)),
        };
        info!(
            m,
            p,
            phi_m,
            ord_p,
            n_slots,
            dims = %algebra.cube,
            "index algebra ready"
        );
        Ok(Arc::new(algebra))
    }
}

impl IndexAlgebra {
    pub fn builder(m: u64) -> IndexAlgebraBuilder {
        IndexAlgebraBuilder::new(m)
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    /// The plaintext prime, or `m - 1` for the complex algebra.
    pub fn p(&self) -> u64 {
        self.p
    }

    pub fn is_complex(&self) -> bool {
        self.complex
    }

    pub fn phi_m(&self) -> u64 {
        self.phi_m
    }

    pub fn ord_p(&self) -> u64 {
        self.ord_p
    }

    pub fn n_slots(&self) -> usize {
        self.cube.size()
    }

    /// Number of distinct primes dividing `m`.
    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    /// Product of the distinct primes dividing `m`.
    pub fn rad_m(&self) -> u64 {
        self.rad_m
    }

    /// `k` when `m = 2^k`, otherwise `0`.
    pub fn pow2(&self) -> u32 {
        self.pow2
    }

    pub fn norm_bnd(&self) -> f64 {
        self.norm_bnd
    }

    pub fn poly_norm_bnd(&self) -> f64 {
        self.poly_norm_bnd
    }

    pub fn c_m(&self) -> f64 {
        self.c_m
    }

    pub fn phim_x(&self) -> &IntPoly {
        &self.phim_x
    }

    /// Irreducible factors of `Phi_m mod p`, one per slot in representative
    /// order. Empty for the complex algebra.
    pub fn frobenius_factors(&self) -> &[ModPoly] {
        &self.factors
    }

    pub fn spectral(&self) -> &SpectralTables {
        &self.spectral
    }

    pub fn cube(&self) -> &CubeSignature {
        &self.cube
    }

    pub fn num_gens(&self) -> usize {
        self.gens.len()
    }

    pub fn gens(&self) -> &[u64] {
        &self.gens
    }

    pub fn generator(&self, i: usize) -> Option<u64> {
        self.gens.get(i).copied()
    }

    pub fn order_of(&self, i: usize) -> usize {
        self.cube.dim(i)
    }

    pub fn orders(&self) -> &[usize] {
        self.cube.dims()
    }

    /// `prod_{j >= i} order_of(j)`.
    pub fn prod_ords_from(&self, i: usize) -> usize {
        self.cube.prod(i)
    }

    /// Whether generator `i` has the same order in `(Z/mZ)^*` as in the
    /// quotient.
    pub fn same_ord(&self, i: usize) -> bool {
        self.native[i]
    }

    /// `j` with `g_i^{ord_i} = p^j`, if the power lies in `<p>`.
    pub fn frob_perturb(&self, i: usize) -> Option<u64> {
        self.frob_perturb[i]
    }

    /// `g_i^j mod m`; negative `j` is allowed.
    pub fn gen_to_pow(&self, i: usize, j: i64) -> u64 {
        mod_pow(self.gens[i], j.rem_euclid(self.phi_m as i64) as u64, self.m)
    }

    /// `p^j mod m`; negative `j` is allowed.
    pub fn frobenius_pow(&self, j: i64) -> u64 {
        mod_pow(self.p, j.rem_euclid(self.ord_p as i64) as u64, self.m)
    }

    /// `prod_i g_i^{exps[i]} mod m`, optionally skipping non-native generators.
    pub fn exponentiate(&self, exps: &[i64], only_same_ord: bool) -> u64 {
        exps.iter()
            .enumerate()
            .filter(|&(i, _)| !only_same_ord || self.native[i])
            .fold(1 % self.m, |acc, (i, &e)| {
                mul_mod(acc, self.gen_to_pow(i, e), self.m)
            })
    }

    pub fn reps(&self) -> &[u64] {
        &self.t
    }

    pub fn ith_rep(&self, i: usize) -> Option<u64> {
        self.t.get(i).copied()
    }

    pub fn index_of_rep(&self, t: u64) -> Option<usize> {
        self.t_idx.get(t as usize).copied().flatten()
    }

    pub fn is_rep(&self, t: u64) -> bool {
        self.index_of_rep(t).is_some()
    }

    pub fn index_in_zm_star(&self, t: u64) -> Option<usize> {
        self.zms_idx.get(t as usize).copied().flatten()
    }

    pub fn rep_in_zm_star(&self, idx: usize) -> Option<u64> {
        self.zms_rep.get(idx).copied()
    }

    pub fn in_zm_star(&self, t: u64) -> bool {
        self.index_in_zm_star(t).is_some()
    }

    /// Coordinate of slot `k` along dimension `i`.
    pub fn coordinate(&self, i: usize, k: usize) -> usize {
        self.cube.coord(k, i)
    }

    pub fn break_index_by_dim(&self, idx: usize, dim: usize) -> (usize, usize) {
        self.cube.break_index_by_dim(idx, dim)
    }

    pub fn assemble_index_by_dim(&self, parts: (usize, usize), dim: usize) -> usize {
        self.cube.assemble_index_by_dim(parts, dim)
    }

    /// Slot `k` with its coordinate along dimension `i` shifted by `offset`.
    pub fn add_coord(&self, i: usize, k: usize, offset: i64) -> usize {
        self.cube.add_coord(i, k, offset)
    }

    pub fn next_exp_vector(&self, exps: &mut [usize]) -> bool {
        self.cube.increment_coords(exps)
    }

    pub fn fft_size_needed(&self) -> u32 {
        fft_size_needed(self.m)
    }

    pub fn params(&self, r: u32) -> AlgebraParams {
        AlgebraParams {
            m: self.m,
            p: self.p,
            r,
            gens: self.gens.clone(),
            ords: self.orders().to_vec(),
            complex: self.complex,
        }
    }

    /// Whether this algebra was built from exactly these parameters.
    pub fn matches(&self, m: u64, p: u64, gens: &[u64], ords: &[usize]) -> bool {
        self.m == m && self.p == p && self.gens == gens && self.orders() == ords
    }
}

impl PartialEq for IndexAlgebra {
    fn eq(&self, other: &Self) -> bool {
        self.complex == other.complex
            && self.matches(other.m, other.p, &other.gens, other.orders())
    }
}

impl Eq for IndexAlgebra {}

impl fmt::Display for IndexAlgebra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "m = {}, p = {}{}, phi(m) = {}",
            self.m,
            self.p,
            if self.complex { " (complex)" } else { "" },
            self.phi_m
        )?;
        writeln!(f, "  ord(p) = {}", self.ord_p)?;
        writeln!(f, "  normBnd = {:.6}", self.norm_bnd)?;
        writeln!(f, "  polyNormBnd = {:.6}", self.poly_norm_bnd)?;
        writeln!(f, "  cM = {:.6}", self.c_m)?;
        let factors: Vec<String> = factorize(self.m)
            .into_iter()
            .map(|(q, e)| if e == 1 { q.to_string() } else { format!("{q}^{e}") })
            .collect();
        writeln!(f, "  factors = [{}]", factors.join(", "))?;
        for (i, &g) in self.gens.iter().enumerate() {
            write!(f, "  generator {g} has order {}", self.order_of(i))?;
            if self.native[i] {
                writeln!(f, " (== Z_m^*)")?;
            } else {
                writeln!(f, " (!= Z_m^*)")?;
            }
        }
        write!(f, "  slots = {} {}", self.n_slots(), self.cube)
    }
}

/// The plain-data description of an algebra, enough to rebuild an equal one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlgebraParams {
    pub m: u64,
    pub p: u64,
    pub r: u32,
    pub gens: Vec<u64>,
    pub ords: Vec<usize>,
    pub complex: bool,
}

impl AlgebraParams {
    pub fn new(m: u64, p: u64, r: u32) -> Self {
        Self {
            m,
            p,
            r,
            gens: Vec::new(),
            ords: Vec::new(),
            complex: false,
        }
    }

    pub fn index_algebra(&self) -> AlgebraResult<Arc<IndexAlgebra>> {
        let mut builder = IndexAlgebraBuilder::new(self.m).prime(self.p);
        if self.complex {
            builder = builder.complex();
        }
        if !self.gens.is_empty() || !self.ords.is_empty() {
            builder = builder.generators(self.gens.clone()).orders(self.ords.clone());
        }
        builder.build()
    }

    pub fn plaintext_algebra(&self) -> AlgebraResult<PlaintextAlgebra> {
        PlaintextAlgebra::new(self.index_algebra()?, self.r)
    }
}
