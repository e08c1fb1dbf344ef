//! Factoring `Phi_m(X)` modulo `p` and lifting the factors to `p^r`.
//!
//! Every irreducible factor of `Phi_m mod p` has degree `ordP`, so a single
//! factor `F_1` is found by equal-degree factorization (Cantor-Zassenhaus).
//! The remaining factors are never searched for independently: the factor
//! attached to a representative `t` is `F_t = gcd(F_1(X^t), Phi_m)`, whose
//! roots are exactly the `rho` with `rho^t` a root of `F_1`.
//!
//! For `r > 1` each factor is Hensel-lifted against its cofactor, one `p`-adic
//! digit per step. Lifts of coprime monic factors are unique, so the product
//! of the lifted factors is again `Phi_m mod p^r`.

use rand::Rng;
use tracing::{debug, warn};

use super::poly::ModPoly;
use crate::errors::{AlgebraError, AlgebraResult};

/// Attempts before a factor search is reported as failed. Each random split
/// succeeds with probability at least one half.
const MAX_SPLIT_ATTEMPTS: usize = 1 << 12;
const SLOW_SPLIT_WARNING: usize = 64;

fn random_poly<R: Rng>(degree_bound: usize, p: u64, rng: &mut R) -> ModPoly {
    let coeffs: Vec<u64> = (0..degree_bound).map(|_| rng.random_range(0..p)).collect();
    ModPoly::from_coeffs(&coeffs, p)
}

/// A polynomial whose gcd with `cur` splits off a proper factor with
/// probability about one half, given that `cur` is a product of distinct
/// irreducibles of degree `d` over `GF(p)`.
fn splitting_candidate(a: &ModPoly, d: usize, cur: &ModPoly) -> ModPoly {
    let p = cur.modulus();
    if p == 2 {
        // Trace from GF(2^d) down to GF(2).
        let mut term = a.rem(cur);
        let mut trace = term.clone();
        for _ in 1..d {
            term = term.mul_mod(&term, cur);
            trace = &trace + &term;
        }
        trace
    } else {
        // a^((p^d - 1)/2) = N(a)^((p - 1)/2), where N(a) = prod_i a^(p^i).
        let mut term = a.rem(cur);
        let mut norm = term.clone();
        for _ in 1..d {
            term = term.pow_mod(p, cur);
            norm = norm.mul_mod(&term, cur);
        }
        &norm.pow_mod((p - 1) / 2, cur) - &ModPoly::one(p)
    }
}

/// Finds one monic irreducible factor of degree `d` of `f`, which must be a
/// squarefree product of degree-`d` irreducibles over the prime field.
pub fn find_factor<R: Rng>(f: &ModPoly, d: usize, rng: &mut R) -> AlgebraResult<ModPoly> {
    let p = f.modulus();
    let mut cur = f.make_monic().ok_or_else(|| AlgebraError::FactorizationFailed {
        message: "cannot factor the zero polynomial".into(),
    })?;
    let total = cur.degree().unwrap_or(0);
    if d == 0 || total % d != 0 {
        return Err(AlgebraError::FactorizationFailed {
            message: format!("degree {total} is not a multiple of {d}"),
        });
    }

    let mut attempts = 0usize;
    while cur.degree() != Some(d) {
        attempts += 1;
        if attempts > MAX_SPLIT_ATTEMPTS {
            return Err(AlgebraError::FactorizationFailed {
                message: format!(
                    "no split of a degree-{} factor mod {p} after {MAX_SPLIT_ATTEMPTS} attempts",
                    cur.degree().unwrap_or(0)
                ),
            });
        }
        if attempts == SLOW_SPLIT_WARNING {
            warn!(attempts, p, d, "equal-degree factorization is splitting slowly");
        }

        let deg = cur.degree().unwrap_or(0);
        let a = random_poly(deg, p, rng);
        if a.degree().unwrap_or(0) == 0 {
            continue;
        }
        let h = splitting_candidate(&a, d, &cur).gcd(&cur);
        let Some(hd) = h.degree() else { continue };
        if hd == 0 || hd == deg {
            continue;
        }
        let Some(other) = cur.exact_div(&h) else {
            continue;
        };
        cur = if hd <= deg - hd { h } else { other };
    }
    debug!(attempts, p, d, "found irreducible factor");
    Ok(cur)
}

/// `F_t = gcd(F_1(X^t), phi)` for every representative `t`, all over `GF(p)`,
/// where `phi = Phi_m mod p`.
///
/// `F_1(X^t)` has at most `deg F_1 + 1` terms. Since `Phi_m` divides
/// `X^m - 1`, exponents are folded mod `m` first, leaving one reduction of a
/// polynomial of degree below `m` per representative.
pub fn frobenius_orbit_factors(
    phi: &ModPoly,
    f1: &ModPoly,
    m: u64,
    reps: &[u64],
) -> Vec<ModPoly> {
    let p = phi.modulus();
    reps.iter()
        .map(|&t| {
            let mut folded = vec![0u64; m as usize];
            for (k, &c) in f1.coeffs().iter().enumerate() {
                if c == 0 {
                    continue;
                }
                let e = ((t as u128 * k as u128) % m as u128) as usize;
                folded[e] = (folded[e] + c) % p;
            }
            ModPoly::from_coeffs(&folded, p).rem(phi).gcd(phi)
        })
        .collect()
}

/// Lifts the monic factor `h` of `f` from `GF(p)` to `Z/p^rZ`. `f` must be
/// monic modulo `p^r` and `h` coprime to its cofactor modulo `p`.
pub fn hensel_lift(f: &ModPoly, h: &ModPoly, p: u64, r: u32) -> AlgebraResult<ModPoly> {
    let q = f.modulus();
    let lift_error = |message: &str| AlgebraError::FactorizationFailed {
        message: message.to_string(),
    };

    let f_p = f.to_modulus(p);
    let h_p = h.to_modulus(p);
    let g_p = f_p
        .exact_div(&h_p)
        .ok_or_else(|| lift_error("factor does not divide the polynomial mod p"))?;
    let (one, s, t) = g_p.xgcd(&h_p);
    if !one.is_one() {
        return Err(lift_error("factor and cofactor are not coprime mod p"));
    }

    let mut g = g_p.to_modulus(q);
    let mut h = h_p.to_modulus(q);
    let mut pk = p;
    for _ in 1..r {
        // e = (f - g*h) / p^k mod p
        let diff = f - &(&g * &h);
        if diff.coeffs().iter().any(|&c| c % pk != 0) {
            return Err(lift_error("lifting invariant lost"));
        }
        let e: Vec<u64> = diff.coeffs().iter().map(|&c| (c / pk) % p).collect();
        let e = ModPoly::from_coeffs(&e, p);

        let (quot, rem) = (&s * &e)
            .div_rem(&h_p)
            .ok_or_else(|| lift_error("factor is not monic"))?;
        let delta_g = &(&t * &e) + &(&quot * &g_p);

        g = &g + &delta_g.to_modulus(q).scale(pk);
        h = &h + &rem.to_modulus(q).scale(pk);
        pk *= p;
    }
    Ok(h)
}

/// Lifts every factor of `f mod p` to `f mod p^r`.
pub fn hensel_lift_all(
    f: &ModPoly,
    factors: &[ModPoly],
    p: u64,
    r: u32,
) -> AlgebraResult<Vec<ModPoly>> {
    if r == 1 {
        return Ok(factors.to_vec());
    }
    debug!(count = factors.len(), p, r, "hensel lifting factors");
    factors.iter().map(|h| hensel_lift(f, h, p, r)).collect()
}
