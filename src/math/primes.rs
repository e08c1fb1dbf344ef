//! Prime utilities for the cyclotomic index computations.
//!
//! Primality uses the Miller-Rabin test with a fixed base set. For `u64`
//! inputs these bases make the test deterministic: `n - 1` is written as
//! `d * 2^r`, and every base must either hit `1`/`n - 1` directly or reach
//! `n - 1` by repeated squaring. If no base witnesses compositeness, `n` is
//! prime.
//!
//! The factorization helpers are trial division, which is all we need for
//! ring moduli `m` that index a table of size `m`.

// Deterministic for all n < 318,665,857,834,031,151,167,461 (covers u64).
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Computes `(a * b) mod modulus` using `u128` intermediate arithmetic.
#[inline]
pub fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mul_mod: modulus must be positive");
    ((a as u128 * b as u128) % modulus as u128) as u64
}

/// Computes `base^exp mod modulus` via binary exponentiation.
pub fn mod_pow(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mod_pow: modulus must be positive");
    if modulus == 1 {
        return 0;
    }
    let mut acc = 1 % modulus;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    acc
}

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    assert!(n > 0, "decompose: n must be positive");
    let r = n.trailing_zeros();
    (n >> r, r)
}

/// Returns `true` if `n` is prime using deterministic Miller-Rabin on `u64`.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Prime-power factorization of `n` as `(prime, exponent)` pairs in
/// increasing prime order. `factorize(1)` is empty.
pub fn factorize(mut n: u64) -> Vec<(u64, u32)> {
    assert!(n > 0, "factorize: n must be positive");
    let mut factors = Vec::new();

    let twos = n.trailing_zeros();
    if twos > 0 {
        factors.push((2, twos));
        n >>= twos;
    }

    let mut q = 3u64;
    while q.saturating_mul(q) <= n {
        if n.is_multiple_of(q) {
            let mut e = 0;
            while n.is_multiple_of(q) {
                n /= q;
                e += 1;
            }
            factors.push((q, e));
        }
        q += 2;
    }
    if n > 1 {
        factors.push((n, 1));
    }
    factors
}

/// Distinct prime divisors of `n`.
pub fn prime_divisors(n: u64) -> Vec<u64> {
    factorize(n).into_iter().map(|(q, _)| q).collect()
}

/// Smallest generator of `(Z/q^eZ)^*` for an odd prime `q`.
///
/// A primitive root `g` mod `q` stays primitive mod every `q^e` unless
/// `g^(q-1) = 1 (mod q^2)`, in which case `g + q` is used instead.
pub fn primitive_root_mod_prime_power(q: u64, e: u32) -> u64 {
    assert!(q > 2 && is_prime(q), "primitive_root: q must be an odd prime");
    assert!(e >= 1, "primitive_root: exponent must be positive");

    let order = q - 1;
    let divisors = prime_divisors(order);
    let mut g = (2..q)
        .find(|&g| divisors.iter().all(|&f| mod_pow(g, order / f, q) != 1))
        .unwrap_or_else(|| panic!("primitive_root: no generator modulo {q}"));

    if e >= 2 && mod_pow(g, order, q * q) == 1 {
        g += q;
    }
    g
}
