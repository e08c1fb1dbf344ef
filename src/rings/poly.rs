use core::ops::{Add, Mul, Neg, Sub};

use crate::math::primes::prime_divisors;
use crate::math::{add_mod, mod_inverse, mul_mod, sub_mod};

/// A dense polynomial over `Z/qZ`.
///
/// The modulus `q` travels with the value: every arithmetic operation reads it
/// from its operands, so there is no ambient "current modulus". Coefficients
/// are stored lowest degree first, reduced into `[0, q)`, with no trailing
/// zeros (the zero polynomial has no coefficients).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModPoly {
    coeffs: Vec<u64>,
    modulus: u64,
}

impl ModPoly {
    fn from_reduced(coeffs: Vec<u64>, modulus: u64) -> Self {
        let mut poly = Self { coeffs, modulus };
        poly.trim();
        poly
    }

    fn trim(&mut self) {
        while let Some(&0) = self.coeffs.last() {
            self.coeffs.pop();
        }
    }

    pub fn zero(modulus: u64) -> Self {
        assert!(modulus > 1, "ModPoly: modulus must be at least 2");
        Self {
            coeffs: Vec::new(),
            modulus,
        }
    }

    pub fn one(modulus: u64) -> Self {
        Self::constant(1, modulus)
    }

    pub fn constant(c: u64, modulus: u64) -> Self {
        Self::monomial(c, 0, modulus)
    }

    /// `c * X^degree`
    pub fn monomial(c: u64, degree: usize, modulus: u64) -> Self {
        let mut coeffs = vec![0; degree + 1];
        coeffs[degree] = c % modulus;
        Self::from_reduced(coeffs, modulus)
    }

    /// The monomial `X`.
    pub fn x(modulus: u64) -> Self {
        Self::monomial(1, 1, modulus)
    }

    pub fn from_coeffs(coeffs: &[u64], modulus: u64) -> Self {
        assert!(modulus > 1, "ModPoly: modulus must be at least 2");
        Self::from_reduced(coeffs.iter().map(|c| c % modulus).collect(), modulus)
    }

    /// Builds a polynomial from signed integer coefficients, reducing each
    /// into `[0, q)`.
    pub fn from_signed(coeffs: &[i64], modulus: u64) -> Self {
        assert!(modulus > 1, "ModPoly: modulus must be at least 2");
        let q = modulus as i128;
        Self::from_reduced(
            coeffs
                .iter()
                .map(|&c| (c as i128).rem_euclid(q) as u64)
                .collect(),
            modulus,
        )
    }

    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    /// Coefficient of `X^i` (zero past the degree).
    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs.get(i).copied().unwrap_or(0)
    }

    /// Coefficients `0..len`, zero-padded.
    pub fn padded_coeffs(&self, len: usize) -> Vec<u64> {
        (0..len).map(|i| self.coeff(i)).collect()
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Degree, or `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    /// Number of stored coefficients (`degree + 1`, zero for the zero polynomial).
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.coeffs == [1]
    }

    pub fn leading_coeff(&self) -> u64 {
        self.coeffs.last().copied().unwrap_or(0)
    }

    pub fn is_monic(&self) -> bool {
        self.leading_coeff() == 1
    }

    /// Reinterprets the coefficients modulo `modulus`. Going from `p^r` down to
    /// `p` reduces; going up keeps the integer representatives.
    pub fn to_modulus(&self, modulus: u64) -> Self {
        Self::from_coeffs(&self.coeffs, modulus)
    }

    /// Coefficients as integers in the balanced range `(-q/2, q/2]`.
    pub fn balanced(&self) -> Vec<i64> {
        let half = self.modulus / 2;
        self.coeffs
            .iter()
            .map(|&c| {
                if c > half {
                    -((self.modulus - c) as i64)
                } else {
                    c as i64
                }
            })
            .collect()
    }

    pub fn scale(&self, c: u64) -> Self {
        let c = c % self.modulus;
        Self::from_reduced(
            self.coeffs
                .iter()
                .map(|&a| mul_mod(a, c, self.modulus))
                .collect(),
            self.modulus,
        )
    }

    /// Evaluates at a scalar point.
    pub fn evaluate(&self, x: u64) -> u64 {
        let x = x % self.modulus;
        self.coeffs
            .iter()
            .rev()
            .fold(0, |acc, &c| add_mod(mul_mod(acc, x, self.modulus), c, self.modulus))
    }

    /// Division with remainder. `None` when `divisor` is zero or its leading
    /// coefficient is not a unit mod `q`.
    pub fn div_rem(&self, divisor: &Self) -> Option<(Self, Self)> {
        assert_eq!(self.modulus, divisor.modulus, "Incompatible moduli");
        let q = self.modulus;
        let dd = divisor.degree()?;
        let lead_inv = mod_inverse(divisor.leading_coeff(), q)?;

        if self.len() < divisor.len() {
            return Some((Self::zero(q), self.clone()));
        }

        let mut rem = self.coeffs.clone();
        let mut quot = vec![0u64; self.len() - dd];
        for i in (0..quot.len()).rev() {
            let c = rem[i + dd];
            if c == 0 {
                continue;
            }
            let factor = mul_mod(c, lead_inv, q);
            quot[i] = factor;
            for (j, &dc) in divisor.coeffs.iter().enumerate() {
                rem[i + j] = sub_mod(rem[i + j], mul_mod(factor, dc, q), q);
            }
        }
        rem.truncate(dd);
        Some((Self::from_reduced(quot, q), Self::from_reduced(rem, q)))
    }

    /// Remainder modulo `divisor`.
    ///
    /// # Panics
    ///
    /// Panics if the leading coefficient of `divisor` is not a unit.
    pub fn rem(&self, divisor: &Self) -> Self {
        match self.div_rem(divisor) {
            Some((_, r)) => r,
            None => panic!("ModPoly::rem: leading coefficient of divisor is not a unit"),
        }
    }

    /// Quotient when `divisor` divides `self` exactly.
    pub fn exact_div(&self, divisor: &Self) -> Option<Self> {
        let (quot, rem) = self.div_rem(divisor)?;
        rem.is_zero().then_some(quot)
    }

    pub fn mul_mod(&self, other: &Self, modulus: &Self) -> Self {
        (self * other).rem(modulus)
    }

    pub fn pow_mod(&self, mut exp: u64, modulus: &Self) -> Self {
        let mut acc = Self::one(self.modulus).rem(modulus);
        let mut base = self.rem(modulus);
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc.mul_mod(&base, modulus);
            }
            exp >>= 1;
            if exp > 0 {
                base = base.mul_mod(&base, modulus);
            }
        }
        acc
    }

    /// `self(h) mod modulus`, by Horner's rule.
    pub fn compose_mod(&self, h: &Self, modulus: &Self) -> Self {
        let h = h.rem(modulus);
        self.coeffs.iter().rev().fold(Self::zero(self.modulus), |acc, &c| {
            &acc.mul_mod(&h, modulus) + &Self::constant(c, self.modulus)
        })
    }

    /// Scales so the leading coefficient is one. `None` for zero or when the
    /// leading coefficient is not a unit.
    pub fn make_monic(&self) -> Option<Self> {
        let inv = mod_inverse(self.leading_coeff(), self.modulus)?;
        if self.is_zero() {
            return None;
        }
        Some(self.scale(inv))
    }

    /// Monic gcd over a prime field. The zero polynomial is returned only for
    /// `gcd(0, 0)`.
    pub fn gcd(&self, other: &Self) -> Self {
        let (mut a, mut b) = (self.clone(), other.clone());
        while !b.is_zero() {
            let r = a.rem(&b);
            a = b;
            b = r;
        }
        a.make_monic().unwrap_or(a)
    }

    /// Extended gcd over a prime field: returns `(g, s, t)` with
    /// `s * self + t * other = g` and `g` monic (or zero).
    pub fn xgcd(&self, other: &Self) -> (Self, Self, Self) {
        let q = self.modulus;
        let (mut r0, mut r1) = (self.clone(), other.clone());
        let (mut s0, mut s1) = (Self::one(q), Self::zero(q));
        let (mut t0, mut t1) = (Self::zero(q), Self::one(q));
        while !r1.is_zero() {
            let Some((quot, rem)) = r0.div_rem(&r1) else {
                panic!("ModPoly::xgcd: coefficient ring must be a field");
            };
            r0 = std::mem::replace(&mut r1, rem);
            let s2 = &s0 - &(&quot * &s1);
            s0 = std::mem::replace(&mut s1, s2);
            let t2 = &t0 - &(&quot * &t1);
            t0 = std::mem::replace(&mut t1, t2);
        }
        match mod_inverse(r0.leading_coeff(), q) {
            Some(inv) if !r0.is_zero() => (r0.scale(inv), s0.scale(inv), t0.scale(inv)),
            _ => (r0, s0, t0),
        }
    }

    /// Inverse modulo the monic polynomial `modulus` over `Z/p^rZ` where
    /// `p` is the prime underlying `q = p^r`.
    ///
    /// The inverse is computed modulo `p` and then Newton-lifted
    /// (`u <- u * (2 - a * u)`), doubling the `p`-adic precision per step.
    pub fn inverse_mod(&self, modulus: &Self, p: u64) -> Option<Self> {
        assert_eq!(self.modulus, modulus.modulus, "Incompatible moduli");
        let q = self.modulus;
        let modulus_p = modulus.to_modulus(p);
        let a_p = self.to_modulus(p).rem(&modulus_p);
        let (g, s, _) = a_p.xgcd(&modulus_p);
        if !g.is_one() {
            return None;
        }

        let a = self.rem(modulus);
        let mut inv = s.to_modulus(q);
        let two = Self::constant(2, q);
        let mut precision = p;
        while precision < q {
            let correction = &two - &a.mul_mod(&inv, modulus);
            inv = inv.mul_mod(&correction, modulus);
            precision = precision.saturating_mul(precision);
        }
        Some(inv)
    }

    /// Rabin's irreducibility test over the prime field `Z/qZ`: a degree-`n`
    /// polynomial is irreducible iff `X^(q^n) = X` and
    /// `gcd(X^(q^(n/l)) - X, f) = 1` for every prime `l | n`.
    pub fn is_irreducible(&self) -> bool {
        let q = self.modulus;
        let Some(f) = self.make_monic() else {
            return false;
        };
        let n = match f.degree() {
            None | Some(0) => return false,
            Some(1) => return true,
            Some(n) => n,
        };

        let x = Self::x(q);
        // frobenius[i] = X^(q^i) mod f
        let mut frobenius = Vec::with_capacity(n + 1);
        frobenius.push(x.rem(&f));
        for i in 0..n {
            let next = frobenius[i].pow_mod(q, &f);
            frobenius.push(next);
        }

        if frobenius[n] != x.rem(&f) {
            return false;
        }
        prime_divisors(n as u64).into_iter().all(|l| {
            let diff = &frobenius[n / l as usize] - &x;
            diff.gcd(&f).is_one()
        })
    }
}

impl Add for &ModPoly {
    type Output = ModPoly;

    fn add(self, rhs: Self) -> ModPoly {
        assert_eq!(self.modulus, rhs.modulus, "Incompatible moduli");
        let q = self.modulus;
        let len = self.len().max(rhs.len());
        ModPoly::from_reduced(
            (0..len)
                .map(|i| add_mod(self.coeff(i), rhs.coeff(i), q))
                .collect(),
            q,
        )
    }
}

impl Sub for &ModPoly {
    type Output = ModPoly;

    fn sub(self, rhs: Self) -> ModPoly {
        assert_eq!(self.modulus, rhs.modulus, "Incompatible moduli");
        let q = self.modulus;
        let len = self.len().max(rhs.len());
        ModPoly::from_reduced(
            (0..len)
                .map(|i| sub_mod(self.coeff(i), rhs.coeff(i), q))
                .collect(),
            q,
        )
    }
}

impl Neg for &ModPoly {
    type Output = ModPoly;

    fn neg(self) -> ModPoly {
        &ModPoly::zero(self.modulus) - self
    }
}

impl Mul for &ModPoly {
    type Output = ModPoly;

    fn mul(self, rhs: Self) -> ModPoly {
        assert_eq!(self.modulus, rhs.modulus, "Incompatible moduli");
        let q = self.modulus;
        if self.is_zero() || rhs.is_zero() {
            return ModPoly::zero(q);
        }

        let wide_q = q as u128;
        let mut result = vec![0u128; self.len() + rhs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                result[i + j] = (result[i + j] + a as u128 * b as u128) % wide_q;
            }
        }
        ModPoly::from_reduced(result.into_iter().map(|c| c as u64).collect(), q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_and_trim() {
        let p = ModPoly::from_coeffs(&[1, 2, 3, 0, 17], 17);
        assert_eq!(p.degree(), Some(2));
        assert_eq!(ModPoly::zero(17).degree(), None);
        assert!(ModPoly::from_coeffs(&[17, 34], 17).is_zero());
    }

    #[test]
    fn test_addition_negative() {
        // 3 - 2x plus -4 + 5x mod 7
        let p1 = ModPoly::from_signed(&[3, -2], 7);
        let p2 = ModPoly::from_signed(&[-4, 5], 7);
        let sum = &p1 + &p2;
        assert_eq!(sum.coeffs(), &[6, 3]);
        assert_eq!(p1.balanced(), vec![3, -2]);
    }

    #[test]
    fn test_basic_multiplication() {
        // (x + 2)(x + 3) = x^2 + 5x + 6
        let p1 = ModPoly::from_coeffs(&[2, 1], 17);
        let p2 = ModPoly::from_coeffs(&[3, 1], 17);
        assert_eq!((&p1 * &p2).coeffs(), &[6, 5, 1]);
    }

    #[test]
    #[should_panic(expected = "Incompatible moduli")]
    fn test_mixed_moduli_panics() {
        let _ = &ModPoly::one(5) + &ModPoly::one(7);
    }

    #[test]
    fn test_div_rem() {
        // x^3 + 2x + 1 = (x^2 + 2x + 6)(x - 2) + 13 over Z/17
        let a = ModPoly::from_coeffs(&[1, 2, 0, 1], 17);
        let b = ModPoly::from_signed(&[-2, 1], 17);
        let (quot, rem) = a.div_rem(&b).unwrap();
        assert_eq!(quot.coeffs(), &[6, 2, 1]);
        assert_eq!(rem.coeffs(), &[13]);
        assert_eq!(&(&quot * &b) + &rem, a);
    }

    #[test]
    fn test_div_rem_rejects_non_unit_leading_coefficient() {
        let a = ModPoly::from_coeffs(&[1, 1, 1], 9);
        let b = ModPoly::from_coeffs(&[1, 3], 9);
        assert!(a.div_rem(&b).is_none());
    }

    #[test]
    fn test_gcd_and_xgcd() {
        // (x - 1)(x - 2) and (x - 1)(x - 3) over Z/7
        let a = &ModPoly::from_signed(&[-1, 1], 7) * &ModPoly::from_signed(&[-2, 1], 7);
        let b = &ModPoly::from_signed(&[-1, 1], 7) * &ModPoly::from_signed(&[-3, 1], 7);
        let g = a.gcd(&b);
        assert_eq!(g, ModPoly::from_signed(&[-1, 1], 7));
        let (g2, s, t) = a.xgcd(&b);
        assert_eq!(g2, g);
        assert_eq!(&(&s * &a) + &(&t * &b), g);
    }

    #[test]
    fn test_inverse_mod_prime_power() {
        // x^2 + x + 1 is irreducible mod 2; invert x + 1 modulo it over Z/8
        let f = ModPoly::from_coeffs(&[1, 1, 1], 8);
        let a = ModPoly::from_coeffs(&[1, 1], 8);
        let inv = a.inverse_mod(&f, 2).unwrap();
        assert!(a.mul_mod(&inv, &f).is_one());

        let non_unit = ModPoly::constant(2, 8);
        assert!(non_unit.inverse_mod(&f, 2).is_none());
    }

    #[test]
    fn test_compose_and_pow() {
        let f = ModPoly::from_coeffs(&[1, 0, 0, 0, 1], 17); // x^4 + 1
        let x = ModPoly::x(17);
        // x^8 = 1 mod x^4 + 1
        assert!(x.pow_mod(8, &f).is_one());
        // (x^2 + 1) composed with x^2 is x^4 + 1 = 0
        let g = ModPoly::from_coeffs(&[1, 0, 1], 17);
        let x2 = ModPoly::monomial(1, 2, 17);
        assert!(g.compose_mod(&x2, &f).is_zero());
        assert_eq!(g.evaluate(4), 0);
    }

    #[test]
    fn test_irreducibility() {
        assert!(ModPoly::from_coeffs(&[1, 1, 1], 2).is_irreducible());
        assert!(ModPoly::from_coeffs(&[1, 1, 0, 0, 1], 2).is_irreducible());
        // x^4 + x^2 + 1 = (x^2 + x + 1)^2 over GF(2)
        assert!(!ModPoly::from_coeffs(&[1, 0, 1, 0, 1], 2).is_irreducible());
        // x^2 + 1 splits mod 5
        assert!(!ModPoly::from_coeffs(&[1, 0, 1], 5).is_irreducible());
        assert!(ModPoly::from_coeffs(&[1, 0, 1], 7).is_irreducible());
    }
}
