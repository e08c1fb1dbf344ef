//! Cyclotomic polynomials over the integers.
//!
//! `Phi_m(X) = prod_{d | m} (X^d - 1)^{mu(m/d)}`. The product is evaluated by
//! first multiplying in every factor with `mu = 1` and then dividing out each
//! factor with `mu = -1`; both steps are sparse updates since `X^d - 1` has
//! two terms.

use core::fmt;

use super::poly::ModPoly;
use crate::math::{divisors, mobius};

/// A dense integer polynomial, lowest degree first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntPoly {
    coeffs: Vec<i64>,
}

impl IntPoly {
    pub fn new(mut coeffs: Vec<i64>) -> Self {
        while let Some(&0) = coeffs.last() {
            coeffs.pop();
        }
        Self { coeffs }
    }

    pub fn coeffs(&self) -> &[i64] {
        &self.coeffs
    }

    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    /// Reduces every coefficient modulo `q`.
    pub fn to_mod(&self, q: u64) -> ModPoly {
        ModPoly::from_signed(&self.coeffs, q)
    }
}

impl fmt::Display for IntPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (i, &c) in self.coeffs.iter().enumerate().rev() {
            if c == 0 {
                continue;
            }
            if !first {
                write!(f, " {} ", if c < 0 { '-' } else { '+' })?;
            } else if c < 0 {
                write!(f, "-")?;
            }
            let abs = c.unsigned_abs();
            match (i, abs) {
                (0, _) => write!(f, "{abs}")?,
                (1, 1) => write!(f, "X")?,
                (1, _) => write!(f, "{abs}*X")?,
                (_, 1) => write!(f, "X^{i}")?,
                _ => write!(f, "{abs}*X^{i}")?,
            }
            first = false;
        }
        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}

/// The `m`-th cyclotomic polynomial.
pub fn cyclotomic(m: u64) -> IntPoly {
    assert!(m >= 1, "cyclotomic: m must be positive");
    let divs = divisors(m);

    // Degree never exceeds the sum of the mu = 1 divisors.
    let max_deg: u64 = divs
        .iter()
        .filter(|&&d| mobius(m / d) == 1)
        .sum();
    let mut acc = vec![0i128; max_deg as usize + 1];
    acc[0] = 1;
    let mut deg = 0usize;

    for &d in &divs {
        if mobius(m / d) == 1 {
            let d = d as usize;
            // acc * (X^d - 1)
            for j in (0..=deg + d).rev() {
                let shifted = if j >= d { acc[j - d] } else { 0 };
                acc[j] = shifted - acc[j];
            }
            deg += d;
        }
    }

    for &d in &divs {
        if mobius(m / d) == -1 {
            let d = d as usize;
            // Exact division by (X^d - 1): q[j - d] = a[j] + q[j].
            let mut quot = vec![0i128; deg - d + 1];
            for j in (d..=deg).rev() {
                let carry = if j <= deg - d { quot[j] } else { 0 };
                quot[j - d] = acc[j] + carry;
            }
            acc[..=deg - d].copy_from_slice(&quot);
            for c in acc.iter_mut().skip(deg - d + 1) {
                *c = 0;
            }
            deg -= d;
        }
    }

    IntPoly::new(acc[..=deg].iter().map(|&c| c as i64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_cyclotomics() {
        assert_eq!(cyclotomic(1).coeffs(), &[-1, 1]);
        assert_eq!(cyclotomic(2).coeffs(), &[1, 1]);
        assert_eq!(cyclotomic(4).coeffs(), &[1, 0, 1]);
        assert_eq!(cyclotomic(6).coeffs(), &[1, -1, 1]);
        assert_eq!(cyclotomic(15).coeffs(), &[1, -1, 0, 1, -1, 1, 0, -1, 1]);
    }

    #[test]
    fn power_of_two_is_binomial() {
        let phi = cyclotomic(128);
        assert_eq!(phi.degree(), Some(64));
        assert_eq!(phi.coeffs()[0], 1);
        assert_eq!(phi.coeffs()[64], 1);
        assert!(phi.coeffs()[1..64].iter().all(|&c| c == 0));
    }

    #[test]
    fn degree_is_totient() {
        assert_eq!(cyclotomic(45).degree(), Some(24));
        assert_eq!(cyclotomic(105).degree(), Some(48));
        // Phi_105 is the first with a coefficient of absolute value 2.
        assert!(cyclotomic(105).coeffs().contains(&-2));
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(cyclotomic(6).to_string(), "X^2 - X + 1");
        assert_eq!(cyclotomic(1).to_string(), "X - 1");
    }
}
