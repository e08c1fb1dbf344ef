//! Root-of-unity tables for evaluating ring elements in the canonical
//! embedding.
//!
//! With `zeta = exp(2*pi*i/m)`, the canonical embedding of `a(X)` is the
//! vector `a(zeta^j)` over all `j` coprime to `m`. The full table evaluates at
//! every `m`-th root of unity with one inverse FFT of size `m`. When `m` is
//! even only odd `j` matter; twisting the coefficients by `zeta^k` turns the
//! odd roots into the `m/2`-th roots of unity, so an FFT of size `m/2`
//! suffices. When `4 | m`, folding the coefficients with `zeta^(m/4) = i`
//! reduces this to size `m/4` for `j = 1 mod 4`, and the remaining
//! `j = 3 mod 4` follow by conjugation since the coefficients are real.

use core::fmt;
use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

fn root_of_unity(m: usize, k: usize) -> Complex64 {
    Complex64::from_polar(1.0, 2.0 * PI * (k % m) as f64 / m as f64)
}

/// Evaluation at all `m`-th roots of unity.
#[derive(Clone)]
pub struct FullFft {
    m: usize,
    plan: Arc<dyn Fft<f64>>,
}

impl FullFft {
    pub fn new(m: usize) -> Self {
        let plan = FftPlanner::new().plan_fft_inverse(m);
        Self { m, plan }
    }

    /// `a(zeta^j)` for `j` in `0..m`. At most `m` coefficients.
    pub fn evaluate(&self, coeffs: &[f64]) -> Vec<Complex64> {
        assert!(coeffs.len() <= self.m, "FullFft::evaluate: too many coefficients");
        let mut buf = vec![Complex64::new(0.0, 0.0); self.m];
        for (slot, &c) in buf.iter_mut().zip(coeffs) {
            slot.re = c;
        }
        self.plan.process(&mut buf);
        buf
    }
}

/// Evaluation at the odd powers of `zeta` for even `m`.
#[derive(Clone)]
pub struct HalfFft {
    m: usize,
    twist: Vec<Complex64>,
    plan: Arc<dyn Fft<f64>>,
}

impl HalfFft {
    pub fn new(m: usize) -> Self {
        assert!(m % 2 == 0, "HalfFft::new: m must be even");
        let n = m / 2;
        let twist = (0..n).map(|k| root_of_unity(m, k)).collect();
        let plan = FftPlanner::new().plan_fft_inverse(n);
        Self { m, twist, plan }
    }

    /// `a(zeta^(2k + 1))` for `k` in `0..m/2`. At most `m` coefficients.
    pub fn evaluate(&self, coeffs: &[f64]) -> Vec<Complex64> {
        assert!(coeffs.len() <= self.m, "HalfFft::evaluate: too many coefficients");
        let n = self.m / 2;
        let mut buf = vec![Complex64::new(0.0, 0.0); n];
        // zeta^n = -1
        for (k, &c) in coeffs.iter().enumerate() {
            let sign = if (k / n) % 2 == 0 { 1.0 } else { -1.0 };
            buf[k % n].re += sign * c;
        }
        for (b, t) in buf.iter_mut().zip(&self.twist) {
            *b *= *t;
        }
        self.plan.process(&mut buf);
        buf
    }
}

/// Evaluation at the powers `zeta^(4k + 1)` for `m` divisible by four.
#[derive(Clone)]
pub struct QuarterFft {
    m: usize,
    twist: Vec<Complex64>,
    plan: Arc<dyn Fft<f64>>,
}

impl QuarterFft {
    pub fn new(m: usize) -> Self {
        assert!(m % 4 == 0, "QuarterFft::new: m must be divisible by 4");
        let n = m / 4;
        let twist = (0..n).map(|k| root_of_unity(m, k)).collect();
        let plan = FftPlanner::new().plan_fft_inverse(n);
        Self { m, twist, plan }
    }

    /// `a(zeta^(4k + 1))` for `k` in `0..m/4`. At most `m` coefficients.
    pub fn evaluate(&self, coeffs: &[f64]) -> Vec<Complex64> {
        assert!(coeffs.len() <= self.m, "QuarterFft::evaluate: too many coefficients");
        let n = self.m / 4;
        let i_pows = [
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(-1.0, 0.0),
            Complex64::new(0.0, -1.0),
        ];
        let mut buf = vec![Complex64::new(0.0, 0.0); n];
        for (k, &c) in coeffs.iter().enumerate() {
            buf[k % n] += i_pows[(k / n) % 4] * c;
        }
        for (b, t) in buf.iter_mut().zip(&self.twist) {
            *b *= *t;
        }
        self.plan.process(&mut buf);
        buf
    }
}

/// Spectral tables for one ring modulus `m`.
///
/// The half and quarter tables exist only when `m` is even, respectively
/// divisible by four.
#[derive(Clone)]
pub struct SpectralTables {
    m: usize,
    full: FullFft,
    half: Option<HalfFft>,
    quarter: Option<QuarterFft>,
}

impl SpectralTables {
    pub fn new(m: usize) -> Self {
        assert!(m >= 1, "SpectralTables::new: m must be positive");
        Self {
            m,
            full: FullFft::new(m),
            half: (m % 2 == 0).then(|| HalfFft::new(m)),
            quarter: (m % 4 == 0).then(|| QuarterFft::new(m)),
        }
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn full(&self) -> &FullFft {
        &self.full
    }

    pub fn half(&self) -> Option<&HalfFft> {
        self.half.as_ref()
    }

    pub fn quarter(&self) -> Option<&QuarterFft> {
        self.quarter.as_ref()
    }

    /// `a(zeta^j)` for every `j` in `[1, m)` coprime to `m`, in increasing `j`.
    pub fn canonical_embedding(&self, coeffs: &[f64]) -> Vec<Complex64> {
        let m = self.m;
        let units = (1..m.max(2)).filter(|&j| crate::math::gcd(j as u64, m as u64) == 1);

        if let Some(quarter) = &self.quarter {
            let values = quarter.evaluate(coeffs);
            units
                .map(|j| {
                    if j % 4 == 1 {
                        values[(j - 1) / 4]
                    } else {
                        values[(m - j - 1) / 4].conj()
                    }
                })
                .collect()
        } else if let Some(half) = &self.half {
            let values = half.evaluate(coeffs);
            units.map(|j| values[(j - 1) / 2]).collect()
        } else {
            let values = self.full.evaluate(coeffs);
            units.map(|j| values[j % m]).collect()
        }
    }
}

impl fmt::Debug for SpectralTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralTables")
            .field("m", &self.m)
            .field("half", &self.half.is_some())
            .field("quarter", &self.quarter.is_some())
            .finish()
    }
}

/// `ceil(log2(m)) + 1`: the exponent of the power-of-two FFT size that
/// holds a product of two elements of the `m`-th cyclotomic ring.
pub fn fft_size_needed(m: u64) -> u32 {
    m.next_power_of_two().trailing_zeros() + 1
}
