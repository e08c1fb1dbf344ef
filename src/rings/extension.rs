//! Arithmetic in `E = (Z/p^rZ)[X] / G(X)` for a monic `G` that is irreducible
//! modulo `p`.
//!
//! `E` is a Galois ring (a field when `r = 1`): an element is a unit exactly
//! when its reduction mod `p` is nonzero. Polynomials over `E` are plain
//! `Vec<ExtElem>` with the lowest degree first; they appear only in root
//! finding, where `r = 1`.

use rand::Rng;

use super::poly::ModPoly;

pub type ExtElem = ModPoly;

/// The ring `(Z/qZ)[X] / G(X)`.
#[derive(Debug, Clone)]
pub struct ExtRing {
    modulus: ModPoly,
    p: u64,
    frobenius_x: ModPoly,
}

impl ExtRing {
    /// `modulus` must be monic with coefficients mod `q = p^r`.
    pub fn new(modulus: ModPoly, p: u64) -> Self {
        assert!(modulus.is_monic(), "ExtRing::new: modulus must be monic");
        let frobenius_x = ModPoly::x(modulus.modulus()).pow_mod(p, &modulus);
        Self {
            modulus,
            p,
            frobenius_x,
        }
    }

    pub fn modulus(&self) -> &ModPoly {
        &self.modulus
    }

    /// `q = p^r`, the coefficient modulus.
    pub fn q(&self) -> u64 {
        self.modulus.modulus()
    }

    pub fn degree(&self) -> usize {
        self.modulus.degree().unwrap_or(0)
    }

    pub fn zero(&self) -> ExtElem {
        ModPoly::zero(self.q())
    }

    pub fn one(&self) -> ExtElem {
        ModPoly::one(self.q())
    }

    pub fn from_scalar(&self, c: u64) -> ExtElem {
        ModPoly::constant(c, self.q())
    }

    pub fn reduce(&self, a: &ModPoly) -> ExtElem {
        a.rem(&self.modulus)
    }

    pub fn add(&self, a: &ExtElem, b: &ExtElem) -> ExtElem {
        a + b
    }

    pub fn sub(&self, a: &ExtElem, b: &ExtElem) -> ExtElem {
        a - b
    }

    pub fn mul(&self, a: &ExtElem, b: &ExtElem) -> ExtElem {
        a.mul_mod(b, &self.modulus)
    }

    pub fn pow(&self, a: &ExtElem, exp: u64) -> ExtElem {
        a.pow_mod(exp, &self.modulus)
    }

    pub fn is_unit(&self, a: &ExtElem) -> bool {
        !a.to_modulus(self.p).rem(&self.modulus.to_modulus(self.p)).is_zero()
    }

    pub fn inv(&self, a: &ExtElem) -> Option<ExtElem> {
        a.inverse_mod(&self.modulus, self.p)
    }

    /// `a(X^p) mod G`, the Frobenius map of the residue field lifted to `E`.
    pub fn frobenius(&self, a: &ExtElem) -> ExtElem {
        a.compose_mod(&self.frobenius_x, &self.modulus)
    }

    pub fn random<R: Rng>(&self, rng: &mut R) -> ExtElem {
        let q = self.q();
        let coeffs: Vec<u64> = (0..self.degree()).map(|_| rng.random_range(0..q)).collect();
        ModPoly::from_coeffs(&coeffs, q)
    }

    fn trim(&self, mut f: Vec<ExtElem>) -> Vec<ExtElem> {
        while f.last().is_some_and(ModPoly::is_zero) {
            f.pop();
        }
        f
    }

    fn poly_mul(&self, a: &[ExtElem], b: &[ExtElem]) -> Vec<ExtElem> {
        if a.is_empty() || b.is_empty() {
            return Vec::new();
        }
        let mut out = vec![self.zero(); a.len() + b.len() - 1];
        for (i, x) in a.iter().enumerate() {
            if x.is_zero() {
                continue;
            }
            for (j, y) in b.iter().enumerate() {
                out[i + j] = self.add(&out[i + j], &self.mul(x, y));
            }
        }
        self.trim(out)
    }

    /// Division with remainder of polynomials over `E`; `None` when the
    /// divisor is zero or its leading coefficient is not a unit.
    fn poly_div_rem(
        &self,
        a: &[ExtElem],
        b: &[ExtElem],
    ) -> Option<(Vec<ExtElem>, Vec<ExtElem>)> {
        let lead = b.last()?;
        let lead_inv = self.inv(lead)?;
        let db = b.len() - 1;
        if a.len() < b.len() {
            return Some((Vec::new(), a.to_vec()));
        }
        let mut rem = a.to_vec();
        let mut quot = vec![self.zero(); a.len() - db];
        for i in (0..quot.len()).rev() {
            if rem[i + db].is_zero() {
                continue;
            }
            let factor = self.mul(&rem[i + db], &lead_inv);
            for (j, bj) in b.iter().enumerate() {
                rem[i + j] = self.sub(&rem[i + j], &self.mul(&factor, bj));
            }
            quot[i] = factor;
        }
        rem.truncate(db);
        Some((self.trim(quot), self.trim(rem)))
    }

    fn poly_rem(&self, a: &[ExtElem], b: &[ExtElem]) -> Vec<ExtElem> {
        match self.poly_div_rem(a, b) {
            Some((_, r)) => r,
            None => panic!("ExtRing::poly_rem: divisor has no unit leading coefficient"),
        }
    }

    fn poly_pow_mod(&self, base: &[ExtElem], mut exp: u64, modulus: &[ExtElem]) -> Vec<ExtElem> {
        let mut acc = self.poly_rem(&[self.one()], modulus);
        let mut base = self.poly_rem(base, modulus);
        while exp > 0 {
            if exp & 1 == 1 {
                acc = self.poly_rem(&self.poly_mul(&acc, &base), modulus);
            }
            exp >>= 1;
            if exp > 0 {
                base = self.poly_rem(&self.poly_mul(&base, &base), modulus);
            }
        }
        acc
    }

    fn poly_monic(&self, f: &[ExtElem]) -> Option<Vec<ExtElem>> {
        let inv = self.inv(f.last()?)?;
        Some(f.iter().map(|c| self.mul(c, &inv)).collect())
    }

    /// Monic gcd over the field `E` (`r = 1`).
    fn poly_gcd(&self, a: &[ExtElem], b: &[ExtElem]) -> Vec<ExtElem> {
        let (mut a, mut b) = (self.trim(a.to_vec()), self.trim(b.to_vec()));
        while !b.is_empty() {
            let r = self.poly_rem(&a, &b);
            a = b;
            b = r;
        }
        self.poly_monic(&a).unwrap_or(a)
    }

    /// A polynomial over `E` that splits roughly half of the roots of `f`.
    fn split_candidate<R: Rng>(&self, f: &[ExtElem], rng: &mut R) -> Vec<ExtElem> {
        let p = self.p;
        let d = self.degree();
        // a = gamma * Y + delta
        let a = self.trim(vec![self.random(rng), self.random(rng)]);
        if p == 2 {
            let mut term = self.poly_rem(&a, f);
            let mut trace = term.clone();
            for _ in 1..d {
                term = self.poly_rem(&self.poly_mul(&term, &term), f);
                trace = self.poly_add(&trace, &term);
            }
            trace
        } else {
            let mut term = self.poly_rem(&a, f);
            let mut norm = term.clone();
            for _ in 1..d {
                term = self.poly_pow_mod(&term, p, f);
                norm = self.poly_rem(&self.poly_mul(&norm, &term), f);
            }
            let pow = self.poly_pow_mod(&norm, (p - 1) / 2, f);
            self.poly_add(&pow, &[self.from_scalar(p - 1)])
        }
    }

    fn poly_add(&self, a: &[ExtElem], b: &[ExtElem]) -> Vec<ExtElem> {
        let len = a.len().max(b.len());
        let zero = self.zero();
        self.trim(
            (0..len)
                .map(|i| self.add(a.get(i).unwrap_or(&zero), b.get(i).unwrap_or(&zero)))
                .collect(),
        )
    }

    /// Finds a root in `E` of `g`, an irreducible polynomial over `GF(p)`
    /// whose degree divides `deg G`. Needs `r = 1`.
    ///
    /// Over `E` such a `g` is a product of distinct linear factors, which are
    /// separated by gcds with random traces (or norms) as in Cantor-Zassenhaus.
    pub fn find_root<R: Rng>(&self, g: &ModPoly, rng: &mut R) -> Option<ExtElem> {
        if self.q() != self.p || g.modulus() != self.p {
            return None;
        }
        let g_monic = g.make_monic()?;
        let mut f: Vec<ExtElem> = g_monic
            .coeffs()
            .iter()
            .map(|&c| self.from_scalar(c))
            .collect();

        let mut attempts = 0usize;
        while f.len() > 2 {
            attempts += 1;
            if attempts > 1 << 12 {
                return None;
            }
            let h = self.poly_gcd(&self.split_candidate(&f, rng), &f);
            if h.len() <= 1 || h.len() == f.len() {
                continue;
            }
            let (other, _) = self.poly_div_rem(&f, &h)?;
            f = if h.len() <= other.len() { h } else { other };
        }
        let f = self.poly_monic(&f)?;
        // f = Y + c0
        Some(self.sub(&self.zero(), &f[0]))
    }

    /// Solves `A x = b` over `E`, where `a` is square and row-major. Pivots
    /// must be units; returns `None` when no unit pivot exists in a column.
    pub fn solve_linear(&self, a: &[Vec<ExtElem>], b: &[ExtElem]) -> Option<Vec<ExtElem>> {
        let n = b.len();
        assert_eq!(a.len(), n, "solve_linear: matrix must be square");
        let mut rows: Vec<Vec<ExtElem>> = a
            .iter()
            .zip(b)
            .map(|(row, rhs)| {
                assert_eq!(row.len(), n, "solve_linear: matrix must be square");
                let mut row = row.clone();
                row.push(rhs.clone());
                row
            })
            .collect();

        for col in 0..n {
            let pivot = (col..n).find(|&r| self.is_unit(&rows[r][col]))?;
            rows.swap(col, pivot);
            let inv = self.inv(&rows[col][col])?;
            for entry in rows[col].iter_mut() {
                *entry = self.mul(entry, &inv);
            }
            for r in 0..n {
                if r == col || rows[r][col].is_zero() {
                    continue;
                }
                let factor = rows[r][col].clone();
                for c in col..=n {
                    let delta = self.mul(&factor, &rows[col][c]);
                    rows[r][c] = self.sub(&rows[r][c], &delta);
                }
            }
        }
        Some(rows.into_iter().map(|mut row| row.swap_remove(n)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn gf16() -> ExtRing {
        // x^4 + x + 1 over GF(2)
        ExtRing::new(ModPoly::from_coeffs(&[1, 1, 0, 0, 1], 2), 2)
    }

    #[test]
    fn inverse_in_gf16() {
        let field = gf16();
        let a = ModPoly::from_coeffs(&[1, 0, 1], 2);
        let inv = field.inv(&a).unwrap();
        assert!(field.mul(&a, &inv).is_one());
        assert!(field.inv(&field.zero()).is_none());
    }

    #[test]
    fn frobenius_has_order_degree() {
        let field = gf16();
        let a = ModPoly::from_coeffs(&[0, 1, 1], 2);
        let mut b = a.clone();
        for _ in 0..4 {
            b = field.frobenius(&b);
        }
        assert_eq!(b, a);
        assert_eq!(field.frobenius(&a), field.pow(&a, 2));
    }

    #[test]
    fn finds_root_of_subfield_polynomial() {
        // x^2 + x + 1 has its roots in GF(4), a subfield of GF(16).
        let field = gf16();
        let g = ModPoly::from_coeffs(&[1, 1, 1], 2);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let w = field.find_root(&g, &mut rng).unwrap();
        let value = field.add(&field.add(&field.mul(&w, &w), &w), &field.one());
        assert!(value.is_zero());
    }

    #[test]
    fn finds_root_over_odd_characteristic() {
        // GF(49) = GF(7)[x]/(x^2 + 1); x^2 - 3 has no root in GF(7).
        let field = ExtRing::new(ModPoly::from_coeffs(&[1, 0, 1], 7), 7);
        let g = ModPoly::from_signed(&[-3, 0, 1], 7);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let w = field.find_root(&g, &mut rng).unwrap();
        let value = field.sub(&field.mul(&w, &w), &field.from_scalar(3));
        assert!(value.is_zero());
    }

    #[test]
    fn solves_small_system() {
        let field = gf16();
        let x = ModPoly::x(2);
        let one = field.one();
        // [[1, x], [x, 1]] * [1, 1] = [1 + x, 1 + x]
        let a = vec![vec![one.clone(), x.clone()], vec![x.clone(), one.clone()]];
        let b = vec![field.add(&one, &x), field.add(&one, &x)];
        let sol = field.solve_linear(&a, &b).unwrap();
        assert_eq!(sol, vec![one.clone(), one]);
    }
}
