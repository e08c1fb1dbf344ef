use super::primes::{factorize, mul_mod};

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

pub fn extended_gcd(a: i128, b: i128) -> (i128, i128, i128) {
    if a == 0 {
        (b, 0, 1)
    } else {
        let (g, x, y) = extended_gcd(b % a, a);
        (g, y - (b / a) * x, x)
    }
}

/// Inverse of `a` modulo `m`, or `None` when `gcd(a, m) != 1`.
pub fn mod_inverse(a: u64, m: u64) -> Option<u64> {
    if m == 1 {
        return Some(0);
    }
    let (g, x, _) = extended_gcd((a % m) as i128, m as i128);
    if g != 1 {
        return None;
    }
    Some(x.rem_euclid(m as i128) as u64)
}

#[inline]
pub fn add_mod(a: u64, b: u64, modulus: u64) -> u64 {
    ((a as u128 + b as u128) % modulus as u128) as u64
}

#[inline]
pub fn sub_mod(a: u64, b: u64, modulus: u64) -> u64 {
    if a >= b { a - b } else { modulus - (b - a) }
}

/// Euler's totient from a prime-power factorization.
pub fn euler_phi(factorization: &[(u64, u32)]) -> u64 {
    factorization
        .iter()
        .map(|&(q, e)| (q - 1) * q.pow(e - 1))
        .product()
}

/// Mobius function of `n`.
pub fn mobius(n: u64) -> i32 {
    let factors = factorize(n);
    if factors.iter().any(|&(_, e)| e > 1) {
        0
    } else if factors.len() % 2 == 0 {
        1
    } else {
        -1
    }
}

/// All positive divisors of `n` in increasing order.
pub fn divisors(n: u64) -> Vec<u64> {
    let mut divs = vec![1u64];
    for (q, e) in factorize(n) {
        let current = divs.clone();
        let mut power = 1u64;
        for _ in 0..e {
            power *= q;
            divs.extend(current.iter().map(|d| d * power));
        }
    }
    divs.sort_unstable();
    divs
}

/// Multiplicative order of `a` modulo `m`, computed by repeated
/// multiplication. `None` when `a` is not a unit.
pub fn multiplicative_order(a: u64, m: u64) -> Option<u64> {
    if m == 1 {
        return Some(1);
    }
    let a = a % m;
    if gcd(a, m) != 1 {
        return None;
    }
    let mut x = a;
    let mut k = 1u64;
    while x != 1 {
        x = mul_mod(x, a, m);
        k += 1;
    }
    Some(k)
}

/// Lifts `a mod q^e` to the residue mod `m` that is `1` on every other
/// prime-power component of `m`.
pub fn crt_lift_component(a: u64, prime_power: u64, m: u64) -> u64 {
    let rest = m / prime_power;
    if rest == 1 {
        return a % m;
    }
    let Some(inv) = mod_inverse(rest % prime_power, prime_power) else {
        panic!("crt_lift_component: {prime_power} is not a coprime component of {m}");
    };
    let shift = mul_mod(
        sub_mod(a % prime_power, 1 % prime_power, prime_power),
        inv,
        prime_power,
    );
    (1 + rest as u128 * shift as u128) as u64 % m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_and_gcd() {
        assert_eq!(gcd(45, 317), 1);
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(mod_inverse(3, 7), Some(5));
        assert_eq!(mod_inverse(6, 9), None);
        assert_eq!(mod_inverse(0, 1), Some(0));
    }

    #[test]
    fn totient_and_mobius() {
        assert_eq!(euler_phi(&factorize(45)), 24);
        assert_eq!(euler_phi(&factorize(128)), 64);
        assert_eq!(euler_phi(&factorize(15)), 8);
        assert_eq!(mobius(1), 1);
        assert_eq!(mobius(15), 1);
        assert_eq!(mobius(30), -1);
        assert_eq!(mobius(45), 0);
        assert_eq!(divisors(45), vec![1, 3, 5, 9, 15, 45]);
    }

    #[test]
    fn orders_modulo_m() {
        assert_eq!(multiplicative_order(317, 45), Some(12));
        assert_eq!(multiplicative_order(2, 15), Some(4));
        assert_eq!(multiplicative_order(257, 128), Some(1));
        assert_eq!(multiplicative_order(3, 15), None);
    }

    #[test]
    fn crt_lift_is_one_elsewhere() {
        let x = crt_lift_component(2, 3, 15);
        assert_eq!(x % 3, 2);
        assert_eq!(x % 5, 1);
        let y = crt_lift_component(2, 5, 15);
        assert_eq!(y % 5, 2);
        assert_eq!(y % 3, 1);
        assert_eq!(crt_lift_component(5, 128, 128), 5);
    }
}
