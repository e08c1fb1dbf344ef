pub mod primes;
pub mod utils;

pub use primes::{factorize, is_prime, mod_pow, mul_mod, primitive_root_mod_prime_power};
pub use utils::{
    add_mod, divisors, euler_phi, gcd, mobius, mod_inverse, multiplicative_order, sub_mod,
};
