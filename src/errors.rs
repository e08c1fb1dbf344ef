use thiserror::Error;

use crate::residue::CoderTag;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlgebraError {
    #[error("ring modulus m must be in [2, {max}], got {m}", max = crate::algebra::MAX_M)]
    InvalidModulus { m: u64 },
    #[error("plaintext base {p} is not prime")]
    NotPrime { p: u64 },
    #[error("prime {p} divides the ring modulus {m}")]
    PrimeDividesModulus { p: u64, m: u64 },
    #[error("generators {gens:?} do not span (Z/{m}Z)*/<{p}>")]
    NonSpanningGenerators { m: u64, p: u64, gens: Vec<u64> },
    #[error("generator {generator} raised to its order {order} is not a power of {p} mod {m}")]
    InvalidGeneratorOrder {
        m: u64,
        p: u64,
        generator: u64,
        order: usize,
    },
    #[error("generator count mismatch: {gens} generators but {orders} orders")]
    GeneratorOrderMismatch { gens: usize, orders: usize },
    #[error("invalid exponent r = {r} for base {p}: p^r must fit in 62 bits")]
    InvalidExponent { p: u64, r: u32 },
    #[error("CRT coefficient for slot {slot} is not invertible")]
    NonInvertibleCrt { slot: usize },
    #[error("factorization failed: {message}")]
    FactorizationFailed { message: String },
    #[error("invalid slot mapping: {reason}")]
    InvalidMapping { reason: String },
    #[error("slot count mismatch: expected {expected}, got {actual}")]
    SlotCountMismatch { expected: usize, actual: usize },
    #[error("modulus mismatch: expected {expected}, got {actual}")]
    ModulusMismatch { expected: u64, actual: u64 },
    #[error("{operation} is not supported by the {tag:?} plaintext algebra")]
    UnsupportedOperation {
        operation: &'static str,
        tag: CoderTag,
    },
}

pub type AlgebraResult<T> = Result<T, AlgebraError>;
