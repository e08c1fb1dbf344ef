//! Slot algebra for homomorphic encryption over cyclotomic rings.
//!
//! [`IndexAlgebra`] describes `(Z/mZ)^* / <p>` as a hypercube of slots and
//! carries the factorization of `Phi_m` modulo `p`. A [`PlaintextAlgebra`]
//! pairs it with a coefficient modulus: a [`ResidueCoder`] for `Z/p^rZ`, or a
//! [`ComplexCoder`] for approximate numbers.

pub mod algebra;
pub mod encoding;
pub mod errors;
pub mod hypercube;
pub mod math;
pub mod residue;
pub mod rings;

pub use algebra::{AlgebraParams, IndexAlgebra, IndexAlgebraBuilder};
pub use errors::{AlgebraError, AlgebraResult};
pub use hypercube::CubeSignature;
pub use residue::{CoderTag, ComplexCoder, MappingData, PlaintextAlgebra, ResidueCoder};
pub use rings::{IntPoly, ModPoly};
