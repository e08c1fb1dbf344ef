pub mod cyclotomic;
pub mod extension;
pub mod factor;
pub mod matrix;
pub mod poly;

pub use cyclotomic::{IntPoly, cyclotomic};
pub use extension::ExtRing;
pub use matrix::ZqMatrix;
pub use poly::ModPoly;
