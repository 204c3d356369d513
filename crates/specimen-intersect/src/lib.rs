//! Intersection of structural schemas.
//!
//! [`resolve`] merges two schema graphs into one that accepts exactly the
//! values both accept, or explains why no such value exists.

mod composed;
mod resolver;
mod scalars;
mod shapes;

pub use resolver::{Resolver, resolve};
