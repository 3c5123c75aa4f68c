//! Password helpers that never touch a vault: the strength advisory
//! and the random generator.

pub mod generator;
pub mod strength;

pub use generator::generate;
pub use strength::{evaluate, Criterion};
