//! Repository layer — storage operations scoped per stored aggregate.

pub mod pattern;
pub mod prescription;
