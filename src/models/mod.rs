pub mod medication;
pub mod pattern;
pub mod prescription;

pub use medication::*;
pub use pattern::*;
pub use prescription::*;
