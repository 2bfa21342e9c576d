pub mod pivots;

#[cfg(test)]
mod pivots_tests;

pub use pivots::*;
