//! Demo computations registered with a coordinator/worker pair by name.

mod factorial;
mod pi;
mod wordfreq;

pub use factorial::Factorial;
pub use pi::MonteCarloPi;
pub use wordfreq::WordFrequency;

use dda_core::ComputationRegistry;

/// Registers every demo computation under its wire name.
pub fn register_all(registry: &ComputationRegistry) {
    registry.register("fac", || Box::new(Factorial::new()));
    registry.register("wordfreq", || Box::new(WordFrequency::new()));
    registry.register("pi", || Box::new(MonteCarloPi::new()));
}
