//! CrowNet: a discrete-time simulator of a self-organizing spiking neural
//! network under neuromodulated Hebbian plasticity.
//!
//! The engine advances a population of neurons through a refractory state
//! machine, propagates expanding spherical pulses through a 16-dimensional
//! space, updates two neurochemical levels that feed back into firing
//! thresholds and learning rate, applies Hebbian weight updates, and moves
//! neurons through a synaptogenesis force field. [`network::Engine`] owns
//! every component and is the crate's single entry point; the `sim`,
//! `expose`, and `observe` modes described in the external interface are
//! all thin callers of [`network::Engine::sim`], [`network::Engine::expose`],
//! and [`network::Engine::observe`].

#![warn(clippy::all)]

pub mod chemistry;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod network;
pub mod neuron;
pub mod pattern;
pub mod pulse;
pub mod rng;
pub mod spatial;
pub mod synaptogenesis;
pub mod weights;

pub use chemistry::ChemicalState;
pub use config::{Config, OutputMode};
pub use error::{CrowNetError, Result};
pub use geometry::Position16;
pub use ids::{Cycle, NeuronId};
pub use network::{Engine, EngineStats};
pub use neuron::{Neuron, NeuronState, NeuronType};
pub use pattern::FrequencyStimulus;
pub use pulse::{Pulse, PulseList};
pub use rng::EngineRng;
pub use weights::Weights;

/// Crate version, useful for compatibility checks against persisted state.
pub const CROWNET_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_integration_builds_and_advances() {
        let mut config = Config::default();
        config.structure.total_neurons = 20;
        config.structure.min_input_neurons = 5;
        config.structure.min_output_neurons = 5;
        config.structure.seed = 1;

        let mut engine = Engine::build(config).unwrap();
        engine.sim(None, 5).unwrap();
        assert_eq!(engine.cycle(), Cycle::new(5));
    }
}
