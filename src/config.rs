//! Validated configuration record shared read-only by every component.
//!
//! Mirrors the grouping used in the external interface: structural sizing,
//! neuron type mix, per-neuron behavior, weights/learning, neurochemistry,
//! and synaptogenesis. Every field has a default; [`Config::validate`]
//! checks cross-field constraints once, at construction time.

use crate::error::{CrowNetError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Structural sizing: population counts, pattern geometry, space extent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StructureConfig {
    pub total_neurons: usize,
    pub min_input_neurons: usize,
    pub min_output_neurons: usize,
    pub pattern_height: usize,
    pub pattern_width: usize,
    pub space_max_dimension: f64,
    pub cycles_per_second: f64,
    pub output_frequency_window_cycles: usize,
    /// 0 means "derive from wall-clock nanoseconds at construction time".
    pub seed: u64,
}

impl StructureConfig {
    /// `pattern_height * pattern_width`, the length a presented pattern must have.
    pub fn pattern_size(&self) -> usize {
        self.pattern_height * self.pattern_width
    }
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            total_neurons: 200,
            min_input_neurons: 35,
            min_output_neurons: 10,
            pattern_height: 7,
            pattern_width: 5,
            space_max_dimension: 10.0,
            cycles_per_second: 1000.0,
            output_frequency_window_cycles: 20,
            seed: 0,
        }
    }
}

/// Relative population shares and spatial placement radii by neuron type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NeuronTypeConfig {
    pub dopaminergic_percent: f64,
    pub inhibitory_percent: f64,
    pub excitatory_radius_factor: f64,
    pub dopaminergic_radius_factor: f64,
    pub inhibitory_radius_factor: f64,
}

impl Default for NeuronTypeConfig {
    fn default() -> Self {
        Self {
            dopaminergic_percent: 0.05,
            inhibitory_percent: 0.2,
            excitatory_radius_factor: 1.0,
            dopaminergic_radius_factor: 0.3,
            inhibitory_radius_factor: 0.6,
        }
    }
}

/// Per-neuron dynamics: thresholds, decay, refractory durations, pulse speed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NeuronBehaviorConfig {
    pub base_firing_threshold: f64,
    pub accumulated_pulse_decay_rate: f64,
    pub absolute_refractory_cycles: u32,
    pub relative_refractory_cycles: u32,
    pub pulse_propagation_speed: f64,
}

impl Default for NeuronBehaviorConfig {
    fn default() -> Self {
        Self {
            base_firing_threshold: 0.5,
            accumulated_pulse_decay_rate: 0.05,
            absolute_refractory_cycles: 3,
            relative_refractory_cycles: 5,
            pulse_propagation_speed: 1.0,
        }
    }
}

/// Synaptic initialization, bounds, decay, and Hebbian learning.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WeightsConfig {
    pub initial_synaptic_weight_min: f64,
    pub initial_synaptic_weight_max: f64,
    pub max_synaptic_weight: f64,
    pub synaptic_weight_decay_rate: f64,
    pub hebbian_coincidence_window: u32,
    pub hebb_positive_reinforce_factor: f64,
    pub hebb_negative_reinforce_factor: f64,
    pub base_learning_rate: f64,
    /// Cap on the number of outgoing connections an initial layout may form
    /// per neuron. `None` means dense all-to-all (the default connectivity).
    pub max_initial_connections_per_neuron: Option<usize>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            initial_synaptic_weight_min: 0.0,
            initial_synaptic_weight_max: 0.3,
            max_synaptic_weight: 1.0,
            synaptic_weight_decay_rate: 0.0,
            hebbian_coincidence_window: 3,
            hebb_positive_reinforce_factor: 1.0,
            hebb_negative_reinforce_factor: 0.5,
            base_learning_rate: 0.01,
            max_initial_connections_per_neuron: None,
        }
    }
}

/// Cortisol/dopamine production, decay, and their influence on other systems.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChemistryConfig {
    pub cortisol_production_rate: f64,
    pub cortisol_decay_rate: f64,
    pub cortisol_production_per_hit: f64,
    pub cortisol_max_level: f64,
    pub dopamine_production_rate: f64,
    pub dopamine_decay_rate: f64,
    pub dopamine_production_per_event: f64,
    pub dopamine_max_level: f64,
    pub cortisol_influence_on_lr: f64,
    pub dopamine_influence_on_lr: f64,
    /// Floor under which cortisol/dopamine can never push the learning-rate
    /// factor, however elevated cortisol gets.
    pub min_learning_rate_factor: f64,
    pub cortisol_influence_on_synapto: f64,
    pub dopamine_influence_on_synapto: f64,
    pub firing_threshold_increase_on_cort: f64,
    pub firing_threshold_increase_on_dopa: f64,
    /// Radius around the gland position (the origin) that a pulse shell must
    /// intersect for the pulse to count as a cortisol-producing "hit".
    pub cortisol_gland_sensitivity_radius: f64,
}

impl Default for ChemistryConfig {
    fn default() -> Self {
        Self {
            cortisol_production_rate: 0.001,
            cortisol_decay_rate: 0.05,
            cortisol_production_per_hit: 0.01,
            cortisol_max_level: 1.0,
            dopamine_production_rate: 0.001,
            dopamine_decay_rate: 0.05,
            dopamine_production_per_event: 0.05,
            dopamine_max_level: 1.0,
            cortisol_influence_on_lr: -0.5,
            dopamine_influence_on_lr: 0.5,
            min_learning_rate_factor: 0.1,
            cortisol_influence_on_synapto: -0.5,
            dopamine_influence_on_synapto: 0.3,
            firing_threshold_increase_on_cort: 0.3,
            firing_threshold_increase_on_dopa: -0.1,
            cortisol_gland_sensitivity_radius: 1.0,
        }
    }
}

/// Attraction/repulsion force field driving neuron movement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SynaptogenesisConfig {
    pub synaptogenesis_influence_radius: f64,
    pub attraction_force_factor: f64,
    pub repulsion_force_factor: f64,
    pub dampening_factor: f64,
    pub max_movement_per_cycle: f64,
}

impl Default for SynaptogenesisConfig {
    fn default() -> Self {
        Self {
            synaptogenesis_influence_radius: 2.0,
            attraction_force_factor: 0.01,
            repulsion_force_factor: 0.005,
            dampening_factor: 0.9,
            max_movement_per_cycle: 0.05,
        }
    }
}

/// How [`crate::pattern`] reads an Output neuron's activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputMode {
    /// Accumulated potential at read time.
    Potential,
    /// Firing rate over the last `output_frequency_window_cycles`.
    FiringRate,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Potential
    }
}

/// The complete, validated set of parameters the engine is built from.
///
/// `Config` is immutable once constructed: every component holds a shared
/// reference to it and none may mutate it mid-run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub structure: StructureConfig,
    pub neuron_types: NeuronTypeConfig,
    pub neuron_behavior: NeuronBehaviorConfig,
    pub weights: WeightsConfig,
    pub chemistry: ChemistryConfig,
    pub synaptogenesis: SynaptogenesisConfig,
    pub output_mode: OutputMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            structure: StructureConfig::default(),
            neuron_types: NeuronTypeConfig::default(),
            neuron_behavior: NeuronBehaviorConfig::default(),
            weights: WeightsConfig::default(),
            chemistry: ChemistryConfig::default(),
            synaptogenesis: SynaptogenesisConfig::default(),
            output_mode: OutputMode::default(),
        }
    }
}

impl Config {
    /// Validate every cross-field constraint from the external interface.
    ///
    /// Collects all violations before returning so a caller sees the whole
    /// picture in one error rather than fixing problems one at a time.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let s = &self.structure;
        if s.total_neurons < s.min_input_neurons + s.min_output_neurons {
            errors.push(format!(
                "structure.total_neurons ({}) must be >= min_input_neurons + min_output_neurons ({})",
                s.total_neurons,
                s.min_input_neurons + s.min_output_neurons
            ));
        }
        if s.min_input_neurons == 0 {
            errors.push("structure.min_input_neurons must be positive".to_string());
        }
        if s.min_output_neurons == 0 {
            errors.push("structure.min_output_neurons must be positive".to_string());
        }
        if s.pattern_size() == 0 {
            errors.push("structure.pattern_height * pattern_width must be positive".to_string());
        }
        if s.space_max_dimension <= 0.0 {
            errors.push("structure.space_max_dimension must be positive".to_string());
        }
        if s.cycles_per_second <= 0.0 {
            errors.push("structure.cycles_per_second must be positive".to_string());
        }

        let t = &self.neuron_types;
        if t.dopaminergic_percent < 0.0 || t.inhibitory_percent < 0.0 {
            errors.push("neuron_types percentages must be >= 0".to_string());
        }
        if t.dopaminergic_percent + t.inhibitory_percent > 1.0 {
            errors.push(
                "neuron_types.dopaminergic_percent + inhibitory_percent must be <= 1.0"
                    .to_string(),
            );
        }

        let w = &self.weights;
        if w.initial_synaptic_weight_min < 0.0 {
            errors.push("weights.initial_synaptic_weight_min must be >= 0".to_string());
        }
        if w.initial_synaptic_weight_max < w.initial_synaptic_weight_min {
            errors.push(
                "weights.initial_synaptic_weight_max must be >= initial_synaptic_weight_min"
                    .to_string(),
            );
        }
        if w.max_synaptic_weight < w.initial_synaptic_weight_max {
            errors.push(
                "weights.max_synaptic_weight must be >= initial_synaptic_weight_max".to_string(),
            );
        }
        if w.synaptic_weight_decay_rate < 0.0 {
            errors.push("weights.synaptic_weight_decay_rate must be >= 0".to_string());
        }
        if w.base_learning_rate < 0.0 {
            errors.push("weights.base_learning_rate must be >= 0".to_string());
        }

        for (name, rate) in [
            ("chemistry.cortisol_decay_rate", self.chemistry.cortisol_decay_rate),
            ("chemistry.dopamine_decay_rate", self.chemistry.dopamine_decay_rate),
            (
                "chemistry.cortisol_production_rate",
                self.chemistry.cortisol_production_rate,
            ),
            (
                "chemistry.dopamine_production_rate",
                self.chemistry.dopamine_production_rate,
            ),
        ] {
            if rate < 0.0 {
                errors.push(format!("{name} must be >= 0"));
            }
        }
        if self.chemistry.cortisol_max_level <= 0.0 {
            errors.push("chemistry.cortisol_max_level must be positive".to_string());
        }
        if self.chemistry.dopamine_max_level <= 0.0 {
            errors.push("chemistry.dopamine_max_level must be positive".to_string());
        }

        if self.synaptogenesis.dampening_factor < 0.0 {
            errors.push("synaptogenesis.dampening_factor must be >= 0".to_string());
        }
        if self.synaptogenesis.max_movement_per_cycle < 0.0 {
            errors.push("synaptogenesis.max_movement_per_cycle must be >= 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CrowNetError::invalid_configuration(errors.join("; ")))
        }
    }

    /// Parse a [`Config`] from a TOML document, then validate it.
    #[cfg(feature = "persistence")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a [`Config`] from a TOML file on disk, then validate it.
    #[cfg(feature = "persistence")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize this config to a TOML document.
    #[cfg(feature = "persistence")]
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_undersized_population() {
        let mut config = Config::default();
        config.structure.total_neurons = 1;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CrowNetError::InvalidConfiguration { .. }));
    }

    #[test]
    fn rejects_type_percentages_over_one() {
        let mut config = Config::default();
        config.neuron_types.dopaminergic_percent = 0.7;
        config.neuron_types.inhibitory_percent = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_weight_bounds() {
        let mut config = Config::default();
        config.weights.initial_synaptic_weight_max = 0.1;
        config.weights.max_synaptic_weight = 0.05;
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn toml_roundtrip_preserves_values() {
        let config = Config::default();
        let text = config.to_toml_string().unwrap();
        let parsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn toml_file_roundtrip_via_tempfile() {
        let mut config = Config::default();
        config.structure.seed = 42;
        config.weights.base_learning_rate = 0.05;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crownet.toml");
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = Config::from_toml_file(&path).unwrap();
        assert_eq!(config, loaded);
    }
}
