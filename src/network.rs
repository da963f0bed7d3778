//! The engine: owns every component, runs the per-cycle pipeline, and
//! exposes the `sim`/`expose`/`observe` mode entry points.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::chemistry::ChemicalState;
use crate::config::Config;
use crate::error::{CrowNetError, Result};
use crate::geometry::Position16;
use crate::ids::{Cycle, NeuronId};
use crate::neuron::{Neuron, NeuronType};
use crate::pattern::{self, FrequencyStimulus};
use crate::pulse::PulseList;
use crate::rng::EngineRng;
use crate::spatial::SpatialIndex;
use crate::synaptogenesis;
use crate::weights::Weights;

/// A point-in-time snapshot of engine-wide state, useful for logging or
/// external reporting without holding a reference into the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStats {
    pub cycle: Cycle,
    pub cortisol: f64,
    pub dopamine: f64,
    pub learning_rate_factor: f64,
    pub synaptogenesis_factor: f64,
    pub active_pulse_count: usize,
    pub neuron_count: usize,
}

/// Owns the entire simulated network and advances it one cycle at a time.
pub struct Engine {
    config: Config,
    neurons: Vec<Neuron>,
    weights: Weights,
    chemistry: ChemicalState,
    pulses: PulseList,
    spatial: SpatialIndex,
    rng: EngineRng,
    cycle: Cycle,
    input_ids: Vec<NeuronId>,
    output_ids: Vec<NeuronId>,
    learning_enabled: bool,
    chemistry_enabled: bool,
    synaptogenesis_enabled: bool,
}

impl Engine {
    /// Construct and lay out a new network from a validated configuration.
    /// This is the engine's single constructor: there is no separate
    /// "default config" path, matching the collapsed constructor called
    /// for in the re-architecture guidance.
    pub fn build(config: Config) -> Result<Self> {
        config.validate()?;

        let s = &config.structure;
        let internal = s.total_neurons - s.min_input_neurons - s.min_output_neurons;
        let t = &config.neuron_types;
        let dopaminergic_count = (t.dopaminergic_percent * internal as f64).floor() as usize;
        let inhibitory_count = (t.inhibitory_percent * internal as f64).floor() as usize;
        let excitatory_count = internal - dopaminergic_count - inhibitory_count;

        let mut kinds = Vec::with_capacity(s.total_neurons);
        kinds.extend(std::iter::repeat(NeuronType::Input).take(s.min_input_neurons));
        kinds.extend(std::iter::repeat(NeuronType::Output).take(s.min_output_neurons));
        kinds.extend(std::iter::repeat(NeuronType::Dopaminergic).take(dopaminergic_count));
        kinds.extend(std::iter::repeat(NeuronType::Inhibitory).take(inhibitory_count));
        kinds.extend(std::iter::repeat(NeuronType::Excitatory).take(excitatory_count));

        let mut rng = EngineRng::new(s.seed);
        log::info!(
            "building engine: {} neurons (in={} out={} dopa={} inhib={} excit={}), seed={}",
            s.total_neurons,
            s.min_input_neurons,
            s.min_output_neurons,
            dopaminergic_count,
            inhibitory_count,
            excitatory_count,
            rng.seed(),
        );

        let mut neurons = Vec::with_capacity(s.total_neurons);
        for (i, kind) in kinds.into_iter().enumerate() {
            let radius_factor = match kind {
                NeuronType::Dopaminergic => t.dopaminergic_radius_factor,
                NeuronType::Inhibitory => t.inhibitory_radius_factor,
                NeuronType::Excitatory | NeuronType::Input | NeuronType::Output => {
                    t.excitatory_radius_factor
                }
            };
            let radius = s.space_max_dimension * radius_factor;
            let position = Position16::random_in_ball(&mut rng, radius);
            neurons.push(Neuron::new(
                NeuronId::new(i as u32),
                kind,
                position,
                config.neuron_behavior.base_firing_threshold,
            ));
        }

        let all_ids: Vec<NeuronId> = neurons.iter().map(|n| n.id).collect();
        let input_ids = all_ids[..s.min_input_neurons].to_vec();
        let output_ids = all_ids[s.min_input_neurons..s.min_input_neurons + s.min_output_neurons].to_vec();

        let cell_size = (s.space_max_dimension / 8.0).max(0.5);
        let mut spatial = SpatialIndex::new(cell_size);
        spatial.rebuild(neurons.iter().map(|n| (n.id, n.position)));

        let mut weights = Weights::new();
        weights.initialize(&mut rng, &all_ids, &config.weights);

        Ok(Self {
            config,
            neurons,
            weights,
            chemistry: ChemicalState::new(),
            pulses: PulseList::new(),
            spatial,
            rng,
            cycle: Cycle::ZERO,
            input_ids,
            output_ids,
            learning_enabled: true,
            chemistry_enabled: true,
            synaptogenesis_enabled: true,
        })
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Mutable access to the neuron population, for calibrating a network
    /// by hand (fixed positions, forced states) ahead of a scripted run.
    pub fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Mutable access to the weight map, for installing hand-picked
    /// connections ahead of a scripted run.
    pub fn weights_mut(&mut self) -> &mut Weights {
        &mut self.weights
    }

    pub fn pulses(&self) -> &crate::pulse::PulseList {
        &self.pulses
    }

    /// Rebuild the spatial index from current neuron positions. Needed
    /// after hand-editing positions via [`Engine::neurons_mut`]; the normal
    /// per-cycle pipeline keeps the index current on its own.
    pub fn rebuild_spatial_index(&mut self) {
        self.spatial.rebuild(self.neurons.iter().map(|n| (n.id, n.position)));
    }

    pub fn chemistry(&self) -> ChemicalState {
        self.chemistry
    }

    pub fn input_ids(&self) -> &[NeuronId] {
        &self.input_ids
    }

    pub fn output_ids(&self) -> &[NeuronId] {
        &self.output_ids
    }

    pub fn set_learning_enabled(&mut self, enabled: bool) {
        self.learning_enabled = enabled;
    }

    pub fn set_chemistry_enabled(&mut self, enabled: bool) {
        self.chemistry_enabled = enabled;
    }

    pub fn set_synaptogenesis_enabled(&mut self, enabled: bool) {
        self.synaptogenesis_enabled = enabled;
    }

    fn max_travel_radius(&self) -> f64 {
        self.config.structure.space_max_dimension * 2.0
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cycle: self.cycle,
            cortisol: self.chemistry.cortisol,
            dopamine: self.chemistry.dopamine,
            learning_rate_factor: self.chemistry.learning_rate_factor,
            synaptogenesis_factor: self.chemistry.synaptogenesis_factor,
            active_pulse_count: self.pulses.len(),
            neuron_count: self.neurons.len(),
        }
    }

    /// Clear accumulated potentials and the active pulse list, leaving
    /// weights, positions, and chemistry untouched.
    pub fn reset_for_new_pattern(&mut self) {
        pattern::reset_for_new_pattern(&mut self.neurons, &mut self.pulses);
    }

    /// Read the current Output-neuron activation vector.
    pub fn read_output(&self) -> Vec<f64> {
        pattern::read_output(&self.output_ids, &self.neurons, self.config.output_mode)
    }

    /// Replace the current weight map, e.g. after loading a prior run's
    /// weights for `observe`.
    pub fn load_weights(&mut self, weights: Weights) {
        self.weights = weights;
    }

    #[cfg(feature = "persistence")]
    pub fn load_weights_from_json_reader<R: std::io::Read>(&mut self, reader: R) -> Result<()> {
        self.weights = Weights::from_json_reader(reader)?;
        Ok(())
    }

    #[cfg(feature = "persistence")]
    pub fn save_weights_to_json_writer<W: std::io::Write>(&self, writer: W) -> Result<()> {
        self.weights.to_json_writer(writer)
    }

    /// Advance the network by exactly one cycle: the central invariant of
    /// the whole engine (steps 1-12). `stimulus` and `pattern` are the two
    /// ways external callers can force input this cycle; either may be
    /// `None`.
    pub fn advance_cycle(
        &mut self,
        stimulus: Option<&FrequencyStimulus>,
        pattern: Option<&[f64]>,
    ) -> Result<()> {
        let c = self.cycle;
        let max_travel_radius = self.max_travel_radius();
        let behavior = &self.config.neuron_behavior;

        // Step 2: read inputs.
        if let Some(stim) = stimulus {
            pattern::apply_frequency_stimulus(
                stim,
                &mut self.neurons,
                c,
                self.config.structure.cycles_per_second,
                max_travel_radius,
                &mut self.pulses,
                &mut self.rng,
            )?;
        }
        if let Some(p) = pattern {
            pattern::present_pattern(
                p,
                &self.input_ids,
                &mut self.neurons,
                c,
                max_travel_radius,
                &mut self.pulses,
            )?;
        }

        // Step 3: decay potential, advance purely time-based refractory transitions.
        #[cfg(feature = "parallel")]
        self.neurons.par_iter_mut().for_each(|n| {
            n.decay_potential(behavior.accumulated_pulse_decay_rate);
            n.advance_refractory_timing(behavior.absolute_refractory_cycles, behavior.relative_refractory_cycles);
        });
        #[cfg(not(feature = "parallel"))]
        for n in self.neurons.iter_mut() {
            n.decay_potential(behavior.accumulated_pulse_decay_rate);
            n.advance_refractory_timing(behavior.absolute_refractory_cycles, behavior.relative_refractory_cycles);
        }

        // Steps 4-6: pulse propagation, delivery, firing, and commit.
        let outcome = self.pulses.process_cycle(
            c,
            behavior.pulse_propagation_speed,
            Position16::ZERO,
            self.config.chemistry.cortisol_gland_sensitivity_radius,
            &mut self.neurons,
            &self.weights,
            &self.spatial,
        );
        self.pulses.commit_pending();

        let dopaminergic_fires = outcome
            .newly_fired
            .iter()
            .filter(|&&id| self.neurons[id.raw() as usize].kind == NeuronType::Dopaminergic)
            .count();

        // Step 7: Hebbian update over eligible pairs only. Eligibility (per
        // the Hebbian-eligibility glossary entry): both endpoints must have
        // fired within `hebbian_coincidence_window` cycles of this cycle,
        // the same recency test synaptogenesis uses for coincidence.
        if self.learning_enabled {
            let effective_lr = self.config.weights.base_learning_rate * self.chemistry.learning_rate_factor;
            let window = self.config.weights.hebbian_coincidence_window;
            for (pre, post) in self.weights.pairs() {
                let pre_eligible = self.neurons[pre.raw() as usize].fired_within(c, window);
                let post_eligible = self.neurons[post.raw() as usize].fired_within(c, window);
                if !pre_eligible || !post_eligible {
                    continue;
                }
                let pre_fired = self.neurons[pre.raw() as usize].last_fired == Some(c);
                let post_fired = self.neurons[post.raw() as usize].last_fired == Some(c);
                let pre_activity = self.neurons[pre.raw() as usize].activity_signal(pre_fired);
                let post_activity = self.neurons[post.raw() as usize].activity_signal(post_fired);
                self.weights.hebbian_update(
                    pre,
                    post,
                    effective_lr,
                    pre_activity,
                    post_activity,
                    self.config.weights.hebb_positive_reinforce_factor,
                    self.config.weights.hebb_negative_reinforce_factor,
                    self.config.weights.max_synaptic_weight,
                );
            }
        }

        // Step 8: weight decay.
        if self.config.weights.synaptic_weight_decay_rate > 0.0 {
            self.weights.decay_all(self.config.weights.synaptic_weight_decay_rate, 1e-6);
        }

        // Step 9-10: neurochemistry and its threshold effect.
        if self.chemistry_enabled {
            self.chemistry.update(outcome.cortisol_hits, dopaminergic_fires, &self.config.chemistry);
            log::debug!(
                "cycle {}: cortisol={:.4} dopamine={:.4} lr_factor={:.4}",
                c,
                self.chemistry.cortisol,
                self.chemistry.dopamine,
                self.chemistry.learning_rate_factor,
            );
            let norm_cort = self.chemistry.normalized_cortisol(&self.config.chemistry);
            let norm_dopa = self.chemistry.normalized_dopamine(&self.config.chemistry);
            for n in self.neurons.iter_mut() {
                n.apply_chemical_threshold(norm_cort, norm_dopa, &self.config.chemistry);
            }
        }

        for n in self.neurons.iter_mut() {
            let fired = n.last_fired == Some(c);
            n.record_fire_history(fired, self.config.structure.output_frequency_window_cycles);
        }

        // Step 11: synaptogenesis.
        if self.synaptogenesis_enabled {
            synaptogenesis::apply(
                &mut self.neurons,
                &self.spatial,
                c,
                &self.config.synaptogenesis,
                self.config.weights.hebbian_coincidence_window,
                self.chemistry.synaptogenesis_factor,
                self.config.structure.space_max_dimension,
            );
            self.spatial.rebuild(self.neurons.iter().map(|n| (n.id, n.position)));
        }

        // Step 12.
        self.cycle = self.cycle.next();
        Ok(())
    }

    /// `sim`: run `cycles` cycles with an optional bound frequency
    /// stimulus, with no pattern presentation.
    pub fn sim(&mut self, stimulus: Option<FrequencyStimulus>, cycles: u32) -> Result<()> {
        for _ in 0..cycles {
            self.advance_cycle(stimulus.as_ref(), None)?;
        }
        Ok(())
    }

    /// `expose`: for each epoch, present every pattern in turn, settle for
    /// `cycles_per_pattern` cycles, and reset transient state in between.
    pub fn expose(&mut self, patterns: &[Vec<f64>], epochs: u32, cycles_per_pattern: u32) -> Result<()> {
        if cycles_per_pattern == 0 {
            return Err(CrowNetError::invalid_request("cycles_per_pattern must be positive"));
        }
        for _ in 0..epochs {
            for pattern in patterns {
                self.reset_for_new_pattern();
                self.advance_cycle(None, Some(pattern))?;
                for _ in 1..cycles_per_pattern {
                    self.advance_cycle(None, None)?;
                }
            }
        }
        Ok(())
    }

    /// `observe`: disable learning/chemistry/synaptogenesis, install the
    /// given (mandatory) trained weights, present one pattern, settle for
    /// `cycles_to_settle` cycles, and return the Output activation vector.
    /// Weights are a required parameter rather than optional state so a
    /// caller cannot observe against the engine's randomly-initialized
    /// weights by omission.
    pub fn observe(&mut self, weights: Weights, pattern: &[f64], cycles_to_settle: u32) -> Result<Vec<f64>> {
        self.load_weights(weights);
        self.set_learning_enabled(false);
        self.set_chemistry_enabled(false);
        self.set_synaptogenesis_enabled(false);
        self.reset_for_new_pattern();
        self.advance_cycle(None, Some(pattern))?;
        for _ in 1..cycles_to_settle {
            self.advance_cycle(None, None)?;
        }
        Ok(self.read_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut cfg = Config::default();
        cfg.structure.total_neurons = 30;
        cfg.structure.min_input_neurons = 5;
        cfg.structure.min_output_neurons = 5;
        cfg.structure.seed = 12345;
        cfg
    }

    #[test]
    fn build_produces_correct_type_counts() {
        let cfg = small_config();
        let engine = Engine::build(cfg.clone()).unwrap();
        let input_count = engine.neurons.iter().filter(|n| n.kind == NeuronType::Input).count();
        let output_count = engine.neurons.iter().filter(|n| n.kind == NeuronType::Output).count();
        assert_eq!(input_count, cfg.structure.min_input_neurons);
        assert_eq!(output_count, cfg.structure.min_output_neurons);
        assert_eq!(engine.neurons.len(), cfg.structure.total_neurons);
    }

    #[test]
    fn rejects_undersized_total() {
        let mut cfg = small_config();
        cfg.structure.total_neurons = 3;
        assert!(Engine::build(cfg).is_err());
    }

    #[test]
    fn determinism_same_seed_same_trajectory() {
        let cfg = small_config();
        let mut a = Engine::build(cfg.clone()).unwrap();
        let mut b = Engine::build(cfg).unwrap();
        for _ in 0..20 {
            a.advance_cycle(None, None).unwrap();
            b.advance_cycle(None, None).unwrap();
        }
        for (na, nb) in a.neurons.iter().zip(b.neurons.iter()) {
            assert_eq!(na.position.0, nb.position.0);
            assert_eq!(na.potential, nb.potential);
        }
        assert_eq!(a.chemistry, b.chemistry);
    }

    #[test]
    fn zero_input_decay_settles_chemistry_and_potentials() {
        let cfg = small_config();
        let mut engine = Engine::build(cfg).unwrap();
        for _ in 0..100 {
            engine.advance_cycle(None, None).unwrap();
        }
        assert!(engine.chemistry.cortisol < 0.05);
        assert!(engine.chemistry.dopamine < 0.05);
        assert_eq!(engine.pulses.len(), 0);
        for n in &engine.neurons {
            assert!(n.potential.abs() < 1e-3);
        }
    }

    #[test]
    fn weight_invariants_hold_after_many_cycles() {
        let cfg = small_config();
        let mut engine = Engine::build(cfg.clone()).unwrap();
        for _ in 0..50 {
            engine.advance_cycle(None, None).unwrap();
        }
        for (pre, post) in engine.weights.pairs() {
            assert!(engine.weights.get(pre, post).abs() <= cfg.weights.max_synaptic_weight + 1e-9);
        }
        for n in &engine.neurons {
            assert_eq!(engine.weights.get(n.id, n.id), 0.0);
        }
    }

    #[test]
    fn observe_installs_given_weights_and_disables_dynamics() {
        let cfg = small_config();
        let mut engine = Engine::build(cfg.clone()).unwrap();
        let pattern = vec![1.0; cfg.structure.min_input_neurons];
        let output = engine.observe(Weights::new(), &pattern, 5).unwrap();
        assert_eq!(output.len(), cfg.structure.min_output_neurons);
        assert!(!engine.learning_enabled);
        assert!(!engine.chemistry_enabled);
        assert!(!engine.synaptogenesis_enabled);
    }

    #[test]
    fn expose_rejects_zero_cycles_per_pattern() {
        let cfg = small_config();
        let mut engine = Engine::build(cfg.clone()).unwrap();
        let pattern = vec![1.0; cfg.structure.min_input_neurons];
        let err = engine.expose(&[pattern], 1, 0).unwrap_err();
        assert!(matches!(err, CrowNetError::InvalidRequest { .. }));
    }
}
