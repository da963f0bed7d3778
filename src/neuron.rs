//! The neuron state machine: potential integration, refractory timing,
//! chemical threshold effects, and movement.

use std::collections::VecDeque;

use crate::config::ChemistryConfig;
use crate::geometry::Position16;
use crate::ids::{Cycle, NeuronId};

/// What a neuron is and what sign of pulse it emits when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeuronType {
    Excitatory,
    Inhibitory,
    Dopaminergic,
    Input,
    Output,
}

impl NeuronType {
    /// The base signal value a pulse from this neuron carries.
    /// Dopaminergic neurons emit no synaptic pulse (0): they drive
    /// chemistry only.
    pub fn emitted_signal(&self) -> f64 {
        match self {
            NeuronType::Excitatory | NeuronType::Input | NeuronType::Output => 1.0,
            NeuronType::Inhibitory => -1.0,
            NeuronType::Dopaminergic => 0.0,
        }
    }
}

/// Position in the refractory state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeuronState {
    Resting,
    Firing,
    AbsoluteRefractory,
    RelativeRefractory,
}

/// A single neuron: identity, position, refractory state, and the
/// accumulated potential that drives it toward firing.
#[derive(Debug, Clone)]
pub struct Neuron {
    pub id: NeuronId,
    pub kind: NeuronType,
    pub position: Position16,
    pub velocity: Position16,
    pub state: NeuronState,
    pub potential: f64,
    pub base_threshold: f64,
    pub current_threshold: f64,
    pub last_fired: Option<Cycle>,
    cycles_in_state: u32,
    /// Ring buffer of whether this neuron fired, one slot per recent cycle,
    /// oldest first. Used by the firing-rate output mode; capacity is set
    /// by the caller via [`Neuron::record_fire_history`].
    fire_history: VecDeque<bool>,
}

impl Neuron {
    /// Create a freshly-placed neuron at rest.
    pub fn new(id: NeuronId, kind: NeuronType, position: Position16, base_threshold: f64) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Position16::ZERO,
            state: NeuronState::Resting,
            potential: 0.0,
            base_threshold,
            current_threshold: base_threshold,
            last_fired: None,
            cycles_in_state: 0,
            fire_history: VecDeque::new(),
        }
    }

    pub fn is_absolute_refractory(&self) -> bool {
        matches!(self.state, NeuronState::AbsoluteRefractory)
    }

    /// Whether this neuron is eligible to accumulate potential and fire.
    pub fn can_integrate(&self) -> bool {
        !matches!(self.state, NeuronState::AbsoluteRefractory | NeuronState::Firing)
    }

    /// Add `amount` to accumulated potential. Rejected while in
    /// `AbsoluteRefractory` or already `Firing`, per the state machine.
    /// Returns whether the integration was accepted.
    pub fn integrate(&mut self, amount: f64) -> bool {
        if !self.can_integrate() {
            return false;
        }
        self.potential += amount;
        true
    }

    /// Whether accumulated potential has crossed the current threshold from
    /// a state that permits firing (`Resting` or `RelativeRefractory`).
    pub fn crossed_threshold(&self) -> bool {
        matches!(self.state, NeuronState::Resting | NeuronState::RelativeRefractory)
            && self.potential >= self.current_threshold
    }

    /// Transition into `Firing`, recording the cycle it fired on. This is
    /// the single point at which `last_fired` is set, matching the
    /// refractory property that a neuron "fires at cycle c".
    pub fn enter_firing(&mut self, cycle: Cycle) {
        self.state = NeuronState::Firing;
        self.last_fired = Some(cycle);
        self.cycles_in_state = 0;
    }

    /// Exponential decay of accumulated potential, applied once per cycle
    /// before pulse delivery. Snaps to exactly 0 below a small epsilon so
    /// idle neurons settle instead of drifting forever.
    pub fn decay_potential(&mut self, rate: f64) {
        self.potential *= 1.0 - rate;
        if self.potential.abs() < 1e-5 {
            self.potential = 0.0;
        }
    }

    /// Advance the purely time-based refractory transitions:
    /// `Firing -> AbsoluteRefractory -> RelativeRefractory -> Resting`.
    /// Threshold-triggered transitions are handled separately in the
    /// firing step of the pipeline.
    pub fn advance_refractory_timing(&mut self, absolute_cycles: u32, relative_cycles: u32) {
        match self.state {
            NeuronState::Firing => {
                self.state = NeuronState::AbsoluteRefractory;
                self.potential = 0.0;
                self.cycles_in_state = 0;
            }
            NeuronState::AbsoluteRefractory => {
                self.cycles_in_state += 1;
                if self.cycles_in_state >= absolute_cycles {
                    self.state = NeuronState::RelativeRefractory;
                    self.cycles_in_state = 0;
                }
            }
            NeuronState::RelativeRefractory => {
                self.cycles_in_state += 1;
                if self.cycles_in_state >= relative_cycles {
                    self.state = NeuronState::Resting;
                    self.cycles_in_state = 0;
                }
            }
            NeuronState::Resting => {}
        }
    }

    /// Recompute `current_threshold` from normalized chemical levels. Floored
    /// at a small positive value so a neuron can always eventually fire.
    pub fn apply_chemical_threshold(&mut self, norm_cortisol: f64, norm_dopamine: f64, cfg: &ChemistryConfig) {
        let raised = self.base_threshold
            * (1.0 + cfg.firing_threshold_increase_on_cort * norm_cortisol)
            * (1.0 + cfg.firing_threshold_increase_on_dopa * norm_dopamine);
        self.current_threshold = raised.max(0.01);
    }

    /// The Hebbian activity signal for this cycle: 1.0 if the neuron fired,
    /// otherwise accumulated potential normalized against its current
    /// threshold and clamped to `[0, 1]`.
    pub fn activity_signal(&self, fired_this_cycle: bool) -> f64 {
        if fired_this_cycle {
            1.0
        } else if self.current_threshold > 0.0 {
            (self.potential.abs() / self.current_threshold).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Apply a movement delta from synaptogenesis, keeping the neuron
    /// inside the hypersphere of the given radius.
    pub fn move_by(&mut self, delta: Position16, space_max_dimension: f64) {
        self.position = self.position.add(&delta).clamp_to_hypersphere(space_max_dimension);
    }

    /// Clear accumulated potential without touching refractory state,
    /// weights, position, or chemistry — used by pattern reset.
    pub fn reset_transient(&mut self) {
        self.potential = 0.0;
    }

    /// Push this cycle's fire bit onto the ring buffer, keeping at most
    /// `capacity` most recent entries.
    pub fn record_fire_history(&mut self, fired: bool, capacity: usize) {
        if capacity == 0 {
            return;
        }
        self.fire_history.push_back(fired);
        while self.fire_history.len() > capacity {
            self.fire_history.pop_front();
        }
    }

    /// Fraction of recorded cycles in which this neuron fired.
    pub fn firing_rate(&self) -> f64 {
        if self.fire_history.is_empty() {
            return 0.0;
        }
        let fired = self.fire_history.iter().filter(|&&f| f).count();
        fired as f64 / self.fire_history.len() as f64
    }

    /// Whether this neuron fired within `window` cycles of `current_cycle`,
    /// inclusive, used for Hebbian eligibility and synaptogenesis coincidence.
    pub fn fired_within(&self, current_cycle: Cycle, window: u32) -> bool {
        match self.last_fired {
            Some(fired_at) => current_cycle.raw().saturating_sub(fired_at.raw()) <= window as u64,
            None => false,
        }
    }
}
