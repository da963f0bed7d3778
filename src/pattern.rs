//! Pattern presentation, output reading, and frequency-driven input — the
//! "Input mode contract" used by the `expose`/`observe`/`sim` surfaces.

use crate::config::OutputMode;
use crate::error::{CrowNetError, Result};
use crate::ids::{Cycle, NeuronId};
use crate::neuron::Neuron;
use crate::pulse::{Pulse, PulseList};
use crate::rng::EngineRng;

/// A value above this (out of `{0,1}` or `[0,1]`) counts as an active
/// pattern entry.
pub const PATTERN_ACTIVE_THRESHOLD: f64 = 0.5;

/// A continuous stimulus binding one Input neuron to a target firing rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyStimulus {
    pub neuron: NeuronId,
    pub hz: f64,
}

fn force_fire(
    neuron: &mut Neuron,
    cycle: Cycle,
    max_travel_radius: f64,
    pulses: &mut PulseList,
    respect_absolute_refractory: bool,
) -> bool {
    if neuron.state == crate::neuron::NeuronState::Firing {
        return false;
    }
    if respect_absolute_refractory && neuron.is_absolute_refractory() {
        return false;
    }
    neuron.enter_firing(cycle);
    pulses.enqueue(Pulse::new(
        neuron.id,
        neuron.position,
        neuron.kind.emitted_signal(),
        cycle,
        max_travel_radius,
    ));
    true
}

/// Present a pattern to the Input population: entries above
/// [`PATTERN_ACTIVE_THRESHOLD`] force their corresponding Input neuron into
/// `Firing` this cycle; the rest are left untouched. Unlike the frequency
/// stimulus, a presented pattern overrides absolute refractoriness: the
/// caller is driving the network directly and the forcing is unconditional
/// except for a neuron already mid-fire this cycle.
pub fn present_pattern(
    pattern: &[f64],
    input_ids: &[NeuronId],
    neurons: &mut [Neuron],
    cycle: Cycle,
    max_travel_radius: f64,
    pulses: &mut PulseList,
) -> Result<()> {
    if pattern.len() != input_ids.len() {
        return Err(CrowNetError::invalid_request(format!(
            "pattern length {} does not match input neuron count {}",
            pattern.len(),
            input_ids.len()
        )));
    }
    for (&value, &id) in pattern.iter().zip(input_ids.iter()) {
        if value > PATTERN_ACTIVE_THRESHOLD {
            let idx = id.raw() as usize;
            if let Some(neuron) = neurons.get_mut(idx) {
                force_fire(neuron, cycle, max_travel_radius, pulses, false);
            }
        }
    }
    Ok(())
}

/// Read the current activation of every Output neuron, per the configured
/// [`OutputMode`].
pub fn read_output(output_ids: &[NeuronId], neurons: &[Neuron], mode: OutputMode) -> Vec<f64> {
    output_ids
        .iter()
        .map(|&id| {
            let idx = id.raw() as usize;
            match neurons.get(idx) {
                Some(n) => match mode {
                    OutputMode::Potential => n.potential,
                    OutputMode::FiringRate => n.firing_rate(),
                },
                None => 0.0,
            }
        })
        .collect()
}

/// Clear accumulated potentials and the active pulse list ahead of
/// presenting a new pattern. Weights, positions, and chemistry are left
/// untouched.
pub fn reset_for_new_pattern(neurons: &mut [Neuron], pulses: &mut PulseList) {
    for neuron in neurons.iter_mut() {
        neuron.reset_transient();
    }
    *pulses = PulseList::new();
}

/// Apply one cycle of a frequency-bound stimulus: with probability
/// `hz / cycles_per_second`, force the bound neuron into `Firing`, subject
/// to absolute-refractory rejection. Returns whether it fired.
pub fn apply_frequency_stimulus(
    stimulus: &FrequencyStimulus,
    neurons: &mut [Neuron],
    cycle: Cycle,
    cycles_per_second: f64,
    max_travel_radius: f64,
    pulses: &mut PulseList,
    rng: &mut EngineRng,
) -> Result<bool> {
    let idx = stimulus.neuron.raw() as usize;
    let neuron = neurons.get_mut(idx).ok_or_else(|| {
        CrowNetError::invalid_request(format!(
            "frequency stimulus bound to unknown neuron id {}",
            stimulus.neuron
        ))
    })?;
    let probability = stimulus.hz / cycles_per_second;
    if rng.bernoulli(probability) {
        Ok(force_fire(neuron, cycle, max_travel_radius, pulses, true))
    } else {
        Ok(false)
    }
}
