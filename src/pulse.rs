//! Expanding spherical pulses: per-cycle shell propagation and synaptic
//! delivery.

use crate::geometry::Position16;
use crate::ids::{Cycle, NeuronId};
use crate::neuron::Neuron;
use crate::spatial::SpatialIndex;
use crate::weights::Weights;

/// A single expanding spherical pulse emitted when a neuron fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub emitter: NeuronId,
    pub origin: Position16,
    pub base_signal: f64,
    pub created_cycle: Cycle,
    pub current_distance: f64,
    pub max_travel_radius: f64,
}

impl Pulse {
    pub fn new(
        emitter: NeuronId,
        origin: Position16,
        base_signal: f64,
        created_cycle: Cycle,
        max_travel_radius: f64,
    ) -> Self {
        Self {
            emitter,
            origin,
            base_signal,
            created_cycle,
            current_distance: 0.0,
            max_travel_radius,
        }
    }

    pub fn is_active(&self) -> bool {
        self.current_distance < self.max_travel_radius
    }

    /// Advance by `speed` and return this cycle's shell as `(inner, outer)`.
    fn advance_and_shell(&mut self, speed: f64) -> (f64, f64) {
        self.current_distance += speed;
        let outer = self.current_distance;
        let inner = (outer - speed).max(0.0);
        (inner, outer)
    }

    /// Whether this pulse's shell this cycle (computed from `inner`/`outer`)
    /// comes within `gland_radius` of `gland_position` — the cortisol hit
    /// test from the neurochemistry model. Equivalent to testing whether
    /// the interval `[inner, outer]` overlaps `[d - r, d + r]` for `d` the
    /// distance from the pulse origin to the gland.
    fn shell_intersects(inner: f64, outer: f64, origin_to_gland: f64, gland_radius: f64) -> bool {
        inner <= origin_to_gland + gland_radius && outer >= origin_to_gland - gland_radius
    }
}

/// Outcome of processing one cycle's worth of active pulses.
#[derive(Debug, Clone, Default)]
pub struct PulseCycleOutcome {
    /// Neurons that transitioned into `Firing` as a result of this cycle's
    /// deliveries, in the order they fired.
    pub newly_fired: Vec<NeuronId>,
    /// Count of active pulses whose shell intersected the cortisol gland's
    /// sensitivity radius this cycle.
    pub cortisol_hits: usize,
}

/// The set of pulses currently propagating through the network.
#[derive(Debug, Clone, Default)]
pub struct PulseList {
    active: Vec<Pulse>,
    pending: Vec<Pulse>,
}

impl PulseList {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn active(&self) -> &[Pulse] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Queue a pulse created outside normal delivery (e.g. by forced input
    /// firing). Base-signal-0 pulses (dopaminergic emitters) are dropped:
    /// they affect chemistry, not synaptic delivery.
    pub fn enqueue(&mut self, pulse: Pulse) {
        if pulse.base_signal != 0.0 {
            self.pending.push(pulse);
        }
    }

    /// Step 4 of the per-cycle pipeline: advance every active pulse,
    /// deliver into its shell, and fold in anything newly fired as a
    /// result. New pulses created during delivery are held in `pending`
    /// until [`PulseList::commit_pending`] runs, so they are never
    /// delivered in the same cycle they were created.
    pub fn process_cycle(
        &mut self,
        cycle: Cycle,
        speed: f64,
        gland_position: Position16,
        gland_radius: f64,
        neurons: &mut [Neuron],
        weights: &Weights,
        spatial: &SpatialIndex,
    ) -> PulseCycleOutcome {
        let mut outcome = PulseCycleOutcome::default();

        for i in 0..self.active.len() {
            let (inner, outer) = self.active[i].advance_and_shell(speed);
            let origin = self.active[i].origin;
            let emitter = self.active[i].emitter;
            let base_signal = self.active[i].base_signal;

            let origin_to_gland = origin.distance(&gland_position);
            if Pulse::shell_intersects(inner, outer, origin_to_gland, gland_radius) {
                outcome.cortisol_hits += 1;
            }

            let candidates = spatial.query_radius(&origin, outer);
            for candidate in candidates {
                if candidate == emitter {
                    continue;
                }
                let idx = candidate.raw() as usize;
                let Some(neuron) = neurons.get_mut(idx) else {
                    continue;
                };
                let dist = neuron.position.distance(&origin);
                if dist < inner || dist >= outer {
                    continue;
                }
                let effective = base_signal * weights.get(emitter, candidate);
                if effective == 0.0 {
                    continue;
                }
                if !neuron.integrate(effective) {
                    continue;
                }
                if neuron.crossed_threshold() {
                    neuron.enter_firing(cycle);
                    outcome.newly_fired.push(candidate);
                    let new_pulse = Pulse::new(
                        candidate,
                        neuron.position,
                        neuron.kind.emitted_signal(),
                        cycle,
                        self.active[i].max_travel_radius,
                    );
                    self.enqueue(new_pulse);
                }
            }
        }

        outcome
    }

    /// Step 6: fold in pulses created this cycle and drop inactive ones.
    pub fn commit_pending(&mut self) {
        self.active.retain(|p| p.is_active());
        self.active.append(&mut self.pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::NeuronType;

    fn pos_x(x: f64) -> Position16 {
        let mut coords = [0.0; 16];
        coords[0] = x;
        Position16::new(coords)
    }

    #[test]
    fn shell_advances_and_reports_bounds() {
        let mut p = Pulse::new(NeuronId::new(0), Position16::ZERO, 1.0, Cycle::ZERO, 20.0);
        let (inner, outer) = p.advance_and_shell(1.0);
        assert_eq!(inner, 0.0);
        assert_eq!(outer, 1.0);
        let (inner2, outer2) = p.advance_and_shell(1.0);
        assert_eq!(inner2, 1.0);
        assert_eq!(outer2, 2.0);
    }

    #[test]
    fn becomes_inactive_past_max_radius() {
        let mut p = Pulse::new(NeuronId::new(0), Position16::ZERO, 1.0, Cycle::ZERO, 2.0);
        p.advance_and_shell(1.0);
        assert!(p.is_active());
        p.advance_and_shell(1.0);
        assert!(!p.is_active());
    }

    #[test]
    fn delivers_to_neuron_inside_shell_and_skips_emitter() {
        let mut neurons = vec![
            Neuron::new(NeuronId::new(0), NeuronType::Excitatory, Position16::ZERO, 0.5),
            Neuron::new(NeuronId::new(1), NeuronType::Excitatory, pos_x(3.0), 0.5),
        ];
        let mut weights = Weights::new();
        weights.set(NeuronId::new(0), NeuronId::new(1), 1.0, 1.0);

        let mut spatial = SpatialIndex::new(2.0);
        spatial.insert(NeuronId::new(0), Position16::ZERO);
        spatial.insert(NeuronId::new(1), pos_x(3.0));

        let mut list = PulseList::new();
        list.enqueue(Pulse::new(
            NeuronId::new(0),
            Position16::ZERO,
            1.0,
            Cycle::ZERO,
            20.0,
        ));
        list.commit_pending();

        for cycle in 1..=3u64 {
            list.process_cycle(
                Cycle::new(cycle),
                1.0,
                Position16::ZERO,
                1.0,
                &mut neurons,
                &weights,
                &spatial,
            );
            list.commit_pending();
        }

        assert!(neurons[1].potential > 0.0 || neurons[1].state != crate::neuron::NeuronState::Resting);
        assert_eq!(neurons[0].potential, 0.0);
    }

    #[test]
    fn pulse_created_during_delivery_is_not_delivered_same_cycle() {
        let mut neurons = vec![
            Neuron::new(NeuronId::new(0), NeuronType::Excitatory, Position16::ZERO, 0.1),
            Neuron::new(NeuronId::new(1), NeuronType::Excitatory, pos_x(1.0), 0.1),
        ];
        let mut weights = Weights::new();
        weights.set(NeuronId::new(0), NeuronId::new(1), 1.0, 1.0);
        weights.set(NeuronId::new(1), NeuronId::new(0), 1.0, 1.0);

        let mut spatial = SpatialIndex::new(2.0);
        spatial.insert(NeuronId::new(0), Position16::ZERO);
        spatial.insert(NeuronId::new(1), pos_x(1.0));

        let mut list = PulseList::new();
        list.enqueue(Pulse::new(
            NeuronId::new(0),
            Position16::ZERO,
            1.0,
            Cycle::ZERO,
            20.0,
        ));
        list.commit_pending();
        assert_eq!(list.len(), 1);

        list.process_cycle(
            Cycle::new(1),
            1.0,
            Position16::ZERO,
            1.0,
            &mut neurons,
            &weights,
            &spatial,
        );
        assert_eq!(list.len(), 1, "newly created pulse must stay pending mid-cycle");
        list.commit_pending();
        assert_eq!(list.len(), 2, "new pulse joins the active list only after commit");
    }
}
