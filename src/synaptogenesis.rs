//! Attraction/repulsion force field that slowly repositions neurons based
//! on recent co-activity.

use crate::config::SynaptogenesisConfig;
use crate::geometry::Position16;
use crate::ids::Cycle;
use crate::neuron::Neuron;
use crate::spatial::SpatialIndex;

/// Step 11: for every pair of neurons within influence radius, accumulate
/// an attractive force (if both fired within the Hebbian coincidence
/// window) or a weaker repulsive force (otherwise), then integrate
/// velocity and move each neuron.
///
/// Assumes `neurons[i].id.raw() == i` (the engine's dense arena layout),
/// so spatial-index candidates can be used directly as slice indices.
pub fn apply(
    neurons: &mut [Neuron],
    spatial: &SpatialIndex,
    cycle: Cycle,
    cfg: &SynaptogenesisConfig,
    coincidence_window: u32,
    synaptogenesis_factor: f64,
    space_max_dimension: f64,
) {
    let n = neurons.len();
    let mut forces = vec![Position16::ZERO; n];

    for i in 0..n {
        let pos_i = neurons[i].position;
        let candidates = spatial.query_radius(&pos_i, cfg.synaptogenesis_influence_radius);
        for candidate in candidates {
            let j = candidate.raw() as usize;
            if j <= i || j >= n {
                continue;
            }
            let pos_j = neurons[j].position;
            let dist = pos_i.distance(&pos_j);
            if dist > cfg.synaptogenesis_influence_radius || dist == 0.0 {
                continue;
            }

            let direction = pos_j.sub(&pos_i).scale(1.0 / dist);
            let both_recent = neurons[i].fired_within(cycle, coincidence_window)
                && neurons[j].fired_within(cycle, coincidence_window);
            let magnitude = if both_recent {
                cfg.attraction_force_factor * synaptogenesis_factor
            } else {
                -(cfg.repulsion_force_factor * synaptogenesis_factor)
            };

            forces[i] = forces[i].add(&direction.scale(magnitude));
            forces[j] = forces[j].add(&direction.scale(-magnitude));
        }
    }

    for (i, neuron) in neurons.iter_mut().enumerate() {
        let mut velocity = neuron.velocity.scale(cfg.dampening_factor).add(&forces[i]);
        let magnitude = velocity.norm();
        if magnitude > cfg.max_movement_per_cycle && magnitude > 0.0 {
            velocity = velocity.scale(cfg.max_movement_per_cycle / magnitude);
        }
        neuron.velocity = velocity;
        neuron.move_by(velocity, space_max_dimension);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NeuronId;
    use crate::neuron::NeuronType;

    fn pos_x(x: f64) -> Position16 {
        let mut coords = [0.0; 16];
        coords[0] = x;
        Position16::new(coords)
    }

    fn two_neurons(separation: f64) -> Vec<Neuron> {
        vec![
            Neuron::new(NeuronId::new(0), NeuronType::Excitatory, Position16::ZERO, 0.5),
            Neuron::new(NeuronId::new(1), NeuronType::Excitatory, pos_x(separation), 0.5),
        ]
    }

    fn spatial_for(neurons: &[Neuron]) -> SpatialIndex {
        let mut idx = SpatialIndex::new(1.0);
        idx.rebuild(neurons.iter().map(|n| (n.id, n.position)));
        idx
    }

    #[test]
    fn coincident_pair_moves_closer() {
        let mut neurons = two_neurons(1.0);
        neurons[0].enter_firing(Cycle::new(5));
        neurons[1].enter_firing(Cycle::new(5));
        let spatial = spatial_for(&neurons);
        let before = neurons[0].position.distance(&neurons[1].position);

        let cfg = SynaptogenesisConfig::default();
        apply(&mut neurons, &spatial, Cycle::new(5), &cfg, 3, 1.0, 100.0);

        let after = neurons[0].position.distance(&neurons[1].position);
        assert!(after < before);
    }

    #[test]
    fn non_coincident_pair_moves_apart() {
        let neurons_initial = two_neurons(1.0);
        let mut neurons = neurons_initial;
        let spatial = spatial_for(&neurons);
        let before = neurons[0].position.distance(&neurons[1].position);

        let cfg = SynaptogenesisConfig::default();
        apply(&mut neurons, &spatial, Cycle::new(5), &cfg, 3, 1.0, 100.0);

        let after = neurons[0].position.distance(&neurons[1].position);
        assert!(after > before);
    }

    #[test]
    fn movement_is_clamped_and_stays_in_hypersphere() {
        let mut neurons = two_neurons(0.01);
        neurons[0].enter_firing(Cycle::new(1));
        neurons[1].enter_firing(Cycle::new(1));
        let spatial = spatial_for(&neurons);

        let mut cfg = SynaptogenesisConfig::default();
        cfg.attraction_force_factor = 1000.0;
        cfg.max_movement_per_cycle = 0.01;

        apply(&mut neurons, &spatial, Cycle::new(1), &cfg, 3, 1.0, 0.5);

        for n in &neurons {
            assert!(n.position.norm() <= 0.5 + 1e-9);
        }
    }
}
