//! End-to-end acceptance scenarios exercising the public `Engine` surface
//! as a whole, rather than one module at a time.

use crownet::{Config, Engine, OutputMode, Position16};

const SEED: u64 = 12345;

fn pos_x(x: f64) -> Position16 {
    let mut coords = [0.0; 16];
    coords[0] = x;
    Position16::new(coords)
}

fn small_config() -> Config {
    let mut cfg = Config::default();
    cfg.structure.total_neurons = 30;
    cfg.structure.min_input_neurons = 5;
    cfg.structure.min_output_neurons = 5;
    cfg.structure.seed = SEED;
    cfg
}

#[test]
fn zero_input_decay_settles_chemistry_and_potentials() {
    let mut engine = Engine::build(small_config()).unwrap();
    engine.sim(None, 100).unwrap();

    let stats = engine.stats();
    assert!(stats.cortisol < 0.05);
    assert!(stats.dopamine < 0.05);
    assert_eq!(stats.active_pulse_count, 0);
    for n in engine.neurons() {
        assert!(n.potential.abs() < 1e-3);
    }
}

#[test]
fn single_input_reaches_target_with_no_learning() {
    let mut cfg = small_config();
    cfg.structure.total_neurons = 5;
    cfg.structure.min_input_neurons = 2;
    cfg.structure.min_output_neurons = 2;
    cfg.structure.space_max_dimension = 50.0;

    let mut engine = Engine::build(cfg).unwrap();
    engine.set_learning_enabled(false);
    engine.set_chemistry_enabled(false);
    engine.set_synaptogenesis_enabled(false);

    // Layout: 0,1 = Input, 2,3 = Output, 4 = Excitatory (the sole internal
    // neuron given total=5, min_input=2, min_output=2).
    let input = crownet::NeuronId::new(0);
    let target = crownet::NeuronId::new(4);
    {
        let neurons = engine.neurons_mut();
        neurons[0].position = Position16::ZERO;
        neurons[4].position = pos_x(2.5);
        // Move every other neuron far out of range so only the input/target
        // pair can interact this cycle.
        neurons[1].position = pos_x(1000.0);
        neurons[2].position = pos_x(1001.0);
        neurons[3].position = pos_x(1002.0);
    }
    engine.weights_mut().set(input, target, 1.0, 1.0);
    engine.rebuild_spatial_index();

    // Cycle 0: present the pattern, forcing neuron 0 into Firing.
    engine.advance_cycle(None, Some(&[1.0, 0.0])).unwrap();
    // Cycles 1, 2, 3: let the pulse's shell sweep out to the target.
    for _ in 0..3 {
        engine.advance_cycle(None, None).unwrap();
    }

    let fired_neuron = &engine.neurons()[target.raw() as usize];
    assert_eq!(fired_neuron.last_fired, Some(crownet::Cycle::new(3)));
    assert!(engine.pulses().len() >= 2, "the target's own pulse should now be active too");

    for _ in 0..16 {
        engine.advance_cycle(None, None).unwrap();
    }
    assert_eq!(engine.weights().get(input, target), 1.0, "no learning means no weight drift");
}

#[test]
fn hebbian_potentiation_strengthens_a_coactive_pair() {
    let mut cfg = small_config();
    cfg.structure.total_neurons = 2;
    cfg.structure.min_input_neurons = 1;
    cfg.structure.min_output_neurons = 1;
    cfg.weights.base_learning_rate = 0.1;
    cfg.weights.hebb_positive_reinforce_factor = 1.0;
    cfg.weights.synaptic_weight_decay_rate = 0.0;

    let mut engine = Engine::build(cfg).unwrap();
    engine.set_chemistry_enabled(false);
    engine.set_synaptogenesis_enabled(false);

    let input = crownet::NeuronId::new(0);
    let output = crownet::NeuronId::new(1);
    {
        let neurons = engine.neurons_mut();
        neurons[0].position = Position16::ZERO;
        neurons[1].position = pos_x(0.1);
    }
    engine.weights_mut().set(input, output, 0.2, 1.0);
    engine.weights_mut().set(output, input, 0.0, 1.0);
    engine.rebuild_spatial_index();

    let initial_weight = engine.weights().get(input, output);
    let mut previous = initial_weight;
    for _ in 0..20 {
        engine.advance_cycle(None, Some(&[1.0])).unwrap();
        let current = engine.weights().get(input, output);
        assert!(current + 1e-9 >= previous, "weight must never decrease while both are coactive");
        assert!(current <= 1.0 + 1e-9, "weight must stay within max_synaptic_weight");
        previous = current;
    }
    assert!(previous > initial_weight, "20 cycles of coincident firing must strengthen the synapse");
}

fn build_cortisol_pair(cortisol_production_per_hit: f64) -> Engine {
    let mut cfg = small_config();
    cfg.structure.total_neurons = 2;
    cfg.structure.min_input_neurons = 1;
    cfg.structure.min_output_neurons = 1;
    cfg.weights.base_learning_rate = 0.1;
    cfg.chemistry.cortisol_production_per_hit = cortisol_production_per_hit;
    cfg.chemistry.cortisol_gland_sensitivity_radius = 1.0;

    let mut engine = Engine::build(cfg).unwrap();
    engine.set_synaptogenesis_enabled(false);

    let input = crownet::NeuronId::new(0);
    let output = crownet::NeuronId::new(1);
    {
        let neurons = engine.neurons_mut();
        // Placing the Input neuron at the gland guarantees every pulse it
        // emits registers a cortisol hit on its first delivery step.
        neurons[0].position = Position16::ZERO;
        neurons[1].position = pos_x(0.1);
    }
    engine.weights_mut().set(input, output, 0.2, 1.0);
    engine.weights_mut().set(output, input, 0.0, 1.0);
    engine.rebuild_spatial_index();
    engine
}

#[test]
fn cortisol_suppresses_learning_relative_to_a_quiet_gland() {
    let input = crownet::NeuronId::new(0);
    let output = crownet::NeuronId::new(1);

    let mut baseline = build_cortisol_pair(0.0);
    let mut with_cortisol = build_cortisol_pair(0.01);

    for _ in 0..20 {
        baseline.advance_cycle(None, Some(&[1.0])).unwrap();
        with_cortisol.advance_cycle(None, Some(&[1.0])).unwrap();
    }

    assert!(with_cortisol.stats().cortisol > baseline.stats().cortisol);
    let baseline_weight = baseline.weights().get(input, output);
    let cortisol_weight = with_cortisol.weights().get(input, output);
    assert!(
        cortisol_weight < baseline_weight,
        "elevated cortisol must dampen the same Hebbian trajectory (baseline={baseline_weight}, cortisol={cortisol_weight})"
    );
}

#[test]
fn expose_then_observe_distinguishes_two_patterns() {
    let mut cfg = small_config();
    cfg.structure.total_neurons = 30;
    cfg.structure.min_input_neurons = 4;
    cfg.structure.min_output_neurons = 4;
    cfg.structure.pattern_height = 2;
    cfg.structure.pattern_width = 2;
    cfg.output_mode = OutputMode::FiringRate;

    let pattern_a = vec![1.0, 1.0, 0.0, 0.0];
    let pattern_b = vec![0.0, 0.0, 1.0, 1.0];

    let mut engine = Engine::build(cfg).unwrap();
    engine
        .expose(&[pattern_a.clone(), pattern_b.clone()], 5, 10)
        .unwrap();
    let trained_weights = engine.weights().clone();

    let output_a = engine.observe(trained_weights.clone(), &pattern_a, 10).unwrap();
    let output_b = engine.observe(trained_weights, &pattern_b, 10).unwrap();

    assert_eq!(output_a.len(), output_b.len());
    let max_abs_diff = output_a
        .iter()
        .zip(output_b.iter())
        .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));
    assert!(
        max_abs_diff > 1e-9,
        "the two patterns must drive visibly different Output activity after training"
    );
}

#[test]
fn determinism_same_seed_same_outcome_end_to_end() {
    let cfg = small_config();
    let pattern = vec![1.0; cfg.structure.min_input_neurons];

    let mut a = Engine::build(cfg.clone()).unwrap();
    let mut b = Engine::build(cfg).unwrap();

    for _ in 0..50 {
        a.advance_cycle(None, Some(&pattern)).unwrap();
        b.advance_cycle(None, Some(&pattern)).unwrap();
    }

    assert_eq!(a.read_output(), b.read_output());
    assert_eq!(a.stats().cortisol, b.stats().cortisol);
    assert_eq!(a.stats().dopamine, b.stats().dopamine);
    for (na, nb) in a.neurons().iter().zip(b.neurons().iter()) {
        assert_eq!(na.position.0, nb.position.0);
        assert_eq!(na.last_fired, nb.last_fired);
    }
    for (pre, post) in a.weights().pairs() {
        assert_eq!(a.weights().get(pre, post), b.weights().get(pre, post));
    }
}
