//! Sparse directed synaptic weight map with bounded initialization,
//! Hebbian updates, and per-cycle decay.

use std::collections::HashMap;

use crate::config::WeightsConfig;
use crate::ids::NeuronId;
use crate::rng::EngineRng;

#[cfg(feature = "persistence")]
use crate::error::{CrowNetError, Result};

/// `sign(x)` restricted to `{-1, 0, 1}` with a small dead zone around 0,
/// used to decide Hebbian agreement between two activity signals.
fn sign(x: f64) -> i8 {
    if x > 1e-9 {
        1
    } else if x < -1e-9 {
        -1
    } else {
        0
    }
}

/// Directed synaptic weights, keyed by `(pre, post)`. Absent pairs and all
/// self-loops implicitly carry weight 0.
#[derive(Debug, Clone, Default)]
pub struct Weights {
    map: HashMap<(NeuronId, NeuronId), f64>,
}

impl Weights {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Number of non-zero stored entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// All `(pre, post)` pairs with a stored entry, in arbitrary order.
    pub fn pairs(&self) -> Vec<(NeuronId, NeuronId)> {
        self.map.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Weight from `from` to `to`. 0 if absent or a self-loop.
    pub fn get(&self, from: NeuronId, to: NeuronId) -> f64 {
        if from == to {
            return 0.0;
        }
        self.map.get(&(from, to)).copied().unwrap_or(0.0)
    }

    /// Store `w` for `from -> to`, clamped to `[-max_abs, max_abs]`.
    /// Self-loops are always rejected, silently, since they can never hold
    /// a weight.
    pub fn set(&mut self, from: NeuronId, to: NeuronId, w: f64, max_abs: f64) {
        if from == to {
            return;
        }
        let clamped = w.clamp(-max_abs, max_abs);
        self.map.insert((from, to), clamped);
    }

    /// Multiply every stored weight by `(1 - rate)`; drop entries whose
    /// magnitude falls below `epsilon` to keep the map sparse.
    pub fn decay_all(&mut self, rate: f64, epsilon: f64) {
        if rate <= 0.0 {
            return;
        }
        self.map.retain(|_, w| {
            *w *= 1.0 - rate;
            w.abs() >= epsilon
        });
    }

    /// Apply a Hebbian weight update between `pre` and `post`.
    ///
    /// `Δw = effective_lr * pre_activity * post_activity * positive_factor`
    /// when the two activity signals agree in sign (both active, or both
    /// inactive); otherwise the same magnitude is applied with
    /// `negative_factor` and an inverted sign. No-op on self-loops.
    #[allow(clippy::too_many_arguments)]
    pub fn hebbian_update(
        &mut self,
        pre: NeuronId,
        post: NeuronId,
        effective_lr: f64,
        pre_activity: f64,
        post_activity: f64,
        positive_factor: f64,
        negative_factor: f64,
        max_abs: f64,
    ) {
        if pre == post {
            return;
        }
        let magnitude = effective_lr * pre_activity * post_activity;
        let delta = if sign(pre_activity) == sign(post_activity) {
            magnitude * positive_factor
        } else {
            -(magnitude * negative_factor)
        };
        let current = self.get(pre, post);
        self.set(pre, post, current + delta, max_abs);
    }

    /// Draw initial weights per the engine construction contract: every
    /// neuron connects to either all others (dense, the default) or to a
    /// random subset bounded by
    /// [`WeightsConfig::max_initial_connections_per_neuron`].
    pub fn initialize(&mut self, rng: &mut EngineRng, ids: &[NeuronId], cfg: &WeightsConfig) {
        match cfg.max_initial_connections_per_neuron {
            None => {
                for i in 0..ids.len() {
                    for j in (i + 1)..ids.len() {
                        let a = ids[i];
                        let b = ids[j];
                        let w_ab = rng.uniform_range(
                            cfg.initial_synaptic_weight_min,
                            cfg.initial_synaptic_weight_max,
                        );
                        let w_ba = rng.uniform_range(
                            cfg.initial_synaptic_weight_min,
                            cfg.initial_synaptic_weight_max,
                        );
                        self.set(a, b, w_ab, cfg.max_synaptic_weight);
                        self.set(b, a, w_ba, cfg.max_synaptic_weight);
                    }
                }
            }
            Some(cap) => {
                use rand::seq::SliceRandom;
                for &a in ids {
                    let mut partners: Vec<NeuronId> =
                        ids.iter().copied().filter(|&x| x != a).collect();
                    partners.shuffle(rng.inner_mut());
                    for &b in partners.iter().take(cap) {
                        let w = rng.uniform_range(
                            cfg.initial_synaptic_weight_min,
                            cfg.initial_synaptic_weight_max,
                        );
                        self.set(a, b, w, cfg.max_synaptic_weight);
                    }
                }
            }
        }
    }

    /// Serialize to the persisted layout: a mapping from source id to a
    /// mapping from target id to weight, both keyed as decimal strings
    /// (JSON object keys must be strings).
    #[cfg(feature = "persistence")]
    pub fn to_json_writer<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut nested: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for (&(from, to), &w) in &self.map {
            nested
                .entry(from.raw().to_string())
                .or_default()
                .insert(to.raw().to_string(), w);
        }
        serde_json::to_writer_pretty(writer, &nested)?;
        Ok(())
    }

    /// Load from the same layout `to_json_writer` produces.
    #[cfg(feature = "persistence")]
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let nested: HashMap<String, HashMap<String, f64>> = serde_json::from_reader(reader)?;
        let mut weights = Weights::new();
        for (from_str, targets) in nested {
            let from = from_str.parse::<u32>().map_err(|_| {
                CrowNetError::persistence(format!("invalid source neuron id: {from_str}"))
            })?;
            for (to_str, w) in targets {
                let to = to_str.parse::<u32>().map_err(|_| {
                    CrowNetError::persistence(format!("invalid target neuron id: {to_str}"))
                })?;
                weights.map.insert((NeuronId::new(from), NeuronId::new(to)), w);
            }
        }
        Ok(weights)
    }
}
