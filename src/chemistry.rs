//! Cortisol and dopamine levels, their decay, and the modulation factors
//! they feed back into learning rate, synaptogenesis, and firing thresholds.

use crate::config::ChemistryConfig;

/// Process-wide neurochemical state and its derived modulation factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChemicalState {
    pub cortisol: f64,
    pub dopamine: f64,
    pub learning_rate_factor: f64,
    pub synaptogenesis_factor: f64,
}

impl ChemicalState {
    /// Fresh engine state: zero levels, neutral (1.0) modulation.
    pub fn new() -> Self {
        Self {
            cortisol: 0.0,
            dopamine: 0.0,
            learning_rate_factor: 1.0,
            synaptogenesis_factor: 1.0,
        }
    }

    /// Step 9: update both levels from this cycle's activity and
    /// recompute the modulation factors that the rest of the pipeline
    /// reads in steps 7, 10, and 11.
    ///
    /// `cortisol_hits` is the count of active pulses whose shell this cycle
    /// intersected the gland's sensitivity radius (from
    /// [`crate::pulse::PulseCycleOutcome::cortisol_hits`]); `dopaminergic_fires`
    /// is the count of Dopaminergic neurons that fired this cycle.
    pub fn update(&mut self, cortisol_hits: usize, dopaminergic_fires: usize, cfg: &ChemistryConfig) {
        let cortisol_production =
            cfg.cortisol_production_rate + cfg.cortisol_production_per_hit * cortisol_hits as f64;
        self.cortisol = (self.cortisol * (1.0 - cfg.cortisol_decay_rate) + cortisol_production)
            .clamp(0.0, cfg.cortisol_max_level);

        let dopamine_production = cfg.dopamine_production_rate
            + cfg.dopamine_production_per_event * dopaminergic_fires as f64;
        self.dopamine = (self.dopamine * (1.0 - cfg.dopamine_decay_rate) + dopamine_production)
            .clamp(0.0, cfg.dopamine_max_level);

        let norm_cort = self.cortisol / cfg.cortisol_max_level;
        let norm_dopa = self.dopamine / cfg.dopamine_max_level;

        self.learning_rate_factor = (1.0
            + cfg.cortisol_influence_on_lr * norm_cort
            + cfg.dopamine_influence_on_lr * norm_dopa)
            .max(cfg.min_learning_rate_factor);

        self.synaptogenesis_factor = (1.0
            + cfg.cortisol_influence_on_synapto * norm_cort
            + cfg.dopamine_influence_on_synapto * norm_dopa)
            .max(0.0);
    }

    /// Normalized cortisol level in `[0, 1]`.
    pub fn normalized_cortisol(&self, cfg: &ChemistryConfig) -> f64 {
        self.cortisol / cfg.cortisol_max_level
    }

    /// Normalized dopamine level in `[0, 1]`.
    pub fn normalized_dopamine(&self, cfg: &ChemistryConfig) -> f64 {
        self.dopamine / cfg.dopamine_max_level
    }
}

impl Default for ChemicalState {
    fn default() -> Self {
        Self::new()
    }
}
