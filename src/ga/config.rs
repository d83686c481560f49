//! GA run configuration.
//!
//! Builder-style settings for one optimization call, plus the fitness
//! weights and penalty weights the evaluator uses.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{HOUR_MS, MAX_TIME_MS};
use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Weights of the four fitness sub-scores.
///
/// Normalized to sum 1 before use. Unknown keys are ignored when
/// deserializing; missing keys keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitnessWeights {
    /// On-time completion rate.
    pub on_time: f64,
    /// Aggregate resource utilization.
    pub utilization: f64,
    /// Evenness of per-station utilization.
    pub load_balance: f64,
    /// Skill compliance and priority ordering.
    pub compliance: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            on_time: 0.35,
            utilization: 0.25,
            load_balance: 0.2,
            compliance: 0.2,
        }
    }
}

impl FitnessWeights {
    /// Returns weights scaled to sum 1.
    ///
    /// Fails if any weight is negative or not finite, or all are zero.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let parts = [self.on_time, self.utilization, self.load_balance, self.compliance];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidParameter,
                format!("Fitness weights must be non-negative numbers, got {self:?}"),
            ));
        }
        let sum: f64 = parts.iter().sum();
        if sum <= 0.0 {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidParameter,
                "Fitness weights must not all be zero",
            ));
        }
        Ok(Self {
            on_time: self.on_time / sum,
            utilization: self.utilization / sum,
            load_balance: self.load_balance / sum,
            compliance: self.compliance / sum,
        })
    }
}

/// Fitness points subtracted per constraint violation.
///
/// Time-conflict and precedence penalties exceed the 100-point feasibility
/// band, so a schedule with either kind of violation always scores below
/// every executable schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PenaltyWeights {
    /// Per overlapping pair on one workstation.
    pub time_conflict: f64,
    /// Per work order starting before a predecessor ends.
    pub precedence: f64,
    /// Per assignment on a station lacking a required skill.
    pub skill_violation: f64,
    /// Maximum penalty for exceeding the makespan limit.
    pub makespan_overrun: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            time_conflict: 150.0,
            precedence: 150.0,
            skill_violation: 20.0,
            makespan_overrun: 50.0,
        }
    }
}

/// Worker pool sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Settings for one GA optimization run.
#[derive(Debug, Clone)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Generation cap.
    pub max_generations: usize,
    /// Probability that a parent pair is recombined.
    pub crossover_rate: f64,
    /// Probability that an offspring is mutated.
    pub mutation_rate: f64,
    /// Tournament size k.
    pub tournament_size: usize,
    /// Generations without improvement before stopping.
    pub stall_generations: usize,
    /// Minimum best-fitness gain that counts as improvement.
    pub convergence_epsilon: f64,
    /// Wall-clock budget; checked at generation barriers.
    pub time_budget: Option<Duration>,
    /// RNG seed. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Worker pool size.
    pub threads: Threads,
    /// Bound of the shift mutation offset (ms).
    pub max_shift_ms: i64,
    /// Planning epoch start; no job starts earlier (ms).
    pub planning_start_ms: i64,
    /// Sub-score weights.
    pub weights: FitnessWeights,
    /// Penalty weights.
    pub penalties: PenaltyWeights,
    /// Aggregate utilization considered ideal (0, 1].
    pub target_utilization: f64,
    /// Optional makespan limit (ms).
    pub max_makespan_ms: Option<i64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 100,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            tournament_size: 3,
            stall_generations: 25,
            convergence_epsilon: 1e-6,
            time_budget: Some(Duration::from_secs(30)),
            seed: None,
            threads: Threads::Auto,
            max_shift_ms: 4 * HOUR_MS,
            planning_start_ms: 0,
            weights: FitnessWeights::default(),
            penalties: PenaltyWeights::default(),
            target_utilization: 0.85,
            max_makespan_ms: None,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    pub fn with_stall_generations(mut self, generations: usize) -> Self {
        self.stall_generations = generations;
        self
    }

    pub fn with_convergence_epsilon(mut self, epsilon: f64) -> Self {
        self.convergence_epsilon = epsilon;
        self
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_threads(mut self, threads: Threads) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_shift_ms(mut self, shift_ms: i64) -> Self {
        self.max_shift_ms = shift_ms;
        self
    }

    pub fn with_planning_start(mut self, start_ms: i64) -> Self {
        self.planning_start_ms = start_ms;
        self
    }

    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_penalties(mut self, penalties: PenaltyWeights) -> Self {
        self.penalties = penalties;
        self
    }

    pub fn with_target_utilization(mut self, target: f64) -> Self {
        self.target_utilization = target;
        self
    }

    pub fn with_max_makespan(mut self, makespan_ms: Option<i64>) -> Self {
        self.max_makespan_ms = makespan_ms;
        self
    }

    /// Checks every setting is in range.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut bad = |message: String| {
            errors.push(ValidationError::new(ValidationErrorKind::InvalidParameter, message))
        };

        if self.population_size < 2 {
            bad(format!(
                "Population size must be at least 2, got {}",
                self.population_size
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            bad(format!("Crossover rate {} outside [0, 1]", self.crossover_rate));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            bad(format!("Mutation rate {} outside [0, 1]", self.mutation_rate));
        }
        if self.tournament_size == 0 {
            bad("Tournament size must be at least 1".to_string());
        }
        if self.stall_generations == 0 {
            bad("Stall generations must be at least 1".to_string());
        }
        if !self.convergence_epsilon.is_finite() || self.convergence_epsilon < 0.0 {
            bad(format!(
                "Convergence epsilon {} must be a non-negative number",
                self.convergence_epsilon
            ));
        }
        if !(0..=MAX_TIME_MS).contains(&self.max_shift_ms) {
            bad(format!(
                "Max shift {}ms outside [0, {MAX_TIME_MS}]",
                self.max_shift_ms
            ));
        }
        if !(-MAX_TIME_MS..=MAX_TIME_MS).contains(&self.planning_start_ms) {
            bad(format!(
                "Planning start {}ms outside [-{MAX_TIME_MS}, {MAX_TIME_MS}]",
                self.planning_start_ms
            ));
        }
        if !(self.target_utilization > 0.0 && self.target_utilization <= 1.0) {
            bad(format!(
                "Target utilization {} outside (0, 1]",
                self.target_utilization
            ));
        }
        if let Some(limit) = self.max_makespan_ms {
            if !(1..=MAX_TIME_MS).contains(&limit) {
                bad(format!("Max makespan {limit}ms outside [1, {MAX_TIME_MS}]"));
            }
        }
        if let Err(e) = self.weights.normalized() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
