//! GA-based work-order scheduling.
//!
//! # Encoding
//!
//! One gene per work order: assigned workstation plus `[start, end)`.
//! Totality is structural; station conflicts and precedence are restored
//! by a repair pass after every gene-changing operator.
//!
//! # Submodules
//!
//! - [`config`]: Run settings, fitness weights and penalties
//! - [`operators`]: Tournament selection, crossover and mutation
//! - [`population`]: Initialization, parallel evaluation, elitist merge
//!
//! # Reference
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"
//! - Cheng et al. (1996), "A Tutorial Survey of JSSP using GA"

mod chromosome;
pub mod config;
pub(crate) mod fitness;
pub mod operators;
pub mod population;
mod problem;

pub use chromosome::{Gene, ScheduleChromosome};
pub use config::{FitnessWeights, GaConfig, PenaltyWeights, Threads};
pub use fitness::{FitnessBreakdown, FEASIBILITY_BAND, MAX_FITNESS};
pub use operators::{GeneticOperators, MutationType};
pub use population::Population;
pub use problem::{SchedulingProblem, UnassignableWorkOrder};
