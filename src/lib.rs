//! Production scheduling core.
//!
//! Assigns work orders to workstations with a genetic algorithm, and
//! analyzes workstation capacity, bottlenecks and projected load.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `WorkOrder`, `Workstation`, `Schedule`,
//!   `ScheduleAssignment`, `Violation`, `TimeWindow`
//! - **`validation`**: Input integrity checks (duplicate IDs, DAG cycles, ranges)
//! - **`ga`**: Chromosome encoding, fitness, operators, population
//! - **`scheduler`**: GA orchestrator and schedule KPIs
//! - **`capacity`**: Capacity analysis, bottleneck detection, forecasting
//! - **`api`**: Serde request/response boundary
//!
//! # Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"
//! - Hopp & Spearman (2011), "Factory Physics", Ch. 7 (capacity and bottlenecks)

pub mod api;
pub mod capacity;
pub mod error;
pub mod ga;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use api::{analyze_capacity, optimize_schedule, CapacityRequest, OptimizeConstraints};
pub use error::SchedulerError;
pub use scheduler::{ProductionScheduler, ScheduleResult};
