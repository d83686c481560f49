//! Production scheduler and KPI evaluation.
//!
//! # Algorithm
//!
//! `ProductionScheduler` runs a generational genetic algorithm with
//! elitist replacement over direct work-order → workstation assignments.
//! Results carry the best schedule, its fitness breakdown, KPIs, the
//! termination reason and the best-fitness history.
//!
//! # KPI
//!
//! `ScheduleKpi` computes standard scheduling metrics: makespan, tardiness,
//! on-time rate, utilization, flow time and violation counts.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod genetic;
mod kpi;

pub use genetic::{ProductionScheduler, RunPhase, ScheduleResult, TerminationReason};
pub use kpi::ScheduleKpi;
