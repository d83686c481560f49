//! Genetic-algorithm production scheduler.
//!
//! # Algorithm
//!
//! 1. Validate inputs and settings, collecting every issue.
//! 2. Build the index-based problem; report orders no station can serve.
//! 3. Seed the population (half random, half load-balanced).
//! 4. Per generation: tournament selection, crossover, mutation, repair,
//!    parallel evaluation, elitist merge.
//! 5. Stop on stall, generation cap or wall-clock budget; decode the best
//!    chromosome ever seen.
//!
//! The wall-clock budget is checked at generation barriers only, so a run
//! can overshoot it by at most one generation.
//!
//! # Reference
//! Goldberg (1989), "Genetic Algorithms", Ch. 3; Eiben & Smith (2015), Ch. 5

use std::collections::HashSet;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use super::kpi::ScheduleKpi;
use crate::error::SchedulerError;
use crate::ga::{
    FitnessBreakdown, GaConfig, GeneticOperators, Population, ScheduleChromosome,
    SchedulingProblem, UnassignableWorkOrder,
};
use crate::models::{Schedule, WorkOrder, Workstation};
use crate::validation::validate_input;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationReason {
    /// Best fitness stalled for the configured number of generations.
    Converged,
    /// The generation cap was reached.
    MaxGenerationsReached,
    /// The wall-clock budget ran out; the result is the best so far.
    TimeBudgetExceeded,
    /// No work orders, or no workstations to place them on.
    NothingToSchedule,
}

/// Phase of a running optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Initializing,
    Evaluating,
    Evolving,
    Finished(TerminationReason),
}

/// Outcome of one optimization call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    /// Best schedule found, one assignment per work order.
    pub schedule: Schedule,
    /// Fitness of that schedule (0-200).
    pub fitness: f64,
    /// Per-part fitness of that schedule.
    pub breakdown: FitnessBreakdown,
    pub metrics: ScheduleKpi,
    /// Orders no workstation could fully serve.
    pub unassignable: Vec<UnassignableWorkOrder>,
    /// True only when the run stopped on a fitness stall.
    pub converged: bool,
    pub termination: TerminationReason,
    /// Generations evolved after the initial population.
    pub generations: usize,
    /// Best fitness after initialization and after each generation.
    pub fitness_history: Vec<f64>,
    pub elapsed_ms: u64,
}

/// Production scheduler driven by a genetic algorithm.
///
/// # Example
///
/// ```
/// use u_production::ga::{GaConfig, Threads};
/// use u_production::models::{WorkOrder, Workstation, HOUR_MS};
/// use u_production::scheduler::ProductionScheduler;
///
/// let orders = vec![
///     WorkOrder::new("WO1", HOUR_MS, 8 * HOUR_MS),
///     WorkOrder::new("WO2", 2 * HOUR_MS, 8 * HOUR_MS),
/// ];
/// let stations = vec![Workstation::new("WS1")];
/// let config = GaConfig::default()
///     .with_population_size(10)
///     .with_max_generations(5)
///     .with_seed(7)
///     .with_threads(Threads::Single);
///
/// let result = ProductionScheduler::new(config).optimize(&orders, &stations).unwrap();
/// assert_eq!(result.schedule.assignment_count(), 2);
/// assert!(result.schedule.makespan_ms() >= 3 * HOUR_MS);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProductionScheduler {
    config: GaConfig,
}

impl ProductionScheduler {
    pub fn new(config: GaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Optimizes an assignment of work orders to workstations.
    ///
    /// # Errors
    /// * [`SchedulerError::Validation`] for malformed input or settings.
    /// * [`SchedulerError::ThreadPool`] if the worker pool cannot start.
    /// * [`SchedulerError::InvariantViolation`] if the best schedule is not
    ///   total or has overlapping jobs on one station.
    pub fn optimize(
        &self,
        work_orders: &[WorkOrder],
        workstations: &[Workstation],
    ) -> Result<ScheduleResult, SchedulerError> {
        let mut issues = Vec::new();
        if let Err(errors) = self.config.validate() {
            issues.extend(errors);
        }
        if let Err(errors) = validate_input(work_orders, workstations) {
            issues.extend(errors);
        }
        if !issues.is_empty() {
            return Err(SchedulerError::Validation(issues));
        }

        let span = info_span!(
            "optimize",
            work_orders = work_orders.len(),
            workstations = workstations.len()
        );
        let _guard = span.enter();
        let started = Instant::now();

        if work_orders.is_empty() || workstations.is_empty() {
            return Ok(self.nothing_to_schedule(work_orders, workstations, started));
        }

        let threads = self.config.threads.number_of_threads();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        info!(
            population = self.config.population_size,
            max_generations = self.config.max_generations,
            threads,
            "starting schedule optimization"
        );

        let problem = SchedulingProblem::new(work_orders, workstations, &self.config);
        let unassignable = problem.unassignable_orders();
        for item in &unassignable {
            warn!(
                work_order = %item.work_order_id,
                missing = ?item.missing_skills,
                fallback = ?item.fallback_stations,
                "no workstation covers all required skills"
            );
        }

        let run = pool.install(|| self.evolve(&problem, started));
        let schedule = problem.decode(&run.best);
        check_invariants(&schedule, work_orders)?;

        let breakdown = problem.fitness_breakdown(&run.best);
        let metrics = ScheduleKpi::calculate(&schedule, work_orders, workstations)
            .with_unassignable(unassignable.len());
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            fitness = breakdown.total,
            generations = run.generations,
            termination = ?run.termination,
            makespan_ms = metrics.makespan_ms,
            elapsed_ms,
            "schedule optimization finished"
        );

        Ok(ScheduleResult {
            schedule,
            fitness: breakdown.total,
            breakdown,
            metrics,
            unassignable,
            converged: run.termination == TerminationReason::Converged,
            termination: run.termination,
            generations: run.generations,
            fitness_history: run.history,
            elapsed_ms,
        })
    }

    /// Runs the generational loop on the current rayon pool.
    fn evolve(&self, problem: &SchedulingProblem, started: Instant) -> EvolutionRun {
        let config = &self.config;
        let operators = GeneticOperators::from(config);
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let mut population = Population::default();
        let mut best: Option<ScheduleChromosome> = None;
        let mut history = Vec::new();
        let mut generation = 0;
        let mut stall = 0;
        let mut phase = RunPhase::Initializing;

        let termination = loop {
            phase = match phase {
                RunPhase::Initializing => {
                    population = Population::initialize(problem, config.population_size, &mut rng);
                    RunPhase::Evaluating
                }
                RunPhase::Evaluating => {
                    population.evaluate(problem);
                    let improved = match (population.best(), best.as_ref()) {
                        (Some(candidate), Some(current)) => {
                            candidate.fitness > current.fitness + config.convergence_epsilon
                        }
                        (Some(_), None) => true,
                        (None, _) => false,
                    };
                    if improved {
                        best = population.best().cloned();
                        stall = 0;
                    } else {
                        stall += 1;
                    }
                    let best_fitness = best.as_ref().map_or(0.0, |b| b.fitness);
                    history.push(best_fitness);
                    debug!(
                        generation,
                        best = best_fitness,
                        mean = population.mean_fitness(),
                        stall,
                        "generation evaluated"
                    );

                    if stall >= config.stall_generations {
                        RunPhase::Finished(TerminationReason::Converged)
                    } else if generation >= config.max_generations {
                        RunPhase::Finished(TerminationReason::MaxGenerationsReached)
                    } else if config
                        .time_budget
                        .is_some_and(|budget| started.elapsed() >= budget)
                    {
                        warn!(generation, "time budget exhausted; returning best so far");
                        RunPhase::Finished(TerminationReason::TimeBudgetExceeded)
                    } else {
                        RunPhase::Evolving
                    }
                }
                RunPhase::Evolving => {
                    let offspring =
                        population.offspring(problem, &operators, config.population_size, &mut rng);
                    let mut next = Population { members: offspring };
                    next.evaluate(problem);
                    population = population.merge_elitist(next.members, config.population_size);
                    generation += 1;
                    RunPhase::Evaluating
                }
                RunPhase::Finished(reason) => break reason,
            };
        };

        // The population is never empty here: size is validated ≥ 2.
        let best = best.unwrap_or_else(|| ScheduleChromosome::random(problem, &mut rng));
        EvolutionRun {
            best,
            history,
            generations: generation,
            termination,
        }
    }

    fn nothing_to_schedule(
        &self,
        work_orders: &[WorkOrder],
        workstations: &[Workstation],
        started: Instant,
    ) -> ScheduleResult {
        let unassignable: Vec<UnassignableWorkOrder> = work_orders
            .iter()
            .map(|wo| UnassignableWorkOrder {
                work_order_id: wo.id.clone(),
                missing_skills: wo.required_skills.clone(),
                fallback_stations: Vec::new(),
            })
            .collect();
        if !unassignable.is_empty() {
            warn!(
                count = unassignable.len(),
                "no workstations available; every work order is unassignable"
            );
        }

        let schedule = Schedule::new();
        let metrics = ScheduleKpi::calculate(&schedule, work_orders, workstations)
            .with_unassignable(unassignable.len());
        info!("nothing to schedule");

        ScheduleResult {
            schedule,
            fitness: 0.0,
            breakdown: FitnessBreakdown::default(),
            metrics,
            unassignable,
            converged: true,
            termination: TerminationReason::NothingToSchedule,
            generations: 0,
            fitness_history: Vec::new(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

struct EvolutionRun {
    best: ScheduleChromosome,
    history: Vec<f64>,
    generations: usize,
    termination: TerminationReason,
}

/// Every work order exactly once, and no station runs two jobs at once.
fn check_invariants(schedule: &Schedule, work_orders: &[WorkOrder]) -> Result<(), SchedulerError> {
    let placed: HashSet<&str> = schedule
        .assignments
        .iter()
        .map(|a| a.work_order_id.as_str())
        .collect();
    let total = schedule.assignment_count() == work_orders.len()
        && placed.len() == work_orders.len()
        && work_orders.iter().all(|wo| placed.contains(wo.id.as_str()));
    if !total {
        let message = format!(
            "schedule has {} assignments for {} work orders",
            schedule.assignment_count(),
            work_orders.len()
        );
        error!(%message, "totality check failed");
        return Err(SchedulerError::InvariantViolation(message));
    }

    if let Some((a, b)) = schedule.time_conflicts().first() {
        let message = format!(
            "'{}' overlaps '{}' on workstation '{}'",
            a.work_order_id, b.work_order_id, a.workstation_id
        );
        error!(%message, "overlap check failed");
        return Err(SchedulerError::InvariantViolation(message));
    }
    Ok(())
}
