//! Direct-assignment chromosome for work-order scheduling.
//!
//! # Encoding
//!
//! One gene per work order, at the order's input index. A gene holds the
//! assigned station and the `[start, end)` interval. Because the gene
//! vector is indexed by work order, every chromosome is total by
//! construction: no order can be missing or duplicated.
//!
//! Start times double as sequencing keys: [`SchedulingProblem::repair`]
//! replays genes in start order to restore a conflict-free timeline.

use rand::prelude::IndexedRandom;
use rand::Rng;
use u_metaheur::ga::Individual;

use super::fitness::MAX_FITNESS;
use super::problem::SchedulingProblem;

/// One work order's placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gene {
    /// Station index.
    pub station: usize,
    /// Start time (ms).
    pub start_ms: i64,
    /// End time (ms).
    pub end_ms: i64,
}

/// A candidate schedule.
///
/// The `fitness` field is a score where higher is better. Through
/// [`Individual`] it is exposed as the cost `MAX_FITNESS - fitness`, so the
/// minimizing selection schemes of `u_metaheur` rank schedules correctly.
#[derive(Debug, Clone)]
pub struct ScheduleChromosome {
    /// Gene per work order, indexed like the problem's work orders.
    pub genes: Vec<Gene>,
    /// Fitness value; `NEG_INFINITY` until evaluated.
    pub fitness: f64,
}

impl Individual for ScheduleChromosome {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        MAX_FITNESS - self.fitness
    }

    fn set_fitness(&mut self, cost: f64) {
        self.fitness = MAX_FITNESS - cost;
    }
}

impl ScheduleChromosome {
    /// Wraps genes in an unevaluated chromosome.
    pub fn from_genes(genes: Vec<Gene>) -> Self {
        Self {
            genes,
            fitness: f64::NEG_INFINITY,
        }
    }

    /// Creates a random chromosome: random candidate per order.
    pub fn random<R: Rng>(problem: &SchedulingProblem, rng: &mut R) -> Self {
        Self::build(problem, rng, false)
    }

    /// Creates a load-balanced chromosome: most complex orders first, each
    /// on its least-loaded candidate.
    pub fn with_load_balancing<R: Rng>(problem: &SchedulingProblem, rng: &mut R) -> Self {
        Self::build(problem, rng, true)
    }

    /// Whether a fitness has been computed since the last change.
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_finite()
    }

    /// Marks the fitness stale.
    pub fn invalidate(&mut self) {
        self.fitness = f64::NEG_INFINITY;
    }

    /// Validates gene count and candidate stations against the problem.
    pub fn is_valid(&self, problem: &SchedulingProblem) -> bool {
        if self.genes.len() != problem.order_count() {
            return false;
        }
        self.genes.iter().enumerate().all(|(i, g)| {
            problem.candidates[i].contains(&g.station) && g.end_ms >= g.start_ms
        })
    }

    /// Visits orders in topological order and places each at the end of its
    /// station's queue, after its predecessors, past maintenance.
    fn build<R: Rng>(problem: &SchedulingProblem, rng: &mut R, balanced: bool) -> Self {
        let n = problem.order_count();
        let mut genes = vec![Gene::default(); n];
        let mut cursor = vec![problem.planning_start_ms; problem.station_count()];
        let mut load = vec![0i64; problem.station_count()];
        let order = if balanced {
            problem.complexity_first_order(rng)
        } else {
            problem.random_topological_order(rng)
        };

        for i in order {
            let cands = &problem.candidates[i];
            let station = if balanced {
                cands.iter().copied().min_by_key(|&s| load[s])
            } else {
                cands.choose(rng).copied()
            };
            // Candidates are empty only when there are no stations, in
            // which case the orchestrator never builds a population.
            let Some(station) = station else { continue };

            let processing = problem.processing_ms[i][station];
            let mut ready = cursor[station];
            for &p in &problem.predecessors[i] {
                ready = ready.max(genes[p].end_ms);
            }
            let start = problem.workstations[station].earliest_start(ready, processing);
            genes[i] = Gene {
                station,
                start_ms: start,
                end_ms: start.saturating_add(processing),
            };
            cursor[station] = start.saturating_add(processing);
            load[station] = load[station].saturating_add(processing);
        }

        Self::from_genes(genes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::GaConfig;
    use crate::models::{WorkOrder, Workstation, HOUR_MS};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn sample_problem() -> SchedulingProblem {
        let orders = vec![
            WorkOrder::new("WO1", HOUR_MS, 8 * HOUR_MS).with_skill("cut"),
            WorkOrder::new("WO2", 2 * HOUR_MS, 8 * HOUR_MS).with_predecessor("WO1"),
            WorkOrder::new("WO3", HOUR_MS, 8 * HOUR_MS),
            WorkOrder::new("WO4", HOUR_MS, 8 * HOUR_MS),
        ];
        let stations = vec![
            Workstation::new("WS1").with_skill("cut"),
            Workstation::new("WS2"),
            Workstation::new("WS3"),
        ];
        SchedulingProblem::new(&orders, &stations, &GaConfig::default())
    }

    #[test]
    fn test_random_chromosome() {
        let problem = sample_problem();
        let mut rng = SmallRng::seed_from_u64(42);
        let ch = ScheduleChromosome::random(&problem, &mut rng);

        assert_eq!(ch.genes.len(), 4);
        assert!(ch.is_valid(&problem));
        assert!(!ch.is_evaluated());
        assert_eq!(ch.genes[0].station, 0); // only WS1 can cut
        assert!(ch.genes[1].start_ms >= ch.genes[0].end_ms);
    }

    #[test]
    fn test_load_balanced_spreads_work() {
        let problem = sample_problem();
        let mut rng = SmallRng::seed_from_u64(42);
        let ch = ScheduleChromosome::with_load_balancing(&problem, &mut rng);

        assert!(ch.is_valid(&problem));
        let mut used: Vec<usize> = ch.genes.iter().map(|g| g.station).collect();
        used.sort();
        used.dedup();
        assert_eq!(used.len(), 3);
    }

    #[test]
    fn test_load_balanced_places_complex_orders_first() {
        let orders = vec![
            WorkOrder::new("SMALL", HOUR_MS, 8 * HOUR_MS),
            WorkOrder::new("BIG", 6 * HOUR_MS, 8 * HOUR_MS)
                .with_skill("cnc")
                .with_skill("deburr"),
            WorkOrder::new("MID", 3 * HOUR_MS, 8 * HOUR_MS).with_skill("cnc"),
        ];
        let stations = vec![Workstation::new("WS1").with_skill("cnc").with_skill("deburr")];
        let problem = SchedulingProblem::new(&orders, &stations, &GaConfig::default());
        let mut rng = SmallRng::seed_from_u64(9);

        assert_eq!(problem.complexity_first_order(&mut rng), vec![1, 2, 0]);
        let ch = ScheduleChromosome::with_load_balancing(&problem, &mut rng);
        assert_eq!(ch.genes[1].start_ms, 0);
        assert_eq!(ch.genes[2].start_ms, ch.genes[1].end_ms);
        assert_eq!(ch.genes[0].start_ms, ch.genes[2].end_ms);
    }

    #[test]
    fn test_built_chromosome_has_no_overlap() {
        let problem = sample_problem();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            let ch = ScheduleChromosome::random(&problem, &mut rng);
            let schedule = problem.decode(&ch);
            assert!(schedule.time_conflicts().is_empty());
        }
    }

    #[test]
    fn test_individual_cost_mirrors_score() {
        let mut ch = ScheduleChromosome::from_genes(vec![]);
        // Unevaluated chromosomes are the worst possible cost.
        assert_eq!(Individual::fitness(&ch), f64::INFINITY);

        ch.set_fitness(30.0);
        assert!((ch.fitness - 170.0).abs() < 1e-12);
        assert!((Individual::fitness(&ch) - 30.0).abs() < 1e-12);
        assert!(ch.is_evaluated());
    }

    #[test]
    fn test_invalid_chromosome() {
        let problem = sample_problem();
        let short = ScheduleChromosome::from_genes(vec![Gene::default(); 2]);
        assert!(!short.is_valid(&problem));

        // WO1 on a station without the cut skill
        let mut wrong = ScheduleChromosome::from_genes(vec![Gene::default(); 4]);
        wrong.genes[0].station = 1;
        assert!(!wrong.is_valid(&problem));
    }
}
