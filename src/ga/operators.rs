//! Genetic operators for work-order scheduling.
//!
//! - **Selection**: k-way tournament.
//! - **Crossover**: single cut point over the per-work-order gene sequence.
//! - **Mutation**: one of swap stations, shift start, reassign station.
//!
//! Every operator that changes genes is followed by
//! [`SchedulingProblem::repair`], so offspring never overlap on a station.
//!
//! # Usage
//!
//! ```
//! use u_production::ga::operators::GeneticOperators;
//!
//! let ops = GeneticOperators::default();
//! assert_eq!(ops.tournament_size, 3);
//! assert!((ops.crossover_rate - 0.8).abs() < 1e-10);
//! ```

use rand::prelude::IndexedRandom;
use rand::Rng;
use u_metaheur::ga::Selection;

use super::chromosome::ScheduleChromosome;
use super::config::GaConfig;
use super::problem::SchedulingProblem;
use crate::models::HOUR_MS;

/// Mutation kinds, chosen uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    /// Exchange the stations of two orders if both stay compatible.
    SwapStations,
    /// Move one order's start by a bounded random offset.
    ShiftStart,
    /// Move one order to a different candidate station.
    Reassign,
}

impl MutationType {
    pub const ALL: [MutationType; 3] = [
        MutationType::SwapStations,
        MutationType::ShiftStart,
        MutationType::Reassign,
    ];
}

/// Rates and bounds for the genetic operators.
#[derive(Debug, Clone)]
pub struct GeneticOperators {
    /// Probability of recombining a parent pair.
    pub crossover_rate: f64,
    /// Probability of mutating an offspring.
    pub mutation_rate: f64,
    /// Tournament size k.
    pub tournament_size: usize,
    /// Bound of the shift mutation offset (ms).
    pub max_shift_ms: i64,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self {
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            tournament_size: 3,
            max_shift_ms: 4 * HOUR_MS,
        }
    }
}

impl From<&GaConfig> for GeneticOperators {
    fn from(config: &GaConfig) -> Self {
        Self {
            crossover_rate: config.crossover_rate,
            mutation_rate: config.mutation_rate,
            tournament_size: config.tournament_size,
            max_shift_ms: config.max_shift_ms,
        }
    }
}

impl GeneticOperators {
    /// Builds a parent pool of `count` indices by repeated tournaments.
    pub fn select_parents<R: Rng>(
        &self,
        population: &[ScheduleChromosome],
        count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        (0..count)
            .filter_map(|_| tournament_select(population, self.tournament_size, rng))
            .collect()
    }

    /// Produces two children from two parents.
    ///
    /// Crossover happens with `crossover_rate`, otherwise children are
    /// copies; each child is then mutated with `mutation_rate`.
    pub fn breed<R: Rng>(
        &self,
        problem: &SchedulingProblem,
        p1: &ScheduleChromosome,
        p2: &ScheduleChromosome,
        rng: &mut R,
    ) -> (ScheduleChromosome, ScheduleChromosome) {
        let (mut c1, mut c2) = if rng.random_bool(self.crossover_rate) {
            single_point_crossover(problem, p1, p2, rng)
        } else {
            (p1.clone(), p2.clone())
        };

        for child in [&mut c1, &mut c2] {
            if rng.random_bool(self.mutation_rate) {
                self.mutate(problem, child, rng);
            }
        }
        (c1, c2)
    }

    /// Applies one uniformly chosen mutation, then repairs.
    ///
    /// Returns the kind applied, or `None` if the chosen kind had nothing
    /// to act on (e.g., no compatible pair to swap).
    pub fn mutate<R: Rng>(
        &self,
        problem: &SchedulingProblem,
        chromosome: &mut ScheduleChromosome,
        rng: &mut R,
    ) -> Option<MutationType> {
        apply_mutation(problem, chromosome, self.max_shift_ms, rng)
    }
}

// ======================== Selection ========================

/// k-way tournament: draws `k` members uniformly, returns the fittest index.
///
/// `None` for an empty population.
pub fn tournament_select<R: Rng>(
    population: &[ScheduleChromosome],
    k: usize,
    rng: &mut R,
) -> Option<usize> {
    if population.is_empty() {
        return None;
    }
    Some(Selection::Tournament(k).select(population, rng))
}

// ======================== Crossover ========================

/// Single-point crossover over the gene sequence.
///
/// Child A takes parent 1's genes before the cut and parent 2's from the
/// cut onward; child B the reverse. Both children are repaired.
pub fn single_point_crossover<R: Rng>(
    problem: &SchedulingProblem,
    p1: &ScheduleChromosome,
    p2: &ScheduleChromosome,
    rng: &mut R,
) -> (ScheduleChromosome, ScheduleChromosome) {
    let len = p1.genes.len().min(p2.genes.len());
    if len < 2 {
        return (p1.clone(), p2.clone());
    }
    let cut = rng.random_range(1..len);

    let mut child1 = p1.genes[..cut].to_vec();
    child1.extend_from_slice(&p2.genes[cut..len]);
    let mut child2 = p2.genes[..cut].to_vec();
    child2.extend_from_slice(&p1.genes[cut..len]);

    let mut c1 = ScheduleChromosome::from_genes(child1);
    let mut c2 = ScheduleChromosome::from_genes(child2);
    problem.repair(&mut c1);
    problem.repair(&mut c2);
    (c1, c2)
}

// ======================== Mutation ========================

/// Applies one uniformly chosen mutation, then repairs.
pub fn apply_mutation<R: Rng>(
    problem: &SchedulingProblem,
    chromosome: &mut ScheduleChromosome,
    max_shift_ms: i64,
    rng: &mut R,
) -> Option<MutationType> {
    let kind = *MutationType::ALL.choose(rng)?;
    let applied = match kind {
        MutationType::SwapStations => swap_mutation(problem, chromosome, rng),
        MutationType::ShiftStart => shift_mutation(problem, chromosome, max_shift_ms, rng),
        MutationType::Reassign => reassign_mutation(problem, chromosome, rng),
    };
    if applied {
        problem.repair(chromosome);
        Some(kind)
    } else {
        None
    }
}

/// Swaps the stations of two orders if each fits the other's station.
pub fn swap_mutation<R: Rng>(
    problem: &SchedulingProblem,
    chromosome: &mut ScheduleChromosome,
    rng: &mut R,
) -> bool {
    let len = chromosome.genes.len();
    if len < 2 {
        return false;
    }
    let a = rng.random_range(0..len);
    let b = rng.random_range(0..len);
    let (sa, sb) = (chromosome.genes[a].station, chromosome.genes[b].station);
    if a == b || sa == sb {
        return false;
    }
    if !problem.candidates[a].contains(&sb) || !problem.candidates[b].contains(&sa) {
        return false;
    }
    chromosome.genes[a].station = sb;
    chromosome.genes[b].station = sa;
    true
}

/// Shifts one order's start by up to `max_shift_ms` in either direction.
pub fn shift_mutation<R: Rng>(
    problem: &SchedulingProblem,
    chromosome: &mut ScheduleChromosome,
    max_shift_ms: i64,
    rng: &mut R,
) -> bool {
    if chromosome.genes.is_empty() || max_shift_ms <= 0 {
        return false;
    }
    let idx = rng.random_range(0..chromosome.genes.len());
    let offset = rng.random_range(-max_shift_ms..=max_shift_ms);
    let gene = &mut chromosome.genes[idx];
    gene.start_ms = gene.start_ms.saturating_add(offset).max(problem.planning_start_ms);
    true
}

/// Moves one order to a different candidate station.
pub fn reassign_mutation<R: Rng>(
    problem: &SchedulingProblem,
    chromosome: &mut ScheduleChromosome,
    rng: &mut R,
) -> bool {
    let movable: Vec<usize> = (0..chromosome.genes.len())
        .filter(|&i| problem.candidates[i].len() > 1)
        .collect();
    let Some(&idx) = movable.choose(rng) else {
        return false;
    };
    let current = chromosome.genes[idx].station;
    let others: Vec<usize> = problem.candidates[idx]
        .iter()
        .copied()
        .filter(|&s| s != current)
        .collect();
    match others.choose(rng) {
        Some(&station) => {
            chromosome.genes[idx].station = station;
            true
        }
        None => false,
    }
}
