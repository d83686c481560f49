//! Population management for the scheduling GA.
//!
//! Initialization alternates random and load-balanced individuals.
//! Evaluation and offspring generation run on the current rayon pool;
//! each parent pair gets its own RNG seeded from the master RNG, so a
//! seeded run produces the same population whatever the thread count.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use u_metaheur::ga::{GaProblem, Individual};
use u_numflow::stats;

use super::chromosome::ScheduleChromosome;
use super::operators::GeneticOperators;
use super::problem::SchedulingProblem;

/// A generation of candidate schedules.
#[derive(Debug, Clone, Default)]
pub struct Population {
    /// Individuals, sorted best-first after [`Population::merge_elitist`].
    pub members: Vec<ScheduleChromosome>,
}

impl Population {
    /// Creates `size` individuals, half random and half load-balanced.
    pub fn initialize<R: Rng>(problem: &SchedulingProblem, size: usize, rng: &mut R) -> Self {
        let members = (0..size)
            .map(|i| {
                if i % 2 == 0 {
                    problem.create_individual(rng)
                } else {
                    ScheduleChromosome::with_load_balancing(problem, rng)
                }
            })
            .collect();
        Self { members }
    }

    /// Evaluates every member whose fitness is stale, in parallel.
    pub fn evaluate(&mut self, problem: &SchedulingProblem) {
        self.members
            .par_iter_mut()
            .filter(|ch| !ch.is_evaluated())
            .for_each(|ch| {
                let cost = problem.evaluate(ch);
                ch.set_fitness(cost);
            });
    }

    /// Breeds `count` offspring from tournament-selected parents.
    ///
    /// Parent indices and per-pair seeds are drawn sequentially from `rng`;
    /// the pairs are then bred in parallel.
    pub fn offspring<R: Rng>(
        &self,
        problem: &SchedulingProblem,
        operators: &GeneticOperators,
        count: usize,
        rng: &mut R,
    ) -> Vec<ScheduleChromosome> {
        let pairs = count.div_ceil(2);
        let parents = operators.select_parents(&self.members, pairs * 2, rng);
        let jobs: Vec<(usize, usize, u64)> = parents
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1], rng.random::<u64>()))
            .collect();

        let children: Vec<(ScheduleChromosome, ScheduleChromosome)> = jobs
            .par_iter()
            .map(|&(a, b, seed)| {
                let mut local = SmallRng::seed_from_u64(seed);
                operators.breed(problem, &self.members[a], &self.members[b], &mut local)
            })
            .collect();

        let mut flat = Vec::with_capacity(children.len() * 2);
        for (c1, c2) in children {
            flat.push(c1);
            flat.push(c2);
        }
        flat.truncate(count);
        flat
    }

    /// Keeps the best `size` of current members and offspring.
    pub fn merge_elitist(mut self, offspring: Vec<ScheduleChromosome>, size: usize) -> Self {
        self.members.extend(offspring);
        self.members
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        self.members.truncate(size);
        self
    }

    /// Fittest member, if any.
    pub fn best(&self) -> Option<&ScheduleChromosome> {
        self.members
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// Mean fitness of evaluated members.
    pub fn mean_fitness(&self) -> f64 {
        let evaluated: Vec<f64> = self
            .members
            .iter()
            .filter(|ch| ch.is_evaluated())
            .map(|ch| ch.fitness)
            .collect();
        stats::mean(&evaluated).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
