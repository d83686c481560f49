//! Scheduling GA problem definition.
//!
//! Implements `u_metaheur::ga::GaProblem` for work-order scheduling.
//! Bridges domain models (`WorkOrder`, `Workstation`) to index-based
//! structures the GA works on: candidate stations per order, processing
//! times per (order, station), and predecessor indices.
//!
//! `GaProblem::evaluate` reports the cost `MAX_FITNESS - score`, matching
//! the minimizing convention of `u_metaheur`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use rand::prelude::IndexedRandom;
use rand::Rng;
use u_metaheur::ga::GaProblem;

use super::chromosome::{Gene, ScheduleChromosome};
use super::config::{FitnessWeights, GaConfig, PenaltyWeights};
use super::fitness::MAX_FITNESS;
use super::operators::{apply_mutation, single_point_crossover};
use crate::models::{Schedule, ScheduleAssignment, Violation, WorkOrder, Workstation};

/// A work order no workstation can fully serve.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignableWorkOrder {
    /// Work order ID.
    pub work_order_id: String,
    /// Required skills no single station offers together.
    pub missing_skills: Vec<String>,
    /// Least-incompatible stations the order falls back to.
    pub fallback_stations: Vec<String>,
}

/// GA problem definition for work-order scheduling.
///
/// Owns copies of the inputs so it can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct SchedulingProblem {
    /// Input work orders (gene `i` belongs to `work_orders[i]`).
    pub work_orders: Vec<WorkOrder>,
    /// Input workstations.
    pub workstations: Vec<Workstation>,
    /// Candidate station indices per order.
    pub candidates: Vec<Vec<usize>>,
    /// `compatible[order][station]`: station covers all required skills.
    pub compatible: Vec<Vec<bool>>,
    /// Processing time per (order, station) in ms.
    pub processing_ms: Vec<Vec<i64>>,
    /// Predecessor indices per order.
    pub predecessors: Vec<Vec<usize>>,
    /// Successor indices per order.
    pub successors: Vec<Vec<usize>>,
    /// Orders without any compatible station.
    pub unassignable: Vec<usize>,
    /// No job starts before this instant (ms).
    pub planning_start_ms: i64,
    /// Normalized sub-score weights.
    pub weights: FitnessWeights,
    /// Penalty weights.
    pub penalties: PenaltyWeights,
    /// Ideal aggregate utilization.
    pub target_utilization: f64,
    /// Optional makespan limit (ms).
    pub max_makespan_ms: Option<i64>,
    /// Bound of the shift mutation offset (ms).
    pub max_shift_ms: i64,
}

impl SchedulingProblem {
    /// Builds a problem from validated inputs.
    ///
    /// Orders with no compatible station get the stations missing the
    /// fewest of their skills as candidates.
    pub fn new(work_orders: &[WorkOrder], workstations: &[Workstation], config: &GaConfig) -> Self {
        let index: HashMap<&str, usize> = work_orders
            .iter()
            .enumerate()
            .map(|(i, wo)| (wo.id.as_str(), i))
            .collect();

        let mut candidates = Vec::with_capacity(work_orders.len());
        let mut compatible = Vec::with_capacity(work_orders.len());
        let mut processing_ms = Vec::with_capacity(work_orders.len());
        let mut unassignable = Vec::new();

        for (i, wo) in work_orders.iter().enumerate() {
            let row: Vec<bool> = workstations
                .iter()
                .map(|ws| ws.covers(&wo.required_skills))
                .collect();
            let mut cands: Vec<usize> = (0..workstations.len()).filter(|&s| row[s]).collect();

            if cands.is_empty() && !workstations.is_empty() {
                unassignable.push(i);
                let missing: Vec<usize> = workstations
                    .iter()
                    .map(|ws| ws.missing_skills(&wo.required_skills).len())
                    .collect();
                let fewest = missing.iter().copied().min().unwrap_or(0);
                cands = (0..workstations.len())
                    .filter(|&s| missing[s] == fewest)
                    .collect();
            }

            processing_ms.push(
                workstations
                    .iter()
                    .map(|ws| ws.processing_ms(wo.duration_ms))
                    .collect(),
            );
            candidates.push(cands);
            compatible.push(row);
        }

        let mut predecessors = vec![Vec::new(); work_orders.len()];
        let mut successors = vec![Vec::new(); work_orders.len()];
        for (i, wo) in work_orders.iter().enumerate() {
            for pred in &wo.predecessors {
                if let Some(&p) = index.get(pred.as_str()) {
                    predecessors[i].push(p);
                    successors[p].push(i);
                }
            }
        }

        let weights = config.weights.normalized().unwrap_or_default();

        Self {
            work_orders: work_orders.to_vec(),
            workstations: workstations.to_vec(),
            candidates,
            compatible,
            processing_ms,
            predecessors,
            successors,
            unassignable,
            planning_start_ms: config.planning_start_ms,
            weights,
            penalties: config.penalties,
            target_utilization: config.target_utilization,
            max_makespan_ms: config.max_makespan_ms,
            max_shift_ms: config.max_shift_ms,
        }
    }

    /// Number of work orders (genes per chromosome).
    pub fn order_count(&self) -> usize {
        self.work_orders.len()
    }

    /// Number of workstations.
    pub fn station_count(&self) -> usize {
        self.workstations.len()
    }

    /// Describes orders no station can fully serve.
    pub fn unassignable_orders(&self) -> Vec<UnassignableWorkOrder> {
        self.unassignable
            .iter()
            .map(|&i| {
                let wo = &self.work_orders[i];
                let missing_skills = wo
                    .required_skills
                    .iter()
                    .filter(|skill| !self.workstations.iter().any(|ws| ws.has_skill(skill)))
                    .cloned()
                    .collect();
                UnassignableWorkOrder {
                    work_order_id: wo.id.clone(),
                    missing_skills,
                    fallback_stations: self.candidates[i]
                        .iter()
                        .map(|&s| self.workstations[s].id.clone())
                        .collect(),
                }
            })
            .collect()
    }

    /// A topological order of the precedence DAG with random tie-breaking.
    ///
    /// Orders caught in a cycle (rejected by validation) are appended last.
    pub fn random_topological_order<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        self.topological_order(|ready| rng.random_range(0..ready.len()))
    }

    /// Topological order releasing the most complex ready order first
    /// (longest-processing-time style), ties broken at random.
    pub fn complexity_first_order<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        self.topological_order(|ready| {
            let top = ready
                .iter()
                .map(|&i| self.work_orders[i].complexity())
                .fold(f64::NEG_INFINITY, f64::max);
            let ties: Vec<usize> = (0..ready.len())
                .filter(|&k| self.work_orders[ready[k]].complexity() >= top)
                .collect();
            ties.choose(rng).copied().unwrap_or(0)
        })
    }

    /// Kahn's algorithm; `pick` chooses an index into the ready list.
    ///
    /// Orders caught in a cycle are appended at the end in input order.
    fn topological_order(&self, mut pick: impl FnMut(&[usize]) -> usize) -> Vec<usize> {
        let n = self.order_count();
        let mut indegree: Vec<usize> = self.predecessors.iter().map(|p| p.len()).collect();
        let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while !ready.is_empty() {
            let k = pick(&ready).min(ready.len() - 1);
            let i = ready.swap_remove(k);
            order.push(i);
            for &succ in &self.successors[i] {
                indegree[succ] -= 1;
                if indegree[succ] == 0 {
                    ready.push(succ);
                }
            }
        }

        if order.len() < n {
            let mut placed = vec![false; n];
            for &i in &order {
                placed[i] = true;
            }
            order.extend((0..n).filter(|&i| !placed[i]));
        }
        order
    }

    /// Re-times every gene so no station runs two jobs at once.
    ///
    /// Genes are released in order of their current start time, but a gene
    /// only becomes eligible once all its predecessors are placed. Each job
    /// starts at the latest of its own start, the station's cursor, the
    /// planning start and its predecessors' ends, then skips maintenance.
    /// End times are recomputed from the assigned station.
    pub fn repair(&self, chromosome: &mut ScheduleChromosome) {
        let n = chromosome.genes.len();
        if n == 0 {
            return;
        }

        let mut indegree: Vec<usize> = self.predecessors.iter().map(|p| p.len()).collect();
        let mut heap: BinaryHeap<Reverse<(i64, usize)>> = (0..n)
            .filter(|&i| indegree[i] == 0)
            .map(|i| Reverse((chromosome.genes[i].start_ms, i)))
            .collect();
        let mut cursor = vec![self.planning_start_ms; self.station_count()];
        let mut placed = vec![false; n];
        let mut placed_count = 0;

        loop {
            let i = match heap.pop() {
                Some(Reverse((_, i))) => i,
                None if placed_count < n => {
                    // Only reachable with cyclic input; release the rest by start.
                    match (0..n)
                        .filter(|&i| !placed[i])
                        .min_by_key(|&i| (chromosome.genes[i].start_ms, i))
                    {
                        Some(i) => i,
                        None => break,
                    }
                }
                None => break,
            };

            self.place_gene(chromosome, i, &mut cursor);
            placed[i] = true;
            placed_count += 1;

            for &succ in &self.successors[i] {
                indegree[succ] = indegree[succ].saturating_sub(1);
                if indegree[succ] == 0 && !placed[succ] {
                    heap.push(Reverse((chromosome.genes[succ].start_ms, succ)));
                }
            }
        }

        chromosome.invalidate();
    }

    fn place_gene(&self, chromosome: &mut ScheduleChromosome, i: usize, cursor: &mut [i64]) {
        let station = chromosome.genes[i].station;
        let processing = self.processing_ms[i][station];
        let mut ready = chromosome.genes[i]
            .start_ms
            .max(cursor[station])
            .max(self.planning_start_ms);
        for &p in &self.predecessors[i] {
            ready = ready.max(chromosome.genes[p].end_ms);
        }
        let start = self.workstations[station].earliest_start(ready, processing);
        let end = start.saturating_add(processing);
        chromosome.genes[i] = Gene {
            station,
            start_ms: start,
            end_ms: end,
        };
        cursor[station] = end;
    }

    /// Decodes a chromosome into a domain schedule with violations.
    pub fn decode(&self, chromosome: &ScheduleChromosome) -> Schedule {
        let mut schedule = Schedule::new();

        for (i, gene) in chromosome.genes.iter().enumerate() {
            let wo = &self.work_orders[i];
            let ws = &self.workstations[gene.station];
            let skill_violation = !self.compatible[i][gene.station];
            schedule.add_assignment(
                ScheduleAssignment::new(&wo.id, &ws.id, gene.start_ms, gene.end_ms)
                    .with_skill_violation(skill_violation),
            );

            if skill_violation {
                schedule.add_violation(Violation::skill_mismatch(
                    &wo.id,
                    format!(
                        "Workstation '{}' lacks skills: {}",
                        ws.id,
                        ws.missing_skills(&wo.required_skills).join(", ")
                    ),
                ));
            }
            if gene.end_ms > wo.due_ms {
                schedule.add_violation(Violation::deadline_miss(
                    &wo.id,
                    format!("Late by {}ms", gene.end_ms.saturating_sub(wo.due_ms)),
                ));
            }
            for &p in &self.predecessors[i] {
                if gene.start_ms < chromosome.genes[p].end_ms {
                    schedule.add_violation(Violation::precedence_violation(
                        &wo.id,
                        format!(
                            "Started before predecessor '{}' finished",
                            self.work_orders[p].id
                        ),
                    ));
                }
            }
        }

        let conflicts: Vec<Violation> = schedule
            .time_conflicts()
            .into_iter()
            .map(|(a, b)| {
                Violation::time_conflict(
                    &a.workstation_id,
                    format!("'{}' overlaps '{}'", a.work_order_id, b.work_order_id),
                )
            })
            .collect();
        for v in conflicts {
            schedule.add_violation(v);
        }

        schedule
    }
}

impl GaProblem for SchedulingProblem {
    type Individual = ScheduleChromosome;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> ScheduleChromosome {
        ScheduleChromosome::random(self, rng)
    }

    fn evaluate(&self, individual: &ScheduleChromosome) -> f64 {
        MAX_FITNESS - self.score(individual)
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &ScheduleChromosome,
        parent2: &ScheduleChromosome,
        rng: &mut R,
    ) -> Vec<ScheduleChromosome> {
        let (c1, c2) = single_point_crossover(self, parent1, parent2, rng);
        vec![c1, c2]
    }

    fn mutate<R: Rng>(&self, individual: &mut ScheduleChromosome, rng: &mut R) {
        apply_mutation(self, individual, self.max_shift_ms, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HOUR_MS;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use u_metaheur::ga::{GaRunner, Individual};

    fn make_problem() -> SchedulingProblem {
        let orders = vec![
            WorkOrder::new("WO1", HOUR_MS, 4 * HOUR_MS).with_skill("weld"),
            WorkOrder::new("WO2", 2 * HOUR_MS, 8 * HOUR_MS)
                .with_skill("paint")
                .with_predecessor("WO1"),
            WorkOrder::new("WO3", HOUR_MS, 8 * HOUR_MS).with_skill("plasma"),
        ];
        let stations = vec![
            Workstation::new("WS1").with_skill("weld"),
            Workstation::new("WS2")
                .with_skill("weld")
                .with_skill("paint")
                .with_efficiency(2.0),
        ];
        SchedulingProblem::new(&orders, &stations, &GaConfig::default())
    }

    #[test]
    fn test_candidates_and_unassignable() {
        let problem = make_problem();
        assert_eq!(problem.candidates[0], vec![0, 1]);
        assert_eq!(problem.candidates[1], vec![1]);
        // WO3 needs plasma: both stations miss exactly one skill
        assert_eq!(problem.unassignable, vec![2]);
        assert_eq!(problem.candidates[2], vec![0, 1]);

        let report = problem.unassignable_orders();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].work_order_id, "WO3");
        assert_eq!(report[0].missing_skills, vec!["plasma".to_string()]);
    }

    #[test]
    fn test_processing_uses_efficiency() {
        let problem = make_problem();
        assert_eq!(problem.processing_ms[1][1], HOUR_MS); // 2h at 2x
        assert_eq!(problem.processing_ms[0][0], HOUR_MS);
    }

    #[test]
    fn test_topological_order_respects_precedence() {
        let problem = make_problem();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let order = problem.random_topological_order(&mut rng);
            assert_eq!(order.len(), 3);
            let pos = |x| order.iter().position(|&i| i == x).unwrap();
            assert!(pos(0) < pos(1));
        }
    }

    #[test]
    fn test_repair_removes_overlap_and_precedence() {
        let problem = make_problem();
        // Everything piled on WS2 at t=0
        let mut ch = ScheduleChromosome::from_genes(vec![
            Gene { station: 1, start_ms: 0, end_ms: 0 },
            Gene { station: 1, start_ms: 0, end_ms: 0 },
            Gene { station: 1, start_ms: 0, end_ms: 0 },
        ]);
        problem.repair(&mut ch);

        let schedule = problem.decode(&ch);
        assert!(schedule.time_conflicts().is_empty());
        assert!(ch.genes[1].start_ms >= ch.genes[0].end_ms);
        assert_eq!(ch.genes[0].end_ms - ch.genes[0].start_ms, HOUR_MS / 2);
    }

    #[test]
    fn test_repair_skips_maintenance() {
        let orders = vec![WorkOrder::new("WO1", HOUR_MS, 10 * HOUR_MS)];
        let stations = vec![Workstation::new("WS1").with_maintenance(0, 2 * HOUR_MS)];
        let problem = SchedulingProblem::new(&orders, &stations, &GaConfig::default());
        let mut ch = ScheduleChromosome::from_genes(vec![Gene {
            station: 0,
            start_ms: 0,
            end_ms: 0,
        }]);
        problem.repair(&mut ch);
        assert_eq!(ch.genes[0].start_ms, 2 * HOUR_MS);
        assert_eq!(ch.genes[0].end_ms, 3 * HOUR_MS);
    }

    #[test]
    fn test_decode_flags_violations() {
        let problem = make_problem();
        let ch = ScheduleChromosome::from_genes(vec![
            Gene { station: 0, start_ms: 0, end_ms: HOUR_MS },
            // starts before WO1 ends, overlaps nothing on WS2
            Gene { station: 1, start_ms: 0, end_ms: HOUR_MS },
            // WO3 on WS1 overlapping WO1, and a skill mismatch
            Gene { station: 0, start_ms: HOUR_MS / 2, end_ms: 2 * HOUR_MS },
        ]);
        let schedule = problem.decode(&ch);
        use crate::models::ViolationType;
        assert_eq!(schedule.violation_count(ViolationType::PrecedenceViolation), 1);
        assert_eq!(schedule.violation_count(ViolationType::TimeConflict), 1);
        assert_eq!(schedule.violation_count(ViolationType::SkillMismatch), 1);
        assert!(schedule.assignment_for("WO3").unwrap().skill_violation);
    }

    #[test]
    fn test_cost_is_score_mirrored() {
        let problem = make_problem();
        let mut rng = SmallRng::seed_from_u64(5);
        let ch = problem.create_individual(&mut rng);
        let cost = GaProblem::evaluate(&problem, &ch);
        assert!((cost + problem.score(&ch) - MAX_FITNESS).abs() < 1e-9);
    }

    #[test]
    fn test_runs_under_generic_runner() {
        let orders: Vec<WorkOrder> = (0..6)
            .map(|i| WorkOrder::new(format!("WO{i}"), HOUR_MS, 4 * HOUR_MS))
            .collect();
        let stations = vec![Workstation::new("WS1"), Workstation::new("WS2")];
        let problem = SchedulingProblem::new(&orders, &stations, &GaConfig::default());
        let config = u_metaheur::ga::GaConfig::default()
            .with_population_size(10)
            .with_max_generations(15)
            .with_seed(42);

        let result = GaRunner::run(&problem, &config);

        assert!(result.best.is_valid(&problem));
        assert!((result.best.fitness() - result.best_fitness).abs() < 1e-9);
        let schedule = problem.decode(&result.best);
        assert!(schedule.time_conflicts().is_empty());
        // Cost is non-increasing under elitism.
        for pair in result.fitness_history.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9);
        }
    }
}
