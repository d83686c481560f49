//! Multi-objective fitness evaluation.
//!
//! # Score Composition
//!
//! | Part | Range | Definition |
//! |------|-------|-----------|
//! | On-time | 0-100 | share of orders ending by their due instant |
//! | Utilization | 0-100 | Σbusy / (stations × span), relative to the target |
//! | Load balance | 0-100 | 100 − σ(per-station utilization) × 100 |
//! | Compliance | 0-100 | skill fit and priority-weighted earliness |
//!
//! `total = Σ weight × part + 100 − penalties`, clamped to [0, 200].
//! The 100-point feasibility band is consumed first by penalties, so
//! time conflicts and precedence violations push fitness to the bottom of
//! the range whatever the other parts say.
//!
//! Evaluation is a pure function of the chromosome and the problem.

use serde::Serialize;
use u_numflow::stats;

use super::chromosome::ScheduleChromosome;
use super::problem::SchedulingProblem;

/// Upper bound of the fitness range.
pub const MAX_FITNESS: f64 = 200.0;

/// Points available to an executable schedule before penalties.
pub const FEASIBILITY_BAND: f64 = 100.0;

/// Scale applied to the standard deviation of utilization fractions.
pub const LOAD_BALANCE_SCALE: f64 = 100.0;

/// Per-part fitness of one chromosome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessBreakdown {
    pub on_time: f64,
    pub utilization: f64,
    pub load_balance: f64,
    pub compliance: f64,
    /// Weighted sum of the four parts (0-100).
    pub weighted: f64,
    /// Overlapping pairs on one station.
    pub time_conflicts: usize,
    /// Orders starting before a predecessor ends.
    pub precedence_violations: usize,
    /// Orders on stations lacking a required skill.
    pub skill_violations: usize,
    /// Span beyond the makespan limit (ms).
    pub makespan_overrun_ms: i64,
    /// Total subtracted points.
    pub penalty: f64,
    /// Final fitness (0-200).
    pub total: f64,
}

impl FitnessBreakdown {
    /// Whether the schedule can be executed as-is.
    pub fn is_executable(&self) -> bool {
        self.time_conflicts == 0 && self.precedence_violations == 0
    }
}

impl SchedulingProblem {
    /// Scalar fitness of a chromosome (higher is better).
    pub fn score(&self, chromosome: &ScheduleChromosome) -> f64 {
        self.fitness_breakdown(chromosome).total
    }

    /// Computes every fitness part of a chromosome.
    pub fn fitness_breakdown(&self, chromosome: &ScheduleChromosome) -> FitnessBreakdown {
        let genes = &chromosome.genes;
        let n = genes.len();
        let m = self.station_count();
        if n == 0 || m == 0 {
            return FitnessBreakdown::default();
        }

        let origin = genes.iter().map(|g| g.start_ms).min().unwrap_or(0);
        let horizon = genes.iter().map(|g| g.end_ms).max().unwrap_or(origin);
        let span = horizon.saturating_sub(origin).max(1) as f64;

        let mut busy = vec![0i64; m];
        let mut on_time = 0usize;
        let mut skill_violations = 0usize;
        for (i, g) in genes.iter().enumerate() {
            busy[g.station] = busy[g.station].saturating_add(g.end_ms.saturating_sub(g.start_ms));
            if g.end_ms <= self.work_orders[i].due_ms {
                on_time += 1;
            }
            if !self.compatible[i][g.station] {
                skill_violations += 1;
            }
        }

        let on_time_score = 100.0 * on_time as f64 / n as f64;

        let total_busy: i64 = busy.iter().sum();
        let utilization = total_busy as f64 / (m as f64 * span);
        let utilization_score = 100.0 * (utilization / self.target_utilization).min(1.0);

        let per_station: Vec<f64> = busy.iter().map(|&b| b as f64 / span).collect();
        let balance_score =
            (100.0 - std_dev(&per_station) * LOAD_BALANCE_SCALE).clamp(0.0, 100.0);

        let skill_score = 100.0 * (1.0 - skill_violations as f64 / n as f64);
        let compliance_score = 0.5 * skill_score + 0.5 * self.priority_earliness(chromosome, origin, span);

        let w = &self.weights;
        let weighted = w.on_time * on_time_score
            + w.utilization * utilization_score
            + w.load_balance * balance_score
            + w.compliance * compliance_score;

        let time_conflicts = count_overlaps(chromosome, m);
        let precedence_violations = genes
            .iter()
            .enumerate()
            .map(|(i, g)| {
                self.predecessors[i]
                    .iter()
                    .filter(|&&p| g.start_ms < genes[p].end_ms)
                    .count()
            })
            .sum::<usize>();

        let makespan = horizon.saturating_sub(origin);
        let (makespan_overrun_ms, overrun_penalty) = match self.max_makespan_ms {
            Some(limit) if makespan > limit => {
                let over = makespan.saturating_sub(limit);
                let ratio = (over as f64 / limit as f64).min(1.0);
                (over, ratio * self.penalties.makespan_overrun)
            }
            _ => (0, 0.0),
        };

        let p = &self.penalties;
        let penalty = p.time_conflict * time_conflicts as f64
            + p.precedence * precedence_violations as f64
            + p.skill_violation * skill_violations as f64
            + overrun_penalty;

        let total = (weighted + FEASIBILITY_BAND - penalty).clamp(0.0, MAX_FITNESS);

        FitnessBreakdown {
            on_time: on_time_score,
            utilization: utilization_score,
            load_balance: balance_score,
            compliance: compliance_score,
            weighted,
            time_conflicts,
            precedence_violations,
            skill_violations,
            makespan_overrun_ms,
            penalty,
            total,
        }
    }

    /// 100 when every order starts at the origin, falling as
    /// higher-priority orders start later in the span.
    fn priority_earliness(&self, chromosome: &ScheduleChromosome, origin: i64, span: f64) -> f64 {
        let min_priority = self
            .work_orders
            .iter()
            .map(|wo| wo.priority)
            .min()
            .unwrap_or(0);

        let mut weighted_delay = 0.0;
        let mut weight_sum = 0.0;
        for (i, g) in chromosome.genes.iter().enumerate() {
            let weight = (self.work_orders[i].priority as f64 - min_priority as f64) + 1.0;
            weighted_delay += weight * g.start_ms.saturating_sub(origin) as f64 / span;
            weight_sum += weight;
        }
        if weight_sum <= 0.0 {
            return 100.0;
        }
        (100.0 * (1.0 - weighted_delay / weight_sum)).clamp(0.0, 100.0)
    }
}

/// Overlapping gene pairs per station.
fn count_overlaps(chromosome: &ScheduleChromosome, stations: usize) -> usize {
    let mut lanes: Vec<Vec<(i64, i64)>> = vec![Vec::new(); stations];
    for g in &chromosome.genes {
        lanes[g.station].push((g.start_ms, g.end_ms));
    }

    let mut count = 0;
    for lane in lanes.iter_mut() {
        lane.sort_unstable();
        for (i, &(_, end)) in lane.iter().enumerate() {
            count += lane[i + 1..]
                .iter()
                .take_while(|&&(start, _)| start < end)
                .count();
        }
    }
    count
}

/// Population standard deviation, 0 for empty or non-finite input.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    stats::population_std_dev(values).unwrap_or(0.0)
}
