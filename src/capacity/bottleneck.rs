//! Bottleneck detection.
//!
//! # Score
//!
//! Four factors, each clamped to [0, 100]:
//!
//! | Factor | Formula | Weight |
//! |--------|---------|--------|
//! | Utilization | (u − 0.5) / 0.45 | 0.4 |
//! | Efficiency | (1.1 − e) / 0.6 | 0.3 |
//! | Skill gap | 1 − coverage | 0.2 |
//! | Maintenance | ratio / 0.2 | 0.1 |
//!
//! Score ≥ 70 is critical, 40-69 potential. A station covering less than
//! 80% of the skills demanded of it is flagged as potential whatever its
//! score.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::analyzer::CapacityProfile;
use crate::models::{Schedule, WorkOrder, Workstation};

pub const CRITICAL_SCORE: f64 = 70.0;
pub const POTENTIAL_SCORE: f64 = 40.0;
/// Skill coverage below which a station is always flagged.
pub const COVERAGE_FLOOR: f64 = 0.8;

const UTILIZATION_WEIGHT: f64 = 0.4;
const EFFICIENCY_WEIGHT: f64 = 0.3;
const SKILL_WEIGHT: f64 = 0.2;
const MAINTENANCE_WEIGHT: f64 = 0.1;

/// Bottleneck severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    None,
    Potential,
    Critical,
}

impl Severity {
    pub fn from_score(score: f64) -> Self {
        if score >= CRITICAL_SCORE {
            Severity::Critical
        } else if score >= POTENTIAL_SCORE {
            Severity::Potential
        } else {
            Severity::None
        }
    }
}

/// Remedy categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    IncreaseCapacity,
    Rebalance,
    CrossTrain,
    ImproveEfficiency,
    RescheduleMaintenance,
}

/// A remedy for one bottleneck.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckAction {
    pub kind: ActionKind,
    pub description: String,
    /// Station to move work to, for rebalancing.
    pub target_workstation: Option<String>,
    /// Estimated utilization reduction (fraction).
    pub estimated_impact: f64,
}

/// Factor scores (0-100 each).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckFactors {
    pub utilization: f64,
    pub efficiency: f64,
    pub skill_gap: f64,
    pub maintenance: f64,
}

impl BottleneckFactors {
    pub fn compute(utilization: f64, efficiency: f64, coverage: f64, maintenance_ratio: f64) -> Self {
        let scaled = |x: f64| (x * 100.0).clamp(0.0, 100.0);
        Self {
            utilization: scaled((utilization - 0.5) / 0.45),
            efficiency: scaled((1.1 - efficiency) / 0.6),
            skill_gap: scaled(1.0 - coverage),
            maintenance: scaled(maintenance_ratio / 0.2),
        }
    }

    /// Weighted score (0-100).
    pub fn score(&self) -> f64 {
        UTILIZATION_WEIGHT * self.utilization
            + EFFICIENCY_WEIGHT * self.efficiency
            + SKILL_WEIGHT * self.skill_gap
            + MAINTENANCE_WEIGHT * self.maintenance
    }
}

/// Bottleneck assessment of one workstation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckRecord {
    pub workstation_id: String,
    pub score: f64,
    pub severity: Severity,
    pub factors: BottleneckFactors,
    pub utilization: f64,
    /// Share of demanded skills the station has (1.0 when nothing is demanded).
    pub coverage: f64,
    /// Demanded skills the station lacks.
    pub missing_skills: Vec<String>,
    /// Remedies, highest estimated impact first.
    pub actions: Vec<BottleneckAction>,
}

/// Flagged stations by tier, each sorted by score descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckReport {
    pub critical: Vec<BottleneckRecord>,
    pub potential: Vec<BottleneckRecord>,
}

impl BottleneckReport {
    /// All flagged records, critical first.
    pub fn flagged(&self) -> impl Iterator<Item = &BottleneckRecord> {
        self.critical.iter().chain(self.potential.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.potential.is_empty()
    }
}

/// Skills demanded of each workstation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillDemand {
    by_station: HashMap<String, BTreeSet<String>>,
}

impl SkillDemand {
    /// No demand: every station has full coverage.
    pub fn none() -> Self {
        Self::default()
    }

    /// Skills of the work orders placed on each station.
    pub fn from_schedule(schedule: &Schedule, work_orders: &[WorkOrder]) -> Self {
        let orders: HashMap<&str, &WorkOrder> =
            work_orders.iter().map(|wo| (wo.id.as_str(), wo)).collect();
        let mut by_station: HashMap<String, BTreeSet<String>> = HashMap::new();
        for a in &schedule.assignments {
            if let Some(wo) = orders.get(a.work_order_id.as_str()) {
                by_station
                    .entry(a.workstation_id.clone())
                    .or_default()
                    .extend(wo.required_skills.iter().cloned());
            }
        }
        Self { by_station }
    }

    /// Skills of the work orders that share at least one skill with each
    /// station, i.e. the orders the station would plausibly receive.
    pub fn from_work_orders(work_orders: &[WorkOrder], workstations: &[Workstation]) -> Self {
        let mut by_station: HashMap<String, BTreeSet<String>> = HashMap::new();
        for ws in workstations {
            for wo in work_orders {
                if wo.required_skills.iter().any(|s| ws.has_skill(s)) {
                    by_station
                        .entry(ws.id.clone())
                        .or_default()
                        .extend(wo.required_skills.iter().cloned());
                }
            }
        }
        Self { by_station }
    }

    /// Adds demanded skills for one station.
    pub fn with_demand<I, S>(mut self, workstation_id: impl Into<String>, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_station
            .entry(workstation_id.into())
            .or_default()
            .extend(skills.into_iter().map(Into::into));
        self
    }

    pub fn for_station(&self, workstation_id: &str) -> Option<&BTreeSet<String>> {
        self.by_station.get(workstation_id)
    }

    /// Coverage and missing skills of a station against its demand.
    pub fn coverage(&self, ws: &Workstation) -> (f64, Vec<String>) {
        match self.for_station(&ws.id) {
            Some(demanded) if !demanded.is_empty() => {
                let missing: Vec<String> = demanded
                    .iter()
                    .filter(|s| !ws.has_skill(s))
                    .cloned()
                    .collect();
                let covered = demanded.len() - missing.len();
                (covered as f64 / demanded.len() as f64, missing)
            }
            _ => (1.0, Vec::new()),
        }
    }
}

/// Stateless bottleneck detector.
#[derive(Debug, Clone, Copy)]
pub struct BottleneckDetector {
    /// Utilization at which adding capacity is suggested.
    pub capacity_threshold: f64,
}

impl Default for BottleneckDetector {
    fn default() -> Self {
        Self {
            capacity_threshold: 0.8,
        }
    }
}

impl BottleneckDetector {
    pub fn new(capacity_threshold: f64) -> Self {
        Self { capacity_threshold }
    }

    /// Scores every station in `profile` and returns the flagged ones.
    ///
    /// `workstations` must be the list the profile was built from.
    pub fn detect(
        &self,
        workstations: &[Workstation],
        profile: &CapacityProfile,
        demand: &SkillDemand,
    ) -> BottleneckReport {
        let utilization: Vec<f64> = profile.stations.iter().map(|s| s.utilization).collect();
        let mut report = BottleneckReport::default();

        for (i, (ws, cap)) in workstations.iter().zip(&profile.stations).enumerate() {
            let (coverage, missing_skills) = demand.coverage(ws);
            let factors =
                BottleneckFactors::compute(cap.utilization, ws.efficiency, coverage, cap.maintenance_ratio);
            let score = factors.score();
            let mut severity = Severity::from_score(score);
            if severity == Severity::None && coverage < COVERAGE_FLOOR {
                severity = Severity::Potential;
            }
            if severity == Severity::None {
                continue;
            }

            let actions = self.actions_for(i, workstations, &utilization, cap.maintenance_ratio, coverage, &missing_skills);
            let record = BottleneckRecord {
                workstation_id: ws.id.clone(),
                score,
                severity,
                factors,
                utilization: cap.utilization,
                coverage,
                missing_skills,
                actions,
            };
            match severity {
                Severity::Critical => report.critical.push(record),
                _ => report.potential.push(record),
            }
        }

        report.critical.sort_by(|a, b| b.score.total_cmp(&a.score));
        report.potential.sort_by(|a, b| b.score.total_cmp(&a.score));
        report
    }

    fn actions_for(
        &self,
        idx: usize,
        workstations: &[Workstation],
        utilization: &[f64],
        maintenance_ratio: f64,
        coverage: f64,
        missing_skills: &[String],
    ) -> Vec<BottleneckAction> {
        let ws = &workstations[idx];
        let u = utilization[idx];
        let mut actions = Vec::new();

        if u >= self.capacity_threshold {
            let slots = ws.capacity.max(1) as f64;
            actions.push(BottleneckAction {
                kind: ActionKind::IncreaseCapacity,
                description: format!(
                    "Add a parallel slot to '{}' ({} → {})",
                    ws.id,
                    ws.capacity,
                    u64::from(ws.capacity) + 1
                ),
                target_workstation: None,
                estimated_impact: u / (slots + 1.0),
            });
        }

        // Least-loaded peer able to take this station's kind of work
        let peer = workstations
            .iter()
            .enumerate()
            .filter(|&(j, other)| {
                j != idx && (ws.skills.is_empty() || ws.skills.iter().any(|s| other.has_skill(s)))
            })
            .min_by(|a, b| utilization[a.0].total_cmp(&utilization[b.0]));
        if let Some((j, other)) = peer {
            let gap = u - utilization[j];
            if gap > 0.1 {
                actions.push(BottleneckAction {
                    kind: ActionKind::Rebalance,
                    description: format!(
                        "Move work from '{}' to '{}' ({:.0}% vs {:.0}% load)",
                        ws.id,
                        other.id,
                        u * 100.0,
                        utilization[j] * 100.0
                    ),
                    target_workstation: Some(other.id.clone()),
                    estimated_impact: gap / 2.0,
                });
            }
        }

        if !missing_skills.is_empty() {
            actions.push(BottleneckAction {
                kind: ActionKind::CrossTrain,
                description: format!("Cross-train '{}' in: {}", ws.id, missing_skills.join(", ")),
                target_workstation: None,
                estimated_impact: u * (1.0 - coverage) * 0.5,
            });
        }

        if ws.efficiency < 1.0 {
            actions.push(BottleneckAction {
                kind: ActionKind::ImproveEfficiency,
                description: format!(
                    "Raise efficiency of '{}' from {:.0}% toward nominal",
                    ws.id,
                    ws.efficiency * 100.0
                ),
                target_workstation: None,
                estimated_impact: u * (1.0 - ws.efficiency),
            });
        }

        if maintenance_ratio > 0.0 {
            actions.push(BottleneckAction {
                kind: ActionKind::RescheduleMaintenance,
                description: format!(
                    "Move maintenance on '{}' out of peak periods ({:.0}% of horizon)",
                    ws.id,
                    maintenance_ratio * 100.0
                ),
                target_workstation: None,
                estimated_impact: u * maintenance_ratio,
            });
        }

        actions.sort_by(|a, b| b.estimated_impact.total_cmp(&a.estimated_impact));
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::analyzer::{AnalyzerConfig, StationCapacity};
    use crate::models::ScheduleAssignment;

    fn profile(stations: &[Workstation], util: &[f64], maint: &[f64]) -> CapacityProfile {
        let config = AnalyzerConfig::default();
        let rows: Vec<StationCapacity> = stations
            .iter()
            .zip(util.iter().zip(maint))
            .map(|(ws, (&u, &m))| StationCapacity::compute(ws, 1, &config, m, u))
            .collect();
        CapacityProfile::from_stations(1, rows)
    }

    #[test]
    fn test_factor_formulas() {
        let f = BottleneckFactors::compute(0.95, 0.5, 0.5, 0.1);
        assert!((f.utilization - 100.0).abs() < 1e-9);
        assert!((f.efficiency - 100.0).abs() < 1e-9);
        assert!((f.skill_gap - 50.0).abs() < 1e-9);
        assert!((f.maintenance - 50.0).abs() < 1e-9);
        assert!((f.score() - (40.0 + 30.0 + 10.0 + 5.0)).abs() < 1e-9);

        let idle = BottleneckFactors::compute(0.2, 1.2, 1.0, 0.0);
        assert_eq!(idle.score(), 0.0);
    }

    #[test]
    fn test_severity_tiers() {
        assert_eq!(Severity::from_score(70.0), Severity::Critical);
        assert_eq!(Severity::from_score(69.9), Severity::Potential);
        assert_eq!(Severity::from_score(40.0), Severity::Potential);
        assert_eq!(Severity::from_score(39.9), Severity::None);
    }

    #[test]
    fn test_detect_tiers_and_actions() {
        let stations = vec![
            Workstation::new("HOT").with_skill("cut").with_efficiency(0.5),
            Workstation::new("OK").with_skill("cut"),
            Workstation::new("IDLE").with_skill("cut"),
        ];
        let p = profile(&stations, &[0.98, 0.6, 0.1], &[0.1, 0.0, 0.0]);
        let report = BottleneckDetector::new(0.8).detect(&stations, &p, &SkillDemand::none());

        assert_eq!(report.critical.len(), 1);
        let hot = &report.critical[0];
        assert_eq!(hot.workstation_id, "HOT");
        assert!(hot.score >= CRITICAL_SCORE);
        assert!(report.potential.is_empty());

        let kinds: Vec<ActionKind> = hot.actions.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&ActionKind::IncreaseCapacity));
        assert!(kinds.contains(&ActionKind::ImproveEfficiency));
        assert!(kinds.contains(&ActionKind::RescheduleMaintenance));
        let rebalance = hot
            .actions
            .iter()
            .find(|a| a.kind == ActionKind::Rebalance)
            .unwrap();
        assert_eq!(rebalance.target_workstation.as_deref(), Some("IDLE"));
        assert!(hot
            .actions
            .windows(2)
            .all(|w| w[0].estimated_impact >= w[1].estimated_impact));
    }

    #[test]
    fn test_capacity_action_at_max_slots() {
        let stations = vec![Workstation::new("WIDE")
            .with_capacity(u32::MAX)
            .with_efficiency(0.5)];
        let p = profile(&stations, &[0.98], &[0.1]);
        let report = BottleneckDetector::new(0.8).detect(&stations, &p, &SkillDemand::none());

        let add = report.critical[0]
            .actions
            .iter()
            .find(|a| a.kind == ActionKind::IncreaseCapacity)
            .unwrap();
        assert!(add.description.contains("4294967295 → 4294967296"));
        assert!(add.estimated_impact > 0.0);
    }

    #[test]
    fn test_low_coverage_flags_regardless_of_load() {
        let stations = vec![Workstation::new("WS1").with_skill("cut")];
        let demand = SkillDemand::none().with_demand("WS1", ["cut", "weld", "paint"]);
        let p = profile(&stations, &[0.1], &[0.0]);
        let report = BottleneckDetector::new(0.8).detect(&stations, &p, &demand);

        assert_eq!(report.potential.len(), 1);
        let rec = &report.potential[0];
        assert!(rec.score < POTENTIAL_SCORE);
        assert!((rec.coverage - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(rec.missing_skills, vec!["paint".to_string(), "weld".to_string()]);
        assert_eq!(rec.actions[0].kind, ActionKind::CrossTrain);
    }

    #[test]
    fn test_demand_from_schedule_and_orders() {
        let orders = vec![
            WorkOrder::new("WO1", 1000, 5000).with_skill("cut").with_skill("weld"),
            WorkOrder::new("WO2", 1000, 5000).with_skill("paint"),
        ];
        let stations = vec![Workstation::new("A").with_skill("cut"), Workstation::new("B")];

        let mut schedule = Schedule::new();
        schedule.add_assignment(ScheduleAssignment::new("WO1", "B", 0, 1000));
        let from_schedule = SkillDemand::from_schedule(&schedule, &orders);
        assert_eq!(from_schedule.for_station("B").unwrap().len(), 2);
        assert!(from_schedule.for_station("A").is_none());

        let from_orders = SkillDemand::from_work_orders(&orders, &stations);
        let a = from_orders.for_station("A").unwrap();
        assert!(a.contains("weld") && !a.contains("paint"));
        let (coverage, missing) = from_orders.coverage(&stations[0]);
        assert!((coverage - 0.5).abs() < 1e-9);
        assert_eq!(missing, vec!["weld".to_string()]);
        assert_eq!(from_orders.coverage(&stations[1]).0, 1.0);
    }
}
