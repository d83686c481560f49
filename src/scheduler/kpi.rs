//! Schedule quality metrics (KPIs).
//!
//! Computes performance indicators from a finished schedule and its
//! input work orders and workstations.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest end minus earliest start |
//! | Total Tardiness | Sum of max(0, end - due) |
//! | Maximum Tardiness | Largest single delay |
//! | On-Time Rate | Fraction ending by their due instant |
//! | Avg Utilization | Mean busy share over *all* workstations |
//! | Avg Flow Time | Mean time from schedule start to completion |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Schedule, ViolationType, WorkOrder, Workstation};

/// Schedule performance indicators.
///
/// All time values are in milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleKpi {
    /// Latest end minus earliest start (ms).
    pub makespan_ms: i64,
    /// Sum of tardiness across all work orders (ms).
    pub total_tardiness_ms: i64,
    /// Maximum tardiness of any single work order (ms).
    pub max_tardiness_ms: i64,
    /// Fraction of work orders ending on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Average utilization across every workstation, idle ones included.
    pub average_utilization: f64,
    /// Per-workstation utilization.
    pub utilization_by_station: HashMap<String, f64>,
    /// Mean completion time measured from the schedule start (ms).
    pub avg_flow_time_ms: f64,
    /// Work orders no station could fully serve.
    pub unassignable_count: usize,
    pub deadline_misses: usize,
    pub time_conflicts: usize,
    pub precedence_violations: usize,
    pub skill_violations: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its inputs.
    ///
    /// # Arguments
    /// * `schedule` - The finished schedule with its violation list.
    /// * `work_orders` - Input work orders (for due instants).
    /// * `workstations` - Input workstations (idle ones count as 0%).
    pub fn calculate(
        schedule: &Schedule,
        work_orders: &[WorkOrder],
        workstations: &[Workstation],
    ) -> Self {
        let origin = schedule.start_ms().unwrap_or(0);
        let mut total_tardiness: i64 = 0;
        let mut max_tardiness: i64 = 0;
        let mut on_time_count: usize = 0;
        let mut total_flow_time: f64 = 0.0;
        let mut counted: usize = 0;

        for wo in work_orders {
            if let Some(a) = schedule.assignment_for(&wo.id) {
                counted += 1;
                total_flow_time += a.end_ms.saturating_sub(origin) as f64;
                if a.end_ms > wo.due_ms {
                    let tardiness = a.end_ms.saturating_sub(wo.due_ms);
                    total_tardiness = total_tardiness.saturating_add(tardiness);
                    max_tardiness = max_tardiness.max(tardiness);
                } else {
                    on_time_count += 1;
                }
            }
        }

        let busy = schedule.all_utilizations();
        let utilization_by_station: HashMap<String, f64> = workstations
            .iter()
            .map(|ws| (ws.id.clone(), busy.get(&ws.id).copied().unwrap_or(0.0)))
            .collect();
        let average_utilization = if utilization_by_station.is_empty() {
            0.0
        } else {
            utilization_by_station.values().sum::<f64>() / utilization_by_station.len() as f64
        };

        let on_time_rate = if counted == 0 {
            1.0
        } else {
            on_time_count as f64 / counted as f64
        };
        let avg_flow_time_ms = if counted == 0 {
            0.0
        } else {
            total_flow_time / counted as f64
        };

        Self {
            makespan_ms: schedule.makespan_ms(),
            total_tardiness_ms: total_tardiness,
            max_tardiness_ms: max_tardiness,
            on_time_rate,
            average_utilization,
            utilization_by_station,
            avg_flow_time_ms,
            unassignable_count: 0,
            deadline_misses: schedule.violation_count(ViolationType::DeadlineMiss),
            time_conflicts: schedule.violation_count(ViolationType::TimeConflict),
            precedence_violations: schedule.violation_count(ViolationType::PrecedenceViolation),
            skill_violations: schedule.violation_count(ViolationType::SkillMismatch),
        }
    }

    /// Sets the unassignable work-order count.
    pub fn with_unassignable(mut self, count: usize) -> Self {
        self.unassignable_count = count;
        self
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_tardiness: i64, min_utilization: f64) -> bool {
        self.max_tardiness_ms <= max_tardiness && self.average_utilization >= min_utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleAssignment, Violation};

    fn order(id: &str, duration_ms: i64, due_ms: i64) -> WorkOrder {
        WorkOrder::new(id, duration_ms, due_ms)
    }

    fn stations(ids: &[&str]) -> Vec<Workstation> {
        ids.iter().map(|id| Workstation::new(*id)).collect()
    }

    #[test]
    fn test_kpi_basic() {
        let orders = vec![order("J1", 1000, 5000), order("J2", 2000, 5000)];
        let mut schedule = Schedule::new();
        schedule.add_assignment(ScheduleAssignment::new("J1", "M1", 0, 1000));
        schedule.add_assignment(ScheduleAssignment::new("J2", "M1", 1000, 3000));

        let kpi = ScheduleKpi::calculate(&schedule, &orders, &stations(&["M1"]));
        assert_eq!(kpi.makespan_ms, 3000);
        assert_eq!(kpi.total_tardiness_ms, 0);
        assert_eq!(kpi.max_tardiness_ms, 0);
        assert!((kpi.on_time_rate - 1.0).abs() < 1e-10);
        assert!((kpi.avg_flow_time_ms - 2000.0).abs() < 1e-10); // (1000+3000)/2
    }

    #[test]
    fn test_kpi_tardiness() {
        let orders = vec![
            order("J1", 1000, 500), // ends at 1000 → tardy 500
            order("J2", 1000, 5000),
        ];
        let mut schedule = Schedule::new();
        schedule.add_assignment(ScheduleAssignment::new("J1", "M1", 0, 1000));
        schedule.add_assignment(ScheduleAssignment::new("J2", "M1", 1000, 2000));
        schedule.add_violation(Violation::deadline_miss("J1", "Late by 500ms"));

        let kpi = ScheduleKpi::calculate(&schedule, &orders, &stations(&["M1"]));
        assert_eq!(kpi.total_tardiness_ms, 500);
        assert_eq!(kpi.max_tardiness_ms, 500);
        assert!((kpi.on_time_rate - 0.5).abs() < 1e-10);
        assert_eq!(kpi.deadline_misses, 1);
    }

    #[test]
    fn test_kpi_utilization_counts_idle_stations() {
        let orders = vec![order("J1", 2000, 9000), order("J2", 1000, 9000)];
        let mut schedule = Schedule::new();
        schedule.add_assignment(ScheduleAssignment::new("J1", "M1", 0, 2000));
        schedule.add_assignment(ScheduleAssignment::new("J2", "M2", 0, 1000));

        let kpi = ScheduleKpi::calculate(&schedule, &orders, &stations(&["M1", "M2", "M3"]));
        assert_eq!(kpi.makespan_ms, 2000);
        assert!((kpi.utilization_by_station["M1"] - 1.0).abs() < 1e-10);
        assert!((kpi.utilization_by_station["M2"] - 0.5).abs() < 1e-10);
        assert!((kpi.utilization_by_station["M3"] - 0.0).abs() < 1e-10);
        assert!((kpi.average_utilization - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = ScheduleKpi::calculate(&Schedule::new(), &[], &[]).with_unassignable(2);
        assert_eq!(kpi.makespan_ms, 0);
        assert_eq!(kpi.total_tardiness_ms, 0);
        assert!((kpi.on_time_rate - 1.0).abs() < 1e-10);
        assert!((kpi.average_utilization - 0.0).abs() < 1e-10);
        assert_eq!(kpi.unassignable_count, 2);
    }

    #[test]
    fn test_meets_thresholds() {
        let orders = vec![order("J1", 1000, 500)]; // tardy by 500
        let mut schedule = Schedule::new();
        schedule.add_assignment(ScheduleAssignment::new("J1", "M1", 0, 1000));

        let kpi = ScheduleKpi::calculate(&schedule, &orders, &stations(&["M1"]));
        assert!(kpi.meets_thresholds(500, 0.0));
        assert!(!kpi.meets_thresholds(499, 0.0));
        assert!(!kpi.meets_thresholds(1000, 1.5));
    }
}
