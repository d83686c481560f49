//! Schedule (solution) model.
//!
//! A schedule places every work order on one workstation for one time
//! interval. It may carry constraint violations for schedules that are
//! late, conflicting, or skill-deficient.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A complete schedule: one assignment per work order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Work order assignments.
    pub assignments: Vec<ScheduleAssignment>,
    /// Constraint violations detected in this schedule.
    pub violations: Vec<Violation>,
}

/// A work order placed on a workstation over `[start_ms, end_ms)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAssignment {
    /// Assigned work order ID.
    pub work_order_id: String,
    /// Assigned workstation ID.
    pub workstation_id: String,
    /// Start time (ms).
    pub start_ms: i64,
    /// End time (ms).
    pub end_ms: i64,
    /// The station lacks at least one skill the work order requires.
    #[serde(default)]
    pub skill_violation: bool,
}

/// A constraint violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity ID (work order or workstation).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationType {
    /// Work order completed after its due instant.
    DeadlineMiss,
    /// Two assignments overlap on the same workstation.
    TimeConflict,
    /// Work order started before a predecessor finished.
    PrecedenceViolation,
    /// Workstation lacks a required skill.
    SkillMismatch,
}

impl ScheduleAssignment {
    /// Creates a new assignment.
    pub fn new(
        work_order_id: impl Into<String>,
        workstation_id: impl Into<String>,
        start_ms: i64,
        end_ms: i64,
    ) -> Self {
        Self {
            work_order_id: work_order_id.into(),
            workstation_id: workstation_id.into(),
            start_ms,
            end_ms,
            skill_violation: false,
        }
    }

    /// Marks the assignment as skill-deficient.
    pub fn with_skill_violation(mut self, violated: bool) -> Self {
        self.skill_violation = violated;
        self
    }

    /// Duration (end - start) in ms.
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Whether two assignments share time.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }
}

impl Violation {
    /// Creates a deadline miss violation.
    pub fn deadline_miss(work_order_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::DeadlineMiss,
            entity_id: work_order_id.into(),
            message: message.into(),
            severity: 60,
        }
    }

    /// Creates a time conflict violation.
    pub fn time_conflict(workstation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::TimeConflict,
            entity_id: workstation_id.into(),
            message: message.into(),
            severity: 100,
        }
    }

    /// Creates a precedence violation.
    pub fn precedence_violation(
        work_order_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type: ViolationType::PrecedenceViolation,
            entity_id: work_order_id.into(),
            message: message.into(),
            severity: 95,
        }
    }

    /// Creates a skill mismatch violation.
    pub fn skill_mismatch(work_order_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::SkillMismatch,
            entity_id: work_order_id.into(),
            message: message.into(),
            severity: 70,
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: ScheduleAssignment) {
        self.assignments.push(assignment);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the schedule has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations of a given type.
    pub fn violation_count(&self, kind: ViolationType) -> usize {
        self.violations
            .iter()
            .filter(|v| v.violation_type == kind)
            .count()
    }

    /// Earliest start across all assignments (ms).
    pub fn start_ms(&self) -> Option<i64> {
        self.assignments.iter().map(|a| a.start_ms).min()
    }

    /// Latest end across all assignments (ms).
    pub fn end_ms(&self) -> Option<i64> {
        self.assignments.iter().map(|a| a.end_ms).max()
    }

    /// Makespan: latest end minus earliest start (ms); 0 when empty.
    pub fn makespan_ms(&self) -> i64 {
        match (self.start_ms(), self.end_ms()) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => 0,
        }
    }

    /// Finds the assignment for a given work order.
    pub fn assignment_for(&self, work_order_id: &str) -> Option<&ScheduleAssignment> {
        self.assignments
            .iter()
            .find(|a| a.work_order_id == work_order_id)
    }

    /// Returns all assignments for a given workstation, in start order.
    pub fn assignments_for_station(&self, workstation_id: &str) -> Vec<&ScheduleAssignment> {
        let mut on_station: Vec<&ScheduleAssignment> = self
            .assignments
            .iter()
            .filter(|a| a.workstation_id == workstation_id)
            .collect();
        on_station.sort_by_key(|a| (a.start_ms, a.end_ms));
        on_station
    }

    /// Busy time per workstation (ms).
    pub fn busy_by_station(&self) -> HashMap<String, i64> {
        let mut busy: HashMap<String, i64> = HashMap::new();
        for a in &self.assignments {
            *busy.entry(a.workstation_id.clone()).or_insert(0) += a.duration_ms();
        }
        busy
    }

    /// Utilization of one workstation over the schedule's span.
    ///
    /// Returns `None` for an empty schedule.
    pub fn station_utilization(&self, workstation_id: &str) -> Option<f64> {
        let span = self.makespan_ms();
        if span <= 0 {
            return None;
        }
        let busy: i64 = self
            .assignments
            .iter()
            .filter(|a| a.workstation_id == workstation_id)
            .map(|a| a.duration_ms())
            .sum();
        Some(busy as f64 / span as f64)
    }

    /// Utilization for all workstations that have assignments.
    pub fn all_utilizations(&self) -> HashMap<String, f64> {
        let span = self.makespan_ms();
        if span <= 0 {
            return HashMap::new();
        }
        self.busy_by_station()
            .into_iter()
            .map(|(id, busy)| (id, busy as f64 / span as f64))
            .collect()
    }

    /// Pairs of overlapping assignments on the same workstation.
    pub fn time_conflicts(&self) -> Vec<(&ScheduleAssignment, &ScheduleAssignment)> {
        let mut by_station: HashMap<&str, Vec<&ScheduleAssignment>> = HashMap::new();
        for a in &self.assignments {
            by_station.entry(a.workstation_id.as_str()).or_default().push(a);
        }

        let mut conflicts = Vec::new();
        for list in by_station.values_mut() {
            list.sort_by_key(|a| a.start_ms);
            for (i, a) in list.iter().enumerate() {
                for b in &list[i + 1..] {
                    if b.start_ms >= a.end_ms {
                        break;
                    }
                    conflicts.push((*a, *b));
                }
            }
        }
        conflicts
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(ScheduleAssignment::new("WO1", "WS1", 0, 5000));
        s.add_assignment(ScheduleAssignment::new("WO2", "WS2", 1000, 4000));
        s.add_assignment(ScheduleAssignment::new("WO3", "WS1", 5000, 8000));
        s
    }

    #[test]
    fn test_schedule_makespan() {
        let s = sample_schedule();
        assert_eq!(s.makespan_ms(), 8000);

        let mut shifted = Schedule::new();
        shifted.add_assignment(ScheduleAssignment::new("WO1", "WS1", 2000, 3000));
        shifted.add_assignment(ScheduleAssignment::new("WO2", "WS1", 3000, 6000));
        assert_eq!(shifted.makespan_ms(), 4000);
    }

    #[test]
    fn test_schedule_is_valid() {
        let mut s = sample_schedule();
        assert!(s.is_valid());
        s.add_violation(Violation::deadline_miss("WO1", "Late by 1000ms"));
        assert!(!s.is_valid());
        assert_eq!(s.violation_count(ViolationType::DeadlineMiss), 1);
        assert_eq!(s.violation_count(ViolationType::TimeConflict), 0);
    }

    #[test]
    fn test_assignment_lookup() {
        let s = sample_schedule();
        assert_eq!(s.assignment_for("WO2").unwrap().workstation_id, "WS2");
        assert!(s.assignment_for("WO99").is_none());

        let ws1 = s.assignments_for_station("WS1");
        assert_eq!(ws1.len(), 2);
        assert_eq!(ws1[0].work_order_id, "WO1");
    }

    #[test]
    fn test_station_utilization() {
        let s = sample_schedule();
        // WS1: busy 5000 + 3000 over span 8000 → 1.0
        assert!((s.station_utilization("WS1").unwrap() - 1.0).abs() < 1e-10);
        // WS2: busy 3000 over span 8000 → 0.375
        let utils = s.all_utilizations();
        assert!((utils["WS2"] - 0.375).abs() < 1e-10);
        assert!(Schedule::new().station_utilization("WS1").is_none());
    }

    #[test]
    fn test_time_conflicts() {
        let s = sample_schedule();
        assert!(s.time_conflicts().is_empty());

        let mut bad = sample_schedule();
        bad.add_assignment(ScheduleAssignment::new("WO4", "WS1", 4000, 6000));
        let conflicts = bad.time_conflicts();
        assert_eq!(conflicts.len(), 2); // overlaps WO1 and WO3
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule::new();
        assert_eq!(s.makespan_ms(), 0);
        assert!(s.is_valid());
        assert_eq!(s.assignment_count(), 0);
    }

    #[test]
    fn test_violation_factories() {
        let v1 = Violation::time_conflict("WS1", "Overlap");
        assert_eq!(v1.violation_type, ViolationType::TimeConflict);
        assert_eq!(v1.entity_id, "WS1");

        let v2 = Violation::precedence_violation("WO2", "Started before WO1");
        assert_eq!(v2.violation_type, ViolationType::PrecedenceViolation);

        let v3 = Violation::skill_mismatch("WO3", "Missing painting");
        assert_eq!(v3.violation_type, ViolationType::SkillMismatch);
    }

    #[test]
    fn test_assignment_serializes_camel_case() {
        let a = ScheduleAssignment::new("WO1", "WS1", 0, 10).with_skill_violation(true);
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"workOrderId\":\"WO1\""));
        assert!(json.contains("\"skillViolation\":true"));
    }
}
