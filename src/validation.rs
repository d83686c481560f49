//! Input validation for planning and analysis calls.
//!
//! Checks structural integrity of work orders and workstations before any
//! computation starts. Detects:
//! - Duplicate IDs
//! - Unknown predecessor references
//! - Circular precedence dependencies (DAG validation)
//! - Non-positive durations, zero capacity, non-positive efficiency
//! - Load fractions outside [0, 1], inverted maintenance windows
//! - Durations and instants beyond `MAX_TIME_MS`
//!
//! All issues are collected; callers get the full list at once.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::{WorkOrder, Workstation, MAX_TIME_MS};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A work order references a predecessor that doesn't exist.
    InvalidPredecessor,
    /// Precedence graph contains a cycle.
    CyclicDependency,
    /// Duration is zero or negative.
    InvalidDuration,
    /// Workstation capacity is zero.
    InvalidCapacity,
    /// Efficiency is zero, negative or not finite.
    InvalidEfficiency,
    /// Current load outside [0, 1].
    InvalidLoad,
    /// Maintenance window ends before it starts.
    InvalidMaintenanceWindow,
    /// Planning horizon is zero, negative or beyond the allowed maximum.
    InvalidHorizon,
    /// A due instant or maintenance bound lies beyond `MAX_TIME_MS`.
    TimeOutOfRange,
    /// A tuning parameter is out of range.
    InvalidParameter,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates work orders and workstations for a planning run.
///
/// Checks:
/// 1. No duplicate work order / workstation IDs
/// 2. Positive work order durations
/// 3. Predecessors reference existing work orders
/// 4. No circular precedence dependencies
/// 5. Workstation capacity ≥ 1, efficiency > 0, load in [0, 1]
/// 6. Maintenance windows are well-formed
///
/// Empty lists are valid.
pub fn validate_input(work_orders: &[WorkOrder], workstations: &[Workstation]) -> ValidationResult {
    let mut errors = Vec::new();
    validate_work_orders_into(work_orders, &mut errors);
    validate_workstations_into(workstations, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates workstations alone (capacity analysis input).
pub fn validate_workstations(workstations: &[Workstation]) -> ValidationResult {
    let mut errors = Vec::new();
    validate_workstations_into(workstations, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a planning horizon in days; must lie in `1..=max_days`.
pub fn validate_horizon(days: i64, max_days: u32) -> Result<u32, ValidationError> {
    if days < 1 || days > i64::from(max_days) {
        return Err(ValidationError::new(
            ValidationErrorKind::InvalidHorizon,
            format!("Time horizon must be between 1 and {max_days} days, got {days}"),
        ));
    }
    Ok(days as u32)
}

fn in_time_range(ms: i64) -> bool {
    (-MAX_TIME_MS..=MAX_TIME_MS).contains(&ms)
}

fn validate_work_orders_into(work_orders: &[WorkOrder], errors: &mut Vec<ValidationError>) {
    let mut ids = HashSet::new();
    for wo in work_orders {
        if !ids.insert(wo.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate work order ID: {}", wo.id),
            ));
        }
        if wo.duration_ms <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!(
                    "Work order '{}' has non-positive duration {}ms",
                    wo.id, wo.duration_ms
                ),
            ));
        } else if wo.duration_ms > MAX_TIME_MS {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!(
                    "Work order '{}' duration {}ms exceeds {MAX_TIME_MS}ms",
                    wo.id, wo.duration_ms
                ),
            ));
        }
        if !in_time_range(wo.due_ms) {
            errors.push(ValidationError::new(
                ValidationErrorKind::TimeOutOfRange,
                format!(
                    "Work order '{}' due instant {}ms outside ±{MAX_TIME_MS}ms",
                    wo.id, wo.due_ms
                ),
            ));
        }
    }

    for wo in work_orders {
        for pred in &wo.predecessors {
            if !ids.contains(pred.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPredecessor,
                    format!(
                        "Work order '{}' references unknown predecessor '{}'",
                        wo.id, pred
                    ),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(work_orders) {
        errors.push(cycle_err);
    }
}

fn validate_workstations_into(workstations: &[Workstation], errors: &mut Vec<ValidationError>) {
    let mut ids = HashSet::new();
    for ws in workstations {
        if !ids.insert(ws.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate workstation ID: {}", ws.id),
            ));
        }
        if ws.capacity == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCapacity,
                format!("Workstation '{}' must have capacity of at least 1", ws.id),
            ));
        }
        if !ws.efficiency.is_finite() || ws.efficiency <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidEfficiency,
                format!(
                    "Workstation '{}' has invalid efficiency {}",
                    ws.id, ws.efficiency
                ),
            ));
        }
        if !(0.0..=1.0).contains(&ws.current_load) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidLoad,
                format!(
                    "Workstation '{}' has current load {} outside [0, 1]",
                    ws.id, ws.current_load
                ),
            ));
        }
        for w in &ws.maintenance_windows {
            if w.end_ms < w.start_ms {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidMaintenanceWindow,
                    format!(
                        "Workstation '{}' has maintenance window ending before it starts ({}..{})",
                        ws.id, w.start_ms, w.end_ms
                    ),
                ));
            }
            if !in_time_range(w.start_ms) || !in_time_range(w.end_ms) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::TimeOutOfRange,
                    format!(
                        "Workstation '{}' has maintenance window {}..{} outside ±{MAX_TIME_MS}ms",
                        ws.id, w.start_ms, w.end_ms
                    ),
                ));
            }
        }
    }
}

/// Detects cycles in the precedence graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
fn detect_cycles(work_orders: &[WorkOrder]) -> Option<ValidationError> {
    // predecessor → successors
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for wo in work_orders {
        for pred in &wo.predecessors {
            adj.entry(pred.as_str()).or_default().push(wo.id.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for wo in work_orders {
        let node = wo.id.as_str();
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving work order '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HOUR_MS;

    fn sample_stations() -> Vec<Workstation> {
        vec![
            Workstation::new("WS1").with_skill("welding"),
            Workstation::new("WS2").with_skill("painting"),
        ]
    }

    fn sample_orders() -> Vec<WorkOrder> {
        vec![
            WorkOrder::new("WO1", HOUR_MS, 8 * HOUR_MS).with_skill("welding"),
            WorkOrder::new("WO2", HOUR_MS, 8 * HOUR_MS)
                .with_skill("painting")
                .with_predecessor("WO1"),
        ]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_orders(), &sample_stations()).is_ok());
        assert!(validate_input(&[], &[]).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let orders = vec![
            WorkOrder::new("WO1", 100, 1000),
            WorkOrder::new("WO1", 100, 1000),
        ];
        let stations = vec![Workstation::new("WS1"), Workstation::new("WS1")];

        let errors = validate_input(&orders, &stations).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("work order")));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("workstation")));
    }

    #[test]
    fn test_invalid_predecessor() {
        let orders = vec![WorkOrder::new("WO1", 100, 1000).with_predecessor("NONEXISTENT")];
        let errors = validate_input(&orders, &[]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidPredecessor));
    }

    #[test]
    fn test_cyclic_dependency() {
        // WO1 → WO2 → WO3 → WO1
        let orders = vec![
            WorkOrder::new("WO1", 100, 1000).with_predecessor("WO3"),
            WorkOrder::new("WO2", 100, 1000).with_predecessor("WO1"),
            WorkOrder::new("WO3", 100, 1000).with_predecessor("WO2"),
        ];
        let errors = validate_input(&orders, &[]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_no_cycle_in_chain() {
        let orders = vec![
            WorkOrder::new("WO1", 100, 1000),
            WorkOrder::new("WO2", 100, 1000).with_predecessor("WO1"),
            WorkOrder::new("WO3", 100, 1000).with_predecessor("WO2"),
        ];
        assert!(validate_input(&orders, &[]).is_ok());
    }

    #[test]
    fn test_bad_numbers() {
        let orders = vec![WorkOrder::new("WO1", 0, 1000)];
        let stations = vec![
            Workstation::new("WS1").with_capacity(0),
            Workstation::new("WS2").with_efficiency(0.0),
            Workstation::new("WS3").with_current_load(1.5),
            Workstation::new("WS4").with_maintenance(5000, 1000),
        ];
        let errors = validate_input(&orders, &stations).unwrap_err();
        let kinds: HashSet<ValidationErrorKind> = errors.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&ValidationErrorKind::InvalidDuration));
        assert!(kinds.contains(&ValidationErrorKind::InvalidCapacity));
        assert!(kinds.contains(&ValidationErrorKind::InvalidEfficiency));
        assert!(kinds.contains(&ValidationErrorKind::InvalidLoad));
        assert!(kinds.contains(&ValidationErrorKind::InvalidMaintenanceWindow));
    }

    #[test]
    fn test_horizon() {
        assert_eq!(validate_horizon(7, 366), Ok(7));
        assert_eq!(validate_horizon(366, 366), Ok(366));
        assert_eq!(
            validate_horizon(0, 366).unwrap_err().kind,
            ValidationErrorKind::InvalidHorizon
        );
        assert!(validate_horizon(-3, 366).is_err());
        assert!(validate_horizon(367, 366).is_err());
        assert!(validate_horizon(i64::MAX, 366).is_err());
    }

    #[test]
    fn test_extreme_times() {
        let orders = vec![
            WorkOrder::new("LONG", i64::MAX, 1000),
            WorkOrder::new("FAR", 1000, i64::MIN),
            WorkOrder::new("EDGE", MAX_TIME_MS, MAX_TIME_MS),
        ];
        let stations = vec![Workstation::new("WS1").with_maintenance(0, i64::MAX)];
        let errors = validate_input(&orders, &stations).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidDuration && e.message.contains("LONG")));
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::TimeOutOfRange)
                .count(),
            2
        );
    }
}
