//! Work order model.
//!
//! A work order is a unit of production work to be placed on exactly one
//! workstation. It carries an urgency, a processing estimate, a due instant,
//! the skills a station needs to perform it, and precedence links to other
//! work orders.

use serde::{Deserialize, Serialize};

use super::HOUR_MS;

/// Upper bound of [`WorkOrder::complexity`].
pub const MAX_COMPLEXITY: f64 = 10.0;

/// A work order to be scheduled.
///
/// # Time Representation
/// All times are in milliseconds relative to a planning epoch (t=0).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    /// Unique work order identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Urgency (higher = more urgent).
    #[serde(default)]
    pub priority: i32,
    /// Estimated processing duration at efficiency 1.0 (ms).
    pub duration_ms: i64,
    /// Due instant (ms).
    pub due_ms: i64,
    /// Skills a workstation must have to perform this order.
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// IDs of work orders that must finish before this one starts.
    #[serde(default)]
    pub predecessors: Vec<String>,
}

impl WorkOrder {
    /// Creates a work order with the given ID, duration and due instant.
    pub fn new(id: impl Into<String>, duration_ms: i64, due_ms: i64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            priority: 0,
            duration_ms,
            due_ms,
            required_skills: Vec::new(),
            predecessors: Vec::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a required skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.push(skill.into());
        self
    }

    /// Adds a predecessor work order ID.
    pub fn with_predecessor(mut self, id: impl Into<String>) -> Self {
        self.predecessors.push(id.into());
        self
    }

    /// Derived complexity score in [1, 10].
    ///
    /// Grows with skill count, duration (hours) and dependency count.
    pub fn complexity(&self) -> f64 {
        let hours = self.duration_ms as f64 / HOUR_MS as f64;
        let raw = 1.0
            + 0.5 * self.required_skills.len() as f64
            + 0.1 * hours.max(0.0)
            + 0.3 * self.predecessors.len() as f64;
        raw.min(MAX_COMPLEXITY)
    }

    /// Whether the order has any precedence dependency.
    pub fn has_predecessors(&self) -> bool {
        !self.predecessors.is_empty()
    }
}
