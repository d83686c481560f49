//! Workstation model.
//!
//! Workstations perform work orders. Each has a number of parallel job slots,
//! a skill set, a throughput multiplier, its current load, and optional
//! maintenance windows during which no job may run.

use serde::{Deserialize, Serialize};

use super::{blocked_ms_in_range, earliest_clear_start, TimeWindow, MAX_TIME_MS};

/// A workstation that can be assigned work orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workstation {
    /// Unique workstation identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Parallel job slots (default: 1).
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Skills this station can perform.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Throughput multiplier (1.0 = nominal, <1.0 = slower, >1.0 = faster).
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    /// Current load fraction (0.0..=1.0).
    #[serde(default)]
    pub current_load: f64,
    /// Planned maintenance windows.
    #[serde(default)]
    pub maintenance_windows: Vec<TimeWindow>,
}

fn default_capacity() -> u32 {
    1
}

fn default_efficiency() -> f64 {
    1.0
}

impl Workstation {
    /// Creates a single-slot station with nominal efficiency.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity: 1,
            skills: Vec::new(),
            efficiency: 1.0,
            current_load: 0.0,
            maintenance_windows: Vec::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the number of parallel job slots.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Adds a skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    /// Sets the efficiency multiplier.
    pub fn with_efficiency(mut self, efficiency: f64) -> Self {
        self.efficiency = efficiency;
        self
    }

    /// Sets the current load fraction.
    pub fn with_current_load(mut self, load: f64) -> Self {
        self.current_load = load;
        self
    }

    /// Adds a maintenance window.
    pub fn with_maintenance(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.maintenance_windows.push(TimeWindow::new(start_ms, end_ms));
        self
    }

    /// Whether this station has a given skill.
    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s == name)
    }

    /// Whether this station can perform every skill in `required`.
    pub fn covers(&self, required: &[String]) -> bool {
        required.iter().all(|s| self.has_skill(s))
    }

    /// Skills in `required` that this station lacks.
    pub fn missing_skills<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|s| !self.has_skill(s))
            .map(|s| s.as_str())
            .collect()
    }

    /// Processing time on this station for a nominal duration (ms).
    ///
    /// `ceil(duration / efficiency)`, clamped to `[1, MAX_TIME_MS]` for
    /// positive input.
    pub fn processing_ms(&self, duration_ms: i64) -> i64 {
        if duration_ms <= 0 {
            return 0;
        }
        let effective = (duration_ms as f64 / self.efficiency).ceil();
        if effective.is_nan() {
            return MAX_TIME_MS;
        }
        effective.clamp(1.0, MAX_TIME_MS as f64) as i64
    }

    /// Earliest start at or after `from_ms` that avoids maintenance.
    pub fn earliest_start(&self, from_ms: i64, processing_ms: i64) -> i64 {
        earliest_clear_start(&self.maintenance_windows, from_ms, processing_ms)
    }

    /// Fraction of `horizon` covered by maintenance (0.0..=1.0).
    pub fn maintenance_ratio(&self, horizon: &TimeWindow) -> f64 {
        if horizon.duration_ms() <= 0 {
            return 0.0;
        }
        let blocked = blocked_ms_in_range(&self.maintenance_windows, horizon);
        (blocked as f64 / horizon.duration_ms() as f64).clamp(0.0, 1.0)
    }
}
