//! Capacity analysis over a planning horizon.
//!
//! # Capacity (hours)
//!
//! | Quantity | Definition |
//! |----------|-----------|
//! | Total | capacity × days × hours_per_day × efficiency |
//! | Maintenance | total × maintenance ratio over the horizon |
//! | Available | total − maintenance |
//! | Safe | safety_ratio × available |
//! | Used | available × utilization |
//!
//! Aggregates are plain sums of the per-station rows.
//!
//! # Load
//!
//! Utilization comes from each station's current load, or from a schedule's
//! busy time. Stations are banded critical / high / normal / underutilized;
//! the balance index is `100 − σ(utilization %)`, and the overload risk
//! score is `100 × (critical + ½·high) / n`.
//!
//! # Trend
//!
//! Each station's utilization is projected over the next
//! `trend_window_days` days, scaled by how much open capacity each day has
//! relative to the horizon average, and compared with the station's
//! reported `current_load`. Maintenance ahead or a schedule heavier than
//! the reported load reads as increasing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::bottleneck::{BottleneckDetector, BottleneckReport, SkillDemand};
use super::forecast::{Forecast, ForecastConfig, LoadForecaster, Recommendation};
use crate::error::SchedulerError;
use crate::ga::fitness::std_dev;
use crate::models::{Schedule, TimeWindow, Workstation, DAY_MS, HOUR_MS, MAX_TIME_MS};
use crate::validation::{
    validate_horizon, validate_workstations, ValidationError, ValidationErrorKind, ValidationResult,
};

/// Longest horizon any configuration may allow (days).
pub const HORIZON_DAYS_LIMIT: u32 = 36_600;

/// Analyzer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Working hours per day.
    pub hours_per_day: f64,
    /// Share of available capacity considered safe to plan.
    pub safety_ratio: f64,
    /// Utilization at or above which a station is critical.
    pub critical_threshold: f64,
    /// Utilization at or above which a station is highly loaded.
    pub high_threshold: f64,
    /// Utilization below which a station is underutilized.
    pub underutilized_threshold: f64,
    /// Balance index at or above which load is well balanced.
    pub well_balanced_index: f64,
    /// Days per trend comparison window.
    pub trend_window_days: u32,
    /// Relative change treated as flat.
    pub trend_tolerance: f64,
    /// Horizon start, for maintenance overlap (ms).
    pub planning_start_ms: i64,
    /// Longest accepted horizon (days).
    pub max_horizon_days: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            hours_per_day: 8.0,
            safety_ratio: 0.85,
            critical_threshold: 0.9,
            high_threshold: 0.8,
            underutilized_threshold: 0.3,
            well_balanced_index: 70.0,
            trend_window_days: 7,
            trend_tolerance: 0.02,
            planning_start_ms: 0,
            max_horizon_days: 366,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_hours_per_day(mut self, hours: f64) -> Self {
        self.hours_per_day = hours;
        self
    }

    pub fn with_safety_ratio(mut self, ratio: f64) -> Self {
        self.safety_ratio = ratio;
        self
    }

    pub fn with_thresholds(mut self, critical: f64, high: f64, underutilized: f64) -> Self {
        self.critical_threshold = critical;
        self.high_threshold = high;
        self.underutilized_threshold = underutilized;
        self
    }

    pub fn with_planning_start(mut self, start_ms: i64) -> Self {
        self.planning_start_ms = start_ms;
        self
    }

    pub fn with_max_horizon_days(mut self, days: u32) -> Self {
        self.max_horizon_days = days;
        self
    }

    pub fn with_trend(mut self, window_days: u32, tolerance: f64) -> Self {
        self.trend_window_days = window_days;
        self.trend_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut bad = |message: String| {
            errors.push(ValidationError::new(ValidationErrorKind::InvalidParameter, message))
        };
        if !(self.hours_per_day > 0.0 && self.hours_per_day <= 24.0) {
            bad(format!("Hours per day {} outside (0, 24]", self.hours_per_day));
        }
        if !(0.0..=1.0).contains(&self.safety_ratio) {
            bad(format!("Safety ratio {} outside [0, 1]", self.safety_ratio));
        }
        if !(self.underutilized_threshold <= self.high_threshold
            && self.high_threshold <= self.critical_threshold)
        {
            bad("Load thresholds must satisfy underutilized ≤ high ≤ critical".to_string());
        }
        if !(1..=HORIZON_DAYS_LIMIT).contains(&self.max_horizon_days) {
            bad(format!(
                "Max horizon {} days outside [1, {HORIZON_DAYS_LIMIT}]",
                self.max_horizon_days
            ));
        }
        if !(1..=HORIZON_DAYS_LIMIT).contains(&self.trend_window_days) {
            bad(format!(
                "Trend window {} days outside [1, {HORIZON_DAYS_LIMIT}]",
                self.trend_window_days
            ));
        }
        if !(self.trend_tolerance.is_finite() && self.trend_tolerance >= 0.0) {
            bad(format!(
                "Trend tolerance {} must be a non-negative number",
                self.trend_tolerance
            ));
        }
        if !(-MAX_TIME_MS..=MAX_TIME_MS).contains(&self.planning_start_ms) {
            bad(format!(
                "Planning start {}ms outside [-{MAX_TIME_MS}, {MAX_TIME_MS}]",
                self.planning_start_ms
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Capacity of one workstation over the horizon (hours).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationCapacity {
    pub workstation_id: String,
    pub total_hours: f64,
    pub maintenance_hours: f64,
    pub available_hours: f64,
    pub safe_hours: f64,
    pub used_hours: f64,
    pub utilization: f64,
    pub maintenance_ratio: f64,
}

impl StationCapacity {
    pub fn compute(
        ws: &Workstation,
        horizon_days: u32,
        config: &AnalyzerConfig,
        maintenance_ratio: f64,
        utilization: f64,
    ) -> Self {
        let total_hours =
            ws.capacity as f64 * horizon_days as f64 * config.hours_per_day * ws.efficiency;
        let maintenance_hours = total_hours * maintenance_ratio;
        let available_hours = total_hours - maintenance_hours;
        Self {
            workstation_id: ws.id.clone(),
            total_hours,
            maintenance_hours,
            available_hours,
            safe_hours: config.safety_ratio * available_hours,
            used_hours: available_hours * utilization,
            utilization,
            maintenance_ratio,
        }
    }
}

/// Per-station and aggregate capacity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityProfile {
    pub horizon_days: u32,
    pub stations: Vec<StationCapacity>,
    pub total_hours: f64,
    pub maintenance_hours: f64,
    pub available_hours: f64,
    pub safe_hours: f64,
    pub used_hours: f64,
    /// used / available over all stations (0 when nothing is available).
    pub overall_utilization: f64,
}

impl CapacityProfile {
    pub fn from_stations(horizon_days: u32, stations: Vec<StationCapacity>) -> Self {
        let sum = |f: fn(&StationCapacity) -> f64| stations.iter().map(f).sum::<f64>();
        let total_hours = sum(|s| s.total_hours);
        let maintenance_hours = sum(|s| s.maintenance_hours);
        let available_hours = sum(|s| s.available_hours);
        let safe_hours = sum(|s| s.safe_hours);
        let used_hours = sum(|s| s.used_hours);
        let overall_utilization = if available_hours > 0.0 {
            used_hours / available_hours
        } else {
            0.0
        };
        Self {
            horizon_days,
            stations,
            total_hours,
            maintenance_hours,
            available_hours,
            safe_hours,
            used_hours,
            overall_utilization,
        }
    }

    /// Hours still plannable before the safety ceiling.
    pub fn headroom_hours(&self) -> f64 {
        (self.safe_hours - self.used_hours).max(0.0)
    }
}

/// Utilization band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadStatus {
    Critical,
    High,
    Normal,
    Underutilized,
}

/// Direction of projected load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadTrend {
    Increasing,
    Stable,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationLoad {
    pub workstation_id: String,
    pub utilization: f64,
    pub status: LoadStatus,
    pub trend: LoadTrend,
}

/// Load across stations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadDistribution {
    pub stations: Vec<StationLoad>,
    pub average_utilization: f64,
    /// Standard deviation of utilization in percentage points.
    pub std_dev_percent: f64,
    /// 0-100, higher is more even.
    pub balance_index: f64,
    pub well_balanced: bool,
}

impl LoadDistribution {
    pub fn count(&self, status: LoadStatus) -> usize {
        self.stations.iter().filter(|s| s.status == status).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverloadRisk {
    /// Stations at or above the critical threshold.
    pub critical_count: usize,
    /// Stations at or above the high threshold but below critical.
    pub high_count: usize,
    /// 0-100.
    pub score: f64,
    pub level: RiskLevel,
}

impl OverloadRisk {
    fn from_distribution(load: &LoadDistribution) -> Self {
        let critical_count = load.count(LoadStatus::Critical);
        let high_count = load.count(LoadStatus::High);
        let n = load.stations.len();
        let score = if n == 0 {
            0.0
        } else {
            100.0 * (critical_count as f64 + 0.5 * high_count as f64) / n as f64
        };
        let level = if score >= 50.0 {
            RiskLevel::Critical
        } else if score >= 25.0 {
            RiskLevel::High
        } else if score > 0.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        Self {
            critical_count,
            high_count,
            score,
            level,
        }
    }
}

/// Where station utilization comes from.
#[derive(Debug, Clone, Copy)]
pub enum UtilizationSource<'a> {
    /// Each station's `current_load`.
    CurrentLoad,
    /// Busy time in a schedule relative to available hours.
    Schedule(&'a Schedule),
}

/// Analysis depth.
#[derive(Debug, Clone, Default)]
pub enum AnalysisMode {
    /// Capacity, load distribution, balance and overload risk.
    #[default]
    Basic,
    /// Basic plus bottleneck detection against the given skill demand.
    Detailed { demand: SkillDemand },
    /// Detailed plus a per-day forecast and ranked recommendations.
    Forecast {
        demand: SkillDemand,
        forecast: ForecastConfig,
    },
}

/// Full analysis output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReport {
    pub profile: CapacityProfile,
    pub load_distribution: LoadDistribution,
    pub overload_risk: OverloadRisk,
    pub bottlenecks: Option<BottleneckReport>,
    pub forecast: Option<Forecast>,
    pub recommendations: Vec<Recommendation>,
}

/// Stateless capacity analyzer.
///
/// # Example
///
/// ```
/// use u_production::capacity::{AnalysisMode, CapacityAnalyzer, UtilizationSource};
/// use u_production::models::Workstation;
///
/// let stations = vec![
///     Workstation::new("WS1").with_current_load(0.95),
///     Workstation::new("WS2").with_current_load(0.2),
/// ];
/// let report = CapacityAnalyzer::default()
///     .analyze(&stations, 5, UtilizationSource::CurrentLoad, &AnalysisMode::Basic)
///     .unwrap();
/// assert!((report.profile.total_hours - 80.0).abs() < 1e-9);
/// assert!(!report.load_distribution.well_balanced);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CapacityAnalyzer {
    config: AnalyzerConfig,
}

impl CapacityAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes capacity and load of `workstations` over `horizon_days`.
    ///
    /// # Errors
    /// [`SchedulerError::Validation`] for a horizon outside
    /// `1..=max_horizon_days`, malformed workstations, or out-of-range
    /// settings.
    pub fn analyze(
        &self,
        workstations: &[Workstation],
        horizon_days: i64,
        source: UtilizationSource<'_>,
        mode: &AnalysisMode,
    ) -> Result<CapacityReport, SchedulerError> {
        let mut issues = Vec::new();
        let days = match validate_horizon(horizon_days, self.config.max_horizon_days) {
            Ok(days) => days,
            Err(e) => {
                issues.push(e);
                0
            }
        };
        for result in [
            self.config.validate(),
            validate_workstations(workstations),
            match mode {
                AnalysisMode::Forecast { forecast, .. } => forecast.validate(),
                _ => Ok(()),
            },
        ] {
            if let Err(errors) = result {
                issues.extend(errors);
            }
        }
        if !issues.is_empty() {
            return Err(SchedulerError::Validation(issues));
        }

        let profile = self.capacity_profile(workstations, days, source);
        let forecaster = match mode {
            AnalysisMode::Forecast { forecast, .. } => LoadForecaster::new(forecast.clone()),
            _ => LoadForecaster::default(),
        };
        let load_distribution = self.load_distribution(workstations, &profile, &forecaster);
        let overload_risk = OverloadRisk::from_distribution(&load_distribution);

        let mut report = CapacityReport {
            profile,
            load_distribution,
            overload_risk,
            bottlenecks: None,
            forecast: None,
            recommendations: Vec::new(),
        };

        match mode {
            AnalysisMode::Basic => {}
            AnalysisMode::Detailed { demand } => {
                report.bottlenecks = Some(self.detector().detect(workstations, &report.profile, demand));
            }
            AnalysisMode::Forecast { demand, .. } => {
                let bottlenecks = self.detector().detect(workstations, &report.profile, demand);
                let utilization: Vec<f64> =
                    report.profile.stations.iter().map(|s| s.utilization).collect();
                let forecast = forecaster.project(workstations, &utilization, days);
                let flagged: Vec<_> = bottlenecks.flagged().cloned().collect();
                report.recommendations = forecaster.recommend(&flagged, &forecast);
                report.bottlenecks = Some(bottlenecks);
                report.forecast = Some(forecast);
            }
        }

        info!(
            workstations = workstations.len(),
            horizon_days = days,
            balance_index = report.load_distribution.balance_index,
            overload_score = report.overload_risk.score,
            "capacity analysis finished"
        );
        Ok(report)
    }

    /// Per-station and aggregate capacity over `days` days.
    pub fn capacity_profile(
        &self,
        workstations: &[Workstation],
        days: u32,
        source: UtilizationSource<'_>,
    ) -> CapacityProfile {
        let horizon = self.window(0, days);
        let busy = match source {
            UtilizationSource::Schedule(schedule) => Some(schedule.busy_by_station()),
            UtilizationSource::CurrentLoad => None,
        };

        let rows = workstations
            .iter()
            .map(|ws| {
                let ratio = ws.maintenance_ratio(&horizon);
                let utilization = match &busy {
                    None => ws.current_load,
                    Some(busy) => {
                        let busy_hours =
                            busy.get(&ws.id).copied().unwrap_or(0) as f64 / HOUR_MS as f64;
                        let open_hours = ws.capacity as f64
                            * days as f64
                            * self.config.hours_per_day
                            * (1.0 - ratio);
                        if open_hours > 0.0 {
                            (busy_hours / open_hours).clamp(0.0, 1.5)
                        } else if busy_hours > 0.0 {
                            1.5
                        } else {
                            0.0
                        }
                    }
                };
                debug!(workstation = %ws.id, utilization, maintenance_ratio = ratio, "station capacity");
                StationCapacity::compute(ws, days, &self.config, ratio, utilization)
            })
            .collect();

        CapacityProfile::from_stations(days, rows)
    }

    /// Status bands, trends and balance of a profile.
    ///
    /// `profile.stations` rows follow `workstations` order.
    pub fn load_distribution(
        &self,
        workstations: &[Workstation],
        profile: &CapacityProfile,
        forecaster: &LoadForecaster,
    ) -> LoadDistribution {
        let c = &self.config;
        let stations: Vec<StationLoad> = profile
            .stations
            .iter()
            .zip(workstations)
            .enumerate()
            .map(|(i, (s, ws))| {
                let status = if s.utilization >= c.critical_threshold {
                    LoadStatus::Critical
                } else if s.utilization >= c.high_threshold {
                    LoadStatus::High
                } else if s.utilization >= c.underutilized_threshold {
                    LoadStatus::Normal
                } else {
                    LoadStatus::Underutilized
                };
                let shares = self.open_shares(ws, profile.horizon_days, s.maintenance_ratio);
                let ratio = forecaster.trend_ratio(ws.current_load, s.utilization, i, &shares);
                let trend = if ratio > c.trend_tolerance {
                    LoadTrend::Increasing
                } else if ratio < -c.trend_tolerance {
                    LoadTrend::Decreasing
                } else {
                    LoadTrend::Stable
                };
                StationLoad {
                    workstation_id: s.workstation_id.clone(),
                    utilization: s.utilization,
                    status,
                    trend,
                }
            })
            .collect();

        let percents: Vec<f64> = stations.iter().map(|s| s.utilization * 100.0).collect();
        let std_dev_percent = std_dev(&percents);
        let balance_index = (100.0 - std_dev_percent).clamp(0.0, 100.0);
        let average_utilization = if stations.is_empty() {
            0.0
        } else {
            stations.iter().map(|s| s.utilization).sum::<f64>() / stations.len() as f64
        };

        LoadDistribution {
            stations,
            average_utilization,
            std_dev_percent,
            balance_index,
            well_balanced: balance_index >= c.well_balanced_index,
        }
    }

    /// Open capacity of each trend-window day relative to the horizon average.
    fn open_shares(&self, ws: &Workstation, horizon_days: u32, horizon_maintenance: f64) -> Vec<f64> {
        let window = self.config.trend_window_days.min(horizon_days);
        let horizon_open = 1.0 - horizon_maintenance;
        if horizon_open <= f64::EPSILON {
            return vec![1.0; window as usize];
        }
        (0..window)
            .map(|day| (1.0 - ws.maintenance_ratio(&self.window(day, 1))) / horizon_open)
            .collect()
    }

    /// `[start + from_day, start + from_day + days)` in ms.
    fn window(&self, from_day: u32, days: u32) -> TimeWindow {
        let start = self
            .config
            .planning_start_ms
            .saturating_add(i64::from(from_day) * DAY_MS);
        TimeWindow::new(start, start.saturating_add(i64::from(days) * DAY_MS))
    }

    fn detector(&self) -> BottleneckDetector {
        BottleneckDetector::new(self.config.high_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::bottleneck::ActionKind;
    use crate::models::ScheduleAssignment;
    use crate::validation::ValidationErrorKind;

    fn loaded(loads: &[f64]) -> Vec<Workstation> {
        loads
            .iter()
            .enumerate()
            .map(|(i, &l)| Workstation::new(format!("WS{}", i + 1)).with_current_load(l))
            .collect()
    }

    #[test]
    fn test_capacity_formulas() {
        let stations = vec![Workstation::new("WS1")
            .with_capacity(2)
            .with_efficiency(0.9)
            .with_current_load(0.5)
            .with_maintenance(0, DAY_MS / 2)];
        let profile = CapacityAnalyzer::default().capacity_profile(&stations, 2, UtilizationSource::CurrentLoad);
        let s = &profile.stations[0];

        let total = 2.0 * 2.0 * 8.0 * 0.9;
        assert!((s.total_hours - total).abs() < 1e-9);
        assert!((s.maintenance_ratio - 0.25).abs() < 1e-9);
        assert!((s.maintenance_hours - total * 0.25).abs() < 1e-9);
        assert!((s.available_hours - total * 0.75).abs() < 1e-9);
        assert!((s.safe_hours - 0.85 * total * 0.75).abs() < 1e-9);
        assert!((s.used_hours - total * 0.75 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_is_sum_of_stations() {
        let stations = vec![
            Workstation::new("A").with_capacity(3).with_current_load(0.4),
            Workstation::new("B").with_efficiency(1.3).with_current_load(0.9),
            Workstation::new("C").with_maintenance(0, DAY_MS).with_current_load(0.1),
        ];
        let profile = CapacityAnalyzer::default().capacity_profile(&stations, 7, UtilizationSource::CurrentLoad);
        let sum = |f: fn(&StationCapacity) -> f64| profile.stations.iter().map(f).sum::<f64>();
        assert!((profile.total_hours - sum(|s| s.total_hours)).abs() < 1e-9);
        assert!((profile.available_hours - sum(|s| s.available_hours)).abs() < 1e-9);
        assert!((profile.used_hours - sum(|s| s.used_hours)).abs() < 1e-9);
        assert!(profile.headroom_hours() >= 0.0);
    }

    #[test]
    fn test_unbalanced_load() {
        let stations = loaded(&[0.95, 0.2, 0.1]);
        let report = CapacityAnalyzer::default()
            .analyze(&stations, 7, UtilizationSource::CurrentLoad, &AnalysisMode::Basic)
            .unwrap();
        let load = &report.load_distribution;
        assert!(load.balance_index < 70.0);
        assert!(!load.well_balanced);
        assert_eq!(load.count(LoadStatus::Critical), 1);
        assert_eq!(load.count(LoadStatus::Underutilized), 2);

        let risk = report.overload_risk;
        assert_eq!(risk.critical_count, 1);
        assert!((risk.score - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(risk.level, RiskLevel::High);
        assert!(report.bottlenecks.is_none());
    }

    #[test]
    fn test_even_load_is_well_balanced() {
        let stations = loaded(&[0.5, 0.55, 0.6]);
        let report = CapacityAnalyzer::default()
            .analyze(&stations, 3, UtilizationSource::CurrentLoad, &AnalysisMode::Basic)
            .unwrap();
        assert!(report.load_distribution.well_balanced);
        assert_eq!(report.overload_risk.level, RiskLevel::Low);
    }

    fn trends(report: &CapacityReport) -> Vec<LoadTrend> {
        report.load_distribution.stations.iter().map(|s| s.trend).collect()
    }

    fn flat_forecast() -> AnalysisMode {
        AnalysisMode::Forecast {
            demand: SkillDemand::none(),
            forecast: ForecastConfig::default()
                .with_weekly_profile([1.0; 7])
                .with_trend_per_day(0.0),
        }
    }

    #[test]
    fn test_trend_follows_maintenance_timing() {
        let stations = vec![
            // Down for the first two days: less room right now.
            Workstation::new("SOON")
                .with_current_load(0.5)
                .with_maintenance(0, 2 * DAY_MS),
            Workstation::new("NONE").with_current_load(0.5),
            // Down only after the trend window: more room right now.
            Workstation::new("LATER")
                .with_current_load(0.5)
                .with_maintenance(10 * DAY_MS, 12 * DAY_MS),
        ];
        let report = CapacityAnalyzer::default()
            .analyze(&stations, 14, UtilizationSource::CurrentLoad, &flat_forecast())
            .unwrap();

        assert_eq!(
            trends(&report),
            vec![LoadTrend::Increasing, LoadTrend::Stable, LoadTrend::Decreasing]
        );
    }

    #[test]
    fn test_trend_compares_schedule_with_reported_load() {
        let stations = vec![
            Workstation::new("UP").with_current_load(0.2),
            Workstation::new("SAME").with_current_load(0.5),
            Workstation::new("DOWN").with_current_load(0.9),
        ];
        let mut schedule = Schedule::new();
        schedule.add_assignment(ScheduleAssignment::new("WO1", "UP", 0, 4 * HOUR_MS));
        schedule.add_assignment(ScheduleAssignment::new("WO2", "SAME", 0, 4 * HOUR_MS));
        schedule.add_assignment(ScheduleAssignment::new("WO3", "DOWN", 0, 2 * HOUR_MS));
        let report = CapacityAnalyzer::default()
            .analyze(&stations, 1, UtilizationSource::Schedule(&schedule), &flat_forecast())
            .unwrap();

        assert_eq!(
            trends(&report),
            vec![LoadTrend::Increasing, LoadTrend::Stable, LoadTrend::Decreasing]
        );
    }

    #[test]
    fn test_horizon_is_capped() {
        let stations = loaded(&[0.5]);
        let analyzer = CapacityAnalyzer::default();
        assert!(analyzer
            .analyze(&stations, 366, UtilizationSource::CurrentLoad, &AnalysisMode::Basic)
            .is_ok());

        for days in [367, i64::from(u32::MAX), i64::MAX] {
            let err = analyzer
                .analyze(&stations, days, UtilizationSource::CurrentLoad, &AnalysisMode::Basic)
                .unwrap_err();
            assert_eq!(
                err.validation_errors().unwrap()[0].kind,
                ValidationErrorKind::InvalidHorizon
            );
        }

        let wide = CapacityAnalyzer::new(AnalyzerConfig::default().with_max_horizon_days(730));
        assert!(wide
            .analyze(&stations, 730, UtilizationSource::CurrentLoad, &AnalysisMode::Basic)
            .is_ok());
    }

    #[test]
    fn test_config_bounds() {
        let config = AnalyzerConfig::default()
            .with_max_horizon_days(0)
            .with_trend(0, f64::NAN)
            .with_planning_start(i64::MAX);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(AnalyzerConfig::default()
            .with_max_horizon_days(HORIZON_DAYS_LIMIT + 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_utilization_from_schedule() {
        let stations = vec![Workstation::new("A"), Workstation::new("B")];
        let mut schedule = Schedule::new();
        schedule.add_assignment(ScheduleAssignment::new("WO1", "A", 0, 4 * HOUR_MS));
        let profile = CapacityAnalyzer::default()
            .capacity_profile(&stations, 1, UtilizationSource::Schedule(&schedule));
        assert!((profile.stations[0].utilization - 0.5).abs() < 1e-9);
        assert_eq!(profile.stations[1].utilization, 0.0);
    }

    #[test]
    fn test_detailed_mode_finds_bottleneck() {
        let stations = vec![
            Workstation::new("A")
                .with_current_load(0.97)
                .with_efficiency(0.5)
                .with_maintenance(0, DAY_MS),
            Workstation::new("B").with_current_load(0.3),
        ];
        let mode = AnalysisMode::Detailed {
            demand: SkillDemand::none(),
        };
        let report = CapacityAnalyzer::default()
            .analyze(&stations, 5, UtilizationSource::CurrentLoad, &mode)
            .unwrap();
        let bottlenecks = report.bottlenecks.unwrap();
        assert_eq!(bottlenecks.critical.len(), 1);
        assert_eq!(bottlenecks.critical[0].workstation_id, "A");
        assert!(report.forecast.is_none());
    }

    #[test]
    fn test_forecast_mode_recommends() {
        let stations = vec![
            Workstation::new("A")
                .with_current_load(0.97)
                .with_efficiency(0.5)
                .with_maintenance(0, DAY_MS),
            Workstation::new("B").with_current_load(0.3),
        ];
        let mode = AnalysisMode::Forecast {
            demand: SkillDemand::none(),
            forecast: ForecastConfig::default().with_seed(1),
        };
        let report = CapacityAnalyzer::default()
            .analyze(&stations, 5, UtilizationSource::CurrentLoad, &mode)
            .unwrap();
        let forecast = report.forecast.unwrap();
        assert_eq!(forecast.days.len(), 5);
        assert!(!forecast.alerts.is_empty());
        assert!(!report.recommendations.is_empty());
        assert!(report.recommendations.len() <= 3);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.kind == ActionKind::Rebalance));
    }

    #[test]
    fn test_rejects_bad_horizon_and_stations() {
        let stations = vec![Workstation::new("A").with_capacity(0)];
        let err = CapacityAnalyzer::default()
            .analyze(&stations, 0, UtilizationSource::CurrentLoad, &AnalysisMode::Basic)
            .unwrap_err();
        let kinds: Vec<ValidationErrorKind> =
            err.validation_errors().unwrap().iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&ValidationErrorKind::InvalidHorizon));
        assert!(kinds.contains(&ValidationErrorKind::InvalidCapacity));
    }

    #[test]
    fn test_empty_station_list() {
        let report = CapacityAnalyzer::default()
            .analyze(&[], 7, UtilizationSource::CurrentLoad, &AnalysisMode::Basic)
            .unwrap();
        assert_eq!(report.profile.total_hours, 0.0);
        assert_eq!(report.load_distribution.balance_index, 100.0);
        assert_eq!(report.overload_risk.level, RiskLevel::Low);
    }
}
