//! Request/response boundary.
//!
//! Plain serde types for the two external operations. Field names are
//! camelCase; unknown keys are ignored and missing keys take defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capacity::{
    AnalysisMode, AnalyzerConfig, BottleneckReport, CapacityAnalyzer, DailyForecast,
    ForecastAlert, ForecastConfig, OverloadRisk, Recommendation, SkillDemand, StationLoad,
    UtilizationSource,
};
use crate::error::SchedulerError;
use crate::ga::{FitnessBreakdown, FitnessWeights, GaConfig, PenaltyWeights, Threads, UnassignableWorkOrder};
use crate::models::{Schedule, ScheduleAssignment, Violation, WorkOrder, Workstation};
use crate::scheduler::{ProductionScheduler, ScheduleKpi, TerminationReason};

/// Tuning knobs for one optimization call.
///
/// ```
/// use u_production::api::OptimizeConstraints;
///
/// let c: OptimizeConstraints = serde_json::from_str(
///     r#"{"weights": {"onTime": 0.5}, "generations": 20, "extra": true}"#,
/// ).unwrap();
/// let config = c.to_config();
/// assert_eq!(config.max_generations, 20);
/// assert_eq!(config.population_size, 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizeConstraints {
    pub weights: FitnessWeights,
    pub penalties: Option<PenaltyWeights>,
    /// Makespan limit (ms).
    pub max_makespan: Option<i64>,
    pub target_utilization: Option<f64>,
    pub population_size: Option<usize>,
    pub generations: Option<usize>,
    pub mutation_rate: Option<f64>,
    pub crossover_rate: Option<f64>,
    pub tournament_size: Option<usize>,
    pub stall_generations: Option<usize>,
    /// Wall-clock budget (ms).
    pub time_budget_ms: Option<u64>,
    pub seed: Option<u64>,
    /// Worker threads; all cores when absent.
    pub threads: Option<usize>,
    pub planning_start_ms: Option<i64>,
}

impl OptimizeConstraints {
    /// Maps onto a [`GaConfig`], keeping defaults for absent fields.
    pub fn to_config(&self) -> GaConfig {
        let defaults = GaConfig::default();
        let mut config = GaConfig {
            weights: self.weights,
            penalties: self.penalties.unwrap_or(defaults.penalties),
            max_makespan_ms: self.max_makespan,
            ..defaults.clone()
        };
        if let Some(v) = self.target_utilization {
            config.target_utilization = v;
        }
        if let Some(v) = self.population_size {
            config.population_size = v;
        }
        if let Some(v) = self.generations {
            config.max_generations = v;
        }
        if let Some(v) = self.mutation_rate {
            config.mutation_rate = v;
        }
        if let Some(v) = self.crossover_rate {
            config.crossover_rate = v;
        }
        if let Some(v) = self.tournament_size {
            config.tournament_size = v;
        }
        if let Some(v) = self.stall_generations {
            config.stall_generations = v;
        }
        if let Some(ms) = self.time_budget_ms {
            config.time_budget = Some(Duration::from_millis(ms));
        }
        config.seed = self.seed;
        config.threads = match self.threads {
            Some(1) => Threads::Single,
            Some(n) => Threads::Multi(n),
            None => defaults.threads,
        };
        if let Some(v) = self.planning_start_ms {
            config.planning_start_ms = v;
        }
        config
    }
}

/// Result of [`optimize_schedule`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub schedule: Vec<ScheduleAssignment>,
    pub violations: Vec<Violation>,
    pub fitness: f64,
    pub breakdown: FitnessBreakdown,
    pub metrics: ScheduleKpi,
    pub unassignable: Vec<UnassignableWorkOrder>,
    pub converged: bool,
    pub termination: TerminationReason,
    pub generations: usize,
    pub fitness_history: Vec<f64>,
    pub elapsed_ms: u64,
}

/// Optimizes a schedule for `work_orders` on `workstations`.
///
/// # Errors
/// See [`ProductionScheduler::optimize`].
pub fn optimize_schedule(
    work_orders: &[WorkOrder],
    workstations: &[Workstation],
    constraints: &OptimizeConstraints,
) -> Result<OptimizeResponse, SchedulerError> {
    let result = ProductionScheduler::new(constraints.to_config()).optimize(work_orders, workstations)?;
    Ok(OptimizeResponse {
        schedule: result.schedule.assignments,
        violations: result.schedule.violations,
        fitness: result.fitness,
        breakdown: result.breakdown,
        metrics: result.metrics,
        unassignable: result.unassignable,
        converged: result.converged,
        termination: result.termination,
        generations: result.generations,
        fitness_history: result.fitness_history,
        elapsed_ms: result.elapsed_ms,
    })
}

/// Depth of a capacity analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisType {
    #[default]
    Basic,
    /// Adds bottlenecks, forecast and recommendations.
    Detailed,
}

/// Input of [`analyze_capacity`].
///
/// `timeHorizonDays` is required; every other field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityRequest {
    #[serde(default)]
    pub workstations: Vec<Workstation>,
    pub time_horizon_days: i64,
    #[serde(default)]
    pub mode: AnalysisType,
    /// Orders used to derive skill demand when no schedule is given.
    #[serde(default)]
    pub work_orders: Vec<WorkOrder>,
    /// When present, utilization and skill demand come from this schedule.
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl CapacityRequest {
    /// Basic analysis of `workstations` over `time_horizon_days`.
    pub fn new(workstations: Vec<Workstation>, time_horizon_days: i64) -> Self {
        Self {
            workstations,
            time_horizon_days,
            mode: AnalysisType::Basic,
            work_orders: Vec::new(),
            schedule: None,
            analyzer: AnalyzerConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

/// Headline figures of a capacity analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySummary {
    pub horizon_days: u32,
    pub total_capacity_hours: f64,
    pub maintenance_hours: f64,
    pub available_hours: f64,
    pub safe_capacity_hours: f64,
    pub used_hours: f64,
    pub overall_utilization: f64,
    pub average_utilization: f64,
    pub balance_index: f64,
    pub well_balanced: bool,
    pub overload_risk: OverloadRisk,
}

/// Result of [`analyze_capacity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityAnalysis {
    pub summary: CapacitySummary,
    pub load_distribution: Vec<StationLoad>,
    pub bottlenecks: BottleneckReport,
    pub forecast: Vec<DailyForecast>,
    pub alerts: Vec<ForecastAlert>,
    pub recommendations: Vec<Recommendation>,
}

/// Analyzes workstation capacity over a horizon.
///
/// # Errors
/// [`SchedulerError::Validation`] when the horizon is outside
/// `1..=analyzer.max_horizon_days` or the workstations or settings are
/// malformed.
pub fn analyze_capacity(request: &CapacityRequest) -> Result<CapacityAnalysis, SchedulerError> {
    let demand = match &request.schedule {
        Some(schedule) => SkillDemand::from_schedule(schedule, &request.work_orders),
        None => SkillDemand::from_work_orders(&request.work_orders, &request.workstations),
    };
    let mode = match request.mode {
        AnalysisType::Basic => AnalysisMode::Basic,
        AnalysisType::Detailed => AnalysisMode::Forecast {
            demand,
            forecast: request.forecast.clone(),
        },
    };
    let source = match &request.schedule {
        Some(schedule) => UtilizationSource::Schedule(schedule),
        None => UtilizationSource::CurrentLoad,
    };

    let report = CapacityAnalyzer::new(request.analyzer.clone()).analyze(
        &request.workstations,
        request.time_horizon_days,
        source,
        &mode,
    )?;

    let profile = &report.profile;
    let load = &report.load_distribution;
    let summary = CapacitySummary {
        horizon_days: profile.horizon_days,
        total_capacity_hours: profile.total_hours,
        maintenance_hours: profile.maintenance_hours,
        available_hours: profile.available_hours,
        safe_capacity_hours: profile.safe_hours,
        used_hours: profile.used_hours,
        overall_utilization: profile.overall_utilization,
        average_utilization: load.average_utilization,
        balance_index: load.balance_index,
        well_balanced: load.well_balanced,
        overload_risk: report.overload_risk.clone(),
    };
    let (forecast, alerts) = match report.forecast {
        Some(f) => (f.days, f.alerts),
        None => (Vec::new(), Vec::new()),
    };

    Ok(CapacityAnalysis {
        summary,
        load_distribution: report.load_distribution.stations,
        bottlenecks: report.bottlenecks.unwrap_or_default(),
        forecast,
        alerts,
        recommendations: report.recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HOUR_MS;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_constraints_defaults_and_overrides() {
        let c: OptimizeConstraints = serde_json::from_str(
            r#"{
                "weights": {"onTime": 1.0, "unknownWeight": 9.0},
                "maxMakespan": 3600000,
                "targetUtilization": 0.7,
                "populationSize": 20,
                "mutationRate": 0.2,
                "crossoverRate": 0.6,
                "seed": 11,
                "threads": 1,
                "somethingElse": [1, 2]
            }"#,
        )
        .unwrap();
        let config = c.to_config();
        assert!((config.weights.on_time - 1.0).abs() < 1e-10);
        assert!((config.weights.compliance - 0.2).abs() < 1e-10);
        assert_eq!(config.max_makespan_ms, Some(3_600_000));
        assert_eq!(config.population_size, 20);
        assert_eq!(config.max_generations, 100);
        assert!((config.mutation_rate - 0.2).abs() < 1e-10);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.threads, Threads::Single);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_constraints_match_defaults() {
        let c: OptimizeConstraints = serde_json::from_str("{}").unwrap();
        let config = c.to_config();
        let defaults = GaConfig::default();
        assert_eq!(config.population_size, defaults.population_size);
        assert_eq!(config.weights, defaults.weights);
        assert_eq!(config.time_budget, defaults.time_budget);
    }

    #[test]
    fn test_optimize_schedule_response() {
        let orders = vec![
            WorkOrder::new("WO1", HOUR_MS, 4 * HOUR_MS),
            WorkOrder::new("WO2", HOUR_MS, 4 * HOUR_MS),
        ];
        let stations = vec![Workstation::new("WS1"), Workstation::new("WS2")];
        let constraints = OptimizeConstraints {
            population_size: Some(8),
            generations: Some(5),
            seed: Some(3),
            ..OptimizeConstraints::default()
        };
        let response = optimize_schedule(&orders, &stations, &constraints).unwrap();
        assert_eq!(response.schedule.len(), 2);
        assert!(response.fitness > 100.0);
        assert_eq!(response.metrics.unassignable_count, 0);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("fitnessHistory").is_some());
        assert!(json["metrics"].get("averageUtilization").is_some());
    }

    #[test]
    fn test_rejects_invalid_rates() {
        let constraints = OptimizeConstraints {
            mutation_rate: Some(2.0),
            ..OptimizeConstraints::default()
        };
        let err = optimize_schedule(&[], &[], &constraints).unwrap_err();
        assert!(err.validation_errors().is_some());
    }

    #[test]
    fn test_capacity_request_from_json() {
        let request: CapacityRequest = serde_json::from_str(
            r#"{
                "workstations": [
                    {"id": "WS1", "currentLoad": 0.95, "skills": ["cut"]},
                    {"id": "WS2", "currentLoad": 0.2},
                    {"id": "WS3", "currentLoad": 0.1}
                ],
                "timeHorizonDays": 7,
                "mode": "detailed",
                "forecast": {"seed": 5}
            }"#,
        )
        .unwrap();
        let analysis = analyze_capacity(&request).unwrap();
        assert_eq!(analysis.load_distribution.len(), 3);
        assert!(analysis.summary.balance_index < 70.0);
        assert_eq!(analysis.summary.overload_risk.critical_count, 1);
        assert_eq!(analysis.forecast.len(), 7);
        assert!(analysis.recommendations.len() <= 3);
    }

    #[test]
    fn test_capacity_request_requires_horizon() {
        let err = serde_json::from_str::<CapacityRequest>(
            r#"{"workstations": [{"id": "WS1"}], "mode": "basic"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeHorizonDays"));

        let request: CapacityRequest = serde_json::from_str(r#"{"timeHorizonDays": 3}"#).unwrap();
        assert_eq!(request.time_horizon_days, 3);
        assert!(request.workstations.is_empty());
        assert_eq!(request.mode, AnalysisType::Basic);
    }

    #[test]
    fn test_capacity_rejects_out_of_range_horizon() {
        for days in [0, -3, 367, 1_000_000_000_000] {
            let request = CapacityRequest::new(Vec::new(), days);
            let err = analyze_capacity(&request).unwrap_err();
            assert_eq!(
                err.validation_errors().unwrap()[0].kind,
                ValidationErrorKind::InvalidHorizon
            );
        }
    }

    #[test]
    fn test_capacity_basic_with_empty_stations() {
        let analysis = analyze_capacity(&CapacityRequest::new(Vec::new(), 7)).unwrap();
        assert!(analysis.load_distribution.is_empty());
        assert!(analysis.bottlenecks.critical.is_empty());
        assert!(analysis.forecast.is_empty());
        assert_eq!(analysis.summary.total_capacity_hours, 0.0);
    }
}
