//! Capacity analysis, bottleneck detection and load forecasting.
//!
//! All three are pure functions of their inputs: no state survives a call.
//!
//! # Submodules
//!
//! - [`analyzer`]: Capacity hours, load bands, balance index, overload risk
//! - [`bottleneck`]: Four-factor bottleneck score and ranked remedies
//! - [`forecast`]: Per-day load projection, alerts and recommendations

pub mod analyzer;
pub mod bottleneck;
pub mod forecast;

pub use analyzer::{
    AnalysisMode, AnalyzerConfig, CapacityAnalyzer, CapacityProfile, CapacityReport,
    LoadDistribution, LoadStatus, LoadTrend, OverloadRisk, RiskLevel, StationCapacity,
    StationLoad, UtilizationSource, HORIZON_DAYS_LIMIT,
};
pub use bottleneck::{
    ActionKind, BottleneckAction, BottleneckDetector, BottleneckFactors, BottleneckRecord,
    BottleneckReport, Severity, SkillDemand,
};
pub use forecast::{
    AlertLevel, DailyForecast, Forecast, ForecastAlert, ForecastConfig, LoadForecaster,
    ProjectedLoad, Recommendation,
};
