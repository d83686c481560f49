//! Per-day load forecast and improvement recommendations.
//!
//! # Projection
//!
//! ```text
//! projected(station, day) = current_load
//!                         × weekly[(start_weekday + day) % 7]
//!                         × (1 + trend_per_day × day)
//!                         × jitter
//! ```
//!
//! clamped to `[0, max_load]`. Without a seed `jitter = 1`; with a seed it
//! is a ±`jitter` factor drawn from an RNG keyed on (seed, station, day),
//! so the same inputs always give the same forecast.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::bottleneck::{ActionKind, BottleneckRecord};
use crate::models::Workstation;
use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Forecast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForecastConfig {
    /// Load multiplier per weekday, Monday first.
    pub weekly_profile: [f64; 7],
    /// Linear growth of load per day ahead.
    pub trend_per_day: f64,
    /// Weekday of day 0 (0 = Monday).
    pub start_weekday: usize,
    /// Jitter seed; `None` disables jitter.
    pub seed: Option<u64>,
    /// Half-width of the seeded jitter factor.
    pub jitter: f64,
    /// Upper clamp of a projected load.
    pub max_load: f64,
    /// Projected load above which a warning is raised.
    pub warning_threshold: f64,
    /// Projected load above which a critical alert is raised.
    pub critical_threshold: f64,
    /// Recommendations returned, at most.
    pub max_recommendations: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            weekly_profile: [1.0, 1.05, 1.1, 1.05, 0.95, 0.7, 0.6],
            trend_per_day: 0.01,
            start_weekday: 0,
            seed: None,
            jitter: 0.02,
            max_load: 1.5,
            warning_threshold: 0.85,
            critical_threshold: 0.95,
            max_recommendations: 3,
        }
    }
}

impl ForecastConfig {
    pub fn with_weekly_profile(mut self, profile: [f64; 7]) -> Self {
        self.weekly_profile = profile;
        self
    }

    pub fn with_trend_per_day(mut self, trend: f64) -> Self {
        self.trend_per_day = trend;
        self
    }

    pub fn with_start_weekday(mut self, weekday: usize) -> Self {
        self.start_weekday = weekday % 7;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_recommendations(mut self, count: usize) -> Self {
        self.max_recommendations = count;
        self
    }

    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        if self.weekly_profile.iter().any(|w| !w.is_finite() || *w < 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidParameter,
                "Weekly profile factors must be non-negative numbers",
            ));
        }
        if self.start_weekday >= 7 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidParameter,
                format!("Start weekday {} outside 0..7", self.start_weekday),
            ));
        }
        if !self.trend_per_day.is_finite() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidParameter,
                "Trend per day must be a number",
            ));
        }
        if !(0.0..1.0).contains(&self.jitter) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidParameter,
                format!("Jitter {} outside [0, 1)", self.jitter),
            ));
        }
        if self.warning_threshold > self.critical_threshold {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidParameter,
                "Warning threshold must not exceed the critical threshold",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Weekday `day` days after `start_weekday`, wrapping without overflow.
fn weekday_of(start_weekday: usize, day: u32) -> usize {
    (start_weekday % 7 + day as usize % 7) % 7
}

/// Alert level of a projected load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

/// A day on which a station is projected above a threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastAlert {
    pub day: u32,
    pub workstation_id: String,
    pub projected_load: f64,
    pub level: AlertLevel,
}

/// One station's projected load on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedLoad {
    pub workstation_id: String,
    pub load: f64,
}

/// All stations' projected loads on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// Days ahead of the horizon start (0-based).
    pub day: u32,
    /// Weekday (0 = Monday).
    pub weekday: usize,
    pub loads: Vec<ProjectedLoad>,
    pub average_load: f64,
}

/// Forecast over a horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub days: Vec<DailyForecast>,
    pub alerts: Vec<ForecastAlert>,
    /// Day with the highest average projected load.
    pub peak_day: Option<u32>,
}

impl Forecast {
    pub fn alert_count(&self, level: AlertLevel) -> usize {
        self.alerts.iter().filter(|a| a.level == level).count()
    }
}

/// A ranked improvement suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: ActionKind,
    pub workstation_id: String,
    pub description: String,
    /// Estimated utilization reduction on the station (fraction).
    pub estimated_impact: f64,
}

/// Deterministic load projection.
#[derive(Debug, Clone, Default)]
pub struct LoadForecaster {
    config: ForecastConfig,
}

impl LoadForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Projected load of one station `day` days ahead.
    ///
    /// `station` only keys the jitter; it has no effect without a seed.
    pub fn projected_load(&self, current_load: f64, station: usize, day: u32) -> f64 {
        let c = &self.config;
        let weekday = weekday_of(c.start_weekday, day);
        let trend = (1.0 + c.trend_per_day * day as f64).max(0.0);
        let jitter = match c.seed {
            Some(seed) if c.jitter > 0.0 => {
                let key = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ ((station as u64) << 32 | day as u64);
                let mut rng = SmallRng::seed_from_u64(key);
                1.0 + rng.random_range(-c.jitter..=c.jitter)
            }
            _ => 1.0,
        };
        (current_load * c.weekly_profile[weekday] * trend * jitter).clamp(0.0, c.max_load)
    }

    /// Projects every station over `days` days and raises alerts.
    ///
    /// `utilization[i]` is station `i`'s current load.
    pub fn project(&self, workstations: &[Workstation], utilization: &[f64], days: u32) -> Forecast {
        let c = &self.config;
        let mut forecast = Forecast::default();
        let mut peak: Option<(u32, f64)> = None;

        for day in 0..days {
            let loads: Vec<ProjectedLoad> = workstations
                .iter()
                .enumerate()
                .map(|(i, ws)| ProjectedLoad {
                    workstation_id: ws.id.clone(),
                    load: self.projected_load(utilization.get(i).copied().unwrap_or(0.0), i, day),
                })
                .collect();

            for p in &loads {
                let level = if p.load > c.critical_threshold {
                    Some(AlertLevel::Critical)
                } else if p.load > c.warning_threshold {
                    Some(AlertLevel::Warning)
                } else {
                    None
                };
                if let Some(level) = level {
                    forecast.alerts.push(ForecastAlert {
                        day,
                        workstation_id: p.workstation_id.clone(),
                        projected_load: p.load,
                        level,
                    });
                }
            }

            let average_load = if loads.is_empty() {
                0.0
            } else {
                loads.iter().map(|p| p.load).sum::<f64>() / loads.len() as f64
            };
            if peak.map_or(true, |(_, best)| average_load > best) {
                peak = Some((day, average_load));
            }
            forecast.days.push(DailyForecast {
                day,
                weekday: weekday_of(c.start_weekday, day),
                loads,
                average_load,
            });
        }

        forecast.peak_day = peak.map(|(day, _)| day);
        forecast
    }

    /// Relative change of a station's mean projected load over the coming
    /// days against its `baseline` load.
    ///
    /// `open_share[d]` is day `d`'s open capacity relative to the horizon
    /// average; a day with less room carries proportionally more load, and a
    /// closed day (share 0) counts at `max_load`. The window is
    /// `open_share.len()` days.
    pub fn trend_ratio(&self, baseline: f64, load: f64, station: usize, open_share: &[f64]) -> f64 {
        if open_share.is_empty() {
            return 0.0;
        }
        let max_load = self.config.max_load;
        let mean = open_share
            .iter()
            .enumerate()
            .map(|(day, &share)| {
                let projected = self.projected_load(load, station, day as u32);
                if projected <= 0.0 {
                    0.0
                } else if share <= f64::EPSILON {
                    max_load
                } else {
                    (projected / share).min(max_load)
                }
            })
            .sum::<f64>()
            / open_share.len() as f64;
        if baseline <= f64::EPSILON {
            // Anything from nothing is growth.
            return if mean > f64::EPSILON { 1.0 } else { 0.0 };
        }
        mean / baseline - 1.0
    }

    /// Top recommendations from bottleneck actions and forecast alerts,
    /// ranked by estimated impact.
    ///
    /// Stations with critical alerts but no bottleneck actions get a
    /// rebalancing suggestion sized by their worst projected overload.
    pub fn recommend(&self, bottlenecks: &[BottleneckRecord], forecast: &Forecast) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = bottlenecks
            .iter()
            .flat_map(|record| {
                record.actions.iter().map(|action| Recommendation {
                    kind: action.kind,
                    workstation_id: record.workstation_id.clone(),
                    description: action.description.clone(),
                    estimated_impact: action.estimated_impact,
                })
            })
            .collect();

        for alert in forecast.alerts.iter().filter(|a| a.level == AlertLevel::Critical) {
            if recommendations.iter().any(|r| r.workstation_id == alert.workstation_id) {
                continue;
            }
            let worst = forecast
                .alerts
                .iter()
                .filter(|a| a.workstation_id == alert.workstation_id)
                .map(|a| a.projected_load)
                .fold(0.0, f64::max);
            recommendations.push(Recommendation {
                kind: ActionKind::Rebalance,
                workstation_id: alert.workstation_id.clone(),
                description: format!(
                    "Shift work off '{}' ahead of day {} (projected {:.0}% load)",
                    alert.workstation_id,
                    alert.day,
                    worst * 100.0
                ),
                estimated_impact: (worst - self.config.warning_threshold).max(0.0),
            });
        }

        recommendations.sort_by(|a, b| b.estimated_impact.total_cmp(&a.estimated_impact));
        let mut seen = std::collections::HashSet::new();
        recommendations.retain(|r| seen.insert((r.kind, r.workstation_id.clone())));
        recommendations.truncate(self.config.max_recommendations);
        recommendations
    }
}
