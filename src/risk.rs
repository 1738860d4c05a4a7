//! Injury risk scoring
//!
//! Six independent factors add penalty points: weekly ramp rate, acute:chronic
//! ratio, the rest-day pattern, the HRV trend, sleep score and self-reported
//! fatigue. The total is capped at 100 and banded into a risk level.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Snapshot;
use crate::recovery::hrv_trend_pct;
use crate::stats::mean;
use crate::thresholds::injury as cfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorSeverity {
    Low,
    Medium,
    High,
}

/// A triggered risk factor with its explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactor {
    pub factor: String,
    pub value: String,
    pub severity: FactorSeverity,
    pub message: String,
    /// Points this factor added
    #[serde(skip)]
    pub points: u32,
}

impl RiskFactor {
    fn new(factor: &str, value: String, severity: FactorSeverity, message: &str, points: u32) -> Self {
        RiskFactor {
            factor: factor.to_string(),
            value,
            severity,
            message: message.to_string(),
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Unknown,
    Low,
    Moderate,
    Elevated,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= cfg::HIGH_FROM {
            RiskLevel::High
        } else if score >= cfg::ELEVATED_FROM {
            RiskLevel::Elevated
        } else if score >= cfg::MODERATE_FROM {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RiskLevel::High => {
                "🔴 HIGH INJURY RISK: Multiple warning signs. Take rest days immediately."
            }
            RiskLevel::Elevated => {
                "🟠 ELEVATED RISK: Several factors concerning. Reduce intensity/volume."
            }
            RiskLevel::Moderate => "🟡 MODERATE RISK: Some warning signs. Monitor closely.",
            RiskLevel::Low => "🟢 LOW RISK: Training load appears sustainable.",
            RiskLevel::Unknown => "Not enough data for risk assessment",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RiskLevel::Unknown => "unknown",
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Elevated => "elevated",
            RiskLevel::High => "high",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InjuryRisk {
    pub risk_score: Option<u32>,
    pub risk_level: RiskLevel,
    pub message: String,
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
}

impl InjuryRisk {
    fn unknown() -> Self {
        InjuryRisk {
            risk_score: None,
            risk_level: RiskLevel::Unknown,
            message: RiskLevel::Unknown.message().to_string(),
            factors: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

fn ramp_rate_factor(ramp_rate: f64) -> Option<RiskFactor> {
    let value = format!("+{:.1}/week", ramp_rate);
    if ramp_rate > cfg::EXTREME_RAMP_RATE {
        Some(RiskFactor::new(
            "Extreme ramp rate",
            value,
            FactorSeverity::High,
            "Fitness increasing too rapidly. High injury risk.",
            cfg::EXTREME_RAMP_POINTS,
        ))
    } else if ramp_rate > cfg::HIGH_RAMP_RATE {
        Some(RiskFactor::new(
            "High ramp rate",
            value,
            FactorSeverity::Medium,
            "Above safe ramp rate (>2-3/week recommended)",
            cfg::HIGH_RAMP_POINTS,
        ))
    } else if ramp_rate > cfg::ELEVATED_RAMP_RATE {
        Some(RiskFactor::new(
            "Elevated ramp rate",
            value,
            FactorSeverity::Low,
            "Monitor for fatigue buildup",
            cfg::ELEVATED_RAMP_POINTS,
        ))
    } else {
        None
    }
}

fn ac_ratio_factor(ac_ratio: f64) -> Option<RiskFactor> {
    let value = format!("{:.2}", ac_ratio);
    if ac_ratio > cfg::VERY_HIGH_AC_RATIO {
        Some(RiskFactor::new(
            "Very high fatigue load",
            value,
            FactorSeverity::High,
            "ATL >50% above CTL. Take rest immediately.",
            cfg::VERY_HIGH_AC_POINTS,
        ))
    } else if ac_ratio > cfg::HIGH_AC_RATIO {
        Some(RiskFactor::new(
            "High fatigue load",
            value,
            FactorSeverity::Medium,
            "Fatigue exceeding fitness base",
            cfg::HIGH_AC_POINTS,
        ))
    } else {
        None
    }
}

fn rest_factor(avg_rest: f64) -> Option<RiskFactor> {
    let value = format!("{:.1} days/week", avg_rest);
    if avg_rest < cfg::MIN_AVG_REST_DAYS {
        Some(RiskFactor::new(
            "Insufficient rest",
            value,
            FactorSeverity::Medium,
            "Too few rest days. Schedule at least 1-2 per week.",
            cfg::INSUFFICIENT_REST_POINTS,
        ))
    } else if avg_rest > cfg::MAX_AVG_REST_DAYS {
        Some(RiskFactor::new(
            "Inconsistent training",
            value,
            FactorSeverity::Low,
            "Long rest periods increase injury risk on return",
            cfg::INCONSISTENT_TRAINING_POINTS,
        ))
    } else {
        None
    }
}

fn hrv_factor(change_pct: f64) -> Option<RiskFactor> {
    let value = format!("{:.0}%", change_pct);
    if change_pct < cfg::SIGNIFICANT_HRV_DROP_PCT {
        Some(RiskFactor::new(
            "Significant HRV drop",
            value,
            FactorSeverity::High,
            "Autonomic stress elevated. Prioritize recovery.",
            cfg::SIGNIFICANT_HRV_DROP_POINTS,
        ))
    } else if change_pct < cfg::HRV_DECLINE_PCT {
        Some(RiskFactor::new(
            "HRV declining",
            value,
            FactorSeverity::Medium,
            "Monitor stress levels",
            cfg::HRV_DECLINE_POINTS,
        ))
    } else {
        None
    }
}

/// Score injury risk from recent snapshots (newest-first, at least 7).
///
/// Ramp rate, A:C ratio, sleep and fatigue come from the newest snapshot; rest
/// days and the HRV trend use the newest week.
pub fn calculate_injury_risk(rows: &[Snapshot]) -> InjuryRisk {
    if rows.len() < cfg::MIN_DAYS {
        return InjuryRisk::unknown();
    }

    let latest = &rows[0];
    let week = &rows[..rows.len().min(cfg::FACTOR_WINDOW)];
    let mut factors = Vec::new();

    factors.extend(latest.ramp_rate.and_then(ramp_rate_factor));
    factors.extend(latest.ac_ratio.and_then(ac_ratio_factor));

    let rest_days: Vec<f64> = week.iter().filter_map(|r| r.rest_days).map(f64::from).collect();
    let avg_rest = mean(&rest_days);
    factors.extend(avg_rest.and_then(rest_factor));

    let hrvs: Vec<f64> = week.iter().filter_map(|r| r.hrv).collect();
    factors.extend(hrv_trend_pct(&hrvs).and_then(hrv_factor));

    if let Some(sleep) = latest.sleep_score.filter(|s| *s < cfg::POOR_SLEEP_SCORE) {
        factors.push(RiskFactor::new(
            "Poor sleep recovery",
            format!("{:.0}/100", sleep),
            FactorSeverity::Medium,
            "Inadequate recovery reduces injury resilience",
            cfg::POOR_SLEEP_POINTS,
        ));
    }

    if let Some(fatigue) = latest.fatigue.filter(|f| *f >= cfg::HIGH_FATIGUE) {
        factors.push(RiskFactor::new(
            "High subjective fatigue",
            format!("{}/5", fatigue),
            FactorSeverity::High,
            "You reported high fatigue. Listen to your body.",
            cfg::HIGH_FATIGUE_POINTS,
        ));
    }

    let raw_score: u32 = factors.iter().map(|f| f.points).sum();
    let risk_level = RiskLevel::from_score(raw_score);

    let mut recommendations = vec![if raw_score >= cfg::REDUCE_VOLUME_FROM {
        "Reduce volume by 20-30%".to_string()
    } else {
        "Maintain current load".to_string()
    }];
    if latest
        .sleep_score
        .is_some_and(|s| s > 0.0 && s < cfg::SLEEP_ADVICE_BELOW)
    {
        recommendations.push("Prioritize sleep (>7 hours)".to_string());
    }
    if avg_rest.unwrap_or(0.0) < cfg::REST_ADVICE_BELOW {
        recommendations.push("Add 1-2 rest days this week".to_string());
    }
    if !hrvs.is_empty() {
        recommendations.push("Monitor HRV daily".to_string());
    }

    tracing::debug!(raw_score, factors = factors.len(), %risk_level, "Computed injury risk");

    InjuryRisk {
        risk_score: Some(raw_score.min(cfg::MAX_SCORE)),
        risk_level,
        message: risk_level.message().to_string(),
        factors,
        recommendations,
    }
}
