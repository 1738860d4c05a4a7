//! Recovery recommendation and training readiness
//!
//! Readiness is a weighted composite of five components, each normalised onto
//! 0-100:
//!
//! | Component | Weight | Mapping                           |
//! |-----------|--------|-----------------------------------|
//! | TSB       | 30%    | -30..20 linearly onto 0..100      |
//! | HRV trend | 25%    | 70 + 1.5 x percent change         |
//! | Sleep     | 20%    | device sleep score as-is          |
//! | Fatigue   | 15%    | (6 - x) / 5 x 100 on a 1-5 scale  |
//! | Soreness  | 10%    | (6 - x) / 5 x 100 on a 1-5 scale  |
//!
//! A component without data scores a neutral 50.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Snapshot;
use crate::stats::{clamp_score, head_mean, percent_change, serialize_round1, tail_mean};
use crate::thresholds::{readiness as cfg, recommendation as rec_cfg};

/// Percent change of the newest three HRV readings against the oldest three.
///
/// `values` are newest-first. `None` with fewer than three readings; a
/// non-positive older average counts as no change.
pub fn hrv_trend_pct(values: &[f64]) -> Option<f64> {
    let recent = head_mean(values, 3)?;
    let older = tail_mean(values, 3)?;
    Some(percent_change(recent, older).unwrap_or(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub recommendation: String,
    pub reason: String,
    pub urgency: Urgency,
    /// Display color: red, yellow, green or blue
    pub color: String,
}

impl Recommendation {
    fn new(recommendation: &str, reason: String, urgency: Urgency, color: &str) -> Self {
        Recommendation {
            recommendation: recommendation.to_string(),
            reason,
            urgency,
            color: color.to_string(),
        }
    }

    /// Placeholder shown before the first snapshot exists
    pub fn no_data() -> Self {
        Self::new(
            "No data available",
            "Take a run to get started!".to_string(),
            Urgency::Low,
            "blue",
        )
    }
}

/// Today's recovery recommendation; the first matching rule wins
pub fn recommend(
    tsb: Option<f64>,
    hrv: Option<f64>,
    sleep_score: Option<f64>,
    fatigue: Option<u8>,
) -> Recommendation {
    if let Some(tsb) = tsb.filter(|t| *t < rec_cfg::REST_BELOW_TSB) {
        return Recommendation::new(
            "🛑 REST DAY",
            format!(
                "TSB is {:.1} - you're overreaching. Take a rest day or very easy recovery run.",
                tsb
            ),
            Urgency::High,
            "red",
        );
    }

    if fatigue.is_some_and(|f| f >= rec_cfg::HIGH_FATIGUE) {
        return Recommendation::new(
            "😴 EASY DAY",
            "High fatigue reported. Keep it conversational pace today.".to_string(),
            Urgency::Medium,
            "yellow",
        );
    }

    if let Some(sleep) = sleep_score.filter(|s| *s < rec_cfg::POOR_SLEEP_SCORE) {
        return Recommendation::new(
            "💤 RECOVERY FOCUS",
            format!(
                "Poor sleep ({:.0}/100). Prioritize recovery over intensity.",
                sleep
            ),
            Urgency::Medium,
            "yellow",
        );
    }

    if let Some(tsb) = tsb {
        if tsb > rec_cfg::GO_ABOVE_TSB && hrv.map_or(true, |h| h > rec_cfg::GO_MIN_HRV) {
            return Recommendation::new(
                "🔥 GO FOR IT",
                format!(
                    "TSB is {:.1} and you're well-recovered. Great day for a hard workout!",
                    tsb
                ),
                Urgency::Low,
                "green",
            );
        }

        if (rec_cfg::STEADY_MIN_TSB..=rec_cfg::STEADY_MAX_TSB).contains(&tsb) {
            return Recommendation::new(
                "✅ STEADY RUN",
                format!(
                    "TSB is {:.1} - balanced fatigue. Good for aerobic base miles.",
                    tsb
                ),
                Urgency::Low,
                "blue",
            );
        }
    }

    Recommendation::new(
        "🏃 EASY RUN",
        "Default recommendation: keep it easy and listen to your body.".to_string(),
        Urgency::Low,
        "blue",
    )
}

/// Normalised readiness components, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadinessComponents {
    #[serde(serialize_with = "serialize_round1")]
    pub tsb: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub hrv_trend: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub sleep: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub fatigue: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub soreness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessLabel {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl ReadinessLabel {
    pub fn from_score(score: u8) -> Self {
        if score >= cfg::EXCELLENT_FROM {
            ReadinessLabel::Excellent
        } else if score >= cfg::GOOD_FROM {
            ReadinessLabel::Good
        } else if score >= cfg::MODERATE_FROM {
            ReadinessLabel::Moderate
        } else {
            ReadinessLabel::Poor
        }
    }
}

impl fmt::Display for ReadinessLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ReadinessLabel::Excellent => "Excellent",
            ReadinessLabel::Good => "Good",
            ReadinessLabel::Moderate => "Moderate",
            ReadinessLabel::Poor => "Poor",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessScore {
    pub score: u8,
    pub label: ReadinessLabel,
    pub components: ReadinessComponents,
}

fn wellness_component(value: Option<u8>) -> f64 {
    value.map_or(cfg::NEUTRAL_COMPONENT, |x| {
        clamp_score((6.0 - x as f64) / 5.0 * 100.0)
    })
}

/// Readiness to train from the latest week of snapshots (newest-first).
///
/// TSB, sleep, fatigue and soreness come from the newest snapshot; the HRV
/// trend uses every HRV reading in `rows`.
pub fn readiness_score(rows: &[Snapshot]) -> ReadinessScore {
    let latest = rows.first();

    let tsb = latest.and_then(|r| r.tsb).map_or(cfg::NEUTRAL_COMPONENT, |tsb| {
        clamp_score((tsb - cfg::TSB_FLOOR) / (cfg::TSB_CEILING - cfg::TSB_FLOOR) * 100.0)
    });

    let hrvs: Vec<f64> = rows.iter().filter_map(|r| r.hrv).collect();
    let hrv_trend = hrv_trend_pct(&hrvs).map_or(cfg::NEUTRAL_COMPONENT, |pct| {
        clamp_score(cfg::HRV_BASE + pct * cfg::HRV_GAIN)
    });

    let sleep = latest
        .and_then(|r| r.sleep_score)
        .map_or(cfg::NEUTRAL_COMPONENT, clamp_score);
    let fatigue = wellness_component(latest.and_then(|r| r.fatigue));
    let soreness = wellness_component(latest.and_then(|r| r.soreness));

    let composite = tsb * cfg::TSB_WEIGHT
        + hrv_trend * cfg::HRV_WEIGHT
        + sleep * cfg::SLEEP_WEIGHT
        + fatigue * cfg::FATIGUE_WEIGHT
        + soreness * cfg::SORENESS_WEIGHT;
    let score = clamp_score(composite).round() as u8;

    tracing::debug!(score, hrv_samples = hrvs.len(), "Computed readiness");

    ReadinessScore {
        score,
        label: ReadinessLabel::from_score(score),
        components: ReadinessComponents {
            tsb,
            hrv_trend,
            sleep,
            fatigue,
            soreness,
        },
    }
}
