//! Correlation mining over recent snapshots
//!
//! Each check compares mean HRV between two groups of days and reports an
//! insight only when both the sample size and the effect are large enough.
//! Values are always paired within the same snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::Snapshot;
use crate::stats::{mean, percent_change, serialize_opt_round1};
use crate::thresholds::{hr_drift as drift_cfg, insights as cfg, sleep as sleep_cfg};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationInsight {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub recommendation: String,
}

impl CorrelationInsight {
    fn new(kind: &str, title: &str, description: String, recommendation: &str) -> Self {
        CorrelationInsight {
            kind: kind.to_string(),
            title: title.to_string(),
            description,
            recommendation: recommendation.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub insights: Vec<CorrelationInsight>,
    pub data_points: usize,
    pub message: String,
}

/// HRV paired with another field of the same snapshot
fn paired<T>(rows: &[Snapshot], field: impl Fn(&Snapshot) -> Option<T>) -> Vec<(T, f64)> {
    rows.iter()
        .filter_map(|r| Some((field(r)?, r.hrv?)))
        .collect()
}

/// Mean HRV of the pairs whose key satisfies `keep`
fn group_hrv<T: Copy>(pairs: &[(T, f64)], keep: impl Fn(T) -> bool) -> Vec<f64> {
    pairs
        .iter()
        .filter(|(key, _)| keep(*key))
        .map(|(_, hrv)| *hrv)
        .collect()
}

fn volume_recovery(rows: &[Snapshot]) -> Option<CorrelationInsight> {
    let pairs = paired(rows, |r| r.week_0_km);
    if pairs.len() < cfg::MIN_ROWS {
        return None;
    }
    let high = mean(&group_hrv(&pairs, |km| km > cfg::HIGH_VOLUME_KM))?;
    let low = mean(&group_hrv(&pairs, |km| km < cfg::LOW_VOLUME_KM))?;
    let drop_pct = percent_change(low, high)?;

    (drop_pct > cfg::VOLUME_HRV_DROP_PCT).then(|| {
        CorrelationInsight::new(
            "volume_recovery",
            "High Volume Impact",
            format!(
                "Your HRV is {:.0}% lower after high volume weeks (>35km). Consider more recovery.",
                drop_pct
            ),
            "Schedule easier days after high volume",
        )
    })
}

fn temperature_range(rows: &[Snapshot]) -> Option<CorrelationInsight> {
    let temps: Vec<f64> = rows.iter().filter_map(|r| r.weather_temp).collect();
    if temps.len() < cfg::MIN_ROWS {
        return None;
    }
    let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
    let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(CorrelationInsight::new(
        "weather",
        "Temperature Sweet Spot",
        format!(
            "You've run in temps from {:.0}°C to {:.0}°C. Most runners perform best at 8-15°C.",
            min, max
        ),
        "Adjust pace expectations in extreme temps",
    ))
}

fn sleep_recovery(rows: &[Snapshot]) -> Option<CorrelationInsight> {
    let pairs = paired(rows, |r| r.sleep_score);
    if pairs.len() < cfg::MIN_ROWS {
        return None;
    }
    let good = mean(&group_hrv(&pairs, |s| s >= cfg::GOOD_SLEEP_SCORE))?;
    let poor = mean(&group_hrv(&pairs, |s| s < cfg::POOR_SLEEP_SCORE))?;
    let diff_pct = percent_change(good, poor)?;

    (diff_pct > cfg::SLEEP_HRV_DIFF_PCT).then(|| {
        CorrelationInsight::new(
            "sleep_recovery",
            "Sleep Matters",
            format!(
                "Good sleep (75+ score) correlates with {:.0}% higher HRV. Sleep is your superpower!",
                diff_pct
            ),
            "Prioritize 7+ hours of quality sleep",
        )
    })
}

fn rest_recovery(rows: &[Snapshot]) -> Option<CorrelationInsight> {
    let window = &rows[..rows.len().min(cfg::REST_WINDOW_DAYS)];
    let pairs = paired(window, |r| r.rest_days);
    if pairs.len() < cfg::MIN_ROWS {
        return None;
    }
    let after_rest = group_hrv(&pairs, |rest| rest == 0);
    let after_break = group_hrv(&pairs, |rest| rest >= cfg::BREAK_REST_DAYS);
    if after_rest.len() <= cfg::MIN_REST_SAMPLES || after_break.len() <= cfg::MIN_REST_SAMPLES {
        return None;
    }
    let no_rest = mean(&after_rest)?;
    let with_break = mean(&after_break)?;

    (with_break > no_rest * cfg::REST_HRV_GAIN).then(|| {
        CorrelationInsight::new(
            "rest_recovery",
            "Rest Days Work",
            format!(
                "HRV is {:.0}% higher after 2+ rest days. Trust the process!",
                (with_break / no_rest - 1.0) * 100.0
            ),
            "Don't skip planned rest days",
        )
    })
}

/// Look for links between training, sleep and HRV in the last 30 snapshots
pub fn find_correlations(rows: &[Snapshot]) -> CorrelationReport {
    if rows.len() < cfg::MIN_ROWS {
        return CorrelationReport {
            insights: Vec::new(),
            data_points: rows.len(),
            message: "Need more data for correlation analysis".to_string(),
        };
    }

    let insights: Vec<CorrelationInsight> = [
        volume_recovery(rows),
        temperature_range(rows),
        sleep_recovery(rows),
        rest_recovery(rows),
    ]
    .into_iter()
    .flatten()
    .collect();

    tracing::debug!(rows = rows.len(), insights = insights.len(), "Mined correlations");

    let message = if insights.is_empty() {
        "Keep logging data - correlations will appear with more entries".to_string()
    } else {
        format!("Analyzed {} snapshots", rows.len())
    };

    CorrelationReport {
        insights,
        data_points: rows.len(),
        message,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl fmt::Display for DriftTrend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DriftTrend::Improving => "improving",
            DriftTrend::Declining => "declining",
            DriftTrend::Stable => "stable",
            DriftTrend::InsufficientData => "insufficient_data",
        };
        write!(f, "{}", s)
    }
}

/// Z2 share of easy time for one aerobic session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftPoint {
    pub date: String,
    #[serde(serialize_with = "crate::stats::serialize_round1")]
    pub z2_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrDriftReport {
    pub trend: DriftTrend,
    /// Newest first
    pub points: Vec<DriftPoint>,
    #[serde(serialize_with = "serialize_opt_round1")]
    pub recent_avg: Option<f64>,
    #[serde(serialize_with = "serialize_opt_round1")]
    pub older_avg: Option<f64>,
    pub message: String,
}

/// Z2 ratio for a snapshot whose latest run was mostly aerobic
fn aerobic_z2_ratio(row: &Snapshot) -> Option<f64> {
    let zones = row.hr_zone_secs().map(|z| z.unwrap_or(0) as f64);
    let total: f64 = zones.iter().sum();
    let easy = zones[0] + zones[1];
    if total < drift_cfg::MIN_ZONE_SECS as f64 || easy / total < drift_cfg::MIN_EASY_FRACTION {
        return None;
    }
    Some(zones[1] / easy * 100.0)
}

/// Track how much of the easy running lands in Z2 rather than Z1.
///
/// More Z2 at the same effort means heart rate drifts less, a proxy for
/// aerobic fitness. Compares the newer half of qualifying sessions against
/// the older half.
pub fn hr_drift(rows: &[Snapshot]) -> HrDriftReport {
    let points: Vec<DriftPoint> = rows
        .iter()
        .filter_map(|r| {
            Some(DriftPoint {
                date: r.recorded_at.chars().take(10).collect(),
                z2_ratio: aerobic_z2_ratio(r)?,
            })
        })
        .collect();

    if points.len() < drift_cfg::MIN_SESSIONS {
        let message = format!(
            "Need at least {} easy runs with heart rate zone data (found {})",
            drift_cfg::MIN_SESSIONS,
            points.len()
        );
        return HrDriftReport {
            trend: DriftTrend::InsufficientData,
            points,
            recent_avg: None,
            older_avg: None,
            message,
        };
    }

    let ratios: Vec<f64> = points.iter().map(|p| p.z2_ratio).collect();
    let half = ratios.len() / 2;
    let recent = mean(&ratios[..half]);
    let older = mean(&ratios[half..]);

    let (trend, message) = match (recent, older) {
        (Some(r), Some(o)) if r - o > drift_cfg::TREND_DELTA => (
            DriftTrend::Improving,
            format!(
                "Z2 share of easy running up {:.1} points. Aerobic efficiency is improving.",
                r - o
            ),
        ),
        (Some(r), Some(o)) if r - o < -drift_cfg::TREND_DELTA => (
            DriftTrend::Declining,
            format!(
                "Z2 share of easy running down {:.1} points. Check fatigue, heat or pacing.",
                o - r
            ),
        ),
        _ => (
            DriftTrend::Stable,
            "Aerobic efficiency is steady on easy runs.".to_string(),
        ),
    };

    HrDriftReport {
        trend,
        points,
        recent_avg: recent,
        older_avg: older,
        message,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepInsight {
    pub title: String,
    pub finding: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepInsightsReport {
    pub insights: Vec<SleepInsight>,
    pub data_points: usize,
    /// Whole hours of sleep with the highest mean HRV
    pub best_sleep_hours: Option<u32>,
    pub message: String,
}

/// How sleep duration and quality relate to HRV over the last 60 snapshots
pub fn sleep_insights(rows: &[Snapshot]) -> SleepInsightsReport {
    let durations = paired(rows, |r| r.sleep_secs);
    if durations.len() < sleep_cfg::MIN_SAMPLES {
        return SleepInsightsReport {
            insights: Vec::new(),
            data_points: durations.len(),
            best_sleep_hours: None,
            message: format!(
                "Need at least {} nights with sleep and HRV data (found {})",
                sleep_cfg::MIN_SAMPLES,
                durations.len()
            ),
        };
    }

    let mut insights = Vec::new();

    let mut buckets: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (secs, hrv) in &durations {
        buckets.entry(secs / 3600).or_default().push(*hrv);
    }
    let best = buckets
        .iter()
        .filter(|(_, hrvs)| hrvs.len() >= sleep_cfg::MIN_BUCKET_SAMPLES)
        .filter_map(|(hours, hrvs)| Some((*hours, mean(hrvs)?)))
        .max_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((hours, hrv)) = best {
        insights.push(SleepInsight {
            title: "Your Sleep Sweet Spot".to_string(),
            finding: format!(
                "HRV averages {:.0} ms after {}-{} hours of sleep, your best range.",
                hrv,
                hours,
                hours + 1
            ),
            recommendation: format!("Aim for at least {} hours of sleep before key sessions", hours),
        });
    }

    let quality = paired(rows, |r| r.sleep_score);
    let good = mean(&group_hrv(&quality, |s| s >= cfg::GOOD_SLEEP_SCORE));
    let poor = mean(&group_hrv(&quality, |s| s < cfg::POOR_SLEEP_SCORE));
    if let Some(diff) = good.zip(poor).and_then(|(g, p)| percent_change(g, p)) {
        if diff.abs() > sleep_cfg::QUALITY_HRV_DIFF_PCT {
            let direction = if diff > 0.0 { "higher" } else { "lower" };
            insights.push(SleepInsight {
                title: "Sleep Quality Matters".to_string(),
                finding: format!(
                    "HRV is {:.0}% {} after good sleep (75+) than after poor sleep (<60).",
                    diff.abs(),
                    direction
                ),
                recommendation: "Protect sleep quality: consistent bedtime, cool dark room"
                    .to_string(),
            });
        }
    }

    let message = if insights.is_empty() {
        "No clear sleep pattern yet".to_string()
    } else {
        format!("Based on {} nights", durations.len())
    };

    SleepInsightsReport {
        insights,
        data_points: durations.len(),
        best_sleep_hours: best.map(|(hours, _)| hours),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_with(n: usize, f: impl Fn(usize, &mut Snapshot)) -> Vec<Snapshot> {
        (0..n)
            .map(|i| {
                let mut row = Snapshot::new(format!("2024-09-{:02}T07:00:00", 30 - i));
                f(i, &mut row);
                row
            })
            .collect()
    }

    #[test]
    fn test_correlations_need_ten_rows() {
        let report = find_correlations(&rows_with(9, |_, _| {}));
        assert!(report.insights.is_empty());
        assert_eq!(report.data_points, 9);
        assert_eq!(report.message, "Need more data for correlation analysis");
    }

    #[test]
    fn test_no_patterns() {
        let rows = rows_with(12, |_, r| {
            r.week_0_km = Some(30.0);
            r.hrv = Some(50.0);
        });
        let report = find_correlations(&rows);
        assert!(report.insights.is_empty());
        assert!(report.message.starts_with("Keep logging"));
    }

    #[test]
    fn test_volume_and_temperature_insights() {
        let rows = rows_with(12, |i, r| {
            if i % 2 == 0 {
                r.week_0_km = Some(40.0);
                r.hrv = Some(40.0);
            } else {
                r.week_0_km = Some(15.0);
                r.hrv = Some(50.0);
            }
            r.weather_temp = Some(4.0 + i as f64 * 2.0);
        });

        let report = find_correlations(&rows);
        assert_eq!(report.message, "Analyzed 12 snapshots");
        let kinds: Vec<&str> = report.insights.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["volume_recovery", "weather"]);
        assert!(report.insights[0].description.contains("25% lower"));
        assert!(report.insights[1].description.contains("from 4°C to 26°C"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["insights"][0]["type"], "volume_recovery");
    }

    #[test]
    fn test_values_pair_within_rows() {
        // High volume rows have no HRV; nothing to compare
        let rows = rows_with(12, |i, r| {
            if i < 6 {
                r.week_0_km = Some(40.0);
            } else {
                r.week_0_km = Some(15.0);
                r.hrv = Some(50.0);
            }
        });
        assert!(volume_recovery(&rows).is_none());
    }

    #[test]
    fn test_sleep_and_rest_insights() {
        let rows = rows_with(12, |i, r| {
            let good = i % 2 == 0;
            r.sleep_score = Some(if good { 85.0 } else { 50.0 });
            r.rest_days = Some(if good { 2 } else { 0 });
            r.hrv = Some(if good { 60.0 } else { 45.0 });
        });

        let report = find_correlations(&rows);
        let kinds: Vec<&str> = report.insights.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["sleep_recovery", "rest_recovery"]);
        assert!(report.insights[0].description.contains("33% higher"));
    }

    #[test]
    fn test_sleep_score_of_75_counts_as_good() {
        let rows = rows_with(12, |i, r| {
            let good = i % 2 == 0;
            r.sleep_score = Some(if good { 75.0 } else { 55.0 });
            r.hrv = Some(if good { 60.0 } else { 45.0 });
        });

        let report = find_correlations(&rows);
        let sleep = report
            .insights
            .iter()
            .find(|i| i.kind == "sleep_recovery")
            .unwrap();
        assert!(sleep.description.starts_with("Good sleep (75+ score)"));
    }

    #[test]
    fn test_rest_insight_needs_three_per_side() {
        let rows = rows_with(12, |i, r| {
            r.rest_days = Some(if i < 2 { 3 } else { 0 });
            r.hrv = Some(if i < 2 { 70.0 } else { 40.0 });
        });
        assert!(rest_recovery(&rows).is_none());
    }

    fn easy_session(r: &mut Snapshot, z1: u32, z2: u32) {
        r.hr_zone_z1_secs = Some(z1);
        r.hr_zone_z2_secs = Some(z2);
        r.hr_zone_z3_secs = Some(60);
        r.hr_zone_z4_secs = Some(0);
        r.hr_zone_z5_secs = None;
    }

    #[test]
    fn test_hr_drift_improving() {
        let rows = rows_with(8, |i, r| {
            if i < 4 {
                easy_session(r, 600, 2400); // 80% Z2
            } else {
                easy_session(r, 1200, 1800); // 60% Z2
            }
        });

        let report = hr_drift(&rows);
        assert_eq!(report.trend, DriftTrend::Improving);
        assert_eq!(report.points.len(), 8);
        assert_eq!(report.points[0].date, "2024-09-30");
        assert!((report.recent_avg.unwrap() - 80.0).abs() < 1e-9);
        assert!((report.older_avg.unwrap() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_hr_drift_filters_hard_and_short_sessions() {
        let rows = rows_with(8, |i, r| match i {
            0 => easy_session(r, 100, 200), // too short
            1 => {
                easy_session(r, 300, 300);
                r.hr_zone_z4_secs = Some(1200); // mostly hard
            }
            _ => easy_session(r, 1000, 2000),
        });

        let report = hr_drift(&rows);
        assert_eq!(report.points.len(), 6);
        assert_eq!(report.trend, DriftTrend::Stable);
    }

    #[test]
    fn test_hr_drift_insufficient() {
        let rows = rows_with(5, |_, r| easy_session(r, 1000, 2000));
        let report = hr_drift(&rows);
        assert_eq!(report.trend, DriftTrend::InsufficientData);
        assert!(report.message.contains("found 5"));
        assert_eq!(report.trend.to_string(), "insufficient_data");
    }

    #[test]
    fn test_sleep_insights() {
        let rows = rows_with(12, |i, r| {
            let (hours, score, hrv) = match i % 3 {
                0 => (8, 85.0, 62.0),
                1 => (7, 70.0, 52.0),
                _ => (5, 50.0, 40.0),
            };
            r.sleep_secs = Some(hours * 3600 + 900);
            r.sleep_score = Some(score);
            r.hrv = Some(hrv);
        });

        let report = sleep_insights(&rows);
        assert_eq!(report.data_points, 12);
        assert_eq!(report.best_sleep_hours, Some(8));
        assert_eq!(report.insights.len(), 2);
        assert!(report.insights[0].finding.contains("8-9 hours"));
        assert!(report.insights[1].finding.contains("55% higher"));
    }

    #[test]
    fn test_sleep_bucket_needs_two_nights() {
        let rows = rows_with(10, |i, r| {
            r.sleep_secs = Some(if i == 0 { 9 * 3600 } else { 7 * 3600 });
            r.hrv = Some(if i == 0 { 90.0 } else { 50.0 });
        });
        let report = sleep_insights(&rows);
        assert_eq!(report.best_sleep_hours, Some(7));
    }

    #[test]
    fn test_sleep_insights_insufficient() {
        let rows = rows_with(9, |_, r| {
            r.sleep_secs = Some(7 * 3600);
            r.hrv = Some(50.0);
        });
        let report = sleep_insights(&rows);
        assert!(report.insights.is_empty());
        assert_eq!(report.best_sleep_hours, None);
        assert!(report.message.contains("found 9"));
    }
}
