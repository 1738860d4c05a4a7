//! Training consistency, volume progression and goal tracking

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{parse_recorded_at, Snapshot};
use crate::stats::{clamp_score, mean, percent_change, serialize_round1, stdev};
use crate::thresholds::{consistency as cfg, overload as overload_cfg};

/// Consistency score and its components, each 0-100
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyResult {
    pub score: Option<u8>,
    pub volume_score: Option<u8>,
    pub rest_score: Option<u8>,
    pub monotony_score: Option<u8>,
    pub assessment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ConsistencyResult {
    fn unavailable(reason: &str) -> Self {
        ConsistencyResult {
            score: None,
            volume_score: None,
            rest_score: None,
            monotony_score: None,
            assessment: "N/A".to_string(),
            reason: Some(reason.to_string()),
        }
    }
}

/// Label for an overall consistency score
pub fn consistency_assessment(score: u8) -> &'static str {
    if score >= cfg::EXCELLENT_FROM {
        "Excellent"
    } else if score >= cfg::GOOD_FROM {
        "Good"
    } else if score >= cfg::FAIR_FROM {
        "Fair"
    } else {
        "Needs Work"
    }
}

/// Score how evenly the athlete trains.
///
/// Low weekly-volume variation, about 1.5 rest days and a monotony near 1.25
/// score highest. Missing rest days and monotony values fall back to
/// pessimistic defaults; an empty volume list has no score.
pub fn calculate_consistency_score(
    volumes: &[f64],
    rest_days: &[u32],
    monotony_values: &[f64],
) -> ConsistencyResult {
    if volumes.is_empty() {
        return ConsistencyResult::unavailable("No volume data");
    }

    let volume_score = match (mean(volumes), stdev(volumes)) {
        (Some(m), Some(sd)) => {
            let cv = if m > 0.0 { sd / m } else { 1.0 };
            clamp_score(100.0 - cv * 100.0)
        }
        _ => cfg::FALLBACK_VOLUME_SCORE,
    };

    let rests: Vec<f64> = rest_days.iter().map(|&r| r as f64).collect();
    let avg_rest = mean(&rests).unwrap_or(cfg::DEFAULT_REST_DAYS);
    let rest_score =
        clamp_score(100.0 - (avg_rest - cfg::IDEAL_REST_DAYS).abs() * cfg::REST_PENALTY_PER_DAY);

    let avg_mono = mean(monotony_values).unwrap_or(cfg::DEFAULT_MONOTONY);
    let monotony_score =
        clamp_score(100.0 - (avg_mono - cfg::IDEAL_MONOTONY).abs() * cfg::MONOTONY_PENALTY);

    let overall = (volume_score * cfg::VOLUME_WEIGHT
        + rest_score * cfg::REST_WEIGHT
        + monotony_score * cfg::MONOTONY_WEIGHT) as u8;

    ConsistencyResult {
        score: Some(overall),
        volume_score: Some(volume_score as u8),
        rest_score: Some(rest_score as u8),
        monotony_score: Some(monotony_score as u8),
        assessment: consistency_assessment(overall).to_string(),
        reason: None,
    }
}

/// Consistency over stored snapshots; needs at least a week of rows
pub fn consistency_from_snapshots(rows: &[Snapshot]) -> ConsistencyResult {
    if rows.len() < cfg::MIN_DAYS {
        return ConsistencyResult::unavailable("Not enough data");
    }

    let volumes: Vec<f64> = rows.iter().filter_map(|r| r.week_0_km).collect();
    let rest_days: Vec<u32> = rows.iter().filter_map(|r| r.rest_days).collect();
    let monotony: Vec<f64> = rows.iter().filter_map(|r| r.monotony).collect();
    calculate_consistency_score(&volumes, &rest_days, &monotony)
}

/// One week-over-week volume comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverloadWeek {
    pub label: String,
    #[serde(serialize_with = "serialize_round1")]
    pub current_km: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub previous_km: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub change_pct: f64,
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverloadReport {
    pub weeks: Vec<OverloadWeek>,
    /// No compared week rose by more than 10%
    pub safe: bool,
    pub recommendation: String,
}

const WEEK_LABELS: [&str; 4] = ["This week", "Last week", "2 weeks ago", "3 weeks ago"];

/// Check week-over-week volume increases against the 10% rule.
///
/// `volumes` runs from this week back to four weeks ago. Pairs with a missing
/// or zero previous week are skipped.
pub fn calculate_overload(volumes: &[Option<f64>; 5]) -> OverloadReport {
    let weeks: Vec<OverloadWeek> = WEEK_LABELS
        .iter()
        .enumerate()
        .filter_map(|(i, label)| {
            let current = volumes[i]?;
            let previous = volumes[i + 1]?;
            let change_pct = percent_change(current, previous)?;
            Some(OverloadWeek {
                label: label.to_string(),
                current_km: current,
                previous_km: previous,
                change_pct,
                flagged: change_pct > overload_cfg::MAX_WEEKLY_INCREASE_PCT,
            })
        })
        .collect();

    let flagged = weeks.iter().filter(|w| w.flagged).count();
    let recommendation = if weeks.is_empty() {
        "Not enough weekly volume data to check progression".to_string()
    } else if flagged == 0 {
        "Volume progression is within the 10% rule. Keep building gradually.".to_string()
    } else {
        format!(
            "Volume rose more than 10% in {} of {} weeks. Hold volume steady before building again.",
            flagged,
            weeks.len()
        )
    };

    OverloadReport {
        safe: flagged == 0,
        weeks,
        recommendation,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekAdherence {
    /// Monday of the week, YYYY-MM-DD
    pub week_start: String,
    pub planned_km: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub actual_km: f64,
    pub achieved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdherenceReport {
    pub target_km: f64,
    pub overall_pct: Option<u32>,
    /// Consecutive achieved weeks counting back from the latest
    pub streak: u32,
    pub weeks: Vec<WeekAdherence>,
    pub message: String,
}

const ADHERENCE_WEEKS: usize = 8;

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Adherence to a weekly distance goal over the most recent eight weeks.
///
/// Each snapshot's `week_0_km` counts toward its Monday-based week; the
/// largest value in a week is taken as that week's total. Rows whose date
/// does not parse are skipped. A target that is not positive yields no weeks.
pub fn goal_adherence(target_km: f64, rows: &[Snapshot]) -> AdherenceReport {
    let empty = |message: &str| AdherenceReport {
        target_km,
        overall_pct: None,
        streak: 0,
        weeks: Vec::new(),
        message: message.to_string(),
    };

    if target_km.is_nan() || target_km <= 0.0 {
        return empty("No weekly goal set");
    }
    if rows.is_empty() {
        return empty("No data available");
    }

    let mut by_week: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        let Some(km) = row.week_0_km else { continue };
        let Some(date) = parse_recorded_at(&row.recorded_at) else {
            tracing::warn!(recorded_at = %row.recorded_at, "Skipping snapshot with malformed date");
            continue;
        };
        let entry = by_week.entry(week_start(date)).or_insert(km);
        *entry = entry.max(km);
    }

    let weeks: Vec<WeekAdherence> = by_week
        .iter()
        .rev()
        .take(ADHERENCE_WEEKS)
        .map(|(start, &actual)| WeekAdherence {
            week_start: start.format("%Y-%m-%d").to_string(),
            planned_km: target_km,
            actual_km: actual,
            achieved: actual >= target_km,
        })
        .collect();

    if weeks.is_empty() {
        return empty("Not enough weekly data");
    }

    let achieved = weeks.iter().filter(|w| w.achieved).count();
    let overall_pct = (achieved as f64 / weeks.len() as f64 * 100.0).round() as u32;
    let streak = weeks.iter().take_while(|w| w.achieved).count() as u32;

    AdherenceReport {
        target_km,
        overall_pct: Some(overall_pct),
        streak,
        message: format!(
            "Hit goal {}/{} weeks ({}%)",
            achieved,
            weeks.len(),
            overall_pct
        ),
        weeks,
    }
}

/// Foster monotony and strain over a run of daily training loads
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingMonotony {
    /// Mean daily load divided by its standard deviation, two decimals
    pub monotony: f64,
    /// Weekly load multiplied by monotony, rounded
    pub strain: f64,
}

/// `None` with fewer than two loads or no day-to-day variation
pub fn training_monotony(daily_loads: &[f64]) -> Option<TrainingMonotony> {
    let sd = stdev(daily_loads)?;
    if sd <= 0.0 {
        return None;
    }
    let monotony = mean(daily_loads)? / sd;
    let total: f64 = daily_loads.iter().sum();
    Some(TrainingMonotony {
        monotony: (monotony * 100.0).round() / 100.0,
        strain: (total * monotony).round(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_sample_week() {
        let result = calculate_consistency_score(
            &[30.0, 32.0, 31.0, 33.0, 30.0, 32.0, 31.0],
            &[1, 1, 2, 1, 1, 2, 1],
            &[1.2, 1.3, 1.1, 1.2, 1.3, 1.1, 1.2],
        );

        let score = result.score.unwrap();
        assert!(score <= 100);
        assert!(["Excellent", "Good", "Fair", "Needs Work"].contains(&result.assessment.as_str()));
        // cv ~3.5% -> ~96, rest 1.29 -> ~93, monotony 1.2 -> ~97
        assert_eq!(result.assessment, "Excellent");
        assert_eq!(result.volume_score, Some(96));
        assert_eq!(result.rest_score, Some(93));
        assert_eq!(result.monotony_score, Some(97));
        assert_eq!(score, 95);
    }

    #[test]
    fn test_consistency_empty_volumes() {
        let result = calculate_consistency_score(&[], &[1], &[1.0]);
        assert_eq!(result.score, None);
        assert_eq!(result.assessment, "N/A");
        assert_eq!(result.reason.as_deref(), Some("No volume data"));
    }

    #[test]
    fn test_consistency_defaults_for_missing_lists() {
        // One week: no stdev, volume 50; rest defaults to 7 -> 0; monotony 2 -> 62.5
        let result = calculate_consistency_score(&[40.0], &[], &[]);
        assert_eq!(result.volume_score, Some(50));
        assert_eq!(result.rest_score, Some(0));
        assert_eq!(result.monotony_score, Some(62));
        assert_eq!(result.score, Some(38));
        assert_eq!(result.assessment, "Needs Work");
    }

    #[test]
    fn test_consistency_zero_mean_volume() {
        let result = calculate_consistency_score(&[0.0, 0.0, 0.0], &[1, 2], &[1.25]);
        assert_eq!(result.volume_score, Some(0));
    }

    #[test]
    fn test_consistency_needs_a_week_of_snapshots() {
        let rows = vec![Snapshot::default(); 6];
        let result = consistency_from_snapshots(&rows);
        assert_eq!(result.score, None);
        assert_eq!(result.reason.as_deref(), Some("Not enough data"));
    }

    #[test]
    fn test_overload_flags_big_jump() {
        let report = calculate_overload(&[Some(44.0), Some(40.0), Some(30.0), Some(30.0), None]);
        assert_eq!(report.weeks.len(), 3);
        assert!(!report.weeks[0].flagged);
        assert!((report.weeks[0].change_pct - 10.0).abs() < 1e-9);
        assert!(report.weeks[1].flagged);
        assert_eq!(report.weeks[1].label, "Last week");
        assert!(!report.safe);
    }

    #[test]
    fn test_overload_skips_zero_previous() {
        let report = calculate_overload(&[Some(20.0), Some(0.0), Some(10.0), None, Some(5.0)]);
        assert_eq!(report.weeks.len(), 1);
        assert_eq!(report.weeks[0].label, "Last week");
        assert_eq!(report.weeks[0].change_pct, -100.0);
        assert!(report.safe);
    }

    #[test]
    fn test_overload_without_data() {
        let report = calculate_overload(&[None; 5]);
        assert!(report.weeks.is_empty());
        assert!(report.safe);
    }

    fn km_row(date: &str, km: Option<f64>) -> Snapshot {
        Snapshot {
            week_0_km: km,
            ..Snapshot::new(date)
        }
    }

    #[test]
    fn test_goal_adherence() {
        let rows = vec![
            km_row("2024-09-25T08:00:00", Some(42.0)), // week of 09-23
            km_row("2024-09-23T08:00:00", Some(12.0)),
            km_row("2024-09-20T08:00:00", Some(41.0)), // week of 09-16
            km_row("2024-09-12T08:00:00", Some(30.0)), // week of 09-09
            km_row("2024-09-05", Some(45.0)),          // week of 09-02
            km_row("garbage", Some(99.0)),
            km_row("2024-09-04", None),
        ];

        let report = goal_adherence(40.0, &rows);
        assert_eq!(report.weeks.len(), 4);
        assert_eq!(report.weeks[0].week_start, "2024-09-23");
        assert_eq!(report.weeks[0].actual_km, 42.0);
        assert_eq!(report.streak, 2);
        assert_eq!(report.overall_pct, Some(75));
        assert_eq!(report.message, "Hit goal 3/4 weeks (75%)");
    }

    #[test]
    fn test_goal_adherence_limits_to_eight_weeks() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows: Vec<Snapshot> = (0..12)
            .map(|w| {
                let date = start + Duration::weeks(w);
                km_row(&date.format("%Y-%m-%d").to_string(), Some(50.0))
            })
            .collect();
        let report = goal_adherence(40.0, &rows);
        assert_eq!(report.weeks.len(), 8);
        assert_eq!(report.streak, 8);
        assert_eq!(report.weeks[0].week_start, "2024-03-18");
    }

    #[test]
    fn test_goal_adherence_empty_inputs() {
        assert_eq!(goal_adherence(40.0, &[]).message, "No data available");

        let unusable = vec![km_row("not a date", Some(40.0)), km_row("2024-09-01", None)];
        let report = goal_adherence(40.0, &unusable);
        assert_eq!(report.message, "Not enough weekly data");
        assert_eq!(report.overall_pct, None);
    }

    #[test]
    fn test_goal_adherence_without_target() {
        let rows = vec![
            km_row("2024-09-23", Some(3.0)),
            km_row("2024-09-16", Some(3.0)),
            km_row("2024-09-09", Some(3.0)),
        ];

        for target in [0.0, -10.0, f64::NAN] {
            let report = goal_adherence(target, &rows);
            assert_eq!(report.message, "No weekly goal set");
            assert_eq!(report.overall_pct, None);
            assert_eq!(report.streak, 0);
            assert!(report.weeks.is_empty());
        }
    }

    #[test]
    fn test_training_monotony() {
        let loads = [50.0, 0.0, 60.0, 40.0, 0.0, 80.0, 30.0];
        let result = training_monotony(&loads).unwrap();
        assert!(result.monotony > 1.0 && result.monotony < 1.5);
        assert_eq!(result.strain, (260.0 * (260.0 / 7.0) / stdev(&loads).unwrap()).round());

        assert_eq!(training_monotony(&[40.0; 7]), None);
        assert_eq!(training_monotony(&[40.0]), None);
    }
}
