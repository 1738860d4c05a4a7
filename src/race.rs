//! Race prediction with the critical speed model
//!
//! Critical speed (CS) is the asymptotic speed an athlete can sustain; D' is
//! the finite distance they can cover above it. Both come from a linear fit of
//! best efforts:
//!
//! ```text
//! distance / time = CS + D' * (1 / time)
//! ```
//!
//! Short races are solved iteratively because D' makes up a large share of the
//! distance; for 2 km and up CS dominates and D' is credited at a fixed,
//! capped share.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::format::{format_duration, pace_for};
use crate::models::Snapshot;
use crate::stats::serialize_round1;
use crate::thresholds::race as cfg;

/// A standard race distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceDistance {
    pub label: &'static str,
    pub meters: f64,
    /// Finishing time range for recreational to competitive runners
    pub typical_range: &'static str,
    /// Label used for personal records
    pub record_label: &'static str,
}

pub const RACE_DISTANCES: [RaceDistance; 6] = [
    RaceDistance { label: "800m", meters: 800.0, typical_range: "2:00-2:30", record_label: "800m" },
    RaceDistance { label: "1 mile", meters: 1609.0, typical_range: "4:30-6:00", record_label: "1 Mile" },
    RaceDistance { label: "5K", meters: 5000.0, typical_range: "15:00-25:00", record_label: "5K" },
    RaceDistance { label: "10K", meters: 10000.0, typical_range: "32:00-55:00", record_label: "10K" },
    RaceDistance { label: "Half Marathon", meters: 21097.0, typical_range: "1:10-2:30", record_label: "Half Marathon" },
    RaceDistance { label: "Marathon", meters: 42195.0, typical_range: "2:30-5:00", record_label: "Marathon" },
];

/// A best effort used for fitting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effort {
    pub distance_m: f64,
    pub time_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalSpeedFit {
    /// Meters per second
    pub critical_speed: f64,
    /// Meters
    pub d_prime: f64,
    pub points_used: Vec<Effort>,
}

/// Least-squares fit of CS and D' over efforts lasting at least two minutes.
///
/// `None` with fewer than two usable efforts, a degenerate regression (all
/// efforts the same duration) or a non-positive CS.
pub fn fit_critical_speed(efforts: &[Effort]) -> Option<CriticalSpeedFit> {
    let points: Vec<Effort> = efforts
        .iter()
        .copied()
        .filter(|e| e.time_secs >= cfg::MIN_EFFORT_SECS && e.distance_m > 0.0)
        .collect();
    if points.len() < cfg::MIN_FIT_POINTS {
        return None;
    }

    let n = points.len() as f64;
    let xs: Vec<f64> = points.iter().map(|e| 1.0 / e.time_secs).collect();
    let ys: Vec<f64> = points.iter().map(|e| e.distance_m / e.time_secs).collect();
    let sx: f64 = xs.iter().sum();
    let sy: f64 = ys.iter().sum();
    let sxx: f64 = xs.iter().map(|x| x * x).sum();
    let sxy: f64 = xs.iter().zip(&ys).map(|(x, y)| x * y).sum();

    let denominator = n * sxx - sx * sx;
    if denominator.abs() < f64::EPSILON {
        tracing::debug!(points = points.len(), "Critical speed fit is degenerate");
        return None;
    }

    let d_prime = (n * sxy - sx * sy) / denominator;
    let critical_speed = (sy - d_prime * sx) / n;
    if critical_speed <= 0.0 {
        return None;
    }

    Some(CriticalSpeedFit {
        critical_speed,
        d_prime,
        points_used: points,
    })
}

/// Pick fitting efforts from pace curves.
///
/// `distances` are the curve sample points in meters and each curve holds the
/// time in seconds for those distances (`None` or 0 where the activity did not
/// reach it). The best time per distance is taken across curves, then the
/// sample closest to each 1-5 km target is used if it lasted two minutes.
pub fn select_curve_efforts(distances: &[f64], curves: &[Vec<Option<f64>>]) -> Vec<Effort> {
    if distances.is_empty() {
        return Vec::new();
    }

    let mut best: Vec<Option<f64>> = vec![None; distances.len()];
    for curve in curves {
        for (slot, time) in best.iter_mut().zip(curve) {
            if let Some(t) = time.filter(|t| *t > 0.0) {
                *slot = Some(slot.map_or(t, |b: f64| b.min(t)));
            }
        }
    }

    cfg::FIT_TARGET_DISTANCES_M
        .iter()
        .filter_map(|target| {
            let (index, distance) = distances
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))?;
            let time = best[index].filter(|t| *t >= cfg::MIN_EFFORT_SECS)?;
            Some(Effort {
                distance_m: *distance,
                time_secs: time,
            })
        })
        .collect()
}

/// Predicted finishing time in seconds for `meters`, or `None` if undefined
pub fn predict_race_time(meters: f64, critical_speed: f64, d_prime: Option<f64>) -> Option<f64> {
    if critical_speed <= 0.0 || meters <= 0.0 {
        return None;
    }
    let d_prime = d_prime.unwrap_or(0.0);

    let time = if meters < cfg::SHORT_DISTANCE_M {
        let mut t = meters / critical_speed;
        for _ in 0..cfg::FIXED_POINT_ITERATIONS {
            let v = if t > 0.0 { critical_speed + d_prime / t } else { critical_speed };
            if v > 0.0 {
                t = meters / v;
            }
        }
        t
    } else {
        let effective = d_prime.min(meters * cfg::D_PRIME_DISTANCE_CAP);
        (meters - effective * cfg::D_PRIME_LONG_WEIGHT) / critical_speed
    };

    (time > 0.0).then_some(time)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RacePrediction {
    pub distance: String,
    pub meters: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub seconds: f64,
    pub predicted_time: String,
    pub predicted_pace: String,
    pub typical_range: String,
}

/// Predictions for the six standard distances; distances without a defined
/// time are left out. CTL only affects the fitness level, see `race_predictor`.
pub fn calculate_race_predictions(critical_speed: f64, d_prime: Option<f64>) -> Vec<RacePrediction> {
    RACE_DISTANCES
        .iter()
        .filter_map(|race| {
            let seconds = predict_race_time(race.meters, critical_speed, d_prime)?;
            Some(RacePrediction {
                distance: race.label.to_string(),
                meters: race.meters,
                seconds,
                predicted_time: format_duration(seconds),
                predicted_pace: pace_for(seconds, race.meters)?,
                typical_range: race.typical_range.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessLevel {
    Excellent,
    Good,
    Building,
    Unknown,
}

impl FitnessLevel {
    pub fn from_ctl(ctl: Option<f64>) -> Self {
        match ctl {
            Some(c) if c > cfg::EXCELLENT_FITNESS_CTL => FitnessLevel::Excellent,
            Some(c) if c > cfg::GOOD_FITNESS_CTL => FitnessLevel::Good,
            _ => FitnessLevel::Building,
        }
    }
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            FitnessLevel::Excellent => "excellent",
            FitnessLevel::Good => "good",
            FitnessLevel::Building => "building",
            FitnessLevel::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RacePredictorReport {
    pub predictions: Vec<RacePrediction>,
    pub critical_speed_ms: Option<f64>,
    pub d_prime_meters: Option<f64>,
    pub fitness_level: FitnessLevel,
    pub message: String,
}

/// Race predictions from the newest snapshot's CS, D' and CTL
pub fn race_predictor(latest: Option<&Snapshot>) -> RacePredictorReport {
    let Some((snapshot, cs)) = latest.and_then(|s| s.critical_speed.map(|cs| (s, cs))) else {
        return RacePredictorReport {
            predictions: Vec::new(),
            critical_speed_ms: None,
            d_prime_meters: None,
            fitness_level: FitnessLevel::Unknown,
            message: "Need critical speed data for race predictions. Complete a few hard efforts (1-5K)."
                .to_string(),
        };
    };

    let fitness_level = FitnessLevel::from_ctl(snapshot.ctl);
    RacePredictorReport {
        predictions: calculate_race_predictions(cs, snapshot.d_prime),
        critical_speed_ms: Some(cs),
        d_prime_meters: snapshot.d_prime,
        fitness_level,
        message: format!(
            "Predictions based on Critical Speed model. Current fitness: {}.",
            fitness_level
        ),
    }
}

/// An activity as reported by the training platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date_local: String,
    #[serde(alias = "distance")]
    pub distance_m: Option<f64>,
    pub moving_time: Option<f64>,
    pub elapsed_time: Option<f64>,
}

/// A run that matched a standard race distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrCandidate {
    pub distance_label: String,
    pub distance_m: f64,
    pub time_secs: f64,
    pub pace_str: String,
    pub activity_date: String,
    pub activity_id: String,
}

/// The standard distance within 8% of `distance_m`, if any
pub fn match_race_distance(distance_m: f64) -> Option<&'static RaceDistance> {
    RACE_DISTANCES
        .iter()
        .find(|race| (distance_m - race.meters).abs() / race.meters <= cfg::PR_DISTANCE_TOLERANCE)
}

const RUN_TYPES: [&str; 3] = ["run", "virtualrun", "treadmill"];

/// Runs whose distance matches a standard race distance.
///
/// Each activity matches at most one distance. Moving time is preferred over
/// elapsed time.
pub fn extract_pr_candidates(activities: &[Activity]) -> Vec<PrCandidate> {
    activities
        .iter()
        .filter(|a| RUN_TYPES.contains(&a.activity_type.to_lowercase().as_str()))
        .filter_map(|a| {
            let distance = a.distance_m.filter(|d| *d > 0.0)?;
            let time = a.moving_time.or(a.elapsed_time).filter(|t| *t > 0.0)?;
            let race = match_race_distance(distance)?;
            Some(PrCandidate {
                distance_label: race.record_label.to_string(),
                distance_m: race.meters,
                time_secs: time,
                pace_str: pace_for(time, distance)?,
                activity_date: a.start_date_local.chars().take(10).collect(),
                activity_id: a.id.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictions_reference_values() {
        let predictions = calculate_race_predictions(3.5, Some(200.0));
        assert_eq!(predictions.len(), 6);

        let five_k = predictions.iter().find(|p| p.distance == "5K").unwrap();
        assert!((five_k.seconds - 1400.0).abs() < 1e-9);
        assert_eq!(five_k.predicted_time, "23:20");
        assert_eq!(five_k.predicted_pace, "4:40/km");
        assert_eq!(five_k.typical_range, "15:00-25:00");

        let ten_k = &predictions[3];
        assert_eq!(ten_k.predicted_time, "47:08");
        let half = &predictions[4];
        assert_eq!(half.predicted_time, "1:39:59");
        let marathon = &predictions[5];
        assert_eq!(marathon.predicted_time, "3:20:27");
    }

    #[test]
    fn test_short_distances_use_d_prime() {
        let with_d = predict_race_time(800.0, 3.5, Some(200.0)).unwrap();
        let without = predict_race_time(800.0, 3.5, None).unwrap();
        assert!((without - 800.0 / 3.5).abs() < 1e-9);
        assert!(with_d < without);
        assert!(with_d > 160.0 && with_d < 180.0);
    }

    #[test]
    fn test_predictions_increase_with_distance() {
        let predictions = calculate_race_predictions(4.2, Some(180.0));
        assert!(predictions.windows(2).all(|w| w[1].seconds > w[0].seconds));
    }

    #[test]
    fn test_non_positive_cs() {
        assert!(calculate_race_predictions(0.0, Some(200.0)).is_empty());
        assert!(calculate_race_predictions(-1.0, None).is_empty());
    }

    #[test]
    fn test_fit_recovers_model_parameters() {
        let efforts: Vec<Effort> = [240.0, 600.0, 1200.0]
            .iter()
            .map(|&t| Effort {
                distance_m: 4.0 * t + 150.0,
                time_secs: t,
            })
            .collect();

        let fit = fit_critical_speed(&efforts).unwrap();
        assert!((fit.critical_speed - 4.0).abs() < 1e-6);
        assert!((fit.d_prime - 150.0).abs() < 1e-3);
        assert_eq!(fit.points_used.len(), 3);
    }

    #[test]
    fn test_fit_needs_two_long_efforts() {
        let efforts = [
            Effort { distance_m: 400.0, time_secs: 70.0 },
            Effort { distance_m: 1000.0, time_secs: 230.0 },
        ];
        assert!(fit_critical_speed(&efforts).is_none());

        let same_duration = [
            Effort { distance_m: 1000.0, time_secs: 300.0 },
            Effort { distance_m: 1100.0, time_secs: 300.0 },
        ];
        assert!(fit_critical_speed(&same_duration).is_none());
    }

    #[test]
    fn test_select_curve_efforts() {
        let distances = [400.0, 1000.0, 2000.0, 3000.0, 5000.0];
        let curves = vec![
            vec![Some(80.0), Some(230.0), Some(500.0), None, None],
            vec![Some(75.0), Some(225.0), Some(510.0), Some(790.0), Some(1350.0)],
            vec![None, Some(0.0), None, None, None],
        ];

        let efforts = select_curve_efforts(&distances, &curves);
        // Targets 1k, 2k, 3k, 4k (closest is 3000 or 5000), 5k
        assert_eq!(efforts[0], Effort { distance_m: 1000.0, time_secs: 225.0 });
        assert_eq!(efforts[1], Effort { distance_m: 2000.0, time_secs: 500.0 });
        assert_eq!(efforts.len(), 5);
        assert_eq!(efforts[4].time_secs, 1350.0);

        assert!(select_curve_efforts(&[], &curves).is_empty());
    }

    #[test]
    fn test_race_predictor_report() {
        let missing = race_predictor(None);
        assert_eq!(missing.fitness_level, FitnessLevel::Unknown);
        assert!(missing.predictions.is_empty());
        assert!(missing.message.starts_with("Need critical speed"));

        let snapshot = Snapshot {
            critical_speed: Some(3.5),
            d_prime: Some(200.0),
            ctl: Some(50.0),
            ..Snapshot::default()
        };
        let report = race_predictor(Some(&snapshot));
        assert_eq!(report.fitness_level, FitnessLevel::Excellent);
        assert_eq!(report.predictions.len(), 6);
        assert!(report.message.ends_with("Current fitness: excellent."));

        let building = Snapshot {
            critical_speed: Some(3.0),
            ctl: Some(25.0),
            ..Snapshot::default()
        };
        assert_eq!(race_predictor(Some(&building)).fitness_level, FitnessLevel::Building);
    }

    #[test]
    fn test_pr_candidates() {
        let activities = vec![
            Activity {
                id: "a1".to_string(),
                activity_type: "Run".to_string(),
                start_date_local: "2024-09-21T08:30:00".to_string(),
                distance_m: Some(5120.0),
                moving_time: Some(1380.0),
                elapsed_time: Some(1400.0),
            },
            Activity {
                id: "a2".to_string(),
                activity_type: "Ride".to_string(),
                distance_m: Some(10000.0),
                moving_time: Some(1200.0),
                ..Activity::default()
            },
            Activity {
                id: "a3".to_string(),
                activity_type: "VirtualRun".to_string(),
                distance_m: Some(7500.0),
                moving_time: Some(2400.0),
                ..Activity::default()
            },
        ];

        let candidates = extract_pr_candidates(&activities);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].distance_label, "5K");
        assert_eq!(candidates[0].distance_m, 5000.0);
        assert_eq!(candidates[0].activity_date, "2024-09-21");
        assert_eq!(candidates[0].pace_str, "4:29/km");
    }

    #[test]
    fn test_activity_deserializes_platform_fields() {
        let json = r#"{"id": "i42", "type": "Run", "distance": 10050.0, "moving_time": 2700}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.distance_m, Some(10050.0));
        assert_eq!(match_race_distance(10050.0).map(|r| r.label), Some("10K"));
    }

    #[test]
    fn test_pr_mile_label() {
        let activities = vec![Activity {
            id: "m1".to_string(),
            activity_type: "Run".to_string(),
            start_date_local: "2024-06-02T09:00:00".to_string(),
            distance_m: Some(1620.0),
            moving_time: Some(330.0),
            ..Activity::default()
        }];

        let candidates = extract_pr_candidates(&activities);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].distance_label, "1 Mile");
        assert_eq!(calculate_race_predictions(4.0, Some(200.0))[1].distance, "1 mile");
    }
}
