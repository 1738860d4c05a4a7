//! Pre-race taper planning
//!
//! A taper lasts up to three weeks. Each week's volume is cut according to the
//! chosen model and CTL is projected with the 42-day decay, partly offset by
//! the training that remains.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CalculationError;
use crate::stats::{serialize_opt_round1, serialize_round1};
use crate::thresholds::{taper as taper_cfg, training_load};

/// Volume reduction curve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaperModel {
    /// Even cuts up to 30%
    Linear,
    /// 20% cut, 30% in race week
    Step,
    /// Front-loaded cuts approaching 40%
    #[default]
    Exponential,
}

impl TaperModel {
    /// Volume reduction in percent for taper week `week` of `taper_weeks`
    pub fn reduction_pct(&self, week: u32, taper_weeks: u32) -> f64 {
        match self {
            TaperModel::Linear => {
                week as f64 / taper_weeks as f64 * taper_cfg::LINEAR_MAX_REDUCTION_PCT
            }
            TaperModel::Step => {
                if week < taper_weeks {
                    taper_cfg::STEP_EARLY_REDUCTION_PCT
                } else {
                    taper_cfg::STEP_FINAL_REDUCTION_PCT
                }
            }
            TaperModel::Exponential => {
                (1.0 - taper_cfg::EXPONENTIAL_BASE.powi(week as i32))
                    * taper_cfg::EXPONENTIAL_MAX_REDUCTION_PCT
            }
        }
    }
}

impl FromStr for TaperModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(TaperModel::Linear),
            "step" => Ok(TaperModel::Step),
            "exponential" | "exp" => Ok(TaperModel::Exponential),
            _ => Err(format!("Invalid taper model: {} (linear, step, exponential)", s)),
        }
    }
}

impl fmt::Display for TaperModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TaperModel::Linear => "linear",
            TaperModel::Step => "step",
            TaperModel::Exponential => "exponential",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaperWeek {
    pub week: u32,
    pub label: String,
    #[serde(serialize_with = "serialize_round1")]
    pub reduction_pct: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub target_volume_pct: f64,
    #[serde(serialize_with = "serialize_opt_round1")]
    pub projected_ctl: Option<f64>,
}

/// Taper schedule; `error` is set instead of `weeks` when no plan is possible
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaperPlan {
    pub race_date: String,
    pub model: TaperModel,
    pub days_to_race: Option<i64>,
    pub taper_weeks: u32,
    #[serde(serialize_with = "serialize_opt_round1")]
    pub current_ctl: Option<f64>,
    pub weeks: Vec<TaperWeek>,
    pub error: Option<String>,
}

impl TaperPlan {
    fn failed(race_date: &str, model: TaperModel, current_ctl: Option<f64>, error: String) -> Self {
        TaperPlan {
            race_date: race_date.to_string(),
            model,
            days_to_race: None,
            taper_weeks: 0,
            current_ctl,
            weeks: Vec::new(),
            error: Some(error),
        }
    }
}

fn parse_race_date(race_date: &str) -> Result<NaiveDate, CalculationError> {
    NaiveDate::parse_from_str(race_date.trim(), "%Y-%m-%d").map_err(|_| {
        CalculationError::MalformedDate {
            value: race_date.to_string(),
        }
    })
}

/// Build a taper schedule for a race on `race_date` (YYYY-MM-DD) as seen from `today`.
///
/// Never fails: a malformed date or a race less than a week away yields a plan
/// with `error` set.
pub fn compute_taper_schedule(
    race_date: &str,
    today: NaiveDate,
    current_ctl: Option<f64>,
    model: TaperModel,
) -> TaperPlan {
    let race = match parse_race_date(race_date) {
        Ok(date) => date,
        Err(e) => {
            tracing::warn!(race_date, "Rejected taper request: {}", e);
            return TaperPlan::failed(race_date, model, current_ctl, e.to_string());
        }
    };

    let days_to_race = (race - today).num_days();
    let taper_weeks = taper_cfg::MAX_WEEKS.min(days_to_race.div_euclid(7));
    if taper_weeks < 1 {
        let mut plan = TaperPlan::failed(
            race_date,
            model,
            current_ctl,
            "Race is less than 1 week away, too late for a taper".to_string(),
        );
        plan.days_to_race = Some(days_to_race);
        return plan;
    }
    let taper_weeks = taper_weeks as u32;

    let daily_decay = 1.0 - 1.0 / training_load::CTL_TIME_CONSTANT_DAYS;
    let weeks = (1..=taper_weeks)
        .map(|week| {
            let reduction_pct = model.reduction_pct(week, taper_weeks);
            let target_volume_pct = 100.0 - reduction_pct;
            let retention = target_volume_pct / 100.0 + taper_cfg::RETENTION_OFFSET;
            let decay = daily_decay.powi((week * 7) as i32);
            TaperWeek {
                week,
                label: format!("W{}", week),
                reduction_pct,
                target_volume_pct,
                projected_ctl: current_ctl.map(|ctl| ctl * decay * retention),
            }
        })
        .collect();

    tracing::debug!(days_to_race, taper_weeks, %model, "Computed taper schedule");

    TaperPlan {
        race_date: race_date.to_string(),
        model,
        days_to_race: Some(days_to_race),
        taper_weeks,
        current_ctl,
        weeks,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
    }

    #[test]
    fn test_taper_weeks_capped_at_three() {
        let plan = compute_taper_schedule("2024-11-30", today(), Some(55.0), TaperModel::Linear);
        assert_eq!(plan.error, None);
        assert_eq!(plan.days_to_race, Some(60));
        assert_eq!(plan.taper_weeks, 3);
        assert_eq!(plan.weeks.len(), 3);
        assert_eq!(plan.weeks[2].label, "W3");
    }

    #[test]
    fn test_short_taper() {
        let plan = compute_taper_schedule("2024-10-15", today(), Some(55.0), TaperModel::Step);
        assert_eq!(plan.taper_weeks, 2);
        assert_eq!(plan.weeks[0].reduction_pct, 20.0);
        assert_eq!(plan.weeks[1].reduction_pct, 30.0);
        assert_eq!(plan.weeks[1].target_volume_pct, 70.0);
    }

    #[test]
    fn test_model_reductions() {
        assert_eq!(TaperModel::Linear.reduction_pct(1, 3), 10.0);
        assert_eq!(TaperModel::Linear.reduction_pct(3, 3), 30.0);
        assert!((TaperModel::Exponential.reduction_pct(1, 3) - 12.0).abs() < 1e-9);
        assert!((TaperModel::Exponential.reduction_pct(2, 3) - 20.4).abs() < 1e-9);
        assert_eq!(TaperModel::Step.reduction_pct(1, 1), 30.0);
    }

    #[test]
    fn test_projected_ctl() {
        let plan = compute_taper_schedule("2024-10-08", today(), Some(50.0), TaperModel::Exponential);
        assert_eq!(plan.taper_weeks, 1);
        let expected = 50.0 * (41.0f64 / 42.0).powi(7) * (0.88 + 0.3);
        assert!((plan.weeks[0].projected_ctl.unwrap() - expected).abs() < 1e-9);

        let no_ctl = compute_taper_schedule("2024-10-08", today(), None, TaperModel::Linear);
        assert_eq!(no_ctl.weeks[0].projected_ctl, None);
    }

    #[test]
    fn test_race_too_close_or_past() {
        let plan = compute_taper_schedule("2024-10-05", today(), Some(50.0), TaperModel::Linear);
        assert!(plan.error.is_some());
        assert_eq!(plan.days_to_race, Some(4));
        assert!(plan.weeks.is_empty());

        let past = compute_taper_schedule("2024-09-01", today(), Some(50.0), TaperModel::Linear);
        assert!(past.error.is_some());
    }

    #[test]
    fn test_malformed_date_is_reported_not_thrown() {
        let plan = compute_taper_schedule("next saturday", today(), Some(50.0), TaperModel::Step);
        assert_eq!(plan.days_to_race, None);
        assert!(plan.error.unwrap().contains("next saturday"));
    }

    #[test]
    fn test_model_parsing() {
        assert_eq!("Linear".parse::<TaperModel>().unwrap(), TaperModel::Linear);
        assert_eq!("exp".parse::<TaperModel>().unwrap(), TaperModel::Exponential);
        assert!("cliff".parse::<TaperModel>().is_err());
        assert_eq!(TaperModel::default().to_string(), "exponential");
    }
}
