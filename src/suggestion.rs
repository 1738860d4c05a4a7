use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::percent_change;
use crate::thresholds::suggestion as cfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Rest,
    Easy,
    Long,
    Tempo,
    Interval,
    Moderate,
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            WorkoutType::Rest => "rest",
            WorkoutType::Easy => "easy",
            WorkoutType::Long => "long",
            WorkoutType::Tempo => "tempo",
            WorkoutType::Interval => "interval",
            WorkoutType::Moderate => "moderate",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSuggestion {
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub title: String,
    pub description: String,
    pub duration_min: u32,
    pub color: String,
}

impl WorkoutSuggestion {
    fn new(
        workout_type: WorkoutType,
        title: &str,
        description: String,
        duration_min: u32,
        color: &str,
    ) -> Self {
        WorkoutSuggestion {
            workout_type,
            title: title.to_string(),
            description,
            duration_min,
            color: color.to_string(),
        }
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Pick today's session from form, sleep, weekday and the week-over-week
/// volume change. Rules are checked in order and the first match wins.
///
/// `weekly_km` is newest-first: index 0 is the current week.
pub fn suggest_workout(
    tsb: Option<f64>,
    sleep_score: Option<f64>,
    weekday: Weekday,
    weekly_km: &[Option<f64>; 5],
) -> WorkoutSuggestion {
    if let Some(t) = tsb.filter(|t| *t < cfg::REST_BELOW_TSB) {
        return WorkoutSuggestion::new(
            WorkoutType::Rest,
            "Rest Day",
            format!("TSB is {:.1}. Your body needs recovery before the next session.", t),
            0,
            "red",
        );
    }

    let tired = tsb.is_some_and(|t| t < cfg::EASY_BELOW_TSB);
    let poor_sleep = sleep_score.is_some_and(|s| s < cfg::POOR_SLEEP_SCORE);
    if tired || poor_sleep {
        let reason = if tired {
            "Fatigue is high"
        } else {
            "Sleep was poor"
        };
        return WorkoutSuggestion::new(
            WorkoutType::Easy,
            "Easy Recovery Run",
            format!("{}. Keep it conversational, Z1-Z2 only.", reason),
            30,
            "yellow",
        );
    }

    if let Some(t) = tsb {
        if is_weekend(weekday) && t >= cfg::LONG_RUN_MIN_TSB {
            return WorkoutSuggestion::new(
                WorkoutType::Long,
                "Long Run",
                "Weekend and fresh enough. Build endurance at an easy, steady pace.".to_string(),
                90,
                "green",
            );
        }

        if (cfg::TEMPO_MIN_TSB..=cfg::TEMPO_MAX_TSB).contains(&t) {
            return WorkoutSuggestion::new(
                WorkoutType::Tempo,
                "Tempo Run",
                "Good balance of fitness and freshness. Try 20-30 min at threshold pace."
                    .to_string(),
                50,
                "blue",
            );
        }

        if t > cfg::TEMPO_MAX_TSB {
            return WorkoutSuggestion::new(
                WorkoutType::Interval,
                "Intervals",
                format!(
                    "TSB is {:.1} and you're fresh. Hit some VO2max intervals today.",
                    t
                ),
                60,
                "green",
            );
        }
    }

    let volume_jump = weekly_km[0]
        .zip(weekly_km[1])
        .and_then(|(current, previous)| percent_change(current, previous));
    if let Some(jump) = volume_jump.filter(|j| *j > cfg::VOLUME_JUMP_PCT) {
        return WorkoutSuggestion::new(
            WorkoutType::Moderate,
            "Moderate Run",
            format!(
                "Volume is up {:.0}% on last week. Hold a moderate effort and don't add more.",
                jump
            ),
            45,
            "yellow",
        );
    }

    WorkoutSuggestion::new(
        WorkoutType::Easy,
        "Easy Aerobic Run",
        "Steady Z2 running to keep building your base.".to_string(),
        45,
        "blue",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT: [Option<f64>; 5] = [Some(30.0), Some(30.0), None, None, None];

    #[test]
    fn test_rest_beats_everything() {
        let s = suggest_workout(Some(-22.0), Some(90.0), Weekday::Sat, &FLAT);
        assert_eq!(s.workout_type, WorkoutType::Rest);
        assert_eq!(s.duration_min, 0);
        assert!(s.description.contains("-22.0"));
    }

    #[test]
    fn test_easy_on_fatigue_or_poor_sleep() {
        let tired = suggest_workout(Some(-12.0), None, Weekday::Tue, &FLAT);
        assert_eq!(tired.workout_type, WorkoutType::Easy);
        assert!(tired.description.starts_with("Fatigue"));

        let sleepy = suggest_workout(Some(20.0), Some(55.0), Weekday::Sun, &FLAT);
        assert_eq!(sleepy.title, "Easy Recovery Run");
        assert!(sleepy.description.starts_with("Sleep"));
    }

    #[test]
    fn test_long_run_on_weekend() {
        let s = suggest_workout(Some(-5.0), Some(80.0), Weekday::Sun, &FLAT);
        assert_eq!(s.workout_type, WorkoutType::Long);

        let weekday = suggest_workout(Some(-5.0), Some(80.0), Weekday::Wed, &FLAT);
        assert_eq!(weekday.workout_type, WorkoutType::Easy);
    }

    #[test]
    fn test_tempo_and_interval_bands() {
        assert_eq!(
            suggest_workout(Some(0.0), None, Weekday::Thu, &FLAT).workout_type,
            WorkoutType::Tempo
        );
        assert_eq!(
            suggest_workout(Some(15.0), None, Weekday::Thu, &FLAT).workout_type,
            WorkoutType::Tempo
        );
        assert_eq!(
            suggest_workout(Some(15.1), None, Weekday::Thu, &FLAT).workout_type,
            WorkoutType::Interval
        );
    }

    #[test]
    fn test_volume_jump_moderates() {
        let jump = [Some(40.0), Some(30.0), None, None, None];
        let s = suggest_workout(Some(-7.0), None, Weekday::Mon, &jump);
        assert_eq!(s.workout_type, WorkoutType::Moderate);
        assert!(s.description.contains("33%"));

        // No previous week to compare against
        let fresh = [Some(40.0), Some(0.0), None, None, None];
        let s = suggest_workout(Some(-7.0), None, Weekday::Mon, &fresh);
        assert_eq!(s.title, "Easy Aerobic Run");
    }

    #[test]
    fn test_defaults_without_data() {
        let s = suggest_workout(None, None, Weekday::Sat, &[None; 5]);
        assert_eq!(s.title, "Easy Aerobic Run");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "easy");
        assert_eq!(json["duration_min"], 45);
    }
}
