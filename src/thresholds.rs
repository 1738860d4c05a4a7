//! Named thresholds used by the analytics
//!
//! Every cutoff, weight and band edge used by the scoring and insight functions
//! lives here, grouped by analytic. The values are heuristic and were tuned on
//! personal training data; keep them literal unless there is evidence a value
//! is wrong.

/// Banister impulse-response model constants
pub mod training_load {
    /// CTL (fitness) time constant in days
    pub const CTL_TIME_CONSTANT_DAYS: f64 = 42.0;

    /// ATL (fatigue) time constant in days
    pub const ATL_TIME_CONSTANT_DAYS: f64 = 7.0;

    /// Daily ATL multiplier when no further training is done (~10% decay per day)
    pub const PROJECTION_ATL_DAILY_DECAY: f64 = 0.9;

    /// Default forward projection horizon in days
    pub const PROJECTION_DAYS: u32 = 7;

    /// Default detraining horizon in weeks
    pub const DETRAINING_WEEKS: u32 = 6;
}

/// Training Stress Balance bands
pub mod tsb {
    /// Projected TSB above this is "Optimal"
    pub const OPTIMAL_ABOVE: f64 = 5.0;

    /// Projected TSB above this (and not optimal) is "Grey", otherwise "Overreach"
    pub const GREY_ABOVE: f64 = -10.0;

    /// Five-band form interpretation edges
    pub const TRANSITION_ABOVE: f64 = 25.0;
    pub const FRESH_ABOVE: f64 = 5.0;
    pub const GREY_ZONE_ABOVE: f64 = -10.0;
    pub const OVERREACHING_ABOVE: f64 = -30.0;

    /// Weekly summary: difference between recent and older TSB means that counts as a trend
    pub const SUMMARY_TREND_BAND: f64 = 2.0;
}

/// Taper planning
pub mod taper {
    pub const MAX_WEEKS: i64 = 3;
    pub const LINEAR_MAX_REDUCTION_PCT: f64 = 30.0;
    pub const STEP_EARLY_REDUCTION_PCT: f64 = 20.0;
    pub const STEP_FINAL_REDUCTION_PCT: f64 = 30.0;
    pub const EXPONENTIAL_BASE: f64 = 0.7;
    pub const EXPONENTIAL_MAX_REDUCTION_PCT: f64 = 40.0;

    /// Fraction of fitness retained on top of the remaining volume fraction
    pub const RETENTION_OFFSET: f64 = 0.3;
}

/// Consistency scoring
pub mod consistency {
    pub const WINDOW_DAYS: usize = 28;
    pub const MIN_DAYS: usize = 7;

    pub const IDEAL_REST_DAYS: f64 = 1.5;
    pub const REST_PENALTY_PER_DAY: f64 = 30.0;
    /// Assumed rest days when none were reported
    pub const DEFAULT_REST_DAYS: f64 = 7.0;

    pub const IDEAL_MONOTONY: f64 = 1.25;
    pub const MONOTONY_PENALTY: f64 = 50.0;
    /// Assumed monotony when none was reported
    pub const DEFAULT_MONOTONY: f64 = 2.0;

    /// Volume score used when the variation cannot be computed (a single week)
    pub const FALLBACK_VOLUME_SCORE: f64 = 50.0;

    pub const VOLUME_WEIGHT: f64 = 0.4;
    pub const REST_WEIGHT: f64 = 0.3;
    pub const MONOTONY_WEIGHT: f64 = 0.3;

    pub const EXCELLENT_FROM: u8 = 80;
    pub const GOOD_FROM: u8 = 60;
    pub const FAIR_FROM: u8 = 40;
}

/// Injury risk factors and point penalties
pub mod injury {
    pub const WINDOW_DAYS: usize = 14;
    pub const MIN_DAYS: usize = 7;
    /// Rest days and HRV trend are evaluated over this many newest rows
    pub const FACTOR_WINDOW: usize = 7;

    pub const EXTREME_RAMP_RATE: f64 = 8.0;
    pub const HIGH_RAMP_RATE: f64 = 5.0;
    pub const ELEVATED_RAMP_RATE: f64 = 3.0;
    pub const EXTREME_RAMP_POINTS: u32 = 30;
    pub const HIGH_RAMP_POINTS: u32 = 20;
    pub const ELEVATED_RAMP_POINTS: u32 = 10;

    pub const VERY_HIGH_AC_RATIO: f64 = 1.5;
    pub const HIGH_AC_RATIO: f64 = 1.3;
    pub const VERY_HIGH_AC_POINTS: u32 = 25;
    pub const HIGH_AC_POINTS: u32 = 15;

    pub const MIN_AVG_REST_DAYS: f64 = 0.5;
    pub const MAX_AVG_REST_DAYS: f64 = 4.0;
    pub const INSUFFICIENT_REST_POINTS: u32 = 15;
    pub const INCONSISTENT_TRAINING_POINTS: u32 = 10;

    /// HRV trend (percent change, recent vs older) penalties
    pub const SIGNIFICANT_HRV_DROP_PCT: f64 = -15.0;
    pub const HRV_DECLINE_PCT: f64 = -10.0;
    pub const SIGNIFICANT_HRV_DROP_POINTS: u32 = 20;
    pub const HRV_DECLINE_POINTS: u32 = 10;

    pub const POOR_SLEEP_SCORE: f64 = 60.0;
    pub const POOR_SLEEP_POINTS: u32 = 10;

    pub const HIGH_FATIGUE: u8 = 4;
    pub const HIGH_FATIGUE_POINTS: u32 = 15;

    pub const MAX_SCORE: u32 = 100;
    pub const HIGH_FROM: u32 = 60;
    pub const ELEVATED_FROM: u32 = 40;
    pub const MODERATE_FROM: u32 = 20;

    /// Recommendation triggers
    pub const REDUCE_VOLUME_FROM: u32 = 40;
    pub const SLEEP_ADVICE_BELOW: f64 = 70.0;
    pub const REST_ADVICE_BELOW: f64 = 1.0;
}

/// Training readiness composite
pub mod readiness {
    pub const WINDOW_DAYS: usize = 7;

    /// TSB is mapped linearly from [TSB_FLOOR, TSB_CEILING] onto [0, 100]
    pub const TSB_FLOOR: f64 = -30.0;
    pub const TSB_CEILING: f64 = 20.0;

    /// HRV component = HRV_BASE + trend_pct * HRV_GAIN
    pub const HRV_BASE: f64 = 70.0;
    pub const HRV_GAIN: f64 = 1.5;

    pub const TSB_WEIGHT: f64 = 0.30;
    pub const HRV_WEIGHT: f64 = 0.25;
    pub const SLEEP_WEIGHT: f64 = 0.20;
    pub const FATIGUE_WEIGHT: f64 = 0.15;
    pub const SORENESS_WEIGHT: f64 = 0.10;

    /// Score used for a component with no data
    pub const NEUTRAL_COMPONENT: f64 = 50.0;

    pub const EXCELLENT_FROM: u8 = 80;
    pub const GOOD_FROM: u8 = 60;
    pub const MODERATE_FROM: u8 = 40;
}

/// Week-over-week volume progression
pub mod overload {
    /// The "10% rule"
    pub const MAX_WEEKLY_INCREASE_PCT: f64 = 10.0;
}

/// Critical speed model and race prediction
pub mod race {
    /// Below this distance D' dominates and the time is solved iteratively
    pub const SHORT_DISTANCE_M: f64 = 2000.0;
    pub const FIXED_POINT_ITERATIONS: usize = 3;

    /// Long races use at most this fraction of the distance as D'
    pub const D_PRIME_DISTANCE_CAP: f64 = 0.1;
    /// Share of the effective D' credited to long races
    pub const D_PRIME_LONG_WEIGHT: f64 = 0.5;

    /// Best efforts shorter than this are excluded from the CS fit
    pub const MIN_EFFORT_SECS: f64 = 120.0;
    pub const MIN_FIT_POINTS: usize = 2;
    /// Target distances for the CS fit, meters
    pub const FIT_TARGET_DISTANCES_M: [f64; 5] = [1000.0, 2000.0, 3000.0, 4000.0, 5000.0];

    /// Activities within this fraction of a standard distance count as a race effort
    pub const PR_DISTANCE_TOLERANCE: f64 = 0.08;

    pub const EXCELLENT_FITNESS_CTL: f64 = 40.0;
    pub const GOOD_FITNESS_CTL: f64 = 25.0;
}

/// Correlation mining
pub mod insights {
    pub const WINDOW_DAYS: usize = 30;
    pub const MIN_ROWS: usize = 10;

    pub const HIGH_VOLUME_KM: f64 = 35.0;
    pub const LOW_VOLUME_KM: f64 = 20.0;
    pub const VOLUME_HRV_DROP_PCT: f64 = 10.0;

    pub const GOOD_SLEEP_SCORE: f64 = 75.0;
    pub const POOR_SLEEP_SCORE: f64 = 60.0;
    pub const SLEEP_HRV_DIFF_PCT: f64 = 15.0;

    pub const REST_WINDOW_DAYS: usize = 20;
    /// Each side of the rest comparison needs strictly more samples than this
    pub const MIN_REST_SAMPLES: usize = 2;
    pub const BREAK_REST_DAYS: u32 = 2;
    pub const REST_HRV_GAIN: f64 = 1.1;
}

/// Aerobic HR-zone drift
pub mod hr_drift {
    pub const WINDOW_DAYS: usize = 60;
    pub const MIN_ZONE_SECS: u32 = 600;
    /// Share of zone time in Z1+Z2 for a session to count as aerobic
    pub const MIN_EASY_FRACTION: f64 = 0.7;
    pub const MIN_SESSIONS: usize = 6;
    pub const TREND_DELTA: f64 = 5.0;
}

/// Sleep duration and quality insights
pub mod sleep {
    pub const WINDOW_DAYS: usize = 60;
    pub const MIN_SAMPLES: usize = 10;
    pub const MIN_BUCKET_SAMPLES: usize = 2;
    pub const QUALITY_HRV_DIFF_PCT: f64 = 10.0;
}

/// Workout suggestion rule cascade
pub mod suggestion {
    pub const REST_BELOW_TSB: f64 = -20.0;
    pub const EASY_BELOW_TSB: f64 = -10.0;
    pub const POOR_SLEEP_SCORE: f64 = 60.0;
    pub const LONG_RUN_MIN_TSB: f64 = -5.0;
    pub const TEMPO_MIN_TSB: f64 = 0.0;
    pub const TEMPO_MAX_TSB: f64 = 15.0;
    pub const VOLUME_JUMP_PCT: f64 = 15.0;
}

/// Recovery recommendation rules
pub mod recommendation {
    pub const REST_BELOW_TSB: f64 = -20.0;
    pub const HIGH_FATIGUE: u8 = 4;
    pub const POOR_SLEEP_SCORE: f64 = 60.0;
    pub const GO_ABOVE_TSB: f64 = 10.0;
    pub const GO_MIN_HRV: f64 = 45.0;
    pub const STEADY_MIN_TSB: f64 = -10.0;
    pub const STEADY_MAX_TSB: f64 = 10.0;
}

/// Heart-rate and pace zone bands
pub mod zones {
    /// Karvonen %HRR bands for zones 1-5
    pub const HRR_BANDS: [(f64, f64); 5] = [
        (0.50, 0.60),
        (0.60, 0.70),
        (0.70, 0.80),
        (0.80, 0.90),
        (0.90, 1.00),
    ];

    /// Critical-speed multiples for pace zones 1-6 (slow end, fast end)
    pub const CS_BANDS: [(f64, f64); 6] = [
        (0.70, 0.80),
        (0.80, 0.88),
        (0.88, 0.95),
        (0.95, 1.02),
        (1.02, 1.10),
        (1.10, 1.25),
    ];
}

/// Dashboard status labels
pub mod status {
    pub const CTL_GOOD_RAMP: f64 = 2.0;
    pub const ATL_GOOD_RATIO: f64 = 1.0;
    pub const ATL_OK_RATIO: f64 = 1.3;
    pub const AC_LOW: f64 = 0.8;
    pub const AC_GOOD_MAX: f64 = 1.3;
    pub const AC_OK_MAX: f64 = 1.5;
}
