//! Text formatting for durations and paces
//!
//! Components are truncated, not rounded: 1399.9 s is `23:19`.

/// Format seconds as `M:SS`, or `H:MM:SS` from one hour up
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let minutes = total / 60;
    let secs = total % 60;
    if minutes >= 60 {
        format!("{}:{:02}:{:02}", minutes / 60, minutes % 60, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a pace given in seconds per kilometer as `M:SS/km`
pub fn format_pace(secs_per_km: f64) -> String {
    let total = secs_per_km.max(0.0) as u64;
    format!("{}:{:02}/km", total / 60, total % 60)
}

/// Pace string for covering `meters` in `seconds`
pub fn pace_for(seconds: f64, meters: f64) -> Option<String> {
    if meters <= 0.0 || seconds <= 0.0 {
        return None;
    }
    Some(format_pace(seconds / meters * 1000.0))
}

/// Pace string for running at `speed` meters per second
pub fn pace_from_speed(speed: f64) -> Option<String> {
    if speed <= 0.0 {
        return None;
    }
    Some(format_pace(1000.0 / speed))
}

/// Short sleep duration text, e.g. `7h05m`
pub fn format_sleep(seconds: u32) -> String {
    format!("{}h{:02}m", seconds / 3600, (seconds % 3600) / 60)
}
