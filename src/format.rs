//! Clock-face formatting for timer values. All rounding of sub-second
//! tracker readings happens here.

/// `MM:SS`, floored and clamped at zero
pub fn fmt_time(total_seconds: f64) -> String {
    let abs = whole_non_negative(total_seconds);
    format!("{:02}:{:02}", abs / 60, abs % 60)
}

/// `H:MM:SS` once an hour is reached, `MM:SS` below that
pub fn fmt_clock(total_seconds: f64) -> String {
    let abs = whole_non_negative(total_seconds);
    let (h, m, s) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Signed `+MM:SS` / `-MM:SS`, rounded to the nearest second. Zero is `+`.
pub fn fmt_diff(diff_seconds: f64) -> String {
    let val = round_secs(diff_seconds);
    let sign = if val >= 0 { '+' } else { '-' };
    let abs = val.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}

/// Countdown for the current section. Overtime shows with a leading `-`.
pub fn fmt_remaining(remaining_seconds: f64) -> String {
    if !remaining_seconds.is_finite() {
        return "00:00".to_string();
    }
    let negative = remaining_seconds < 0.0;
    let abs = remaining_seconds.floor().abs() as u64;
    format!(
        "{}{:02}:{:02}",
        if negative { "-" } else { "" },
        abs / 60,
        abs % 60
    )
}

/// Planned length in minutes as `N min` or `N min S s`
pub fn fmt_minutes(minutes: f64) -> String {
    let minutes = if minutes.is_finite() { minutes.max(0.0) } else { 0.0 };
    let mut whole = minutes.floor() as u64;
    let mut secs = ((minutes - minutes.floor()) * 60.0).round() as u64;
    if secs == 60 {
        whole += 1;
        secs = 0;
    }
    if secs > 0 {
        format!("{whole} min {secs} s")
    } else {
        format!("{whole} min")
    }
}

/// Round to whole seconds, halves toward positive infinity
pub fn round_secs(seconds: f64) -> i64 {
    if seconds.is_finite() {
        (seconds + 0.5).floor() as i64
    } else {
        0
    }
}

fn whole_non_negative(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}
