//! Countdown text formatting

/// Render seconds as `MM:SS`.
///
/// Negative input reads as zero and fractions are floored. Minutes are at
/// least two digits and keep growing past 99.
pub fn format_countdown(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}
