use std::time::Duration;

/// Format a duration as `mm:ss`. Minutes keep counting past an hour.
pub fn format_time(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Whole-number percentage of `part` in `total`, or `None` for an empty total.
pub fn percentage(part: usize, total: usize) -> Option<u32> {
    match total {
        positive if positive > 0 => Some(((part as f64 / total as f64) * 100.0).round() as u32),
        _ => None,
    }
}
