use std::time::Duration;

/// Returns the next tip polling interval based on how long the tip has been
/// unchanged.
pub fn poll_interval(since_last_change: Duration) -> Duration {
    match since_last_change {
        d if d < Duration::from_secs(10) => Duration::from_secs(1),
        d if d < Duration::from_secs(60) => Duration::from_secs(5),
        d if d < Duration::from_secs(300) => Duration::from_secs(15),
        _ => Duration::from_secs(30),
    }
}
