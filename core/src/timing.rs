use std::time::{Duration, Instant};

/// Logs the time between its creation and drop at `info` level.
pub struct LogDuration {
    label: String,
    start: Instant,
}

impl LogDuration {
    pub fn new(label: impl Into<String>) -> Self { Self { label: label.into(), start: Instant::now() } }

    pub fn elapsed(&self) -> Duration { self.start.elapsed() }
}

impl Drop for LogDuration {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::info!(label = %self.label, took_s = elapsed.as_secs_f64(), "finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_grows() {
        let timer = LogDuration::new("sleep");
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }
}
