use std::time::Instant;

/// Emits `start` and `end` tracing events of one negotiation round.
pub struct ScopedTimer<'a> {
    submitter: &'a str,
    pool: &'a str,
    method: &'static str,
    started: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(submitter: &'a str, pool: &'a str, method: &'static str) -> Self {
        tracing::info!(
            action = "measure",
            submitter = submitter,
            pool = pool,
            method = method,
            event = "start"
        );
        Self {
            submitter,
            pool,
            method,
            started: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        tracing::info!(
            action = "measure",
            method = self.method,
            submitter = self.submitter,
            pool = self.pool,
            duration_ms = self.started.elapsed().as_millis() as u64,
            event = "end"
        );
    }
}

macro_rules! trace_time {
    ($submitter:expr, $pool:expr, $method:tt, $block:expr) => {{
        let _timer =
            $crate::internal::common::trace::ScopedTimer::new($submitter, $pool, $method);
        $block
    }};
}
