use derive_builder::Builder;
use std::time::Duration;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(60);

/// Universe of jobs handled by the dedicated (parallel) scheduler.
pub const PARALLEL_UNIVERSE: i64 = 11;

#[derive(Builder, Debug, Clone)]
#[builder(pattern = "owned")]
pub struct NegotiationConfiguration {
    /// How long to wait for the next message of the negotiator.
    #[builder(default = "DEFAULT_READ_TIMEOUT")]
    pub read_timeout: Duration,
    #[builder(default = "DEFAULT_WRITE_TIMEOUT")]
    pub write_timeout: Duration,
    /// Jobs of these universes are always offered with a resource request count of one.
    #[builder(default = "vec![PARALLEL_UNIVERSE]")]
    pub non_batchable_universes: Vec<i64>,
    /// Decode the `reason|autocluster|cluster.proc|` suffix sent by older negotiators.
    #[builder(default = "true")]
    pub legacy_reject_context: bool,
}

impl Default for NegotiationConfiguration {
    fn default() -> Self {
        NegotiationConfiguration {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            non_batchable_universes: vec![PARALLEL_UNIVERSE],
            legacy_reject_context: true,
        }
    }
}

impl NegotiationConfiguration {
    pub fn is_batchable_universe(&self, universe: Option<i64>) -> bool {
        match universe {
            Some(universe) => !self.non_batchable_universes.contains(&universe),
            None => true,
        }
    }
}
