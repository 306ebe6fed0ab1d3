use crate::internal::classad::Ad;
use crate::internal::messages::negotiator::ClaimId;
use crate::internal::negotiation::session::NegotiationSummary;
use crate::JobId;

/// Outcome of [`JobSource::should_skip_job`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipDecision {
    pub skip: bool,
    /// Skip also every remaining job of the same auto-cluster.
    pub skip_entire_cluster: bool,
    pub reason: String,
}

impl SkipDecision {
    pub fn offer() -> Self {
        Self::default()
    }

    pub fn skip<S: Into<String>>(reason: S) -> Self {
        SkipDecision {
            skip: true,
            skip_entire_cluster: false,
            reason: reason.into(),
        }
    }

    pub fn skip_cluster<S: Into<String>>(reason: S) -> Self {
        SkipDecision {
            skip: true,
            skip_entire_cluster: true,
            reason: reason.into(),
        }
    }
}

/// The queue on whose behalf a session negotiates.
///
/// All methods are called synchronously from within message dispatch and are expected
/// to be in-memory operations.
pub trait JobSource {
    /// Returns `None` when the job no longer exists.
    fn get_job_ad(&mut self, job_id: JobId) -> Option<Ad>;

    /// `match_ad` is `None` when the job is being selected for an offer and contains
    /// the machine when a match for the job has arrived.
    fn should_skip_job(&mut self, job_id: JobId, match_ad: Option<&Ad>) -> SkipDecision;

    fn handle_job_rejected(&mut self, job_id: JobId, reason: &str);

    /// Returns `true` when the match was accepted.
    fn handle_match(
        &mut self,
        job_id: JobId,
        claim_id: &ClaimId,
        machine_ad: &Ad,
        slot_name: &str,
    ) -> bool;

    /// Called exactly once per round, also when the round was abandoned.
    fn handle_negotiation_finished(&mut self, summary: &NegotiationSummary);

    /// Upper bound of matches that may be accepted in one round, `-1` means unlimited.
    fn max_resources_to_offer(&self) -> i32 {
        -1
    }
}
