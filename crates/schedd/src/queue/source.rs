use chrono::Utc;

use negotiation::JobId;
use negotiation::classad::{Ad, attrs};
use negotiation::messages::ClaimId;
use negotiation::negotiation::{JobSource, NegotiationSummary, SkipDecision};

use crate::queue::JobQueueRef;
use crate::queue::job::{JobStatus, MatchRecord};

/// Negotiates on behalf of the jobs in a [`JobQueue`](crate::queue::JobQueue) for one round.
pub struct QueueJobSource {
    queue: JobQueueRef,
    remote_pool: Option<String>,
}

impl QueueJobSource {
    pub fn new(queue: JobQueueRef, remote_pool: Option<String>) -> Self {
        QueueJobSource { queue, remote_pool }
    }

    fn pool_name(&self) -> &str {
        self.remote_pool.as_deref().unwrap_or("local pool")
    }
}

impl JobSource for QueueJobSource {
    fn get_job_ad(&mut self, job_id: JobId) -> Option<Ad> {
        self.queue.get().job_ad(job_id)
    }

    fn should_skip_job(&mut self, job_id: JobId, _match_ad: Option<&Ad>) -> SkipDecision {
        let queue = self.queue.get();
        match queue.get_job(job_id) {
            None => SkipDecision::skip("job was removed"),
            Some(job) if job.status == JobStatus::Removed => SkipDecision::skip("job was removed"),
            Some(job) if !job.is_idle() => {
                SkipDecision::skip(format!("job is not idle ({})", job.status))
            }
            Some(_) => SkipDecision::offer(),
        }
    }

    fn handle_job_rejected(&mut self, job_id: JobId, reason: &str) {
        if job_id.is_none() {
            // Rejection of a resource request that was not linked to any job
            return;
        }
        let mut queue = self.queue.get_mut();
        let Some(job) = queue.get_job_mut(job_id) else {
            log::debug!("Rejected job {job_id} is no longer in the queue");
            return;
        };
        job.attributes.assign(attrs::LAST_REJ_MATCH_REASON, reason);
        job.attributes
            .assign(attrs::LAST_REJ_MATCH_TIME, Utc::now().timestamp());
    }

    fn handle_match(
        &mut self,
        job_id: JobId,
        claim_id: &ClaimId,
        machine_ad: &Ad,
        slot_name: &str,
    ) -> bool {
        if machine_ad.lookup_string(attrs::MY_ADDRESS).is_none() {
            log::warn!("Slot {slot_name} matched with job {job_id} has no address, ignoring match");
            return false;
        }
        let mut queue = self.queue.get_mut();
        let Some(job) = queue.get_job_mut(job_id) else {
            return false;
        };
        if !job.is_idle() {
            log::debug!("Job {job_id} is {}, ignoring match with {slot_name}", job.status);
            return false;
        }
        job.status = JobStatus::Matched;
        job.match_record = Some(MatchRecord {
            claim_id: claim_id.clone(),
            slot_name: slot_name.to_string(),
            remote_pool: self.remote_pool.clone(),
            matched_at: Utc::now(),
        });
        log::info!("Job {job_id} matched with {slot_name}");
        true
    }

    fn handle_negotiation_finished(&mut self, summary: &NegotiationSummary) {
        log::info!(
            "Finished negotiating for {} in {}: {} matched, {} rejected",
            summary.submitter,
            self.pool_name(),
            summary.jobs_matched,
            summary.jobs_rejected
        );
        if let Some(failure) = &summary.failure {
            log::warn!("Negotiation for {} failed: {failure}", summary.submitter);
        }
        self.queue.get_mut().record_round(summary);
    }

    fn max_resources_to_offer(&self) -> i32 {
        self.queue.get().max_resources_to_offer()
    }
}
