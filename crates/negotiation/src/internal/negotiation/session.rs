use crate::internal::classad::{Ad, attrs};
use crate::internal::common::Set;
use crate::internal::common::error::NegotiationError;
use crate::internal::messages::negotiator::{
    ClaimId, FromNegotiatorMessage, Operation, RejectContext, ToNegotiatorMessage,
};
use crate::internal::negotiation::comm::NegotiatorComm;
use crate::internal::negotiation::configuration::NegotiationConfiguration;
use crate::internal::negotiation::fixup::fixup_partitionable_slot;
use crate::internal::negotiation::reject::{UNKNOWN_REJECT_REASON, decode_reject_reason};
use crate::internal::negotiation::request::ResourceRequestList;
use crate::internal::negotiation::source::JobSource;
use crate::{AutoClusterId, JobId};

/// Attributes sent in resource-request-list mode on top of the significant attributes
/// of the job's auto-cluster.
const REQUIRED_REQUEST_ATTRIBUTES: [&str; 8] = [
    attrs::OWNER,
    attrs::CLUSTER_ID,
    attrs::PROC_ID,
    attrs::RESOURCE_REQUEST_COUNT,
    attrs::GLOBAL_JOB_ID,
    attrs::AUTO_CLUSTER_ID,
    attrs::WANT_MATCH_DIAGNOSTICS,
    attrs::WANT_CLAIMING,
];

const UNKNOWN_SLOT_NAME: &str = "<unknown>";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, `negotiate` was not called yet.
    Idle,
    AwaitingMessage,
    Finished,
}

/// Job selected to be offered next, set aside while the negotiator answers for another job.
struct Cursor {
    auto_cluster_id: AutoClusterId,
    job_id: JobId,
    job_ad: Option<Ad>,
}

/// Result of one round, handed to [`JobSource::handle_negotiation_finished`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NegotiationSummary {
    pub submitter: String,
    pub remote_pool: Option<String>,
    pub jobs_matched: u32,
    pub jobs_rejected: u32,
    pub satisfied: bool,
    /// Set when the round was abandoned because of a transport or protocol error.
    pub failure: Option<String>,
}

/// Drives one negotiation round for one submitter.
///
/// The session never performs I/O. Every message read from the negotiator is passed to
/// [`NegotiationSession::on_message`] and all replies are queued into a [`NegotiatorComm`].
pub struct NegotiationSession {
    submitter: String,
    remote_pool: Option<String>,
    configuration: NegotiationConfiguration,
    requests: ResourceRequestList,

    current_auto_cluster_id: AutoClusterId,
    current_job_id: JobId,
    current_job_ad: Option<Ad>,
    rejected_auto_clusters: Set<AutoClusterId>,

    current_resources_requested: u32,
    current_resources_delivered: u32,
    jobs_rejected: u32,
    jobs_matched: u32,
    num_resource_reqs_sent: u32,
    num_resource_reqs_to_send: u32,
    /// Matches that may still be accepted in this round, `-1` is unlimited.
    jobs_can_offer: i32,

    started: bool,
    negotiation_finished: bool,
    finish_reported: bool,
    operation: Option<Operation>,
    failure: Option<String>,
}

impl NegotiationSession {
    pub fn new(
        submitter: String,
        remote_pool: Option<String>,
        requests: ResourceRequestList,
        configuration: NegotiationConfiguration,
    ) -> Self {
        NegotiationSession {
            submitter,
            remote_pool,
            configuration,
            requests,
            current_auto_cluster_id: AutoClusterId::NONE,
            current_job_id: JobId::NONE,
            current_job_ad: None,
            rejected_auto_clusters: Default::default(),
            current_resources_requested: 0,
            current_resources_delivered: 0,
            jobs_rejected: 0,
            jobs_matched: 0,
            num_resource_reqs_sent: 0,
            num_resource_reqs_to_send: 0,
            jobs_can_offer: -1,
            started: false,
            negotiation_finished: false,
            finish_reported: false,
            operation: None,
            failure: None,
        }
    }

    pub fn submitter(&self) -> &str {
        &self.submitter
    }

    pub fn remote_pool(&self) -> Option<&str> {
        self.remote_pool.as_deref()
    }

    pub fn configuration(&self) -> &NegotiationConfiguration {
        &self.configuration
    }

    fn pool_name(&self) -> &str {
        self.remote_pool.as_deref().unwrap_or("local pool")
    }

    pub fn state(&self) -> SessionState {
        if self.negotiation_finished {
            SessionState::Finished
        } else if self.started {
            SessionState::AwaitingMessage
        } else {
            SessionState::Idle
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.negotiation_finished
    }

    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    pub fn current_job_id(&self) -> JobId {
        self.current_job_id
    }

    pub fn current_auto_cluster_id(&self) -> AutoClusterId {
        self.current_auto_cluster_id
    }

    pub fn current_job_ad(&self) -> Option<&Ad> {
        self.current_job_ad.as_ref()
    }

    pub fn jobs_matched(&self) -> u32 {
        self.jobs_matched
    }

    pub fn jobs_rejected(&self) -> u32 {
        self.jobs_rejected
    }

    pub fn resources_requested(&self) -> u32 {
        self.current_resources_requested
    }

    pub fn resources_delivered(&self) -> u32 {
        self.current_resources_delivered
    }

    pub fn resource_requests_sent(&self) -> u32 {
        self.num_resource_reqs_sent
    }

    pub fn is_auto_cluster_rejected(&self, auto_cluster_id: AutoClusterId) -> bool {
        self.rejected_auto_clusters.contains(&auto_cluster_id)
    }

    pub fn requests(&self) -> &ResourceRequestList {
        &self.requests
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// The round was successful when nothing was rejected and advancing once more would
    /// find no job to offer.
    ///
    /// Pure query, the session is not advanced. Jobs that the source skips or that are
    /// no longer in the queue are not waiting.
    pub fn get_satisfaction(&self, source: &mut impl JobSource) -> bool {
        if self.jobs_rejected > 0 || !self.current_job_id.is_none() {
            return false;
        }
        for cluster in self.requests.iter() {
            if self.is_auto_cluster_rejected(cluster.auto_cluster_id()) {
                continue;
            }
            for request in cluster.requests() {
                let decision = source.should_skip_job(request.job_id, None);
                if decision.skip {
                    if decision.skip_entire_cluster {
                        break;
                    }
                    continue;
                }
                if source.get_job_ad(request.job_id).is_some() {
                    return false;
                }
            }
        }
        true
    }

    pub fn summary(&self, source: &mut impl JobSource) -> NegotiationSummary {
        NegotiationSummary {
            submitter: self.submitter.clone(),
            remote_pool: self.remote_pool.clone(),
            jobs_matched: self.jobs_matched,
            jobs_rejected: self.jobs_rejected,
            satisfied: self.failure.is_none() && self.get_satisfaction(source),
            failure: self.failure.clone(),
        }
    }

    /// Starts the round by selecting the first job that will be offered.
    pub fn negotiate(&mut self, source: &mut impl JobSource) {
        assert!(!self.started, "Negotiation was already started");
        self.started = true;
        self.jobs_can_offer = source.max_resources_to_offer();
        log::debug!(
            "Negotiating for {} in {}: {} job(s) in {} auto cluster(s)",
            self.submitter,
            self.pool_name(),
            self.requests.total_jobs(),
            self.requests.len()
        );
        self.next_job(source);
    }

    /// Abandons the round, no further messages are accepted.
    pub fn abort(&mut self, reason: String) {
        if !self.negotiation_finished {
            log::warn!(
                "Negotiation for {} in {} abandoned: {} (current job {})",
                self.submitter,
                self.pool_name(),
                reason,
                self.current_job_id
            );
        }
        if self.failure.is_none() {
            self.failure = Some(reason);
        }
        self.negotiation_finished = true;
    }

    /// Reports the end of the round to the job source; only the first call has an effect.
    pub fn finish(&mut self, source: &mut impl JobSource) {
        self.negotiation_finished = true;
        if self.finish_reported {
            return;
        }
        self.finish_reported = true;
        let summary = self.summary(source);
        log::debug!(
            "Finished negotiating for {} in {}: {} matched, {} rejected",
            self.submitter,
            self.pool_name(),
            summary.jobs_matched,
            summary.jobs_rejected
        );
        source.handle_negotiation_finished(&summary);
    }

    pub fn on_message(
        &mut self,
        comm: &mut impl NegotiatorComm,
        source: &mut impl JobSource,
        message: FromNegotiatorMessage,
    ) -> crate::Result<()> {
        assert!(self.started, "Message dispatched before negotiation started");
        let operation = message.operation();
        if self.negotiation_finished {
            return Err(NegotiationError::ProtocolError(format!(
                "Received {operation} after the negotiation has finished"
            )));
        }
        self.operation = Some(operation);
        log::trace!("Received {operation} for {}", self.submitter);

        match message {
            FromNegotiatorMessage::Rejected => {
                self.on_rejected(source, UNKNOWN_REJECT_REASON.to_string(), None);
            }
            FromNegotiatorMessage::RejectedWithReason { reason, context } => {
                let (reason, context) = match context {
                    Some(context) => (reason, Some(context)),
                    None if self.configuration.legacy_reject_context => {
                        let rejection = decode_reject_reason(&reason)?;
                        (rejection.reason, rejection.context)
                    }
                    None => (reason, None),
                };
                self.on_rejected(source, reason, context);
            }
            FromNegotiatorMessage::SendJobInfo => {
                self.on_send_job_info(comm, source);
            }
            FromNegotiatorMessage::SendResourceRequestList { count } => {
                self.on_send_resource_request_list(comm, source, count);
            }
            FromNegotiatorMessage::PermissionAndAd {
                claim_id,
                machine_ad,
            } => {
                self.on_permission_and_ad(source, claim_id, machine_ad)?;
            }
            FromNegotiatorMessage::EndNegotiate => {
                log::debug!(
                    "Negotiator ended negotiation for {} ({} matched, {} rejected)",
                    self.submitter,
                    self.jobs_matched,
                    self.jobs_rejected
                );
                self.negotiation_finished = true;
            }
        }
        Ok(())
    }

    fn on_rejected(
        &mut self,
        source: &mut impl JobSource,
        reason: String,
        context: Option<RejectContext>,
    ) {
        let previous = context.and_then(|context| {
            self.resync_current_job(context.job_id, Some(context.auto_cluster_id))
        });
        log::debug!(
            "Job {} (auto cluster {}) rejected: {}",
            self.current_job_id,
            self.current_auto_cluster_id,
            reason
        );
        source.handle_job_rejected(self.current_job_id, &reason);
        self.jobs_rejected += 1;
        if !self.current_auto_cluster_id.is_none() {
            self.rejected_auto_clusters
                .insert(self.current_auto_cluster_id);
        }
        self.advance(source, previous);
    }

    fn on_send_job_info(&mut self, comm: &mut impl NegotiatorComm, source: &mut impl JobSource) {
        self.num_resource_reqs_sent = 0;
        if !self.ensure_current_job(source) {
            log::debug!("No more jobs to offer for {}", self.submitter);
            comm.send_message(ToNegotiatorMessage::NoMoreJobs);
            self.negotiation_finished = true;
            return;
        }
        let Some(job_ad) = self.current_job_ad.as_ref() else {
            return;
        };
        let count = request_count(job_ad);
        self.current_resources_requested = count;
        self.current_resources_delivered = 0;
        log::debug!(
            "Offering job {} (auto cluster {}, resource request count {})",
            self.current_job_id,
            self.current_auto_cluster_id,
            count
        );
        comm.send_message(ToNegotiatorMessage::JobInfo(job_ad.clone()));
    }

    fn on_send_resource_request_list(
        &mut self,
        comm: &mut impl NegotiatorComm,
        source: &mut impl JobSource,
        count: u32,
    ) {
        self.num_resource_reqs_sent = 0;
        self.num_resource_reqs_to_send = count;
        self.current_resources_requested = 0;
        self.current_resources_delivered = 0;

        while self.num_resource_reqs_to_send > 0 {
            if !self.ensure_current_job(source) {
                break;
            }
            let Some(job_ad) = self.current_job_ad.as_ref() else {
                break;
            };
            let request_ad = self.significant_attributes_ad(job_ad);
            self.current_resources_requested += request_count(&request_ad);
            comm.send_message(ToNegotiatorMessage::JobInfo(request_ad));
            self.num_resource_reqs_sent += 1;
            self.num_resource_reqs_to_send -= 1;

            // The request stands for the whole auto-cluster, the next one starts a new cluster
            let auto_cluster_id = self.current_auto_cluster_id;
            if self
                .requests
                .front()
                .is_some_and(|c| c.auto_cluster_id() == auto_cluster_id)
            {
                self.requests.pop_front();
            }
            self.clear_current_job();
        }

        log::debug!(
            "Sent {} of {} resource request(s) for {}",
            self.num_resource_reqs_sent,
            count,
            self.submitter
        );
        self.num_resource_reqs_to_send = 0;
        if self.num_resource_reqs_sent == 0 {
            comm.send_message(ToNegotiatorMessage::NoMoreJobs);
            self.negotiation_finished = true;
        }
    }

    fn on_permission_and_ad(
        &mut self,
        source: &mut impl JobSource,
        claim_id: ClaimId,
        mut machine_ad: Ad,
    ) -> crate::Result<()> {
        if claim_id.is_empty() {
            return Err(NegotiationError::ProtocolError(
                "Received a match without a claim id".to_string(),
            ));
        }
        let mut previous = None;
        if let Some((job_id, auto_cluster_id)) = request_link(&machine_ad) {
            previous = self.resync_current_job(job_id, auto_cluster_id);
            if previous.is_some() {
                self.current_job_ad = source.get_job_ad(job_id);
            }
        }
        self.current_resources_delivered += 1;

        let job_id = self.current_job_id;
        let slot_name = machine_ad
            .lookup_string(attrs::NAME)
            .unwrap_or(UNKNOWN_SLOT_NAME)
            .to_string();

        if job_id.is_none() {
            log::warn!(
                "Received match with {slot_name} for {} but no job is selected",
                self.submitter
            );
        } else if machine_ad.lookup_bool(attrs::OFFLINE).unwrap_or(false) {
            log::debug!("Match of job {job_id} is an offline slot {slot_name}, skipping");
        } else if self.remaining_offers() == Some(0) {
            log::debug!("Skipping match of job {job_id} with {slot_name}: got enough matches");
        } else if let Some(reason) = self.skip_reason(source, job_id, &machine_ad) {
            log::debug!("Skipping match of job {job_id} with {slot_name}: {reason}");
        } else if !self.fixup_machine(&mut machine_ad) {
            log::debug!("Job {job_id} does not fit into partitionable slot {slot_name}, skipping");
        } else if source.handle_match(job_id, &claim_id, &machine_ad, &slot_name) {
            log::debug!("Job {job_id} matched with {slot_name} ({claim_id})");
            self.jobs_matched += 1;
        } else {
            log::debug!("Match of job {job_id} with {slot_name} was not accepted");
        }

        self.advance(source, previous);
        Ok(())
    }

    fn skip_reason(
        &self,
        source: &mut impl JobSource,
        job_id: JobId,
        machine_ad: &Ad,
    ) -> Option<String> {
        let decision = source.should_skip_job(job_id, Some(machine_ad));
        decision.skip.then_some(decision.reason)
    }

    fn fixup_machine(&self, machine_ad: &mut Ad) -> bool {
        if !machine_ad
            .lookup_bool(attrs::SLOT_PARTITIONABLE)
            .unwrap_or(false)
        {
            return true;
        }
        match &self.current_job_ad {
            Some(job_ad) => fixup_partitionable_slot(job_ad, machine_ad),
            None => false,
        }
    }

    /// Points the session to a job named by the negotiator.
    ///
    /// Returns the previously selected job when the named job is a different one.
    fn resync_current_job(
        &mut self,
        job_id: JobId,
        auto_cluster_id: Option<AutoClusterId>,
    ) -> Option<Cursor> {
        if job_id == self.current_job_id {
            if let Some(auto_cluster_id) = auto_cluster_id {
                self.current_auto_cluster_id = auto_cluster_id;
            }
            return None;
        }
        let previous = Cursor {
            auto_cluster_id: self.current_auto_cluster_id,
            job_id: self.current_job_id,
            job_ad: self.current_job_ad.take(),
        };
        self.current_job_id = job_id;
        self.current_auto_cluster_id = auto_cluster_id.unwrap_or(AutoClusterId::NONE);
        Some(previous)
    }

    /// Moves on once the negotiator answered for a job.
    ///
    /// An answer for the selected job advances to the next one. An answer for a job named
    /// by the negotiator leaves the selection as it was before the answer.
    fn advance(&mut self, source: &mut impl JobSource, previous: Option<Cursor>) {
        match previous {
            Some(cursor) => {
                self.current_auto_cluster_id = cursor.auto_cluster_id;
                self.current_job_id = cursor.job_id;
                self.current_job_ad = cursor.job_ad;
                if !self.current_job_id.is_none()
                    && self.is_auto_cluster_rejected(self.current_auto_cluster_id)
                {
                    self.next_job(source);
                }
            }
            // Requests of a list are answered in any order, the next list selects again
            None if self.num_resource_reqs_sent > 0 => self.clear_current_job(),
            None => {
                self.next_job(source);
            }
        }
    }

    fn remaining_offers(&self) -> Option<u32> {
        if self.jobs_can_offer < 0 {
            None
        } else {
            Some((self.jobs_can_offer as u32).saturating_sub(self.jobs_matched))
        }
    }

    fn ensure_current_job(&mut self, source: &mut impl JobSource) -> bool {
        if !self.current_job_id.is_none() && self.current_job_ad.is_some() {
            return true;
        }
        self.next_job(source)
    }

    fn clear_current_job(&mut self) {
        self.current_auto_cluster_id = AutoClusterId::NONE;
        self.current_job_id = JobId::NONE;
        self.current_job_ad = None;
    }

    /// Selects the next job that will be offered. Returns `false` when there is none.
    fn next_job(&mut self, source: &mut impl JobSource) -> bool {
        let remaining_offers = self.remaining_offers();
        if remaining_offers == Some(0) {
            log::debug!(
                "Reached the limit of {} match(es) for {}",
                self.jobs_can_offer,
                self.submitter
            );
            self.clear_current_job();
            return false;
        }

        while let Some(cluster) = self.requests.front_mut() {
            let auto_cluster_id = cluster.auto_cluster_id();
            if self.rejected_auto_clusters.contains(&auto_cluster_id) {
                let dropped = cluster.drain();
                log::trace!(
                    "Dropping {dropped} job(s) of rejected auto cluster {auto_cluster_id}"
                );
                self.requests.pop_front();
                continue;
            }

            let Some(job_id) = cluster.pop_job() else {
                self.requests.pop_front();
                continue;
            };

            let decision = source.should_skip_job(job_id, None);
            if decision.skip {
                log::debug!("Skipping job {job_id}: {}", decision.reason);
                if decision.skip_entire_cluster {
                    cluster.drain();
                }
                continue;
            }

            let Some(mut job_ad) = source.get_job_ad(job_id) else {
                log::debug!("Job {job_id} is no longer in the queue, skipping");
                continue;
            };

            let remaining = cluster.size();
            if remaining == 0 {
                self.requests.pop_front();
            }

            let universe = job_ad.lookup_int(attrs::JOB_UNIVERSE);
            if self.configuration.is_batchable_universe(universe) {
                // The popped job plus everything still waiting in its cluster
                let mut count = 1 + remaining as i64;
                if let Some(limit) = remaining_offers {
                    count = count.min(limit as i64);
                }
                job_ad.assign(attrs::RESOURCE_REQUEST_COUNT, count);
            }

            self.current_job_id = job_id;
            self.current_auto_cluster_id = auto_cluster_id;
            self.current_job_ad = Some(job_ad);
            return true;
        }

        self.clear_current_job();
        false
    }

    fn significant_attributes_ad(&self, job_ad: &Ad) -> Ad {
        let significant = job_ad
            .lookup_string(attrs::AUTO_CLUSTER_ATTRS)
            .unwrap_or_default();
        let mut ad = job_ad.project(
            significant
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|name| !name.is_empty())
                .chain(REQUIRED_REQUEST_ATTRIBUTES),
        );
        ad.assign(attrs::CLUSTER_ID, self.current_job_id.cluster());
        ad.assign(attrs::PROC_ID, self.current_job_id.proc());
        ad.assign(attrs::AUTO_CLUSTER_ID, self.current_auto_cluster_id.as_num());
        ad
    }
}

fn request_count(job_ad: &Ad) -> u32 {
    job_ad
        .lookup_int(attrs::RESOURCE_REQUEST_COUNT)
        .unwrap_or(1)
        .clamp(1, u32::MAX as i64) as u32
}

/// Job and auto-cluster named by a match delivered in resource-request-list mode.
///
/// A link with a value out of the range of the ids is ignored.
fn request_link(machine_ad: &Ad) -> Option<(JobId, Option<AutoClusterId>)> {
    let cluster = i32::try_from(machine_ad.lookup_int(attrs::RESOURCE_REQUEST_CLUSTER)?).ok()?;
    let proc = i32::try_from(machine_ad.lookup_int(attrs::RESOURCE_REQUEST_PROC)?).ok()?;
    let auto_cluster_id = match machine_ad.lookup_int(attrs::RESOURCE_REQUEST_AUTO_CLUSTER) {
        Some(value) => Some(AutoClusterId::new(i32::try_from(value).ok()?)),
        None => None,
    };
    Some((JobId::new(cluster, proc), auto_cluster_id))
}
