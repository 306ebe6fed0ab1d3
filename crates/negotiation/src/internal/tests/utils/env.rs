use crate::internal::classad::{Ad, attrs};
use crate::internal::common::{Map, Set};
use crate::internal::messages::negotiator::{ClaimId, ToNegotiatorMessage};
use crate::internal::negotiation::comm::NegotiatorComm;
use crate::internal::negotiation::configuration::NegotiationConfiguration;
use crate::internal::negotiation::request::ResourceRequestList;
use crate::internal::negotiation::session::{NegotiationSession, NegotiationSummary};
use crate::internal::negotiation::source::{JobSource, SkipDecision};
use crate::JobId;

pub const TEST_SUBMITTER: &str = "alice@test.pool";

#[derive(Default, Debug)]
pub struct TestComm {
    pub messages: Vec<ToNegotiatorMessage>,
}

impl TestComm {
    pub fn take_messages(&mut self, len: usize) -> Vec<ToNegotiatorMessage> {
        assert_eq!(self.messages.len(), len);
        std::mem::take(&mut self.messages)
    }

    /// Takes exactly one job ad sent to the negotiator.
    pub fn take_job_info(&mut self) -> Ad {
        let mut msgs = self.take_messages(1);
        match msgs.pop() {
            Some(ToNegotiatorMessage::JobInfo(ad)) => ad,
            msg => panic!("Expected job info, got {msg:?}"),
        }
    }

    pub fn take_job_infos(&mut self, len: usize) -> Vec<Ad> {
        self.take_messages(len)
            .into_iter()
            .map(|msg| match msg {
                ToNegotiatorMessage::JobInfo(ad) => ad,
                msg => panic!("Expected job info, got {msg:?}"),
            })
            .collect()
    }

    pub fn check_no_more_jobs(&mut self) {
        let msgs = self.take_messages(1);
        assert_eq!(msgs[0], ToNegotiatorMessage::NoMoreJobs);
    }

    pub fn emptiness_check(&self) {
        if !self.messages.is_empty() {
            panic!("Unexpected messages to negotiator: {:?}", self.messages);
        }
    }
}

impl NegotiatorComm for TestComm {
    fn send_message(&mut self, message: ToNegotiatorMessage) {
        self.messages.push(message);
    }
}

#[derive(Debug)]
pub struct MatchRecord {
    pub job_id: JobId,
    pub claim_id: ClaimId,
    pub machine_ad: Ad,
    pub slot_name: String,
}

/// In-memory job queue that records every callback of the session.
#[derive(Debug)]
pub struct TestJobSource {
    pub jobs: Map<JobId, Ad>,
    pub skip: Map<JobId, SkipDecision>,
    pub refuse_matches: Set<JobId>,
    pub max_resources: i32,

    pub skip_queries: Vec<(JobId, bool)>,
    pub rejected: Vec<(JobId, String)>,
    pub matches: Vec<MatchRecord>,
    pub finished: Vec<NegotiationSummary>,
}

impl Default for TestJobSource {
    fn default() -> Self {
        TestJobSource {
            jobs: Default::default(),
            skip: Default::default(),
            refuse_matches: Default::default(),
            max_resources: -1,
            skip_queries: Vec::new(),
            rejected: Vec::new(),
            matches: Vec::new(),
            finished: Vec::new(),
        }
    }
}

impl TestJobSource {
    pub fn new<I: IntoIterator<Item = Ad>>(ads: I) -> Self {
        let mut source = Self::default();
        for ad in ads {
            source.add_job(ad);
        }
        source
    }

    pub fn add_job(&mut self, ad: Ad) -> JobId {
        let job_id = JobId::new(
            ad.lookup_int(attrs::CLUSTER_ID).unwrap() as i32,
            ad.lookup_int(attrs::PROC_ID).unwrap() as i32,
        );
        self.jobs.insert(job_id, ad);
        job_id
    }

    pub fn matched_jobs(&self) -> Vec<JobId> {
        self.matches.iter().map(|m| m.job_id).collect()
    }

    pub fn rejected_jobs(&self) -> Vec<JobId> {
        self.rejected.iter().map(|r| r.0).collect()
    }
}

impl JobSource for TestJobSource {
    fn get_job_ad(&mut self, job_id: JobId) -> Option<Ad> {
        self.jobs.get(&job_id).cloned()
    }

    fn should_skip_job(&mut self, job_id: JobId, match_ad: Option<&Ad>) -> SkipDecision {
        self.skip_queries.push((job_id, match_ad.is_some()));
        self.skip.get(&job_id).cloned().unwrap_or_default()
    }

    fn handle_job_rejected(&mut self, job_id: JobId, reason: &str) {
        self.rejected.push((job_id, reason.to_string()));
    }

    fn handle_match(
        &mut self,
        job_id: JobId,
        claim_id: &ClaimId,
        machine_ad: &Ad,
        slot_name: &str,
    ) -> bool {
        if self.refuse_matches.contains(&job_id) {
            return false;
        }
        self.matches.push(MatchRecord {
            job_id,
            claim_id: claim_id.clone(),
            machine_ad: machine_ad.clone(),
            slot_name: slot_name.to_string(),
        });
        true
    }

    fn handle_negotiation_finished(&mut self, summary: &NegotiationSummary) {
        self.finished.push(summary.clone());
    }

    fn max_resources_to_offer(&self) -> i32 {
        self.max_resources
    }
}

pub fn create_test_session(requests: ResourceRequestList) -> NegotiationSession {
    create_test_session_with_config(requests, Default::default())
}

pub fn create_test_session_with_config(
    requests: ResourceRequestList,
    configuration: NegotiationConfiguration,
) -> NegotiationSession {
    NegotiationSession::new(TEST_SUBMITTER.to_string(), None, requests, configuration)
}
