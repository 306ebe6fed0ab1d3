pub mod autocluster;
pub mod file;
pub mod job;
pub mod source;

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

use negotiation::classad::Ad;
use negotiation::negotiation::{NegotiationSummary, ResourceRequestCluster, ResourceRequestList};
use negotiation::{AutoClusterId, JobId, Map};

use crate::common::error::error;
use crate::queue::autocluster::AutoClusters;
use crate::queue::file::QueueDef;
use crate::queue::job::Job;

/// Owner part of a submitter identity (`owner@domain`).
pub fn submitter_owner(submitter: &str) -> &str {
    submitter.split('@').next().unwrap_or(submitter)
}

pub struct JobQueue {
    schedd_name: String,
    jobs: BTreeMap<JobId, Job>,
    auto_clusters: AutoClusters,
    max_resources_to_offer: i32,
    last_rounds: Map<String, NegotiationSummary>,
}

impl JobQueue {
    pub fn new(schedd_name: String, significant_attributes: Vec<String>) -> Self {
        JobQueue {
            schedd_name,
            jobs: Default::default(),
            auto_clusters: AutoClusters::new(significant_attributes),
            max_resources_to_offer: -1,
            last_rounds: Default::default(),
        }
    }

    pub fn from_def(schedd_name: String, qdef: QueueDef) -> crate::Result<Self> {
        let mut queue = JobQueue::new(schedd_name, qdef.significant_attributes);
        for jdef in qdef.jobs {
            let mut job = Job::new(jdef.job_id(), jdef.owner.clone(), jdef.make_attributes()?);
            job.status = jdef.status;
            job.priority = jdef.priority;
            queue.add_job(job)?;
        }
        Ok(queue)
    }

    pub fn schedd_name(&self) -> &str {
        &self.schedd_name
    }

    pub fn set_max_resources_to_offer(&mut self, value: i32) {
        self.max_resources_to_offer = value;
    }

    pub fn max_resources_to_offer(&self) -> i32 {
        self.max_resources_to_offer
    }

    pub fn auto_clusters(&self) -> &AutoClusters {
        &self.auto_clusters
    }

    /// Inserts a job and assigns its auto-cluster.
    pub fn add_job(&mut self, mut job: Job) -> crate::Result<JobId> {
        let job_id = job.id();
        if self.jobs.contains_key(&job_id) {
            return error(format!("Job {job_id} is already in the queue"));
        }
        let ad = self.make_job_ad(&job);
        job.auto_cluster_id = self.auto_clusters.get_auto_cluster_id(&ad);
        log::debug!(
            "Job {job_id} of {} added to auto cluster {}",
            job.owner(),
            job.auto_cluster_id
        );
        self.jobs.insert(job_id, job);
        Ok(job_id)
    }

    fn make_job_ad(&self, job: &Job) -> Ad {
        job.make_ad(
            &self.schedd_name,
            &self.auto_clusters.significant_attributes_list(),
        )
    }

    pub fn get_job(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.get(&job_id)
    }

    pub fn get_job_mut(&mut self, job_id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&job_id)
    }

    pub fn job_ad(&self, job_id: JobId) -> Option<Ad> {
        self.jobs.get(&job_id).map(|job| self.make_job_ad(job))
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Idle jobs of the submitter grouped by auto-cluster.
    ///
    /// Clusters are ordered by the highest job priority they contain, jobs within a
    /// cluster by descending priority and then by job id.
    pub fn build_request_list(&self, submitter: &str) -> ResourceRequestList {
        let owner = submitter_owner(submitter);
        let mut jobs: Vec<&Job> = self
            .jobs
            .values()
            .filter(|job| job.owner() == owner && job.is_idle())
            .collect();
        jobs.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id().cmp(&b.id())));

        let mut order: Vec<AutoClusterId> = Vec::new();
        let mut clusters: Map<AutoClusterId, ResourceRequestCluster> = Map::default();
        for job in jobs {
            clusters
                .entry(job.auto_cluster_id)
                .or_insert_with(|| {
                    order.push(job.auto_cluster_id);
                    ResourceRequestCluster::new(job.auto_cluster_id)
                })
                .add_job(job.id());
        }
        order
            .into_iter()
            .filter_map(|id| clusters.remove(&id))
            .collect()
    }

    pub fn record_round(&mut self, summary: &NegotiationSummary) {
        self.last_rounds
            .insert(summary.submitter.clone(), summary.clone());
    }

    pub fn last_round(&self, submitter: &str) -> Option<&NegotiationSummary> {
        self.last_rounds.get(submitter)
    }
}

/// Shared handle to the queue; connections run on one thread and borrow it only
/// inside synchronous callbacks.
#[derive(Clone)]
pub struct JobQueueRef(Rc<RefCell<JobQueue>>);

impl JobQueueRef {
    pub fn new(queue: JobQueue) -> Self {
        JobQueueRef(Rc::new(RefCell::new(queue)))
    }

    #[inline]
    #[track_caller]
    pub fn get(&self) -> Ref<'_, JobQueue> {
        self.0.borrow()
    }

    #[inline]
    #[track_caller]
    pub fn get_mut(&self) -> RefMut<'_, JobQueue> {
        self.0.borrow_mut()
    }
}
