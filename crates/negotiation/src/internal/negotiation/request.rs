use std::collections::VecDeque;

use crate::{AutoClusterId, JobId};

/// One job offered on behalf of an auto-cluster.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResourceRequest {
    pub job_id: JobId,
    pub auto_cluster_id: AutoClusterId,
}

/// Jobs of one auto-cluster, in the order in which they should be offered.
#[derive(Debug)]
pub struct ResourceRequestCluster {
    auto_cluster_id: AutoClusterId,
    jobs: VecDeque<JobId>,
}

impl ResourceRequestCluster {
    pub fn new(auto_cluster_id: AutoClusterId) -> Self {
        ResourceRequestCluster {
            auto_cluster_id,
            jobs: VecDeque::new(),
        }
    }

    pub fn with_jobs<I: IntoIterator<Item = JobId>>(auto_cluster_id: AutoClusterId, jobs: I) -> Self {
        ResourceRequestCluster {
            auto_cluster_id,
            jobs: jobs.into_iter().collect(),
        }
    }

    #[inline]
    pub fn auto_cluster_id(&self) -> AutoClusterId {
        self.auto_cluster_id
    }

    #[inline]
    pub fn add_job(&mut self, job_id: JobId) {
        self.jobs.push_back(job_id);
    }

    #[inline]
    pub fn pop_job(&mut self) -> Option<JobId> {
        self.jobs.pop_front()
    }

    /// Number of jobs that were not popped yet.
    #[inline]
    pub fn size(&self) -> usize {
        self.jobs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drops all remaining jobs, returns how many were dropped.
    pub fn drain(&mut self) -> usize {
        let count = self.jobs.len();
        self.jobs.clear();
        count
    }

    pub fn requests(&self) -> impl Iterator<Item = ResourceRequest> + '_ {
        self.jobs.iter().map(|&job_id| ResourceRequest {
            job_id,
            auto_cluster_id: self.auto_cluster_id,
        })
    }
}

/// All jobs that may be offered in one negotiation round, grouped by auto-cluster.
///
/// Clusters are kept in priority order and are only ever consumed from the front.
#[derive(Debug, Default)]
pub struct ResourceRequestList {
    clusters: VecDeque<ResourceRequestCluster>,
}

impl ResourceRequestList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_cluster(&mut self, cluster: ResourceRequestCluster) {
        self.clusters.push_back(cluster);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    #[inline]
    pub fn front(&self) -> Option<&ResourceRequestCluster> {
        self.clusters.front()
    }

    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut ResourceRequestCluster> {
        self.clusters.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<ResourceRequestCluster> {
        self.clusters.pop_front()
    }

    /// Number of jobs left in all clusters.
    pub fn total_jobs(&self) -> usize {
        self.clusters.iter().map(|c| c.size()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceRequestCluster> {
        self.clusters.iter()
    }

    pub fn requests(&self) -> impl Iterator<Item = ResourceRequest> + '_ {
        self.clusters.iter().flat_map(|c| c.requests())
    }
}

impl FromIterator<ResourceRequestCluster> for ResourceRequestList {
    fn from_iter<T: IntoIterator<Item = ResourceRequestCluster>>(iter: T) -> Self {
        ResourceRequestList {
            clusters: iter.into_iter().collect(),
        }
    }
}
