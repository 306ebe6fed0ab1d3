use crate::internal::classad::{Ad, AdValue, attrs};
use crate::internal::messages::negotiator::{ClaimId, FromNegotiatorMessage};
use crate::internal::negotiation::request::{ResourceRequestCluster, ResourceRequestList};
use crate::{AutoClusterId, JobId};

pub const VANILLA_UNIVERSE: i64 = 5;

pub struct JobAdBuilder {
    ad: Ad,
}

impl JobAdBuilder {
    pub fn new(cluster: i32, proc: i32, auto_cluster: i32) -> Self {
        let mut ad = Ad::new();
        ad.assign(attrs::OWNER, "alice");
        ad.assign(attrs::CLUSTER_ID, cluster);
        ad.assign(attrs::PROC_ID, proc);
        ad.assign(attrs::AUTO_CLUSTER_ID, auto_cluster);
        ad.assign(attrs::GLOBAL_JOB_ID, format!("submit.test#{cluster}.{proc}#0"));
        ad.assign(
            attrs::AUTO_CLUSTER_ATTRS,
            "RequestCpus,RequestMemory,RequestDisk",
        );
        ad.assign(attrs::JOB_UNIVERSE, VANILLA_UNIVERSE);
        ad.assign(attrs::REQUEST_CPUS, 1);
        ad.assign(attrs::REQUEST_MEMORY, 1024);
        ad.assign(attrs::REQUEST_DISK, 100);
        ad.assign("Cmd", "/bin/sleep");
        JobAdBuilder { ad }
    }

    pub fn universe(mut self, universe: i64) -> Self {
        self.ad.assign(attrs::JOB_UNIVERSE, universe);
        self
    }

    pub fn attr<V: Into<AdValue>>(mut self, name: &str, value: V) -> Self {
        self.ad.assign(name, value);
        self
    }

    pub fn build(self) -> Ad {
        self.ad
    }
}

pub fn job_ad(cluster: i32, proc: i32, auto_cluster: i32) -> Ad {
    JobAdBuilder::new(cluster, proc, auto_cluster).build()
}

pub fn machine_ad(name: &str) -> Ad {
    let mut ad = Ad::new();
    ad.assign(attrs::NAME, name);
    ad.assign(attrs::MY_ADDRESS, "<10.0.0.1:9618>");
    ad.assign(attrs::CPUS, 8);
    ad.assign(attrs::MEMORY, 16384);
    ad.assign(attrs::DISK, 10000);
    ad
}

pub fn partitionable_machine_ad(name: &str) -> Ad {
    let mut ad = machine_ad(name);
    ad.assign(attrs::SLOT_PARTITIONABLE, true);
    ad.assign(attrs::TOTAL_DISK, 10000);
    ad
}

/// Machine delivered in resource-request-list mode, linked to the request of `job_id`.
pub fn linked_machine_ad(name: &str, job_id: JobId, auto_cluster: i32) -> Ad {
    let mut ad = machine_ad(name);
    ad.assign(attrs::RESOURCE_REQUEST_CLUSTER, job_id.cluster());
    ad.assign(attrs::RESOURCE_REQUEST_PROC, job_id.proc());
    ad.assign(attrs::RESOURCE_REQUEST_AUTO_CLUSTER, auto_cluster);
    ad
}

pub fn permission(claim: &str, machine_ad: Ad) -> FromNegotiatorMessage {
    FromNegotiatorMessage::PermissionAndAd {
        claim_id: ClaimId::new(claim),
        machine_ad,
    }
}

/// Builds a request list from `(auto_cluster, [(cluster, proc)])` pairs.
pub fn request_list(clusters: &[(i32, &[(i32, i32)])]) -> ResourceRequestList {
    clusters
        .iter()
        .map(|(auto_cluster, jobs)| {
            ResourceRequestCluster::with_jobs(
                AutoClusterId::new(*auto_cluster),
                jobs.iter().map(|&(c, p)| JobId::new(c, p)),
            )
        })
        .collect()
}
