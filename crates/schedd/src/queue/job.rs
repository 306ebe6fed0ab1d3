use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use negotiation::classad::{Ad, attrs};
use negotiation::messages::ClaimId;
use negotiation::{AutoClusterId, JobId};

pub const VANILLA_UNIVERSE: i64 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Removed,
    Completed,
    Held,
    /// Got a match in a negotiation round and waits to be claimed.
    Matched,
}

impl JobStatus {
    /// Value of the `JobStatus` attribute.
    pub fn code(&self) -> i64 {
        match self {
            JobStatus::Idle | JobStatus::Matched => 1,
            JobStatus::Running => 2,
            JobStatus::Removed => 3,
            JobStatus::Completed => 4,
            JobStatus::Held => 5,
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Idle => "idle",
            JobStatus::Running => "running",
            JobStatus::Removed => "removed",
            JobStatus::Completed => "completed",
            JobStatus::Held => "held",
            JobStatus::Matched => "matched",
        };
        f.write_str(name)
    }
}

/// Claim obtained for a job in a negotiation round.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub claim_id: ClaimId,
    pub slot_name: String,
    pub remote_pool: Option<String>,
    pub matched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Job {
    id: JobId,
    owner: String,
    pub status: JobStatus,
    pub priority: i64,
    pub auto_cluster_id: AutoClusterId,
    /// Attributes of the job without the ones derived from the fields above.
    pub attributes: Ad,
    pub match_record: Option<MatchRecord>,
}

impl Job {
    pub fn new(id: JobId, owner: String, attributes: Ad) -> Self {
        Job {
            id,
            owner,
            status: JobStatus::Idle,
            priority: 0,
            auto_cluster_id: AutoClusterId::NONE,
            attributes,
            match_record: None,
        }
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn universe(&self) -> i64 {
        self.attributes
            .lookup_int(attrs::JOB_UNIVERSE)
            .unwrap_or(VANILLA_UNIVERSE)
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.status == JobStatus::Idle
    }

    /// Full job ad as offered to the matchmaker.
    pub fn make_ad(&self, schedd_name: &str, significant_attributes: &str) -> Ad {
        let mut ad = self.attributes.clone();
        ad.assign(attrs::OWNER, self.owner.as_str());
        ad.assign(attrs::CLUSTER_ID, self.id.cluster());
        ad.assign(attrs::PROC_ID, self.id.proc());
        ad.assign(
            attrs::GLOBAL_JOB_ID,
            format!("{schedd_name}#{}#0", self.id),
        );
        ad.assign(attrs::JOB_UNIVERSE, self.universe());
        ad.assign(attrs::JOB_PRIO, self.priority);
        ad.assign(attrs::JOB_STATUS, self.status.code());
        ad.assign(attrs::AUTO_CLUSTER_ID, self.auto_cluster_id.as_num());
        ad.assign(attrs::AUTO_CLUSTER_ATTRS, significant_attributes);
        ad
    }
}
