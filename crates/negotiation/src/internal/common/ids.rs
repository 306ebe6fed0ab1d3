use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Identifies one job in the queue as a `cluster.proc` pair.
///
/// `(-1, -1)` is the sentinel used while no job is selected.
#[derive(Copy, Clone, Hash, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobId {
    cluster: i32,
    proc: i32,
}

impl JobId {
    pub const NONE: JobId = JobId {
        cluster: -1,
        proc: -1,
    };

    #[inline]
    pub fn new(cluster: i32, proc: i32) -> Self {
        Self { cluster, proc }
    }

    #[inline]
    pub fn cluster(&self) -> i32 {
        self.cluster
    }

    #[inline]
    pub fn proc(&self) -> i32 {
        self.proc
    }

    /// Jobs with a negative cluster or proc never exist in the queue.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.cluster < 0 || self.proc < 0
    }
}

impl Default for JobId {
    fn default() -> Self {
        JobId::NONE
    }
}

impl From<(i32, i32)> for JobId {
    #[inline]
    fn from((cluster, proc): (i32, i32)) -> Self {
        JobId::new(cluster, proc)
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.cluster, self.proc)
    }
}

impl Debug for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cluster, proc) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("Invalid job id '{s}', expected <cluster>.<proc>"))?;
        let cluster = cluster
            .parse::<i32>()
            .map_err(|e| format!("Invalid cluster in job id '{s}': {e}"))?;
        let proc = proc
            .parse::<i32>()
            .map_err(|e| format!("Invalid proc in job id '{s}': {e}"))?;
        Ok(JobId::new(cluster, proc))
    }
}

/// Equivalence class of jobs that the matchmaker treats as fungible within a round.
#[derive(
    Copy, Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct AutoClusterId(i32);

impl AutoClusterId {
    pub const NONE: AutoClusterId = AutoClusterId(-1);

    #[inline]
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    #[inline]
    pub fn as_num(&self) -> i32 {
        self.0
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 < 0
    }
}

impl Default for AutoClusterId {
    fn default() -> Self {
        AutoClusterId::NONE
    }
}

impl From<i32> for AutoClusterId {
    #[inline]
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<AutoClusterId> for i32 {
    #[inline]
    fn from(id: AutoClusterId) -> Self {
        id.0
    }
}

impl Display for AutoClusterId {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for AutoClusterId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AutoClusterId(s.trim().parse::<i32>()?))
    }
}
