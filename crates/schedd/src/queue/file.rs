use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use negotiation::JobId;
use negotiation::classad::{Ad, AdValue};

use crate::common::error::ScheddError;
use crate::queue::job::{JobStatus, VANILLA_UNIVERSE};

fn default_universe() -> i64 {
    VANILLA_UNIVERSE
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct JobDef {
    pub cluster: i32,
    #[serde(default)]
    pub proc: i32,
    pub owner: String,
    #[serde(default = "default_universe")]
    pub universe: i64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub attributes: BTreeMap<String, toml::Value>,
}

impl JobDef {
    pub fn job_id(&self) -> JobId {
        JobId::new(self.cluster, self.proc)
    }

    pub fn make_attributes(&self) -> crate::Result<Ad> {
        let mut ad = Ad::new();
        for (name, value) in &self.attributes {
            let value = match value {
                toml::Value::String(s) => AdValue::Str(s.clone()),
                toml::Value::Integer(v) => AdValue::Int(*v),
                toml::Value::Float(v) => AdValue::Real(*v),
                toml::Value::Boolean(v) => AdValue::Bool(*v),
                _ => {
                    return Err(ScheddError::DeserializationError(format!(
                        "Job {}: attribute '{name}' has an unsupported type",
                        self.job_id()
                    )));
                }
            };
            ad.assign(name, value);
        }
        ad.assign(negotiation::classad::attrs::JOB_UNIVERSE, self.universe);
        Ok(ad)
    }
}

/// Contents of a job queue file.
///
/// ```toml
/// significant_attributes = ["RequestCpus", "RequestMemory"]
///
/// [[job]]
/// cluster = 1
/// proc = 0
/// owner = "alice"
/// attributes = { RequestCpus = 1, RequestMemory = 1024 }
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct QueueDef {
    #[serde(default)]
    pub significant_attributes: Vec<String>,
    #[serde(default, rename = "job")]
    pub jobs: Vec<JobDef>,
}

impl QueueDef {
    fn validate(&self) -> crate::Result<()> {
        for job in &self.jobs {
            if job.job_id().is_none() {
                return Err(ScheddError::DeserializationError(format!(
                    "Invalid job id {}",
                    job.job_id()
                )));
            }
            if job.owner.is_empty() {
                return Err(ScheddError::DeserializationError(format!(
                    "Job {} has no owner",
                    job.job_id()
                )));
            }
        }
        Ok(())
    }

    pub fn parse(str: &str) -> crate::Result<QueueDef> {
        let qdef: QueueDef = toml::from_str(str)?;
        qdef.validate()?;
        Ok(qdef)
    }

    pub fn load(path: &Path) -> crate::Result<QueueDef> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
