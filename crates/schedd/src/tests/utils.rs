use std::time::Duration;

use negotiation::classad::{Ad, attrs};
use negotiation::messages::{ClaimId, FromNegotiatorMessage};
use negotiation::negotiation::NegotiationConfigurationBuilder;

use crate::queue::file::QueueDef;
use crate::queue::{JobQueue, JobQueueRef};
use crate::server::ServerConfig;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub const TEST_QUEUE: &str = r#"
significant_attributes = ["RequestCpus", "RequestMemory"]

[[job]]
cluster = 1
proc = 0
owner = "alice"
attributes = { RequestCpus = 1, RequestMemory = 1024 }

[[job]]
cluster = 1
proc = 1
owner = "alice"
attributes = { RequestCpus = 1, RequestMemory = 1024 }

[[job]]
cluster = 2
proc = 0
owner = "bob"
attributes = { RequestCpus = 4, RequestMemory = 8192 }
"#;

pub fn create_test_queue() -> JobQueueRef {
    let qdef = QueueDef::parse(TEST_QUEUE).unwrap();
    JobQueueRef::new(JobQueue::from_def("schedd@test".to_string(), qdef).unwrap())
}

pub fn create_test_config(idle_timeout: Duration) -> ServerConfig {
    ServerConfig {
        idle_timeout,
        negotiation: NegotiationConfigurationBuilder::default()
            .read_timeout(TEST_TIMEOUT)
            .write_timeout(TEST_TIMEOUT)
            .build()
            .unwrap(),
        ..Default::default()
    }
}

pub fn slot_ad(name: &str) -> Ad {
    let mut ad = Ad::new();
    ad.assign(attrs::NAME, name);
    ad.assign(attrs::MY_ADDRESS, "<10.0.0.2:9618>");
    ad
}

pub fn permission(claim: &str, machine_ad: Ad) -> FromNegotiatorMessage {
    FromNegotiatorMessage::PermissionAndAd {
        claim_id: ClaimId::new(claim),
        machine_ad,
    }
}
