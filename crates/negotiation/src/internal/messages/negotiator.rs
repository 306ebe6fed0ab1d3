use crate::internal::classad::Ad;
use crate::{AutoClusterId, JobId};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Opens one negotiation round on an established connection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NegotiateCommand {
    /// Identity of the submitter whose jobs are negotiated in this round.
    pub submitter: String,
    /// `None` for the local pool.
    pub remote_pool: Option<String>,
}

/// Rejection context attached to a rejection in resource-request-list mode.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectContext {
    pub auto_cluster_id: AutoClusterId,
    pub job_id: JobId,
}

/// Claim handed out by the matchmaker together with a matched machine.
///
/// The first whitespace separated token is the claim itself, any further tokens are
/// claims for additional slots of the same match.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClaimId(String);

impl ClaimId {
    pub fn new<S: Into<String>>(claim: S) -> Self {
        ClaimId(claim.into())
    }

    pub fn id(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or("")
    }

    pub fn extra_claims(&self) -> &str {
        let trimmed = self.0.trim_start();
        match trimmed.find(char::is_whitespace) {
            Some(pos) => trimmed[pos..].trim(),
            None => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id().is_empty()
    }

    /// Public part of the claim, safe to be logged.
    pub fn public_id(&self) -> &str {
        let id = self.id();
        match id.find('#') {
            Some(pos) => &id[..pos],
            None => id,
        }
    }
}

impl Debug for ClaimId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClaimId({}#...)", self.public_id())
    }
}

impl Display for ClaimId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#...", self.public_id())
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub enum FromNegotiatorMessage {
    Rejected,
    RejectedWithReason {
        reason: String,
        context: Option<RejectContext>,
    },
    SendJobInfo,
    SendResourceRequestList {
        count: u32,
    },
    PermissionAndAd {
        claim_id: ClaimId,
        machine_ad: Ad,
    },
    EndNegotiate,
}

impl FromNegotiatorMessage {
    pub fn operation(&self) -> Operation {
        match self {
            FromNegotiatorMessage::Rejected => Operation::Rejected,
            FromNegotiatorMessage::RejectedWithReason { .. } => Operation::RejectedWithReason,
            FromNegotiatorMessage::SendJobInfo => Operation::SendJobInfo,
            FromNegotiatorMessage::SendResourceRequestList { .. } => {
                Operation::SendResourceRequestList
            }
            FromNegotiatorMessage::PermissionAndAd { .. } => Operation::PermissionAndAd,
            FromNegotiatorMessage::EndNegotiate => Operation::EndNegotiate,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ToNegotiatorMessage {
    NoMoreJobs,
    JobInfo(Ad),
}

/// Kind of the message most recently read from the negotiator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Rejected,
    RejectedWithReason,
    SendJobInfo,
    SendResourceRequestList,
    PermissionAndAd,
    EndNegotiate,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Rejected => "REJECTED",
            Operation::RejectedWithReason => "REJECTED_WITH_REASON",
            Operation::SendJobInfo => "SEND_JOB_INFO",
            Operation::SendResourceRequestList => "SEND_RESOURCE_REQUEST_LIST",
            Operation::PermissionAndAd => "PERMISSION_AND_AD",
            Operation::EndNegotiate => "END_NEGOTIATE",
        };
        f.write_str(name)
    }
}
