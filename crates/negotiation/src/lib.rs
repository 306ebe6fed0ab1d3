#[macro_use]
pub mod internal;

pub use crate::internal::common::ids::{AutoClusterId, JobId};
pub use crate::internal::common::{Map, Set};

pub type Error = internal::common::error::NegotiationError;
pub type Result<T> = std::result::Result<T, Error>;

pub const MAX_FRAME_SIZE: usize = 128 * 1024 * 1024;

pub mod classad {
    pub use crate::internal::classad::expr::{BinaryOp, Function, Scope};
    pub use crate::internal::classad::{Ad, AdExpr, AdValue, attrs};
}

pub mod messages {
    pub use crate::internal::messages::negotiator::{
        ClaimId, FromNegotiatorMessage, NegotiateCommand, Operation, RejectContext,
        ToNegotiatorMessage,
    };
}

pub mod negotiation {
    pub use crate::internal::negotiation::comm::{NegotiatorComm, QueueComm};
    pub use crate::internal::negotiation::configuration::{
        DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT, NegotiationConfiguration,
        NegotiationConfigurationBuilder, PARALLEL_UNIVERSE,
    };
    pub use crate::internal::negotiation::fixup::fixup_partitionable_slot;
    pub use crate::internal::negotiation::reject::{
        Rejection, UNKNOWN_REJECT_REASON, decode_reject_reason, encode_reject_reason,
    };
    pub use crate::internal::negotiation::request::{
        ResourceRequest, ResourceRequestCluster, ResourceRequestList,
    };
    pub use crate::internal::negotiation::rpc::{
        read_negotiate_command, receive_message, run_negotiation, send_messages,
    };
    pub use crate::internal::negotiation::session::{
        NegotiationSession, NegotiationSummary, SessionState,
    };
    pub use crate::internal::negotiation::source::{JobSource, SkipDecision};
}

pub mod transport {
    pub use crate::internal::transfer::codec::{deserialize, serialize};
    pub use crate::internal::transfer::transport::make_framed;
}
