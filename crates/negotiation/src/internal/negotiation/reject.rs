use crate::internal::common::error::NegotiationError;
use crate::internal::messages::negotiator::RejectContext;
use crate::{AutoClusterId, JobId};

pub const UNKNOWN_REJECT_REASON: &str = "Unknown reason";

const CONTEXT_DELIMITER: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: String,
    pub context: Option<RejectContext>,
}

/// Splits a rejection reason of the form `reason|<autocluster>|<cluster>.<proc>|`.
///
/// A reason without the delimiter is returned verbatim with no context. A reason that
/// contains the delimiter but does not have exactly three parts is a protocol error.
pub fn decode_reject_reason(reason: &str) -> crate::Result<Rejection> {
    if !reason.contains(CONTEXT_DELIMITER) {
        return Ok(Rejection {
            reason: reason.to_string(),
            context: None,
        });
    }

    let mut tokens: Vec<&str> = reason.split(CONTEXT_DELIMITER).collect();
    if tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    let malformed = || {
        NegotiationError::ProtocolError(format!("Malformed rejection reason: {reason:?}"))
    };
    let [text, auto_cluster_id, job_id] = tokens.as_slice() else {
        return Err(malformed());
    };
    let auto_cluster_id: AutoClusterId = auto_cluster_id.parse().map_err(|_| malformed())?;
    let job_id: JobId = job_id.parse().map_err(|_| malformed())?;
    Ok(Rejection {
        reason: text.trim().to_string(),
        context: Some(RejectContext {
            auto_cluster_id,
            job_id,
        }),
    })
}

/// Inverse of [`decode_reject_reason`], used by negotiators that do not send the
/// structured context.
pub fn encode_reject_reason(reason: &str, context: &RejectContext) -> String {
    format!(
        "{reason}{CONTEXT_DELIMITER}{}{CONTEXT_DELIMITER}{}{CONTEXT_DELIMITER}",
        context.auto_cluster_id, context.job_id
    )
}

#[cfg(test)]
mod tests {
    use super::{decode_reject_reason, encode_reject_reason};
    use crate::internal::messages::negotiator::RejectContext;
    use crate::{AutoClusterId, JobId};

    #[test]
    fn test_decode_with_context() {
        let rejection = decode_reject_reason("bad fit|42|100.3|").unwrap();
        assert_eq!(rejection.reason, "bad fit");
        let context = rejection.context.unwrap();
        assert_eq!(context.auto_cluster_id, AutoClusterId::new(42));
        assert_eq!(context.job_id, JobId::new(100, 3));
    }

    #[test]
    fn test_decode_trims_reason() {
        let rejection = decode_reject_reason("  no match found |1|2.0|").unwrap();
        assert_eq!(rejection.reason, "no match found");
    }

    #[test]
    fn test_decode_without_delimiter() {
        let rejection = decode_reject_reason("  insufficient priority ").unwrap();
        assert_eq!(rejection.reason, "  insufficient priority ");
        assert!(rejection.context.is_none());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode_reject_reason("bad fit|42|").is_err());
        assert!(decode_reject_reason("bad fit|x|1.0|").is_err());
        assert!(decode_reject_reason("bad fit|1|1|").is_err());
        assert!(decode_reject_reason("a|b|1|2.0|").is_err());
    }

    #[test]
    fn test_encode_decode() {
        let context = RejectContext {
            auto_cluster_id: AutoClusterId::new(3),
            job_id: JobId::new(10, 2),
        };
        let encoded = encode_reject_reason("no resources", &context);
        assert_eq!(encoded, "no resources|3|10.2|");
        let rejection = decode_reject_reason(&encoded).unwrap();
        assert_eq!(rejection.context, Some(context));
    }
}
