use tokio::io::{AsyncRead, AsyncWrite};

use negotiation::Error as NegotiationError;
use negotiation::negotiation::{NegotiationSession, read_negotiate_command, run_negotiation};
use negotiation::transport::make_framed;

use crate::common::error::ScheddError;
use crate::queue::JobQueueRef;
use crate::queue::source::QueueJobSource;
use crate::server::ServerConfig;

/// Serves negotiation rounds on one connection until the negotiator disconnects.
///
/// Each round starts with a negotiate command; a finished round leaves the connection
/// open for the next one. A failed round closes the connection.
pub async fn handle_connection<T>(
    stream: T,
    queue: JobQueueRef,
    config: &ServerConfig,
) -> crate::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = make_framed(stream);
    loop {
        let command = match read_negotiate_command(&mut framed, config.idle_timeout).await {
            Ok(Some(command)) => command,
            Ok(None) => {
                log::debug!("Negotiator closed the connection");
                return Ok(());
            }
            Err(NegotiationError::Timeout(_)) => {
                log::debug!("No negotiation request within the idle timeout, closing connection");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let requests = queue.get().build_request_list(&command.submitter);
        log::debug!(
            "Negotiation request for {}: {} job(s) in {} auto cluster(s)",
            command.submitter,
            requests.total_jobs(),
            requests.len()
        );
        let mut source = QueueJobSource::new(queue.clone(), command.remote_pool.clone());
        let mut session = NegotiationSession::new(
            command.submitter,
            command.remote_pool,
            requests,
            config.negotiation.clone(),
        );
        let summary = run_negotiation(&mut framed, &mut session, &mut source).await;
        if let Some(failure) = summary.failure {
            return Err(ScheddError::GenericError(format!(
                "Negotiation for {} failed: {failure}",
                summary.submitter
            )));
        }
    }
}
