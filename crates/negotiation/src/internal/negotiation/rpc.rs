use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;

use crate::internal::common::error::NegotiationError;
use crate::internal::messages::negotiator::{FromNegotiatorMessage, NegotiateCommand};
use crate::internal::negotiation::comm::QueueComm;
use crate::internal::negotiation::session::{NegotiationSession, NegotiationSummary};
use crate::internal::negotiation::source::JobSource;
use crate::internal::transfer::codec::{deserialize, serialize};

/// Reads one frame and decodes it as `T`.
pub async fn receive_message<S, T>(stream: &mut S, read_timeout: Duration) -> crate::Result<T>
where
    S: Stream<Item = Result<BytesMut, std::io::Error>> + Unpin,
    T: DeserializeOwned,
{
    match timeout(read_timeout, stream.next()).await {
        Ok(Some(data)) => deserialize(&data?),
        Ok(None) => Err(NegotiationError::ConnectionClosed),
        Err(_) => Err(NegotiationError::Timeout(format!(
            "No message received within {read_timeout:?}"
        ))),
    }
}

/// Writes all messages and flushes the connection.
pub async fn send_messages<S, T>(
    sink: &mut S,
    messages: &[T],
    write_timeout: Duration,
) -> crate::Result<()>
where
    S: Sink<Bytes, Error = std::io::Error> + Unpin,
    T: Serialize,
{
    if messages.is_empty() {
        return Ok(());
    }
    let mut frames = Vec::with_capacity(messages.len());
    for message in messages {
        frames.push(Bytes::from(serialize(message)?));
    }
    let write = async {
        for frame in frames {
            sink.feed(frame).await?;
        }
        sink.flush().await
    };
    match timeout(write_timeout, write).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(NegotiationError::Timeout(format!(
            "Messages were not written within {write_timeout:?}"
        ))),
    }
}

/// Waits for the command that opens the next round.
///
/// Returns `None` when the negotiator closed the connection between rounds.
pub async fn read_negotiate_command<S>(
    stream: &mut S,
    read_timeout: Duration,
) -> crate::Result<Option<NegotiateCommand>>
where
    S: Stream<Item = Result<BytesMut, std::io::Error>> + Unpin,
{
    match receive_message(stream, read_timeout).await {
        Ok(command) => Ok(Some(command)),
        Err(NegotiationError::ConnectionClosed) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Runs one round over an established connection.
///
/// The round ends when the negotiator sends END_NEGOTIATE, when there is nothing more to
/// offer or when reading/writing fails. In every case the job source is notified exactly
/// once. The connection stays usable for another round only if the returned summary
/// carries no failure.
pub async fn run_negotiation<S, J>(
    stream: &mut S,
    session: &mut NegotiationSession,
    source: &mut J,
) -> NegotiationSummary
where
    S: Stream<Item = Result<BytesMut, std::io::Error>> + Sink<Bytes, Error = std::io::Error> + Unpin,
    J: JobSource,
{
    let submitter = session.submitter().to_string();
    let pool = session.remote_pool().unwrap_or("local").to_string();
    trace_time!(&submitter, &pool, "negotiate", {
        session.negotiate(source);
        if let Err(e) = negotiation_loop(stream, session, source).await {
            session.abort(e.to_string());
        }
        session.finish(source);
    });
    session.summary(source)
}

async fn negotiation_loop<S, J>(
    stream: &mut S,
    session: &mut NegotiationSession,
    source: &mut J,
) -> crate::Result<()>
where
    S: Stream<Item = Result<BytesMut, std::io::Error>> + Sink<Bytes, Error = std::io::Error> + Unpin,
    J: JobSource,
{
    let read_timeout = session.configuration().read_timeout;
    let write_timeout = session.configuration().write_timeout;
    let mut comm = QueueComm::default();

    while !session.is_finished() {
        let message: FromNegotiatorMessage = receive_message(stream, read_timeout).await?;
        let result = session.on_message(&mut comm, source, message);
        // Replies queued before a failure are still delivered
        send_messages(stream, &comm.take_messages(), write_timeout).await?;
        result?;
    }
    Ok(())
}
