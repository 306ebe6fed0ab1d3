use std::time::Duration;

use bytes::Bytes;
use futures::SinkExt;
use tokio::io::DuplexStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::internal::classad::attrs;
use crate::internal::messages::negotiator::{
    FromNegotiatorMessage, NegotiateCommand, ToNegotiatorMessage,
};
use crate::internal::negotiation::configuration::NegotiationConfigurationBuilder;
use crate::internal::negotiation::rpc::{
    read_negotiate_command, receive_message, run_negotiation, send_messages,
};
use crate::internal::tests::utils::env::{
    TestJobSource, create_test_session, create_test_session_with_config,
};
use crate::internal::tests::utils::job::{job_ad, machine_ad, permission, request_list};
use crate::internal::transfer::transport::make_framed;
use crate::JobId;

const TIMEOUT: Duration = Duration::from_secs(5);

type TestStream = Framed<DuplexStream, LengthDelimitedCodec>;

fn connection() -> (TestStream, TestStream) {
    let (schedd, negotiator) = tokio::io::duplex(64 * 1024);
    (make_framed(schedd), make_framed(negotiator))
}

async fn send(stream: &mut TestStream, message: FromNegotiatorMessage) {
    send_messages(stream, &[message], TIMEOUT).await.unwrap();
}

async fn receive(stream: &mut TestStream) -> ToNegotiatorMessage {
    receive_message(stream, TIMEOUT).await.unwrap()
}

#[tokio::test]
async fn test_round_over_connection() {
    let (mut schedd, mut negotiator) = connection();
    let mut source = TestJobSource::new([job_ad(5, 0, 1)]);
    let mut session = create_test_session(request_list(&[(1, &[(5, 0)])]));

    let negotiator_side = async {
        send(&mut negotiator, FromNegotiatorMessage::SendJobInfo).await;
        match receive(&mut negotiator).await {
            ToNegotiatorMessage::JobInfo(ad) => {
                assert_eq!(ad.lookup_int(attrs::CLUSTER_ID), Some(5));
                assert_eq!(ad.lookup_int(attrs::RESOURCE_REQUEST_COUNT), Some(1));
            }
            msg => panic!("Unexpected message {msg:?}"),
        }
        send(&mut negotiator, permission("C1", machine_ad("slot1@m1"))).await;
        send(&mut negotiator, FromNegotiatorMessage::SendJobInfo).await;
        assert_eq!(
            receive(&mut negotiator).await,
            ToNegotiatorMessage::NoMoreJobs
        );
    };
    let (summary, ()) = tokio::join!(
        run_negotiation(&mut schedd, &mut session, &mut source),
        negotiator_side
    );

    assert!(summary.failure.is_none());
    assert!(summary.satisfied);
    assert_eq!(summary.jobs_matched, 1);
    assert_eq!(source.matched_jobs(), vec![JobId::new(5, 0)]);
    assert_eq!(source.finished, vec![summary]);
}

#[tokio::test]
async fn test_connection_is_reused_for_next_round() {
    let (mut schedd, mut negotiator) = connection();

    send_messages(
        &mut negotiator,
        &[NegotiateCommand {
            submitter: "alice@test.pool".to_string(),
            remote_pool: None,
        }],
        TIMEOUT,
    )
    .await
    .unwrap();
    let command = read_negotiate_command(&mut schedd, TIMEOUT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(command.submitter, "alice@test.pool");

    let mut source = TestJobSource::new([job_ad(1, 0, 1)]);
    let mut session = create_test_session(request_list(&[(1, &[(1, 0)])]));
    send(&mut negotiator, FromNegotiatorMessage::EndNegotiate).await;
    let summary = run_negotiation(&mut schedd, &mut session, &mut source).await;
    assert!(summary.failure.is_none());
    assert!(!summary.satisfied);

    drop(negotiator);
    assert!(
        read_negotiate_command(&mut schedd, TIMEOUT)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_connection_closed_during_round() {
    let (mut schedd, mut negotiator) = connection();
    let mut source = TestJobSource::new([job_ad(1, 0, 1)]);
    let mut session = create_test_session(request_list(&[(1, &[(1, 0)])]));

    let negotiator_side = async move {
        send(&mut negotiator, FromNegotiatorMessage::SendJobInfo).await;
        receive(&mut negotiator).await;
    };
    let (summary, ()) = tokio::join!(
        run_negotiation(&mut schedd, &mut session, &mut source),
        negotiator_side
    );

    assert_eq!(
        summary.failure.as_deref(),
        Some("Connection closed by the remote side")
    );
    assert!(!summary.satisfied);
    assert!(source.matches.is_empty());
    assert_eq!(source.finished.len(), 1);
}

#[tokio::test]
async fn test_read_timeout() {
    let (mut schedd, _negotiator) = connection();
    let config = NegotiationConfigurationBuilder::default()
        .read_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let mut source = TestJobSource::new([job_ad(1, 0, 1)]);
    let mut session = create_test_session_with_config(request_list(&[(1, &[(1, 0)])]), config);

    let summary = run_negotiation(&mut schedd, &mut session, &mut source).await;
    assert!(summary.failure.unwrap().starts_with("Timeout"));
    assert_eq!(source.finished.len(), 1);
}

#[tokio::test]
async fn test_protocol_error_ends_round() {
    let (mut schedd, mut negotiator) = connection();
    let mut source = TestJobSource::new([job_ad(1, 0, 1)]);
    let mut session = create_test_session(request_list(&[(1, &[(1, 0)])]));

    send(
        &mut negotiator,
        FromNegotiatorMessage::RejectedWithReason {
            reason: "bad|reason".to_string(),
            context: None,
        },
    )
    .await;
    let summary = run_negotiation(&mut schedd, &mut session, &mut source).await;
    assert!(summary.failure.unwrap().starts_with("Protocol error"));
    assert!(source.rejected.is_empty());
}

#[tokio::test]
async fn test_garbage_frame() {
    let (mut schedd, mut negotiator) = connection();
    let mut source = TestJobSource::default();
    let mut session = create_test_session(request_list(&[]));

    negotiator
        .send(Bytes::from_static(&[255, 255, 255, 255, 1]))
        .await
        .unwrap();
    let summary = run_negotiation(&mut schedd, &mut session, &mut source).await;
    assert!(summary.failure.unwrap().starts_with("Serialization error"));
}
