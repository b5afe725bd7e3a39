mod testsupport;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use bytes::Bytes;
use samsa_mock::prelude::{
    protocol::{self, HeaderRequest},
    ApiKey, BrokerConnection, Control, Error, Request, Response,
};

fn synthetic_metadata() -> Response {
    Response::Metadata(protocol::MetadataResponse {
        brokers: vec![],
        cluster_id: Some("synthetic".to_owned()),
        controller_id: 42,
        topics: vec![],
    })
}

#[tokio::test]
async fn it_answers_once_with_a_control_response() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    cluster.control_key(ApiKey::Metadata, |_| Control::Respond(synthetic_metadata()));

    let first = testsupport::metadata(&mut conn, &[&topic]).await?;
    assert_eq!(first.controller_id, 42);
    assert_eq!(first.cluster_id.as_deref(), Some("synthetic"));

    let second = testsupport::metadata(&mut conn, &[&topic]).await?;
    assert_eq!(second.controller_id, 0);
    assert_eq!(second.topics.len(), 1);

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_keeps_a_control_function_that_asks() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let handle = cluster.clone();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    cluster.control_key(ApiKey::Metadata, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        handle.keep_control();
        Control::Respond(synthetic_metadata())
    });

    for _ in 0..3 {
        let response = testsupport::metadata(&mut conn, &[&topic]).await?;
        assert_eq!(response.controller_id, 42);
    }
    assert_eq!(seen.load(Ordering::SeqCst), 3);

    // closing drops the kept function and the cluster handle inside it
    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_shuts_down_when_only_weak_handles_remain() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let addr = testsupport::addr_of(&cluster, 0).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let weak = cluster.downgrade();
    let kept = weak.clone();
    cluster.control_key(ApiKey::Metadata, move |_| {
        kept.keep_control();
        Control::Respond(synthetic_metadata())
    });
    for _ in 0..2 {
        let response = testsupport::metadata(&mut conn, &[&topic]).await?;
        assert_eq!(response.controller_id, 42);
    }

    drop(cluster);
    assert!(weak.upgrade().is_none());

    // the listener goes away with the cluster
    let mut refused = false;
    for _ in 0..50 {
        if BrokerConnection::connect(addr).await.is_err() {
            refused = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(refused);
    Ok(())
}

#[tokio::test]
async fn it_passes_through_until_handled() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    cluster.control(move |req| {
        counter.fetch_add(1, Ordering::SeqCst);
        match req {
            Request::Fetch(_) => Control::Respond(Response::Fetch(protocol::FetchResponse {
                throttle_time_ms: 7,
                topics: vec![],
            })),
            _ => Control::Pass,
        }
    });

    // passed along to the cluster
    testsupport::metadata(&mut conn, &[&topic]).await?;
    testsupport::metadata(&mut conn, &[&topic]).await?;
    let fetch = testsupport::fetch(&mut conn, &topic, 0, 0).await?;
    assert_eq!(fetch.throttle_time_ms, 7);
    // gone once it handled something
    let fetch = testsupport::fetch(&mut conn, &topic, 0, 0).await?;
    assert_eq!(fetch.throttle_time_ms, 0);

    assert_eq!(seen.load(Ordering::SeqCst), 3);
    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_tries_keyed_functions_first() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    cluster.control(|_| Control::Fail(Error::Control("wildcard".to_owned())));
    cluster.control_key(ApiKey::Metadata, |_| Control::Respond(synthetic_metadata()));

    let response = testsupport::metadata(&mut conn, &[&topic]).await?;
    assert_eq!(response.controller_id, 42);

    // the wildcard is still armed and now closes the connection
    assert!(testsupport::metadata(&mut conn, &[&topic]).await.is_err());

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_closes_the_connection_on_fail() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    cluster.control_key(ApiKey::Metadata, |_| {
        Control::Fail(Error::Control("broker on fire".to_owned()))
    });
    let result = testsupport::metadata(&mut conn, &[&topic]).await;
    assert!(matches!(result, Err(Error::IoError(_))));

    // other connections are unaffected
    let mut conn = testsupport::connect(&cluster, 0).await?;
    testsupport::metadata(&mut conn, &[&topic]).await?;

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_swallows_ignored_requests() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    cluster.control_key(ApiKey::Metadata, |_| Control::Ignore);

    let request = Request::Metadata(protocol::MetadataRequest::new(&[&topic]));
    conn.send_request(&request).await?;
    let waited = tokio::time::timeout(Duration::from_millis(200), conn.receive_response()).await;
    assert!(waited.is_err());

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_closes_the_connection_on_unknown_api_keys() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let header = HeaderRequest::new(99, 0, 1, "rust");
    conn.send_raw(&header, &protocol::ApiVersionsRequest::new(0))
        .await?;
    assert!(matches!(
        conn.receive_response().await,
        Err(Error::IoError(_))
    ));

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_closes_the_connection_on_unsupported_versions() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let header = HeaderRequest::new(i16::from(ApiKey::Produce), 7, 1, "rust");
    conn.send_raw(&header, &protocol::ApiVersionsRequest::new(0))
        .await?;
    assert!(conn.receive_response().await.is_err());

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_lets_control_functions_answer_unknown_keys() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    cluster.control_key(99_i16, |req| match req {
        Request::Unsupported(unsupported) => {
            assert_eq!(unsupported.api_version, 4);
            Control::Respond(Response::Raw(Bytes::from_static(b"\x00\x01")))
        }
        _ => Control::Pass,
    });

    let header = HeaderRequest::new(99, 4, 5, "rust");
    conn.send_raw(&header, &protocol::ApiVersionsRequest::new(0))
        .await?;
    let frame = conn.receive_response().await?;
    assert_eq!(&frame[..], [0, 0, 0, 5, 0, 1]);

    cluster.close();
    Ok(())
}
