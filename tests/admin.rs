mod testsupport;

use samsa_mock::prelude::{
    protocol::{self, create_partitions, create_topics, HeaderRequest},
    ApiKey, ClusterBuilder, Error, KafkaCode, Request, Response,
};

async fn create(
    conn: &mut samsa_mock::prelude::BrokerConnection,
    request: protocol::CreateTopicsRequest,
) -> Result<protocol::CreateTopicsResponse, Error> {
    match conn.request(&Request::CreateTopics(request)).await? {
        Response::CreateTopics(response) => Ok(response),
        other => panic!("unexpected response {:?}", other),
    }
}

fn code_of(response: &protocol::CreateTopicsResponse, name: &str) -> KafkaCode {
    response
        .topics
        .iter()
        .find(|t| t.name == name)
        .map(|t| t.error_code)
        .unwrap_or(KafkaCode::Unknown)
}

#[tokio::test]
async fn it_creates_topics_on_the_controller() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(3, &topic, 1).await?;
    let mut conn = testsupport::controller_conn(&cluster).await?;

    let name = testsupport::topic_name();
    let mut request = protocol::CreateTopicsRequest::new(1000, false);
    request.add(&name, 4, -1);
    let response = create(&mut conn, request).await?;
    response.is_error()?;

    let metadata = testsupport::metadata(&mut conn, &[&name]).await?;
    let created = metadata.topic(&name).unwrap();
    assert_eq!(created.error_code, KafkaCode::None);
    assert_eq!(created.partitions.len(), 4);
    for partition in &created.partitions {
        assert_eq!(partition.replica_nodes, vec![partition.leader_id]);
        assert_eq!(partition.isr_nodes, vec![partition.leader_id]);
    }
    assert!(cluster.topic_id(&name).await?.is_some());

    // again is an error
    let mut request = protocol::CreateTopicsRequest::new(1000, false);
    request.add(&name, 4, 1);
    let response = create(&mut conn, request).await?;
    assert_eq!(code_of(&response, &name), KafkaCode::TopicAlreadyExists);

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_uses_defaults_for_unset_partitions() -> Result<(), Error> {
    testsupport::init_tracing();
    let cluster = ClusterBuilder::new()
        .num_brokers(1)
        .default_num_partitions(6)
        .build()
        .await?;
    let mut conn = testsupport::controller_conn(&cluster).await?;

    let name = testsupport::topic_name();
    let mut request = protocol::CreateTopicsRequest::new(1000, false);
    request.add(&name, -1, -1);
    create(&mut conn, request).await?.is_error()?;

    let metadata = testsupport::metadata(&mut conn, &[&name]).await?;
    assert_eq!(metadata.topic(&name).unwrap().partitions.len(), 6);

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_validates_created_topics() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(2, &topic, 1).await?;
    let mut conn = testsupport::controller_conn(&cluster).await?;

    let mut request = protocol::CreateTopicsRequest::new(1000, false);
    request.add("", 1, 1);
    request.add("no-partitions", 0, 1);
    request.add("negative-partitions", -3, 1);
    request.add("no-replicas", 1, 0);
    request.add("too-many-replicas", 1, 3);
    request.topics.push(create_topics::request::Topic {
        name: "assigned".to_owned(),
        num_partitions: -1,
        replication_factor: -1,
        assignments: vec![create_topics::request::Assignment {
            partition_index: 0,
            broker_ids: vec![0],
        }],
        configs: vec![],
    });
    request.add("twice", 1, 1);
    let twice = request.topics.last().cloned().unwrap();
    request.topics.push(twice);

    let response = create(&mut conn, request).await?;
    assert_eq!(code_of(&response, ""), KafkaCode::InvalidTopicException);
    assert_eq!(
        code_of(&response, "no-partitions"),
        KafkaCode::InvalidPartitions
    );
    assert_eq!(
        code_of(&response, "negative-partitions"),
        KafkaCode::InvalidPartitions
    );
    assert_eq!(
        code_of(&response, "no-replicas"),
        KafkaCode::InvalidReplicationFactor
    );
    assert_eq!(
        code_of(&response, "too-many-replicas"),
        KafkaCode::InvalidReplicationFactor
    );
    assert_eq!(code_of(&response, "assigned"), KafkaCode::InvalidRequest);
    assert_eq!(code_of(&response, "twice"), KafkaCode::InvalidRequest);
    assert!(response
        .topics
        .iter()
        .filter(|t| t.name == "twice")
        .all(|t| t.error_code == KafkaCode::InvalidRequest));

    // nothing was created
    let metadata = testsupport::metadata(&mut conn, &["twice", "assigned"]).await?;
    assert!(metadata
        .topics
        .iter()
        .all(|t| t.error_code == KafkaCode::UnknownTopicOrPartition));

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_only_validates_when_asked() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::controller_conn(&cluster).await?;

    let name = testsupport::topic_name();
    let mut request = protocol::CreateTopicsRequest::new(1000, true);
    request.add(&name, 2, 1);
    create(&mut conn, request).await?.is_error()?;
    assert_eq!(cluster.topic_id(&name).await?, None);

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_refuses_admin_requests_off_the_controller() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(3, &topic, 1).await?;
    let controller = cluster.controller_id().await?.unwrap();
    let other = cluster
        .broker_ids()
        .await?
        .into_iter()
        .find(|id| *id != controller)
        .unwrap();
    let mut conn = testsupport::connect(&cluster, other).await?;

    let mut request = protocol::CreateTopicsRequest::new(1000, false);
    request.add("elsewhere", 1, 1);
    let response = create(&mut conn, request).await?;
    assert_eq!(code_of(&response, "elsewhere"), KafkaCode::NotController);

    let mut request = protocol::DeleteTopicsRequest::new(1000);
    request.add(&topic);
    let Response::DeleteTopics(response) = conn.request(&Request::DeleteTopics(request)).await?
    else {
        panic!("expected a delete topics response");
    };
    assert_eq!(response.responses[0].error_code, KafkaCode::NotController);

    let mut request = protocol::CreatePartitionsRequest::new(1000, false);
    request.add(&topic, 5);
    let Response::CreatePartitions(response) =
        conn.request(&Request::CreatePartitions(request)).await?
    else {
        panic!("expected a create partitions response");
    };
    assert_eq!(response.results[0].error_code, KafkaCode::NotController);

    assert!(cluster.topic_id(&topic).await?.is_some());
    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_deletes_topics() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(2, &topic, 2).await?;
    let mut conn = testsupport::controller_conn(&cluster).await?;

    let mut request = protocol::DeleteTopicsRequest::new(1000);
    request.add(&topic);
    request.add("missing");
    let Response::DeleteTopics(response) = conn.request(&Request::DeleteTopics(request)).await?
    else {
        panic!("expected a delete topics response");
    };
    let code = |name: &str| {
        response
            .responses
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.error_code)
    };
    assert_eq!(code(&topic), Some(KafkaCode::None));
    assert_eq!(code("missing"), Some(KafkaCode::UnknownTopicOrPartition));

    assert_eq!(cluster.topic_id(&topic).await?, None);
    assert_eq!(cluster.partition_leader(&topic, 0).await?, None);

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_creates_partitions() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(2, &topic, 2).await?;
    let mut conn = testsupport::controller_conn(&cluster).await?;

    let mut request = protocol::CreatePartitionsRequest::new(1000, false);
    // assignments are accepted and ignored
    request.topics.push(create_partitions::request::Topic {
        name: topic.clone(),
        count: 5,
        assignments: Some(vec![create_partitions::request::Assignment {
            broker_ids: vec![0],
        }]),
    });
    request.add("missing", 3);
    let missing = request.topics[1].clone();
    request.topics.push(missing);
    let Response::CreatePartitions(response) =
        conn.request(&Request::CreatePartitions(request)).await?
    else {
        panic!("expected a create partitions response");
    };
    assert_eq!(response.results[0].error_code, KafkaCode::None);
    assert_eq!(response.results[1].error_code, KafkaCode::InvalidRequest);
    assert_eq!(response.results[2].error_code, KafkaCode::InvalidRequest);

    let metadata = testsupport::metadata(&mut conn, &[&topic]).await?;
    assert_eq!(metadata.topic(&topic).unwrap().partitions.len(), 5);
    let (leader, epoch) = cluster.partition_leader(&topic, 4).await?.unwrap();
    assert!(leader.is_some());
    assert_eq!(epoch, 0);

    // shrinking or staying put is refused, validation leaves it alone
    for (count, validate_only, expected) in [
        (5, false, KafkaCode::InvalidPartitions),
        (3, false, KafkaCode::InvalidPartitions),
        (8, true, KafkaCode::None),
    ] {
        let mut request = protocol::CreatePartitionsRequest::new(1000, validate_only);
        request.add(&topic, count);
        let Response::CreatePartitions(response) =
            conn.request(&Request::CreatePartitions(request)).await?
        else {
            panic!("expected a create partitions response");
        };
        assert_eq!(response.results[0].error_code, expected);
    }
    assert_eq!(cluster.partition_leader(&topic, 5).await?, None);

    let mut request = protocol::CreatePartitionsRequest::new(1000, false);
    request.add("missing", 3);
    let Response::CreatePartitions(response) =
        conn.request(&Request::CreatePartitions(request)).await?
    else {
        panic!("expected a create partitions response");
    };
    assert_eq!(
        response.results[0].error_code,
        KafkaCode::UnknownTopicOrPartition
    );

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_refuses_huge_partition_counts_and_keeps_serving() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::controller_conn(&cluster).await?;

    let name = testsupport::topic_name();
    let mut request = protocol::CreateTopicsRequest::new(1000, false);
    request.add(&name, i32::MAX, 1);
    let response = create(&mut conn, request).await?;
    assert_eq!(code_of(&response, &name), KafkaCode::InvalidPartitions);
    assert_eq!(cluster.topic_id(&name).await?, None);

    let mut request = protocol::CreatePartitionsRequest::new(1000, false);
    request.add(&topic, i32::MAX);
    let Response::CreatePartitions(response) =
        conn.request(&Request::CreatePartitions(request)).await?
    else {
        panic!("expected a create partitions response");
    };
    assert_eq!(response.results[0].error_code, KafkaCode::InvalidPartitions);

    // the cluster still answers, on the same connection and through admin calls
    let metadata = testsupport::metadata(&mut conn, &[&topic]).await?;
    assert_eq!(metadata.topic(&topic).unwrap().partitions.len(), 1);
    assert_eq!(cluster.broker_ids().await?, vec![0]);

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_bumps_epochs_of_created_topics_on_shuffle() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(3, &topic, 1).await?;
    let mut conn = testsupport::controller_conn(&cluster).await?;
    let nodes = cluster.broker_ids().await?;

    let name = testsupport::topic_name();
    let mut request = protocol::CreateTopicsRequest::new(1000, false);
    request.add(&name, 4, 1);
    create(&mut conn, request).await?.is_error()?;

    cluster.shuffle_partition_leaders().await?;
    for partition in 0..4 {
        let (leader, epoch) = cluster.partition_leader(&name, partition).await?.unwrap();
        assert_eq!(epoch, 1);
        assert!(nodes.contains(&leader.unwrap()));
    }
    assert_eq!(cluster.partition_leader(&name, 4).await?, None);

    // clients see the new leaders too
    let metadata = testsupport::metadata(&mut conn, &[&name]).await?;
    let described = metadata.topic(&name).unwrap();
    assert_eq!(described.partitions.len(), 4);
    for partition in &described.partitions {
        let (leader, _) = cluster
            .partition_leader(&name, partition.partition_index)
            .await?
            .unwrap();
        assert_eq!(leader, Some(partition.leader_id));
    }

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_hands_out_producer_ids() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let init = |id: Option<&str>, timeout: i32| {
        Request::InitProducerId(protocol::InitProducerIdRequest::new(id, timeout))
    };
    let mut answers = Vec::new();
    for request in [
        init(None, 0),
        init(None, 0),
        init(Some("txn"), 1000),
        init(Some("txn"), 1000),
        init(Some("txn"), 0),
    ] {
        match conn.request(&request).await? {
            Response::InitProducerId(resp) => {
                answers.push((resp.error_code, resp.producer_id, resp.producer_epoch))
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    assert_eq!(answers[0], (KafkaCode::None, 0, 0));
    assert_eq!(answers[1], (KafkaCode::None, 1, 0));
    assert_eq!(answers[2], (KafkaCode::None, 2, 0));
    assert_eq!(answers[3], (KafkaCode::None, 2, 1));
    assert_eq!(answers[4], (KafkaCode::InvalidTransactionTimeout, -1, -1));

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_describes_the_cluster() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    testsupport::init_tracing();
    let cluster = ClusterBuilder::new()
        .num_brokers(3)
        .cluster_id("described")
        .seed_topics(3, &[&topic])
        .build()
        .await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let Response::Metadata(metadata) = conn
        .request(&Request::Metadata(protocol::MetadataRequest::all()))
        .await?
    else {
        panic!("expected a metadata response");
    };
    assert_eq!(metadata.cluster_id.as_deref(), Some("described"));
    assert_eq!(metadata.controller_id, 2);
    assert_eq!(metadata.brokers.len(), 3);
    let addrs = cluster.listen_addrs().await?;
    for (broker, addr) in metadata.brokers.iter().zip(addrs) {
        assert_eq!(broker.host, "127.0.0.1");
        assert_eq!(broker.port, i32::from(addr.port()));
        assert_eq!(broker.rack, None);
    }
    assert_eq!(metadata.topic(&topic).unwrap().partitions.len(), 3);

    let metadata = testsupport::metadata(&mut conn, &["unknown"]).await?;
    assert_eq!(
        metadata.topic("unknown").unwrap().error_code,
        KafkaCode::UnknownTopicOrPartition
    );
    assert_eq!(cluster.topic_id("unknown").await?, None);

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_creates_topics_from_metadata_when_allowed() -> Result<(), Error> {
    testsupport::init_tracing();
    let cluster = ClusterBuilder::new()
        .num_brokers(2)
        .default_num_partitions(4)
        .allow_auto_topic_creation(true)
        .build()
        .await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let name = testsupport::topic_name();
    let metadata = testsupport::metadata(&mut conn, &[&name]).await?;
    let created = metadata.topic(&name).unwrap();
    assert_eq!(created.error_code, KafkaCode::None);
    assert_eq!(created.partitions.len(), 4);
    assert!(cluster.topic_id(&name).await?.is_some());

    cluster.close();
    Ok(())
}

#[tokio::test]
async fn it_advertises_api_versions() -> Result<(), Error> {
    let topic = testsupport::topic_name();
    let cluster = testsupport::start(1, &topic, 1).await?;
    let mut conn = testsupport::connect(&cluster, 0).await?;

    let Response::ApiVersions(versions) = conn
        .request(&Request::ApiVersions(protocol::ApiVersionsRequest::new(1)))
        .await?
    else {
        panic!("expected an api versions response");
    };
    assert_eq!(versions.error_code, KafkaCode::None);
    assert_eq!(versions.api_keys.len(), ApiKey::ALL.len());
    let fetch = versions.find(i16::from(ApiKey::Fetch)).unwrap();
    assert_eq!((fetch.min_version, fetch.max_version), (4, 4));
    let api_versions = versions.find(i16::from(ApiKey::ApiVersions)).unwrap();
    assert_eq!(
        (api_versions.min_version, api_versions.max_version),
        (0, 1)
    );

    // too new, answered in the oldest layout
    let header = HeaderRequest::new(i16::from(ApiKey::ApiVersions), 3, 77, "rust");
    conn.send_raw(&header, &protocol::ApiVersionsRequest::new(3))
        .await?;
    let Response::ApiVersions(versions) = conn.receive_for(&header).await? else {
        panic!("expected an api versions response");
    };
    assert_eq!(versions.error_code, KafkaCode::UnsupportedVersion);
    assert_eq!(versions.api_keys.len(), ApiKey::ALL.len());

    cluster.close();
    Ok(())
}
