use super::test_utilities::{
    PROJECT, run_command, seed, subscription_fqn, topic_fqn, topics,
};
use mqutil::service::{MemoryBroker, Operation, PubSubService};
use test_log::test;

#[test(tokio::test)]
async fn test_list_topics_prints_full_names() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("a", &[]), ("b", &[])]).await;

    let (result, output) = run_command(&broker, &["topics", "list"]).await;
    result.unwrap();
    assert_eq!(output.lines(), vec![topic_fqn("a"), topic_fqn("b")]);
}

#[test(tokio::test)]
async fn test_one_session_per_command() {
    let broker = MemoryBroker::new();

    let (result, _) = run_command(&broker, &["topics", "create", "t1", "t2"]).await;
    result.unwrap();
    assert_eq!(broker.connections(), 1);
    assert_eq!(broker.closes(), 1);

    let (result, _) = run_command(&broker, &["topics", "delete", "missing"]).await;
    assert!(result.is_err());
    assert_eq!(broker.connections(), 2);
    assert_eq!(broker.closes(), 2);
}

#[test(tokio::test)]
async fn test_batch_create_continues_past_existing_topic() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &[])]).await;

    let (result, output) = run_command(&broker, &["topics", "create", "t1", "t2"]).await;
    result.unwrap();

    assert_eq!(topics(&broker).await, vec![topic_fqn("t1"), topic_fqn("t2")]);
    let lines = output.lines();
    assert_eq!(lines[0], "topic already exists: t1");
    assert_eq!(lines[1], format!("created topic {}", topic_fqn("t2")));
}

#[test(tokio::test)]
async fn test_batch_create_stops_on_other_errors() {
    let broker = MemoryBroker::new();
    broker.fail_on(Operation::CreateTopic, "t2");

    let (result, _) = run_command(&broker, &["topics", "create", "t1", "t2", "t3"]).await;
    assert!(result.is_err());
    assert_eq!(topics(&broker).await, vec![topic_fqn("t1")]);
}

#[test(tokio::test)]
async fn test_compact_spec_creates_topic_with_subscriptions() {
    let broker = MemoryBroker::new();

    let (result, _) = run_command(&broker, &["topics", "create", "t1:s1;s2"]).await;
    result.unwrap();

    let (result, output) = run_command(&broker, &["subs", "-t", "t1", "list"]).await;
    result.unwrap();
    assert_eq!(
        output.lines(),
        vec![subscription_fqn("s1"), subscription_fqn("s2")]
    );
}

#[test(tokio::test)]
async fn test_compact_spec_tolerates_existing_resources() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &["s1"])]).await;

    let (result, output) = run_command(&broker, &["topics", "create", "t1:s1;s2"]).await;
    result.unwrap();

    assert_eq!(
        output.lines(),
        vec![
            "topic already exists: t1".to_string(),
            "subscription already exists: s1".to_string(),
            format!("created subscription: {}", subscription_fqn("s2")),
        ]
    );
}

#[test(tokio::test)]
async fn test_delete_removes_subscriptions_before_topic() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &["s1", "s2"]), ("t2", &["s3"])]).await;

    let (result, output) = run_command(&broker, &["topics", "delete", "t1"]).await;
    result.unwrap();

    assert_eq!(
        output.lines(),
        vec![
            format!("deleted subscription: {}", subscription_fqn("s1")),
            format!("deleted subscription: {}", subscription_fqn("s2")),
            "deleted topic: t1".to_string(),
        ]
    );
    assert_eq!(topics(&broker).await, vec![topic_fqn("t2")]);
    let remaining = broker.connect(PROJECT).list_subscriptions("t2").await.unwrap();
    assert_eq!(remaining, vec![subscription_fqn("s3")]);
}

#[test(tokio::test)]
async fn test_delete_keeps_topic_when_subscription_delete_fails() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &["s1", "s2"]), ("t2", &[])]).await;
    broker.fail_on(Operation::DeleteSubscription, "s2");

    let (result, _) = run_command(&broker, &["topics", "delete", "t1", "t2"]).await;
    assert!(result.is_err());

    // Nothing after the failed deletion is attempted.
    assert_eq!(topics(&broker).await, vec![topic_fqn("t1"), topic_fqn("t2")]);
    let remaining = broker.connect(PROJECT).list_subscriptions("t1").await.unwrap();
    assert_eq!(remaining, vec![subscription_fqn("s2")]);
    assert_eq!(broker.closes(), 1);
}

#[test(tokio::test)]
async fn test_delete_stops_when_topic_delete_fails() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &[]), ("t2", &[])]).await;
    broker.fail_on(Operation::DeleteTopic, "t1");

    let (result, _) = run_command(&broker, &["topics", "delete", "t1", "t2"]).await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("delete topic"));
    assert_eq!(topics(&broker).await, vec![topic_fqn("t1"), topic_fqn("t2")]);
}

#[test(tokio::test)]
async fn test_delete_removes_subscriptions_owned_by_other_projects() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &["s1"])]).await;
    broker
        .connect("other")
        .create_subscription("x", &topic_fqn("t1"))
        .await
        .unwrap();

    let (result, output) = run_command(&broker, &["topics", "delete", "t1"]).await;
    result.unwrap();

    assert!(
        output
            .lines()
            .contains(&"deleted subscription: projects/other/subscriptions/x".to_string())
    );
    assert!(topics(&broker).await.is_empty());
    assert_eq!(broker.pending("projects/other/subscriptions/x"), 0);
    let err = broker
        .connect("other")
        .delete_subscription("x")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
