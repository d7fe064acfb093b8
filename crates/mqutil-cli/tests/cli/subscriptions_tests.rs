use super::test_utilities::{PROJECT, run_command, seed, subscription_fqn};
use mqutil::service::{MemoryBroker, Operation, PubSubService};
use mqutil_cli::CliError;
use test_log::test;

async fn attached(broker: &MemoryBroker, topic: &str) -> Vec<String> {
    broker.connect(PROJECT).list_subscriptions(topic).await.unwrap()
}

#[test(tokio::test)]
async fn test_create_and_list_subscriptions() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &[])]).await;

    let (result, output) = run_command(&broker, &["subs", "-t", "t1", "create", "a", "b"]).await;
    result.unwrap();
    assert_eq!(
        output.lines(),
        vec![
            format!("created subscription: {}", subscription_fqn("a")),
            format!("created subscription: {}", subscription_fqn("b")),
        ]
    );

    let (result, output) = run_command(&broker, &["subs", "list", "--topic", "t1"]).await;
    result.unwrap();
    assert_eq!(output.lines(), vec![subscription_fqn("a"), subscription_fqn("b")]);
}

#[test(tokio::test)]
async fn test_create_tolerates_existing_subscription() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &["a"])]).await;

    let (result, output) = run_command(&broker, &["subs", "-t", "t1", "create", "a", "b"]).await;
    result.unwrap();
    assert_eq!(output.lines()[0], "subscription already exists: a");
    assert_eq!(attached(&broker, "t1").await.len(), 2);
}

#[test(tokio::test)]
async fn test_create_on_missing_topic_fails() {
    let broker = MemoryBroker::new();

    let (result, _) = run_command(&broker, &["subs", "-t", "nope", "create", "a"]).await;
    match result {
        Err(CliError::PubSub(e)) => assert!(e.is_not_found()),
        other => panic!("expected not found, got {other:?}"),
    }
    assert_eq!(broker.closes(), 1);
}

#[test(tokio::test)]
async fn test_delete_only_touches_attached_subscriptions() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &["a", "b"]), ("t2", &["c"])]).await;

    let (result, output) =
        run_command(&broker, &["subs", "-t", "t1", "delete", "a", "c", "ghost"]).await;
    result.unwrap();

    assert_eq!(
        output.lines(),
        vec![format!("deleted subscription: {}", subscription_fqn("a"))]
    );
    assert_eq!(attached(&broker, "t1").await, vec![subscription_fqn("b")]);
    assert_eq!(attached(&broker, "t2").await, vec![subscription_fqn("c")]);
}

#[test(tokio::test)]
async fn test_delete_is_fail_fast() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &["a", "b", "c"])]).await;
    broker.fail_on(Operation::DeleteSubscription, "b");

    let (result, _) = run_command(&broker, &["subs", "-t", "t1", "delete", "a", "b", "c"]).await;
    assert!(result.is_err());
    assert_eq!(
        attached(&broker, "t1").await,
        vec![subscription_fqn("b"), subscription_fqn("c")]
    );
}

#[test(tokio::test)]
async fn test_delete_subscription_owned_by_other_project() {
    let broker = MemoryBroker::new();
    seed(&broker, &[("t1", &["a"])]).await;
    broker
        .connect("other")
        .create_subscription("x", &format!("projects/{PROJECT}/topics/t1"))
        .await
        .unwrap();

    let (result, output) = run_command(&broker, &["subs", "-t", "t1", "delete", "x"]).await;
    result.unwrap();

    assert_eq!(
        output.lines(),
        vec!["deleted subscription: projects/other/subscriptions/x".to_string()]
    );
    assert_eq!(attached(&broker, "t1").await, vec![subscription_fqn("a")]);
}
