use mqutil::{MemoryBroker, PubSubError, Session, SessionConfig, with_session};
use std::fmt;
use test_log::test;

#[derive(Debug)]
enum BodyError {
    Remote(PubSubError),
    Local(String),
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::Remote(err) => write!(f, "{err}"),
            BodyError::Local(message) => write!(f, "{message}"),
        }
    }
}

impl From<PubSubError> for BodyError {
    fn from(err: PubSubError) -> Self {
        BodyError::Remote(err)
    }
}

#[test(tokio::test)]
async fn test_one_connection_and_one_close_per_invocation() {
    let broker = MemoryBroker::new();
    let config = SessionConfig::new("p");

    for topic in ["a", "b", "c"] {
        with_session(&broker, &config, async |session: &Session| {
            session.service().create_topic(topic).await.map(|_| ())
        })
        .await
        .unwrap();
    }

    assert_eq!(broker.connections(), 3);
    assert_eq!(broker.closes(), 3);
}

#[test(tokio::test)]
async fn test_local_body_error_still_closes_session() {
    let broker = MemoryBroker::new();
    let config = SessionConfig::new("p");

    let err = with_session(&broker, &config, async |_: &Session| {
        Err::<(), _>(BodyError::Local("bad input".to_string()))
    })
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "bad input");
    assert_eq!(broker.closes(), 1);
}

#[test(tokio::test)]
async fn test_spawned_task_joined_within_session() {
    let broker = MemoryBroker::new();
    let config = SessionConfig::new("p");

    let topics = with_session(&broker, &config, async |session: &Session| {
        let shared = session.shared();
        let handle = tokio::spawn(async move {
            shared.create_topic("spawned").await?;
            shared.list_topics().await
        });
        handle
            .await
            .map_err(|e| BodyError::Local(e.to_string()))?
            .map_err(BodyError::from)
    })
    .await
    .unwrap();

    assert_eq!(topics, vec!["projects/p/topics/spawned".to_string()]);
    assert_eq!(broker.closes(), 1);
}
