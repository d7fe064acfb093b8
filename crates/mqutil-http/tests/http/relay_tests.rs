use super::test_utilities::{TOPIC_NAME, TestRelay};
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use mqutil::service::{MemoryBroker, PubSubService};
use mqutil_http::relay::{
    producer::MAX_MESSAGE_BYTES, routes::create_router, server::create_app_state,
};
use test_log::test;
use tower::ServiceExt;

#[test(tokio::test)]
async fn test_post_publishes_body() {
    let relay = TestRelay::start().await.expect("Failed to start test relay");
    let client = reqwest::Client::new();

    let response = client
        .post(relay.data_url())
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    assert!(response.text().await.unwrap().is_empty());

    assert_eq!(relay.broker.published(TOPIC_NAME), vec![b"hello".to_vec()]);
}

#[test(tokio::test)]
async fn test_empty_post_publishes_empty_message() {
    let relay = TestRelay::start().await.expect("Failed to start test relay");

    let response = reqwest::Client::new()
        .post(relay.data_url())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    assert_eq!(relay.broker.published(TOPIC_NAME), vec![Vec::<u8>::new()]);
}

#[test(tokio::test)]
async fn test_other_methods_not_allowed() {
    let relay = TestRelay::start().await.expect("Failed to start test relay");
    let client = reqwest::Client::new();

    let response = client.get(relay.data_url()).send().await.unwrap();
    assert_eq!(response.status(), 405);
    assert_eq!(response.text().await.unwrap(), "method not allowed");

    let response = client.put(relay.data_url()).body("x").send().await.unwrap();
    assert_eq!(response.status(), 405);
    assert!(relay.broker.published(TOPIC_NAME).is_empty());
}

#[test(tokio::test)]
async fn test_unknown_path_not_found() {
    let relay = TestRelay::start().await.expect("Failed to start test relay");

    let response = reqwest::Client::new()
        .post(format!("{}/other", relay.base_url))
        .body("x")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[test(tokio::test)]
async fn test_publish_failure_returns_500() {
    let broker = MemoryBroker::new();
    // No topic is created, so every publish fails.
    let publisher = broker.connect("test-project").publisher("missing");
    let relay = TestRelay::start_with(broker, publisher, std::time::Duration::from_secs(10))
        .await
        .expect("Failed to start test relay");

    let response = reqwest::Client::new()
        .post(relay.data_url())
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "error sending message");
}

#[test(tokio::test)]
async fn test_truncated_body_returns_500() {
    let broker = MemoryBroker::new();
    let service = broker.connect("test-project");
    service.create_topic("relay").await.unwrap();
    let app = create_router(create_app_state(service.publisher("relay")));

    let chunks = futures_util::stream::iter(vec![
        Ok::<_, std::io::Error>(Bytes::from_static(b"partial")),
        Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection reset",
        )),
    ]);
    let request = Request::builder()
        .method("POST")
        .uri("/data")
        .body(Body::from_stream(chunks))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"error reading body");
    assert!(broker.published(TOPIC_NAME).is_empty());
}

#[test(tokio::test)]
async fn test_oversized_body_returns_413() {
    let broker = MemoryBroker::new();
    let service = broker.connect("test-project");
    service.create_topic("relay").await.unwrap();
    let app = create_router(create_app_state(service.publisher("relay")));

    let request = Request::builder()
        .method("POST")
        .uri("/data")
        .body(Body::from(vec![b'x'; MAX_MESSAGE_BYTES + 1]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"message too large");
    assert!(broker.published(TOPIC_NAME).is_empty());

    let request = Request::builder()
        .method("POST")
        .uri("/data")
        .body(Body::from(vec![b'x'; MAX_MESSAGE_BYTES]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(broker.published(TOPIC_NAME).len(), 1);
}

#[test(tokio::test)]
async fn test_concurrent_requests_are_isolated() {
    let relay = TestRelay::start().await.expect("Failed to start test relay");
    let client = reqwest::Client::new();

    let mut requests = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        let url = if i % 2 == 0 {
            relay.data_url()
        } else {
            format!("{}/health", relay.base_url)
        };
        requests.push(tokio::spawn(async move {
            if i % 2 == 0 {
                client.post(url).body(format!("m{i}")).send().await
            } else {
                // GET on /health interleaved with publishes
                client.get(url).send().await
            }
        }));
    }

    for request in requests {
        let status = request.await.unwrap().unwrap().status();
        assert!(status == 201 || status == 200, "unexpected status {status}");
    }
    let mut published = relay.broker.published(TOPIC_NAME);
    published.sort();
    let expected: Vec<Vec<u8>> = ["m0", "m2", "m4", "m6", "m8"]
        .iter()
        .map(|m| m.as_bytes().to_vec())
        .collect();
    assert_eq!(published, expected);
}
