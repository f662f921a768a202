//! API Module Tests
//!
//! End-to-end checks over a real TCP listener bound on an ephemeral port.
//!
//! ## Test Scopes
//! - **Happy path**: set -> update(release) -> reserve, values past axum's
//!   default body limit.
//! - **Failure mapping**: 400 / 401 / 404 / 408 and the `{"error": ...}` envelope.
//! - **Blocking**: retained locks (including non-`true` release flags) and
//!   concurrent `set` calls on one key.

#[cfg(test)]
mod tests {
    use crate::api::protocol::{ErrorResponse, LockResponse};
    use crate::api::router;
    use crate::store::Store;
    use reqwest::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn spawn_server() -> String {
        spawn_server_with(Store::new()).await
    }

    async fn spawn_server_with(store: Store) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(store));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    async fn put_value(client: &reqwest::Client, base: &str, key: &str, body: &str) -> String {
        let resp = client
            .put(format!("{}/values/{}", base, key))
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json::<LockResponse>().await.unwrap().lock_id
    }

    async fn post_value(
        client: &reqwest::Client,
        base: &str,
        key: &str,
        lock_id: &str,
        release: &str,
        body: &str,
    ) -> reqwest::Response {
        client
            .post(format!("{}/values/{}/{}?release={}", base, key, lock_id, release))
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }

    // ============================================================
    // HAPPY PATH
    // ============================================================

    #[tokio::test]
    async fn test_set_update_reserve_scenario() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        // PUT returns only a lock id.
        let resp = client
            .put(format!("{}/values/foo", base))
            .body("hello")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let raw: serde_json::Value = resp.json().await.unwrap();
        let lock_a = raw["lock_id"].as_str().unwrap().to_string();
        assert!(raw.get("value").is_none(), "empty value must be omitted");

        let resp = post_value(&client, &base, "foo", &lock_a, "true", "world").await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = client
            .post(format!("{}/reservations/foo", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let reserved: LockResponse = resp.json().await.unwrap();
        assert_eq!(reserved.value, "world");
        assert!(!reserved.lock_id.is_empty());
        assert_ne!(reserved.lock_id, lock_a);
    }

    #[tokio::test]
    async fn test_values_larger_than_default_body_limit_are_accepted() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        let big = "a".repeat(3 * 1024 * 1024);

        let lock_id = put_value(&client, &base, "big", &big).await;
        let resp = post_value(&client, &base, "big", &lock_id, "true", &big).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let reserved: LockResponse = client
            .post(format!("{}/reservations/big", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reserved.value.len(), big.len());
    }

    // ============================================================
    // FAILURE MAPPING
    // ============================================================

    #[tokio::test]
    async fn test_reserve_unknown_key_is_404() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/reservations/unknown", base))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_key_is_404() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = post_value(&client, &base, "ghost", "some-lock", "true", "v").await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_with_wrong_lock_id_is_401() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        let lock_id = put_value(&client, &base, "foo", "hello").await;

        let resp = post_value(&client, &base, "foo", "not-my-lock", "true", "evil").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert!(body.error.contains("lock id"));

        // The rejected write changed nothing.
        let resp = post_value(&client, &base, "foo", &lock_id, "true", "hello").await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let reserved: LockResponse = client
            .post(format!("{}/reservations/foo", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reserved.value, "hello");
    }

    #[tokio::test]
    async fn test_update_without_release_is_400() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        let lock_id = put_value(&client, &base, "foo", "hello").await;

        let resp = client
            .post(format!("{}/values/foo/{}", base, lock_id))
            .body("world")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert!(body.error.contains("release"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_key_is_400_with_envelope() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/reservations/%FF", base))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert!(body.error.contains("invalid path parameter"));
    }

    #[tokio::test]
    async fn test_lock_timeout_is_408_with_envelope() {
        let base =
            spawn_server_with(Store::new().with_lock_timeout(Some(Duration::from_millis(50))))
                .await;
        let client = reqwest::Client::new();
        let lock_id = put_value(&client, &base, "foo", "hello").await;

        let resp = client
            .post(format!("{}/reservations/foo", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert!(body.error.contains("timed out"));

        // The holder keeps its lock.
        let resp = post_value(&client, &base, "foo", &lock_id, "true", "world").await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_with_envelope() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{}/nothing/here", base))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_method_on_known_path_is_404() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{}/values/foo", base))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert!(!body.error.is_empty());
    }

    // ============================================================
    // BLOCKING BEHAVIOUR
    // ============================================================

    #[tokio::test]
    async fn test_retained_lock_blocks_reservation() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        let lock_id = put_value(&client, &base, "foo", "hello").await;

        let resp = post_value(&client, &base, "foo", &lock_id, "false", "kept").await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let reservation = {
            let client = client.clone();
            let url = format!("{}/reservations/foo", base);
            tokio::spawn(async move { client.post(url).send().await })
        };

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!reservation.is_finished(), "reservation must wait for release");

        let resp = post_value(&client, &base, "foo", &lock_id, "true", "done").await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = timeout(Duration::from_secs(2), reservation)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let reserved: LockResponse = resp.json().await.unwrap();
        assert_eq!(reserved.value, "done");
    }

    #[tokio::test]
    async fn test_concurrent_sets_are_serialized() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        for body in ["x", "y"] {
            let client = client.clone();
            let base = base.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let lock_id = put_value(&client, &base, "bar", body).await;
                let _ = tx.send((body, lock_id));
            });
        }

        let (first_body, t1) = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();

        // The other PUT is parked behind the first holder.
        assert!(
            timeout(Duration::from_millis(150), rx.recv()).await.is_err(),
            "second set must wait for the first lock to be released"
        );

        let resp = post_value(&client, &base, "bar", &t1, "true", first_body).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let (second_body, t2) = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_ne!(t1, t2);
        assert_ne!(first_body, second_body);

        let resp = post_value(&client, &base, "bar", &t1, "true", "stale").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = post_value(&client, &base, "bar", &t2, "true", second_body).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_release_values_other_than_true_retain_lock() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let cases = [
            ("maybe", "release=maybe"),
            ("empty", "release="),
            ("bare", "release"),
        ];
        for (key, query) in cases {
            let lock_id = put_value(&client, &base, key, "v1").await;

            let resp = client
                .post(format!("{}/values/{}/{}?{}", base, key, lock_id, query))
                .body("v2")
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::NO_CONTENT, "query {:?}", query);

            let reservation = {
                let client = client.clone();
                let url = format!("{}/reservations/{}", base, key);
                tokio::spawn(async move { client.post(url).send().await })
            };
            tokio::time::sleep(Duration::from_millis(150)).await;
            assert!(
                !reservation.is_finished(),
                "query {:?} must keep the lock held",
                query
            );

            let resp = post_value(&client, &base, key, &lock_id, "true", "v3").await;
            assert_eq!(resp.status(), StatusCode::NO_CONTENT);
            let resp = timeout(Duration::from_secs(2), reservation)
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            let reserved: LockResponse = resp.json().await.unwrap();
            assert_eq!(reserved.value, "v3");
        }
    }
}
