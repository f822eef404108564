//! # Integration Tests
//!
//! These tests drive the bridge router over real HTTP. Each test starts an
//! in-process server on an ephemeral loopback port with its own temporary
//! spool directory, so no running bridge or fixed port is needed.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test
//! ```

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use posnet_bridge::config::BridgeConfig;
    use posnet_bridge::state::AppState;
    use posnet_bridge::{create_app, MAX_BODY_BYTES};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    struct TestBridge {
        base_url: String,
        spool_dir: PathBuf,
        _tmp: TempDir,
    }

    impl TestBridge {
        async fn start(api_key: Option<&str>) -> Self {
            let tmp = TempDir::new().expect("Failed to create temp dir");
            let spool_dir = tmp.path().join("spool");
            let config = BridgeConfig {
                port: 0,
                api_key: api_key.map(str::to_string),
                spool_dir: spool_dir.clone(),
            };
            let app = create_app(AppState::new(&config));

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind test listener");
            let addr = listener.local_addr().expect("Failed to read local addr");
            tokio::spawn(async move {
                axum::serve(listener, app).await.expect("Server failed");
            });

            Self {
                base_url: format!("http://{}", addr),
                spool_dir,
                _tmp: tmp,
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        fn spool_files(&self) -> Vec<PathBuf> {
            list_json(&self.spool_dir)
        }

        async fn health(&self) -> Value {
            reqwest::get(self.url("/health"))
                .await
                .expect("Failed to send request")
                .json()
                .await
                .expect("Failed to parse response")
        }
    }

    fn list_json(dir: &Path) -> Vec<PathBuf> {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn receipt_payload() -> Value {
        json!({
            "transactionId": "t1",
            "reservationId": "r1",
            "items": [{"name": "Room", "qty": 1}],
            "totalAmount": 250.0,
            "paymentType": "CARD"
        })
    }

    fn invoice_payload() -> Value {
        json!({
            "reservationId": "r1",
            "company": {"nip": "5260250274", "name": "Hotel Sp. z o.o."},
            "items": [{"name": "Room", "qty": 2, "price": 300.0}],
            "totalAmount": 600.0
        })
    }

    fn assert_number(number: &str, prefix: &str) {
        let suffix = number
            .strip_prefix(prefix)
            .unwrap_or_else(|| panic!("{number} should start with {prefix}"));
        assert_eq!(suffix.len(), 8, "{number}");
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()),
            "{number}"
        );
    }

    #[tokio::test]
    async fn test_print_receipt_spools_exact_payload() {
        let bridge = TestBridge::start(None).await;
        let client = reqwest::Client::new();

        let res = client
            .post(bridge.url("/fiscal/print"))
            .json(&receipt_payload())
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 200);

        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["success"], true);
        assert_number(body["receiptNumber"].as_str().unwrap(), "PAR-");

        let files = bridge.spool_files();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("receipt_"), "{name}");
        assert!(!name.contains(':'), "{name}");

        let stored: Value =
            serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap();
        assert_eq!(stored, receipt_payload());

        let health = bridge.health().await;
        assert_eq!(health["counters"]["receipts"], 1);
        assert_eq!(health["spoolFiles"], 1);
    }

    #[tokio::test]
    async fn test_receipt_number_matches_spool_id() {
        let bridge = TestBridge::start(None).await;
        let body: Value = reqwest::Client::new()
            .post(bridge.url("/fiscal/print"))
            .json(&receipt_payload())
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");

        let number = body["receiptNumber"].as_str().unwrap().to_string();
        let name = bridge.spool_files()[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        let id = name
            .trim_end_matches(".json")
            .rsplit('_')
            .next()
            .unwrap()
            .to_string();
        assert_eq!(number, format!("PAR-{}", id[..8].to_uppercase()));
    }

    #[tokio::test]
    async fn test_invalid_payloads_never_reach_the_spool() {
        let bridge = TestBridge::start(None).await;
        let client = reqwest::Client::new();

        let mut no_company = invoice_payload();
        no_company.as_object_mut().unwrap().remove("company");
        let mut zero_total = receipt_payload();
        zero_total["totalAmount"] = json!(0);

        let cases = [
            ("/fiscal/invoice", no_company, "Brak company"),
            ("/fiscal/print", zero_total, "Brak/nieprawidlowe totalAmount"),
            ("/fiscal/print", json!({}), "Brak transactionId"),
            (
                "/fiscal/storno",
                json!({"originalReceiptNumber": "PAR-ABC12345", "reason": "x", "amount": 0}),
                "Brak/nieprawidlowe amount",
            ),
            ("/fiscal/report/x", json!([1, 2, 3]), "Nieprawidlowy JSON"),
        ];

        for (path, payload, message) in cases {
            let res = client
                .post(bridge.url(path))
                .json(&payload)
                .send()
                .await
                .expect("Failed to send request");
            assert_eq!(res.status(), 400, "{path}");
            let body: Value = res.json().await.expect("Failed to parse response");
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], message, "{path}");
        }

        assert!(bridge.spool_files().is_empty());
        let health = bridge.health().await;
        assert_eq!(
            health["counters"],
            json!({"receipts": 0, "invoices": 0, "reports": 0, "stornos": 0})
        );
        assert!(health["lastError"].is_null());
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let bridge = TestBridge::start(None).await;
        let res = reqwest::Client::new()
            .post(bridge.url("/fiscal/print"))
            .header("content-type", "application/json")
            .body("{\"transactionId\": ")
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "Nieprawidlowy JSON");
        assert!(bridge.spool_files().is_empty());
    }

    #[tokio::test]
    async fn test_invoice_is_tagged_in_spool() {
        let bridge = TestBridge::start(None).await;
        let res = reqwest::Client::new()
            .post(bridge.url("/fiscal/invoice"))
            .json(&invoice_payload())
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 200);

        let body: Value = res.json().await.expect("Failed to parse response");
        assert_number(body["invoiceNumber"].as_str().unwrap(), "FV-");

        let files = bridge.spool_files();
        assert_eq!(files.len(), 1);
        let stored: Value =
            serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap();
        assert_eq!(stored["_type"], "invoice");
        assert_eq!(stored["company"]["nip"], "5260250274");
    }

    #[tokio::test]
    async fn test_reports_share_counter_and_are_stamped() {
        let bridge = TestBridge::start(None).await;
        let client = reqwest::Client::new();

        let cases = [
            ("/fiscal/report/x", "X-", "report-x_", "X_REPORT"),
            ("/fiscal/report/z", "Z-", "report-z_", "Z_REPORT"),
            (
                "/fiscal/report/periodic",
                "PER-",
                "report-periodic_",
                "PERIODIC_REPORT",
            ),
        ];

        for (path, number_prefix, file_prefix, tag) in cases {
            let res = client
                .post(bridge.url(path))
                .json(&json!({"from": "2026-10-01", "to": "2026-10-13"}))
                .send()
                .await
                .expect("Failed to send request");
            assert_eq!(res.status(), 200, "{path}");
            let body: Value = res.json().await.expect("Failed to parse response");
            assert_number(body["reportNumber"].as_str().unwrap(), number_prefix);

            let file = bridge
                .spool_files()
                .into_iter()
                .find(|p| p.file_name().unwrap().to_string_lossy().starts_with(file_prefix))
                .unwrap_or_else(|| panic!("no spool file for {path}"));
            let stored: Value = serde_json::from_slice(&std::fs::read(&file).unwrap()).unwrap();
            assert_eq!(stored["_type"], tag);
            assert_eq!(stored["from"], "2026-10-01");
            assert!(
                chrono::DateTime::parse_from_rfc3339(stored["timestamp"].as_str().unwrap())
                    .is_ok()
            );
        }

        let health = bridge.health().await;
        assert_eq!(health["counters"]["reports"], 3);
        assert_eq!(health["spoolFiles"], 3);
    }

    #[tokio::test]
    async fn test_storno_echoes_original_receipt() {
        let bridge = TestBridge::start(None).await;
        let res = reqwest::Client::new()
            .post(bridge.url("/fiscal/storno"))
            .json(&json!({
                "originalReceiptNumber": "PAR-ABC12345",
                "reason": "Guest complaint",
                "amount": 50.0
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 200);

        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["success"], true);
        assert_number(body["stornoNumber"].as_str().unwrap(), "ST-");
        assert_eq!(body["originalReceiptNumber"], "PAR-ABC12345");
        assert_eq!(body["stornoAmount"], 50.0);

        let files = bridge.spool_files();
        assert_eq!(files.len(), 1);
        let stored: Value =
            serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap();
        assert_eq!(stored["_type"], "storno");
        assert_eq!(stored["reason"], "Guest complaint");
        assert!(stored["timestamp"].is_string());
        assert_eq!(bridge.health().await["counters"]["stornos"], 1);
    }

    #[tokio::test]
    async fn test_api_key_is_enforced() {
        let bridge = TestBridge::start(Some("s3cret")).await;
        let client = reqwest::Client::new();

        let missing = client
            .post(bridge.url("/fiscal/print"))
            .json(&receipt_payload())
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(missing.status(), 401);
        let body: Value = missing.json().await.expect("Failed to parse response");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Unauthorized (x-api-key)");

        let wrong = client
            .post(bridge.url("/fiscal/storno"))
            .header("x-api-key", "guess")
            .json(&json!({"originalReceiptNumber": "PAR-1", "reason": "x", "amount": 1.0}))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(wrong.status(), 401);
        assert!(bridge.spool_files().is_empty());

        let ok = client
            .post(bridge.url("/fiscal/print"))
            .header("x-api-key", "s3cret")
            .json(&receipt_payload())
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(ok.status(), 200);
        assert_eq!(bridge.spool_files().len(), 1);

        // health stays open
        let health = client
            .get(bridge.url("/health"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(health.status(), 200);
    }

    #[tokio::test]
    async fn test_health_has_no_side_effects() {
        let bridge = TestBridge::start(None).await;

        let first = bridge.health().await;
        let second = bridge.health().await;

        assert_eq!(first["ok"], true);
        assert_eq!(first["bridge"], "posnet-bridge");
        assert_eq!(first["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(first["mode"], "spool");
        assert_eq!(first["spoolFiles"], 0);
        assert!(first["uptime"].is_u64());
        assert!(first["lastError"].is_null());
        assert_eq!(first["counters"], second["counters"]);
        assert_eq!(first["startedAt"], second["startedAt"]);
        assert!(bridge.spool_files().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_is_refused() {
        let bridge = TestBridge::start(None).await;
        let mut payload = receipt_payload();
        payload["padding"] = json!("x".repeat(MAX_BODY_BYTES + 1));

        let result = reqwest::Client::new()
            .post(bridge.url("/fiscal/print"))
            .json(&payload)
            .send()
            .await;

        // the server may close the connection before the upload completes
        if let Ok(res) = result {
            assert_eq!(res.status(), 413);
        }

        assert!(bridge.spool_files().is_empty());
        assert_eq!(bridge.health().await["counters"]["receipts"], 0);
    }

    #[tokio::test]
    async fn test_concurrent_receipts_get_distinct_files() {
        let bridge = TestBridge::start(None).await;
        let client = reqwest::Client::new();

        let requests = (0..50).map(|i| {
            let client = client.clone();
            let url = bridge.url("/fiscal/print");
            let mut payload = receipt_payload();
            payload["transactionId"] = json!(format!("t{}", i));
            tokio::spawn(async move {
                let res = client
                    .post(url)
                    .json(&payload)
                    .send()
                    .await
                    .expect("Failed to send request");
                assert_eq!(res.status(), 200);
                let body: Value = res.json().await.expect("Failed to parse response");
                body["receiptNumber"].as_str().unwrap().to_string()
            })
        });

        let mut numbers = Vec::new();
        for handle in requests.collect::<Vec<_>>() {
            numbers.push(handle.await.expect("request task panicked"));
        }
        numbers.sort();
        numbers.dedup();

        assert_eq!(numbers.len(), 50);
        assert_eq!(bridge.spool_files().len(), 50);
        assert_eq!(bridge.health().await["counters"]["receipts"], 50);
    }

    #[tokio::test]
    async fn test_spool_write_failure_is_reported() {
        let bridge = TestBridge::start(None).await;
        // a regular file where the spool directory should be
        std::fs::write(&bridge.spool_dir, b"not a directory").unwrap();

        let res = reqwest::Client::new()
            .post(bridge.url("/fiscal/print"))
            .json(&receipt_payload())
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 500);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["success"], false);

        let health = bridge.health().await;
        assert_eq!(health["counters"]["receipts"], 0);
        assert_eq!(health["lastError"]["message"], body["error"]);
        assert!(health["lastError"]["timestamp"].is_string());

        // the daemon keeps serving once the directory is fixed
        std::fs::remove_file(&bridge.spool_dir).unwrap();
        let res = reqwest::Client::new()
            .post(bridge.url("/fiscal/print"))
            .json(&receipt_payload())
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let bridge = TestBridge::start(None).await;
        let client = reqwest::Client::new();

        let res = client
            .get(bridge.url("/fiscal/unknown"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 404);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body, json!({"success": false, "error": "Not found"}));

        let wrong_method = client
            .get(bridge.url("/fiscal/print"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(wrong_method.status(), 404);
    }

    #[tokio::test]
    async fn test_cors_preflight_is_permissive() {
        let bridge = TestBridge::start(Some("s3cret")).await;
        let res = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, bridge.url("/fiscal/print"))
            .header("origin", "https://pms.example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type, x-api-key")
            .send()
            .await
            .expect("Failed to send request");

        assert!(res.status().is_success(), "status {}", res.status());
        assert_eq!(
            res.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let allowed = res
            .headers()
            .get("access-control-allow-headers")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        assert!(allowed.contains("x-api-key"), "{allowed}");
    }
}
