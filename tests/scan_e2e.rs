//! End-to-end run: local HTTP server, file input, file output.

use std::time::Duration;

use delay_scan::host::LocalHost;
use delay_scan::models::Config;
use delay_scan::pipeline::run_with_host;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const DELAYED_JSON: &str =
    r#"{"shipment":{"status":"Shipment delayed due to weather","eta":"2024-02-10T00:00:00Z"}}"#;
const DELIVERED_HTML: &str =
    r#"<html><body><div class="status">Package delivered</div></body></html>"#;
const LATE_HTML: &str = r#"<html><body><h2 id="s">Service alert</h2><p>Expected delivery: Feb 12, 2024</p></body></html>"#;

fn response(content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}

/// Serve canned tracking documents by path until the test ends.
async fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                if path == "/hang" {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
                let reply = match path {
                    "/api/1" => response("application/json", DELAYED_JSON),
                    "/page/2" => response("text/html; charset=utf-8", DELIVERED_HTML),
                    "/page/3" => response("text/html", LATE_HTML),
                    _ => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string(),
                };
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn scan_writes_only_qualifying_incidents() {
    let base = serve().await;
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("incidents.json");

    let payload = json!({
        "concurrency": 2,
        "sources": [
            {
                "url": format!("{base}/api/1"),
                "orderId": "ord-1",
                "carrier": "ACME",
                "promisedDeliveryDate": "2024-02-08T00:00:00Z",
                "statusPaths": ["shipment.status"],
                "etaPaths": ["shipment.eta"],
                "metadata": {"lane": "EU-2"}
            },
            {
                "url": format!("{base}/page/2"),
                "orderId": "ord-2",
                "statusSelectors": [".status"]
            },
            {
                "url": format!("{base}/page/3"),
                "orderId": "ord-3",
                "promisedDeliveryDate": "Feb 9, 2024",
                "statusSelectors": "#s",
                "incidentId": "INC-3"
            },
            {
                "url": format!("{base}/missing"),
                "orderId": "ord-4"
            },
            {"orderId": "no-url"}
        ]
    });
    std::fs::write(&input, serde_json::to_vec(&payload).unwrap()).unwrap();

    let host = LocalHost::new(&input, Some(output.clone()));
    let outcome = run_with_host(&host, &Config::default()).await.unwrap();
    assert_eq!(outcome.source_total, 4);
    assert_eq!(outcome.failures, 1);
    assert_eq!(outcome.discarded.len(), 1);

    let written: Vec<Value> = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(written.len(), 2);

    let first = written.iter().find(|i| i["orderId"] == "ord-1").unwrap();
    assert_eq!(first["delayHours"], json!(48.0));
    assert_eq!(first["carrierStatusDescription"], "Shipment delayed due to weather");
    assert_eq!(first["carrierStatusCode"], "IN_TRANSIT_DELAYED");
    assert_eq!(first["estimatedDelivery"], "2024-02-10T00:00:00Z");
    assert_eq!(first["carrier"], "ACME");
    assert_eq!(first["metadata"]["lane"], "EU-2");
    assert!(first["incidentId"].as_str().unwrap().starts_with("DELAY-ORD-1-"));
    assert!(first.get("region").is_none());

    let third = written.iter().find(|i| i["orderId"] == "ord-3").unwrap();
    assert_eq!(third["incidentId"], "INC-3");
    assert_eq!(third["carrierStatusDescription"], "Service alert");
    assert_eq!(third["promisedDeliveryDate"], "2024-02-09T00:00:00Z");
}

#[tokio::test]
async fn timed_out_source_does_not_sink_batch() {
    let base = serve().await;
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("incidents.json");

    let payload = json!({
        "requestTimeoutSeconds": 0.3,
        "sources": [
            {"url": format!("{base}/hang"), "orderId": "slow"},
            {
                "url": format!("{base}/api/1"),
                "orderId": "fast",
                "statusPaths": ["shipment.status"]
            }
        ]
    });
    std::fs::write(&input, serde_json::to_vec(&payload).unwrap()).unwrap();

    let host = LocalHost::new(&input, Some(output.clone()));
    let outcome = run_with_host(&host, &Config::default()).await.unwrap();
    assert_eq!(outcome.failures, 1);
    assert_eq!(outcome.incidents.len(), 1);
    assert_eq!(outcome.incidents[0].order_id, "fast");

    let written: Vec<Value> = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(written.len(), 1);
}
