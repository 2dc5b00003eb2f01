#![allow(clippy::unwrap_used)]
// Integration tests for `IaqClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aerium_api::{Error, IaqClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, IaqClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = IaqClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Measurement window ──────────────────────────────────────────────

#[tokio::test]
async fn test_measurement_window() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "_time": "2026-03-02T09:10:00Z",
            "co2": 820.0,
            "pm25": 7.5,
            "tvoc": 120.0,
            "temperature": 21.0,
            "humidity": 48.0,
            "global_score": 84.0,
            "global_level": "good"
        },
        {
            "_time": "2026-03-02T09:05:00Z",
            "co2": 790.0
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/api/iaq/window"))
        .and(query_param("enseigne", "Maison"))
        .and(query_param("salle", "Bureau"))
        .and(query_param("hours", "1"))
        .and(query_param("step", "1min"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let records = client
        .measurement_window("Maison", "Bureau", 1, "1min")
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].co2, Some(820.0));
    assert_eq!(records[0].global_level.as_deref(), Some("good"));
    // Second record has only CO2 — other fields come back as None.
    assert!(records[1].pm25.is_none());
}

#[tokio::test]
async fn test_measurement_window_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/iaq/window"))
        .respond_with(ResponseTemplate::new(503).set_body_string("storage offline"))
        .mount(&server)
        .await;

    let result = client.measurement_window("Maison", "Bureau", 1, "1min").await;

    match result {
        Err(Error::Backend { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "storage offline");
        }
        other => panic!("expected Backend error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_measurement_window_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/iaq/window"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.measurement_window("Maison", "Bureau", 1, "1min").await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Site configuration ──────────────────────────────────────────────

#[tokio::test]
async fn test_site_config() {
    let (server, client) = setup().await;

    let body = json!({
        "lieux": {
            "active": true,
            "enseignes": [
                {
                    "id": "e1",
                    "nom": "Maison",
                    "pieces": [
                        { "id": "p1", "nom": "Bureau", "type": "bureau" },
                        { "id": "p2", "nom": "Chambre", "type": "chambre" }
                    ]
                },
                {
                    "id": "e2",
                    "nom": "Atelier",
                    "pieces": []
                }
            ]
        }
    });

    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let config = client.site_config().await.unwrap();

    assert!(config.lieux.active);
    assert_eq!(config.lieux.enseignes.len(), 2);
    assert_eq!(config.lieux.enseignes[0].nom, "Maison");
    assert_eq!(config.lieux.enseignes[0].pieces.len(), 2);
    assert!(config.lieux.enseignes[1].pieces.is_empty());
}

// ── Predictions ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_preventive_actions() {
    let (server, client) = setup().await;

    let body = json!({
        "predicted_score": 58.5,
        "actions": [
            {
                "device": "ventilation",
                "action": "activer_ventilation",
                "priority": "high",
                "parameter": "co2",
                "current_value": 1180.0,
                "predicted_value": 1420.0,
                "reason": "co2 trending up"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/iaq/actions/preventive"))
        .and(query_param("enseigne", "Maison"))
        .and(query_param("salle", "Bureau"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let prediction = client.preventive_actions("Maison", "Bureau").await.unwrap();

    assert_eq!(prediction.predicted_score, Some(58.5));
    assert_eq!(prediction.actions.len(), 1);
    assert_eq!(prediction.actions[0].device, "ventilation");
    assert_eq!(prediction.actions[0].priority.as_deref(), Some("high"));
}

#[tokio::test]
async fn test_preventive_actions_empty_payload() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/iaq/actions/preventive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let prediction = client.preventive_actions("Maison", "Bureau").await.unwrap();

    assert!(prediction.actions.is_empty());
    assert!(prediction.predicted_score.is_none());
}
