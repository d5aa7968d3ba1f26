//! End-to-end coverage: drive a real `gst-daemon` session over loopback
//! TCP through the green-screen connector.

use std::sync::Arc;

use gst_component::{CancellationToken, Component, ComponentConfiguration};
use gst_daemon::{DaemonContext, LoanStore};
use gst_dict::DataDictionary;
use gst_engine::GreenScreenConnector;
use gst_transition::NavigationConfig;
use tokio::net::TcpListener;

const CATALOG_JSON: &str = r#"[
    {
        "screen_id": "SIGN_ON",
        "identifier": {"row": 1, "col": 30, "expected_text": "Sign On"},
        "fields": [
            {"name": "user_id", "type": "input", "row": 6, "col": 20, "length": 10},
            {"name": "password", "type": "input", "row": 7, "col": 20, "length": 10, "attributes": {"hidden": true}}
        ],
        "static_text": [{"row": 1, "col": 30, "text": "Sign On"}]
    },
    {
        "screen_id": "MAIN_MENU",
        "identifier": {"row": 1, "col": 30, "expected_text": "Main Menu"},
        "fields": [
            {"name": "user_id", "type": "display", "row": 3, "col": 20, "length": 10}
        ],
        "static_text": [{"row": 1, "col": 30, "text": "Main Menu"}]
    }
]"#;

const NAV_CONFIG_JSON: &str = r#"{
    "initial_screen": "SIGN_ON",
    "credentials": [{"user_id": "jsmith", "password": "secret"}],
    "transitions": [
        {
            "source_screen": "SIGN_ON",
            "aid_key": "Enter",
            "conditions": {"user_id": "not_empty"},
            "target_screen": "MAIN_MENU",
            "validation": "credentials"
        },
        {
            "source_screen": "SIGN_ON",
            "aid_key": "Enter",
            "target_screen": "SIGN_ON",
            "error_message": "User id is required"
        },
        {
            "source_screen": "MAIN_MENU",
            "aid_key": "F3",
            "target_screen": "SIGN_ON"
        }
    ]
}"#;

/// Spins up a real `gst-daemon` session server on an OS-assigned
/// loopback port and returns its address plus the shutdown handle.
async fn spawn_daemon() -> (std::net::SocketAddr, CancellationToken) {
    let nav_config = NavigationConfig::from_json(NAV_CONFIG_JSON).unwrap();
    let catalog = gst_catalog::ScreenCatalog::from_definitions(serde_json::from_str(CATALOG_JSON).unwrap()).unwrap();
    let ctx = Arc::new(DaemonContext {
        catalog,
        nav_config: Arc::new(nav_config),
        loan_store: Arc::new(LoanStore::empty()),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let task_shutdown = shutdown.clone();
    tokio::spawn(async move {
        gst_daemon::run(listener, ctx, task_shutdown).await;
    });
    (addr, shutdown)
}

fn engine_config(port: u16, catalog_path: &std::path::Path, steps: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "connection": {"host": "127.0.0.1", "port": port},
        "screen_catalog_path": catalog_path.to_str().unwrap(),
        "steps": steps,
    })
}

#[tokio::test]
async fn successful_sign_on_and_scrape() {
    let (addr, _shutdown) = spawn_daemon().await;

    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    std::fs::write(&catalog_path, CATALOG_JSON).unwrap();

    let steps = serde_json::json!([
        {
            "name": "sign_on",
            "type": "navigate",
            "fields": {"user_id": "{{user_id}}", "password": "{{password}}"},
            "aid_key": "Enter",
            "expect_screen": "MAIN_MENU"
        },
        {
            "name": "scrape_user",
            "type": "scrape",
            "scrape_fields": ["user_id"]
        }
    ]);

    let config = ComponentConfiguration {
        component_type: "green_screen_connector".to_string(),
        version: "1.0".to_string(),
        config_blob: engine_config(addr.port(), &catalog_path, steps),
    };

    let mut dict = DataDictionary::from_entries([("user_id".to_string(), "jsmith".to_string()), ("password".to_string(), "secret".to_string())]);

    let connector = GreenScreenConnector::new();
    let result = connector.execute(&config, &mut dict, CancellationToken::new()).await;

    assert_eq!(result.status, gst_component::ComponentStatus::Success, "{:?}", result.error);
    assert_eq!(result.output_data.get("user_id"), Some(&"jsmith".to_string()));
}

#[tokio::test]
async fn wrong_password_fails_the_navigate_step() {
    let (addr, _shutdown) = spawn_daemon().await;

    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    std::fs::write(&catalog_path, CATALOG_JSON).unwrap();

    let steps = serde_json::json!([
        {
            "name": "sign_on",
            "type": "navigate",
            "fields": {"user_id": "{{user_id}}", "password": "{{password}}"},
            "aid_key": "Enter",
            "expect_screen": "MAIN_MENU"
        }
    ]);

    let config = ComponentConfiguration {
        component_type: "green_screen_connector".to_string(),
        version: "1.0".to_string(),
        config_blob: engine_config(addr.port(), &catalog_path, steps),
    };

    let mut dict = DataDictionary::from_entries([("user_id".to_string(), "jsmith".to_string()), ("password".to_string(), "wrong".to_string())]);

    let connector = GreenScreenConnector::new();
    let result = connector.execute(&config, &mut dict, CancellationToken::new()).await;

    assert_eq!(result.status, gst_component::ComponentStatus::Failure);
    assert_eq!(result.error.unwrap().code, "SCREEN_MISMATCH");
}
