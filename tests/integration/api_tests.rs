//! API integration tests
//!
//! Exercises the console endpoints with real HTTP requests against the
//! router, backed by a stub cluster backend.

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{snapshot_with_vms, TestApp};

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 3)).await;
    let response = app.get("/health").await;

    response.assert_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_readiness_is_unavailable_before_first_snapshot() {
    let app = TestApp::empty("test").await;
    let response = app.get("/health/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["stale"], true);
}

#[tokio::test]
async fn test_view_returns_first_page_by_default() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 120)).await;
    let response = app.get("/api/v1/view").await;

    response.assert_ok();
    let view: serde_json::Value = response.json();
    assert_eq!(view["cluster_id"], "test");
    assert_eq!(view["page_info"]["effective_page"], 1);
    assert_eq!(view["page_info"]["total_pages"], 3);
    assert_eq!(view["page_info"]["filtered_count"], 120);
    assert_eq!(view["rows"].as_array().unwrap().len(), 50);
    assert_eq!(view["node_count"], 2);
}

#[tokio::test]
async fn test_out_of_range_page_is_clamped() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 120)).await;

    // 120 items at 50/page is 3 pages; asking for page 4 shows page 3.
    let view: serde_json::Value = app
        .put_json("/api/v1/view/page", json!({"page": 4}))
        .await
        .json();

    assert_eq!(view["page_info"]["requested_page"], 4);
    assert_eq!(view["page_info"]["effective_page"], 3);
    assert_eq!(view["page_info"]["range_start"], 101);
    assert_eq!(view["page_info"]["range_end"], 120);
    assert_eq!(view["rows"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_search_filters_rows_and_resets_page() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 120)).await;
    app.put_json("/api/v1/view/page", json!({"page": 3})).await;

    let view: serde_json::Value = app
        .put_json("/api/v1/view/search", json!({"search": "vm01"}))
        .await
        .json();

    // vm010 through vm019 match "vm01".
    assert_eq!(view["page_info"]["effective_page"], 1);
    assert_eq!(view["page_info"]["filtered_count"], 10);
    for row in view["rows"].as_array().unwrap() {
        assert!(row["display_name"].as_str().unwrap().contains("vm01"));
    }
}

#[tokio::test]
async fn test_invalid_page_size_is_rejected() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 10)).await;

    let response = app
        .put_json("/api/v1/view/page-size", json!({"page_size": 25}))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    app.put_json("/api/v1/view/page-size", json!({"page_size": 200}))
        .await
        .assert_ok();
}

#[tokio::test]
async fn test_selection_survives_refresh_and_reports_vanished() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 5)).await;

    for id in [1, 2, 3] {
        app.post_json("/api/v1/view/selection/toggle", json!({"id": id}))
            .await
            .assert_ok();
    }

    // Resource 2 vanishes in the next tick; the selection is untouched.
    let mut next = snapshot_with_vms("test", 5);
    next.resources.retain(|r| r.id != 2);
    app.apply_snapshot(next).await;

    let view: serde_json::Value = app.get("/api/v1/view").await.json();
    assert_eq!(view["selected_count"], 3);

    // Bulk migration reports the vanished guest per item.
    let report: serde_json::Value = app
        .post_json("/api/v1/resources/bulk/migrate", json!({"target": "pve2"}))
        .await
        .json();
    assert_eq!(report["requested"], 3);
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["failed"], 1);

    let failed_item = report["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["ok"] == false)
        .unwrap();
    assert_eq!(failed_item["id"], 2);
    assert!(failed_item["error"]
        .as_str()
        .unwrap()
        .contains("no longer present"));
}

#[tokio::test]
async fn test_select_all_covers_every_match_not_just_page() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 120)).await;

    app.post("/api/v1/view/selection/all").await.assert_ok();
    let view: serde_json::Value = app.get("/api/v1/view").await.json();
    assert_eq!(view["selected_count"], 120);

    app.delete("/api/v1/view/selection").await.assert_ok();
    let view: serde_json::Value = app.get("/api/v1/view").await.json();
    assert_eq!(view["selected_count"], 0);
}

#[tokio::test]
async fn test_focus_follows_refresh_and_clears_on_vanish() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 5)).await;
    app.put_json("/api/v1/view/focus", json!({"id": 3}))
        .await
        .assert_ok();

    // The guest migrates; the focused copy follows.
    let mut next = snapshot_with_vms("test", 5);
    next.resources[2].node = "pve2".to_string();
    app.apply_snapshot(next).await;

    let view: serde_json::Value = app.get("/api/v1/view").await.json();
    assert_eq!(view["focused"]["id"], 3);
    assert_eq!(view["focused"]["node"], "pve2");

    // The guest vanishes; focus clears instead of pointing at stale data.
    let mut next = snapshot_with_vms("test", 5);
    next.resources.retain(|r| r.id != 3);
    app.apply_snapshot(next).await;

    let view: serde_json::Value = app.get("/api/v1/view").await.json();
    assert!(view["focused"].is_null());
}

#[tokio::test]
async fn test_reveal_jumps_to_containing_page() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 120)).await;
    app.put_json("/api/v1/view/search", json!({"search": "vm001"}))
        .await;

    // Position 73 in default id order lands on page 2 at 50/page.
    let view: serde_json::Value = app
        .post_json("/api/v1/view/reveal", json!({"id": 73}))
        .await
        .json();

    assert_eq!(view["query"]["search"], "");
    assert_eq!(view["query"]["filter"], "all");
    assert_eq!(view["page_info"]["effective_page"], 2);
    assert!(view["rows"]
        .as_array()
        .unwrap()
        .iter()
        .any(|row| row["id"] == 73));
}

#[tokio::test]
async fn test_resource_command_reaches_backend() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 3)).await;

    let response = app.post("/api/v1/resources/2/shutdown").await;
    response.assert_status(StatusCode::ACCEPTED);

    let commands = app.backend.commands.lock().await;
    assert_eq!(commands.as_slice(), ["shutdown:2"]);
}

#[tokio::test]
async fn test_command_on_unknown_resource_is_404() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 3)).await;

    let response = app.post("/api/v1/resources/999/start").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert!(app.backend.commands.lock().await.is_empty());
}

#[tokio::test]
async fn test_duplicate_command_is_conflict() {
    use chrono::Utc;
    use clusterdeck::console::ResourceAction;

    let app = TestApp::with_snapshot(snapshot_with_vms("test", 3)).await;

    // Claim the slot as if a command were still in flight.
    app.state
        .console
        .write()
        .await
        .dispatch_resource(1, ResourceAction::Start, Utc::now())
        .unwrap();

    let response = app.post("/api/v1/resources/1/start").await;
    response.assert_status(StatusCode::CONFLICT);
    assert!(app.backend.commands.lock().await.is_empty());
}

#[tokio::test]
async fn test_failed_command_surfaces_notification() {
    use std::sync::atomic::Ordering;

    let app = TestApp::with_snapshot(snapshot_with_vms("test", 3)).await;
    app.backend.fail_next_command.store(true, Ordering::SeqCst);

    let response = app.post("/api/v1/resources/1/reboot").await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let notifications: Vec<serde_json::Value> = app.get("/api/v1/notifications").await.json();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["level"], "error");
    assert!(notifications[0]["message"]
        .as_str()
        .unwrap()
        .contains("reboot"));

    // The control is re-actionable after the failure settled.
    app.post("/api/v1/resources/1/reboot")
        .await
        .assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_cluster_switch_resets_view() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 10)).await;
    app.post_json("/api/v1/view/selection/toggle", json!({"id": 1}))
        .await;

    let view: serde_json::Value = app
        .put_json("/api/v1/view/cluster", json!({"cluster_id": "staging"}))
        .await
        .json();

    assert_eq!(view["cluster_id"], "staging");
    assert_eq!(view["selected_count"], 0);
    assert_eq!(view["page_info"]["filtered_count"], 0);

    // A late snapshot from the previous cluster must not repopulate it.
    app.apply_snapshot(snapshot_with_vms("test", 10)).await;
    let view: serde_json::Value = app.get("/api/v1/view").await.json();
    assert_eq!(view["page_info"]["filtered_count"], 0);
}
