//! Node workflow integration tests
//!
//! Maintenance and update state machines as seen through the API: banner
//! projection, action gating and the acknowledgement flow.

use axum::http::StatusCode;
use serde_json::json;

use clusterdeck::models::{
    MaintenanceStatus, MaintenanceTask, Snapshot, UpdatePhase, UpdateStatus, UpdateTask,
};

use crate::common::{online_node, snapshot_with_vms, TestApp};

fn maintenance(status: MaintenanceStatus, acknowledged: bool) -> MaintenanceTask {
    MaintenanceTask {
        status,
        migrated_count: 2,
        total_vms: 4,
        current_vm: None,
        failed_vms: vec![],
        acknowledged,
        error: None,
    }
}

fn snapshot_with_maintenance(status: MaintenanceStatus, acknowledged: bool) -> Snapshot {
    let mut snapshot = snapshot_with_vms("test", 4);
    snapshot.nodes[0].maintenance = Some(maintenance(status, acknowledged));
    snapshot
}

#[tokio::test]
async fn test_idle_node_offers_enter_maintenance_only() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 2)).await;

    let body: serde_json::Value = app.get("/api/v1/nodes").await.json();
    assert_eq!(body["node_count"], 2);

    let node = &body["nodes"][0];
    assert_eq!(node["projection"]["banner"], "none");
    assert_eq!(
        node["projection"]["enabled_actions"],
        json!(["enter_maintenance"])
    );
    assert!(node["maintenance_progress"].is_null());
}

#[tokio::test]
async fn test_evacuating_node_reports_progress_and_locks_reboot() {
    let app =
        TestApp::with_snapshot(snapshot_with_maintenance(MaintenanceStatus::Evacuating, false))
            .await;

    let body: serde_json::Value = app.get("/api/v1/nodes").await.json();
    let node = &body["nodes"][0];
    assert_eq!(node["projection"]["banner"], "evacuating");
    // 2 of 4 guests migrated.
    assert_eq!(node["maintenance_progress"], 50.0);

    // Reboot is locked while evacuation runs; rejected before the backend.
    let response = app.post("/api/v1/nodes/pve1/reboot").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.backend.commands.lock().await.is_empty());

    // Leaving maintenance mid-evacuation is always possible.
    app.post("/api/v1/nodes/pve1/exit_maintenance")
        .await
        .assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_errors_must_be_acknowledged_before_unlock() {
    let app = TestApp::with_snapshot(snapshot_with_maintenance(
        MaintenanceStatus::CompletedWithErrors,
        false,
    ))
    .await;

    let body: serde_json::Value = app.get("/api/v1/nodes").await.json();
    let node = &body["nodes"][0];
    assert_eq!(node["projection"]["banner"], "completed_with_errors_unacked");

    // Update start stays locked until the errors are acknowledged.
    app.post("/api/v1/nodes/pve1/start_update")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.post("/api/v1/nodes/pve1/acknowledge_errors")
        .await
        .assert_status(StatusCode::ACCEPTED);

    // The backend confirms the acknowledgement in the next snapshot; only
    // then does the disruptive action set unlock.
    app.apply_snapshot(snapshot_with_maintenance(
        MaintenanceStatus::CompletedWithErrors,
        true,
    ))
    .await;

    let body: serde_json::Value = app.get("/api/v1/nodes").await.json();
    let actions = body["nodes"][0]["projection"]["enabled_actions"]
        .as_array()
        .unwrap()
        .clone();
    assert!(actions.contains(&json!("start_update")));
    assert!(actions.contains(&json!("reboot")));

    app.post("/api/v1/nodes/pve1/start_update")
        .await
        .assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_running_update_locks_all_actions() {
    let mut snapshot = snapshot_with_maintenance(MaintenanceStatus::Completed, false);
    snapshot.nodes[0].update = Some(UpdateTask {
        status: UpdateStatus::Running,
        phase: Some(UpdatePhase::AptUpgrade),
        output_lines: vec![],
        packages_upgraded: 12,
        error: None,
        with_reboot: true,
    });
    let app = TestApp::with_snapshot(snapshot).await;

    let body: serde_json::Value = app.get("/api/v1/nodes").await.json();
    let node = &body["nodes"][0];
    assert_eq!(node["projection"]["enabled_actions"], json!([]));
    assert_eq!(node["projection"]["update"]["phase_label"], "apt upgrade");
    assert_eq!(node["projection"]["update"]["dismissible"], false);

    app.post("/api/v1/nodes/pve1/reboot")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    app.post("/api/v1/nodes/pve1/exit_maintenance")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_failed_update_stays_until_dismissed() {
    let mut snapshot = snapshot_with_maintenance(MaintenanceStatus::Completed, false);
    snapshot.nodes[0].update = Some(UpdateTask {
        status: UpdateStatus::Failed,
        phase: Some(UpdatePhase::AptUpgrade),
        output_lines: vec![],
        packages_upgraded: 0,
        error: Some("disk full".to_string()),
        with_reboot: false,
    });
    let app = TestApp::with_snapshot(snapshot).await;

    let body: serde_json::Value = app.get("/api/v1/nodes").await.json();
    let node = &body["nodes"][0];
    assert_eq!(node["projection"]["update"]["dismissible"], true);
    assert_eq!(node["projection"]["update"]["error"], "disk full");

    // A second update cannot start over an undismissed failure.
    app.post("/api/v1/nodes/pve1/start_update")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.post("/api/v1/nodes/pve1/dismiss_update")
        .await
        .assert_status(StatusCode::ACCEPTED);
    assert_eq!(
        app.backend.commands.lock().await.as_slice(),
        ["dismiss_update:pve1"]
    );
}

#[tokio::test]
async fn test_command_on_unknown_node_is_404() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 1)).await;

    app.post("/api/v1/nodes/pve9/reboot")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_node_history_present_after_snapshots() {
    let app = TestApp::with_snapshot(snapshot_with_vms("test", 1)).await;

    // Two more ticks so the sparkline series carries real samples.
    app.apply_snapshot(snapshot_with_vms("test", 1)).await;
    app.apply_snapshot(snapshot_with_vms("test", 1)).await;

    let body: serde_json::Value = app.get("/api/v1/nodes").await.json();
    let history = &body["nodes"][0]["history"];
    assert_eq!(history["cpu"]["samples"].as_array().unwrap().len(), 20);

    // A node that never appeared has no history.
    let names: Vec<&str> = body["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["pve1", "pve2"]);
}

#[tokio::test]
async fn test_offline_node_keeps_unknown_gauges_null() {
    let mut snapshot = snapshot_with_vms("test", 1);
    let mut offline = online_node("pve3");
    offline.status = clusterdeck::models::NodeStatus::Offline;
    offline.cpu_percent = None;
    offline.mem_percent = None;
    snapshot.nodes.push(offline);
    let app = TestApp::with_snapshot(snapshot).await;

    let body: serde_json::Value = app.get("/api/v1/nodes").await.json();
    let node = body["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["name"] == "pve3")
        .unwrap();
    assert_eq!(node["status"], "offline");
    // Unknown gauges stay null, never fabricated zeros.
    assert!(node["cpu_percent"].is_null());
    assert!(node["mem_percent"].is_null());
}
