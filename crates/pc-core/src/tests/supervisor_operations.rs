use super::fakes::{Harness, Reply, test_config, test_node};
use crate::{NodeStateType, SupervisorConfig, SupervisorError, TimeoutProfile};

use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, is_empty, len, ok, pat, some};

const STOP_TIMEOUT: Duration = Duration::from_millis(10000);

async fn sweep_forever(harness: &Harness) {
    loop {
        harness.supervisor.sweep().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

// =========================================================================
// start_node
// =========================================================================

#[tokio::test(start_paused = true)]
async fn given_unconfigured_name_when_started_then_unknown_node_error() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);

    // When
    let result = harness.supervisor.start_node("nope", false).await;

    // Then
    assert_that!(result, err(pat!(SupervisorError::UnknownNode { .. })));
}

#[tokio::test(start_paused = true)]
async fn given_node_when_started_asynchronously_then_starting_immediately() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);

    // When
    let status = harness.supervisor.start_node("n1", false).await.unwrap();

    // Then
    assert_that!(status.state, eq(NodeStateType::Starting));
    assert_that!(harness.processes.spawn_count("n1"), eq(1));
}

#[tokio::test(start_paused = true)]
async fn given_node_that_comes_up_when_started_synchronously_then_returns_running() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_ping("n1", Reply::Ok);

    // When
    let status = harness.supervisor.start_node("n1", true).await.unwrap();

    // Then
    assert_that!(status.state, eq(NodeStateType::Running));
    assert_that!(harness.processes.spawn_count("n1"), eq(1));
}

#[tokio::test(start_paused = true)]
async fn given_spawn_failure_when_started_then_error_and_wont_start() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.processes.fail_spawns();

    // When
    let result = harness.supervisor.start_node("n1", false).await;

    // Then
    assert_that!(result, err(pat!(SupervisorError::Spawn { .. })));
    assert_that!(harness.state("n1"), eq(NodeStateType::WontStart));
}

// =========================================================================
// stop_node
// =========================================================================

#[tokio::test(start_paused = true)]
async fn given_running_node_when_stopped_then_stopping_after_shutdown_request() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_ping("n1", Reply::Ok);
    harness.supervisor.sweep().await;

    // When
    let status = harness.supervisor.stop_node("n1", STOP_TIMEOUT).await.unwrap();

    // Then
    assert_that!(status.state, eq(NodeStateType::Stopping));
    assert_that!(harness.admin.shutdowns("n1"), eq(1));
    assert_that!(harness.processes.kill_count("n1"), eq(0));
    assert_that!(
        harness.admin.shutdown_profile("n1"),
        some(eq(TimeoutProfile::Slow))
    );
}

#[tokio::test(start_paused = true)]
async fn given_stop_abandoned_by_caller_when_shutdown_answers_later_then_process_still_owned() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.supervisor.start_node("n1", false).await.unwrap();
    harness
        .admin
        .set_shutdown_delay("n1", Duration::from_secs(30));

    // When
    let abandoned = tokio::time::timeout(
        Duration::from_secs(5),
        harness.supervisor.stop_node("n1", STOP_TIMEOUT),
    )
    .await;
    harness.supervisor.sweep().await;

    // Then
    assert_that!(abandoned.is_err(), eq(true));
    let status = harness.supervisor.node_status("n1");
    assert_that!(status.state, eq(NodeStateType::Stopping));
    assert_that!(status.pid, some(eq(1001)));
    assert_that!(harness.processes.spawn_count("n1"), eq(1));
    assert_that!(harness.admin.shutdowns("n1"), eq(1));
}

#[tokio::test(start_paused = true)]
async fn given_shutdown_call_fails_when_stopped_then_killed_and_stopped() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_ping("n1", Reply::Ok);
    harness.supervisor.sweep().await;
    harness.admin.set_shutdown("n1", Reply::Refused);

    // When
    let status = harness.supervisor.stop_node("n1", STOP_TIMEOUT).await.unwrap();

    // Then
    assert_that!(status.state, eq(NodeStateType::Stopped));
    assert_that!(harness.processes.kill_count("n1"), eq(1));
}

#[tokio::test(start_paused = true)]
async fn given_no_admin_client_when_stopped_then_killed_and_stopped() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_unavailable("n1", true);
    harness.supervisor.sweep().await;

    // When
    let status = harness.supervisor.stop_node("n1", STOP_TIMEOUT).await.unwrap();

    // Then
    assert_that!(status.state, eq(NodeStateType::Stopped));
    assert_that!(harness.admin.shutdowns("n1"), eq(0));
}

#[tokio::test(start_paused = true)]
async fn given_starting_node_when_stopped_then_never_left_starting() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.supervisor.sweep().await;

    // When
    let status = harness.supervisor.stop_node("n1", STOP_TIMEOUT).await.unwrap();

    // Then
    assert_that!(status.state, eq(NodeStateType::Stopping));
}

#[tokio::test(start_paused = true)]
async fn given_unconfigured_name_when_stopped_then_unknown_node_error() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);

    // When
    let result = harness.supervisor.stop_node("nope", STOP_TIMEOUT).await;

    // Then
    assert_that!(result, err(pat!(SupervisorError::UnknownNode { .. })));
}

// =========================================================================
// delete_node
// =========================================================================

#[tokio::test(start_paused = true)]
async fn given_running_node_when_deleted_then_returns_after_stop_and_forgets_node() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_ping("n1", Reply::Ok);
    harness.supervisor.sweep().await;
    harness.admin.set_ping("n1", Reply::Refused);

    // When
    let result = tokio::select! {
        result = harness.supervisor.delete_node("n1", STOP_TIMEOUT) => result,
        _ = sweep_forever(&harness) => unreachable!(),
    };

    // Then
    assert_that!(result, ok(anything()));
    assert_that!(harness.admin.shutdowns("n1"), eq(1));
    assert_that!(harness.state("n1"), eq(NodeStateType::Unknown));
}

#[tokio::test(start_paused = true)]
async fn given_stopped_node_when_deleted_then_removed_without_shutdown() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.processes.fail_spawns();
    harness.supervisor.sweep().await;
    assert_that!(harness.state("n1"), eq(NodeStateType::WontStart));

    // When
    let result = harness.supervisor.delete_node("n1", STOP_TIMEOUT).await;

    // Then
    assert_that!(result, ok(anything()));
    assert_that!(harness.admin.shutdowns("n1"), eq(0));
    assert_that!(harness.state("n1"), eq(NodeStateType::Unknown));
}

#[tokio::test(start_paused = true)]
async fn given_deleted_node_still_configured_when_swept_then_not_respawned() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.supervisor.start_node("n1", false).await.unwrap();
    harness.processes.exit_latest("n1", 0);
    tokio::select! {
        result = harness.supervisor.delete_node("n1", STOP_TIMEOUT) => result.unwrap(),
        _ = sweep_forever(&harness) => unreachable!(),
    };
    let spawns = harness.processes.spawn_count("n1");

    // When
    for _ in 0..3 {
        harness.supervisor.sweep().await;
    }

    // Then
    assert_that!(harness.processes.spawn_count("n1"), eq(spawns));
    assert_that!(harness.state("n1"), eq(NodeStateType::Unknown));
    assert_that!(harness.supervisor.list_nodes(), is_empty());
}

#[tokio::test(start_paused = true)]
async fn given_deleted_node_when_started_again_then_swept_and_listed() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.processes.fail_spawns();
    harness.supervisor.sweep().await;
    harness
        .supervisor
        .delete_node("n1", STOP_TIMEOUT)
        .await
        .unwrap();

    // When
    let result = harness.supervisor.start_node("n1", false).await;
    harness.supervisor.sweep().await;

    // Then
    assert_that!(result, err(pat!(SupervisorError::Spawn { .. })));
    assert_that!(harness.state("n1"), eq(NodeStateType::WontStart));
    assert_that!(harness.supervisor.list_nodes(), len(eq(1)));
}

#[tokio::test(start_paused = true)]
async fn given_unconfigured_name_when_deleted_then_unknown_node_error() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);

    // When
    let result = harness.supervisor.delete_node("nope", STOP_TIMEOUT).await;

    // Then
    assert_that!(result, err(pat!(SupervisorError::UnknownNode { .. })));
}

// =========================================================================
// Status
// =========================================================================

#[tokio::test(start_paused = true)]
async fn given_untracked_node_when_status_read_then_synthetic_unknown() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);

    // When
    let status = harness.supervisor.node_status("ghost");

    // Then
    assert_that!(status.state, eq(NodeStateType::Unknown));
    assert_that!(status.name, eq("ghost"));
}

#[tokio::test(start_paused = true)]
async fn given_configured_nodes_when_listed_then_every_node_reported_by_name() {
    // Given
    let harness = Harness::new(vec![test_node("n2"), test_node("n1")]);
    harness.admin.set_ping("n2", Reply::Ok);
    harness.supervisor.sweep().await;

    // When
    let statuses = harness.supervisor.list_nodes();

    // Then
    assert_that!(statuses, len(eq(2)));
    assert_that!(statuses[0].name, eq("n1"));
    assert_that!(statuses[0].state, eq(NodeStateType::Starting));
    assert_that!(statuses[1].name, eq("n2"));
    assert_that!(statuses[1].state, eq(NodeStateType::Running));
}

// =========================================================================
// call_node_api
// =========================================================================

#[tokio::test(start_paused = true)]
async fn given_running_node_when_api_called_then_operation_runs_against_node() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_ping("n1", Reply::Ok);
    harness.supervisor.sweep().await;
    let pings = harness.admin.pings("n1");

    // When
    let result = harness
        .supervisor
        .call_node_api(Some("n1"), |api| async move { api.ping().await.is_ok() })
        .await;

    // Then
    assert_that!(result, ok(eq(&true)));
    assert_that!(harness.admin.pings("n1"), eq(pings + 1));
}

#[tokio::test(start_paused = true)]
async fn given_no_name_when_api_called_then_any_tracked_node_used() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_ping("n1", Reply::Ok);
    harness.supervisor.sweep().await;

    // When
    let result = harness
        .supervisor
        .call_node_api(None, |api| async move { api.shutdown().await.is_ok() })
        .await;

    // Then
    assert_that!(result, ok(eq(&true)));
    assert_that!(harness.admin.shutdowns("n1"), eq(1));
}

#[tokio::test(start_paused = true)]
async fn given_no_admin_client_when_api_called_then_temporarily_unavailable_with_last_state() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_unavailable("n1", true);
    harness.supervisor.sweep().await;

    // When
    let result = harness
        .supervisor
        .call_node_api(Some("n1"), |_api| async {})
        .await;

    // Then
    assert_that!(
        result,
        err(pat!(SupervisorError::TemporarilyUnavailable {
            name: eq("n1"),
            last_known: eq(&NodeStateType::Starting),
            ..
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn given_nothing_tracked_when_api_called_without_name_then_temporarily_unavailable() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);

    // When
    let result = harness.supervisor.call_node_api(None, |_api| async {}).await;

    // Then
    assert_that!(
        result,
        err(pat!(SupervisorError::TemporarilyUnavailable { .. }))
    );
}

// =========================================================================
// stop_all
// =========================================================================

#[tokio::test(start_paused = true)]
async fn given_running_nodes_when_all_stopped_then_every_node_down_and_none_restarted() {
    // Given
    let harness = Harness::new(vec![test_node("n1"), test_node("n2")]);
    harness.admin.set_ping("n1", Reply::Ok);
    harness.admin.set_ping("n2", Reply::Ok);
    harness.supervisor.sweep().await;
    harness.admin.set_ping("n1", Reply::Refused);
    harness.admin.set_ping("n2", Reply::Refused);

    // When
    let all_stopped = harness.supervisor.stop_all(STOP_TIMEOUT).await;
    harness.supervisor.sweep().await;

    // Then
    assert_that!(all_stopped, eq(true));
    assert_that!(harness.state("n1"), eq(NodeStateType::Stopped));
    assert_that!(harness.state("n2"), eq(NodeStateType::Stopped));
    assert_that!(harness.processes.spawn_count("n1"), eq(0));
    assert_that!(harness.supervisor.is_shutting_down(), eq(true));
}

#[tokio::test(start_paused = true)]
async fn given_node_ignoring_shutdown_when_all_stopped_then_killed_after_per_node_timeout() {
    // Given
    let harness = Harness::new(vec![test_node("n1")]);
    harness.admin.set_ping("n1", Reply::Ok);
    harness.supervisor.sweep().await;
    harness.admin.set_ping("n1", Reply::TimedOut);

    // When
    let all_stopped = harness.supervisor.stop_all(STOP_TIMEOUT).await;

    // Then
    assert_that!(all_stopped, eq(true));
    assert_that!(harness.state("n1"), eq(NodeStateType::Stopped));
    assert_that!(harness.processes.kill_count("n1"), eq(1));
}

#[tokio::test(start_paused = true)]
async fn given_overall_timeout_shorter_than_stop_when_all_stopped_then_gives_up() {
    // Given
    let config = SupervisorConfig {
        stop_all_timeout: Duration::from_millis(3000),
        ..test_config()
    };
    let harness = Harness::with_config(vec![test_node("n1")], config);
    harness.admin.set_ping("n1", Reply::Ok);
    harness.supervisor.sweep().await;
    harness.admin.set_ping("n1", Reply::TimedOut);

    // When
    let all_stopped = harness.supervisor.stop_all(STOP_TIMEOUT).await;

    // Then
    assert_that!(all_stopped, eq(false));
    assert_that!(harness.state("n1"), eq(NodeStateType::Stopping));
}
