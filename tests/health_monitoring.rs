//! Health check monitoring scenarios against an in-memory registry.

use std::sync::Arc;
use std::time::Duration;

use origin_health::health::{CheckSummary, HealthCheckMonitoringService, MonitorSettings};
use origin_health::registry::ObjectStore;

mod common;
use common::{eventually, health_tags_of, record, set, tags_of, Failing, Meddling, Recording, Slow};

fn monitor(store: &Arc<ObjectStore>, path: &str, active: u32, inactive: u32) -> HealthCheckMonitoringService {
    HealthCheckMonitoringService::new(
        store.clone(),
        MonitorSettings::new("aaa", path, Duration::from_millis(100)).with_thresholds(active, inactive),
    )
}

#[tokio::test]
async fn test_probes_discovered_objects_at_configured_path() {
    let store = Arc::new(ObjectStore::new());
    let handler01 = Recording::new(200);
    let handler02 = Recording::new(200);
    record(&store, "aaa-01", "aaa", &[], handler01.clone());
    record(&store, "aaa-02", "aaa", &[], handler02.clone());

    let monitor = monitor(&store, "/healthCheck.txt", 3, 3);
    monitor.run_checks().await;

    assert_eq!(handler01.paths(), vec!["/healthCheck.txt"]);
    assert_eq!(handler02.paths(), vec!["/healthCheck.txt"]);

    // ... and re-tags after each probe
    for name in ["aaa-01", "aaa-02"] {
        assert_eq!(
            health_tags_of(&store, name),
            vec!["healthcheck=passing:1", "state=unreachable"],
            "object '{name}' is tagged with {:?}",
            tags_of(&store, name)
        );
    }
}

#[tokio::test]
async fn test_untagged_object_becomes_active_after_threshold() {
    let store = Arc::new(ObjectStore::new());
    record(&store, "aaa-01", "aaa", &[], Recording::new(200));
    let monitor = monitor(&store, "/", 3, 3);

    monitor.run_checks().await;
    monitor.run_checks().await;
    assert_eq!(
        health_tags_of(&store, "aaa-01"),
        vec!["healthcheck=passing:2", "state=unreachable"]
    );

    monitor.run_checks().await;
    assert_eq!(tags_of(&store, "aaa-01"), set(&["lbGroup=aaa", "state=active"]));
}

#[tokio::test]
async fn test_failing_active_object_counts_down_to_unreachable() {
    let store = Arc::new(ObjectStore::new());
    record(&store, "aaa-03", "aaa", &["state=active"], Failing::new());
    let monitor = monitor(&store, "/", 3, 3);

    monitor.run_checks().await;
    assert_eq!(
        health_tags_of(&store, "aaa-03"),
        vec!["healthcheck=failing:1", "state=active"]
    );

    monitor.run_checks().await;
    assert_eq!(
        health_tags_of(&store, "aaa-03"),
        vec!["healthcheck=failing:2", "state=active"]
    );

    monitor.run_checks().await;
    assert_eq!(health_tags_of(&store, "aaa-03"), vec!["state=unreachable"]);
}

#[tokio::test]
async fn test_failing_unreachable_object_stays_unreachable() {
    let store = Arc::new(ObjectStore::new());
    record(&store, "aaa-04", "aaa", &["state=unreachable", "healthcheck=passing:2"], Failing::new());
    let monitor = monitor(&store, "/", 3, 3);

    monitor.run_checks().await;
    monitor.run_checks().await;
    assert_eq!(health_tags_of(&store, "aaa-04"), vec!["state=unreachable"]);
}

#[tokio::test]
async fn test_success_resets_failing_streak() {
    let store = Arc::new(ObjectStore::new());
    record(&store, "aaa-01", "aaa", &["state=active", "healthcheck=failing:2"], Recording::new(204));
    let monitor = monitor(&store, "/", 3, 3);

    monitor.run_checks().await;
    assert_eq!(health_tags_of(&store, "aaa-01"), vec!["state=active"]);
}

#[tokio::test]
async fn test_rejected_status_counts_as_failure() {
    let store = Arc::new(ObjectStore::new());
    record(&store, "aaa-01", "aaa", &["state=active"], Recording::new(503));
    let monitor = monitor(&store, "/", 3, 1);

    monitor.run_checks().await;
    assert_eq!(health_tags_of(&store, "aaa-01"), vec!["state=unreachable"]);
}

#[tokio::test]
async fn test_closed_objects_are_never_probed_or_retagged() {
    let store = Arc::new(ObjectStore::new());
    let closed = Recording::new(200);
    record(&store, "aaa-06", "aaa", &["state=closed", "healthcheck=passing:1"], closed.clone());
    let before = tags_of(&store, "aaa-06");
    let monitor = monitor(&store, "/", 1, 1);

    for _ in 0..5 {
        let summary = monitor.run_checks().await;
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.probed, 0);
    }

    assert_eq!(closed.calls(), 0);
    assert_eq!(tags_of(&store, "aaa-06"), before);
    assert_eq!(store.get("aaa-06").unwrap().version, 1);
}

#[tokio::test]
async fn test_other_groups_are_ignored() {
    let store = Arc::new(ObjectStore::new());
    let other = Recording::new(200);
    record(&store, "bbb-01", "bbb", &[], other.clone());
    let monitor = monitor(&store, "/", 1, 1);

    monitor.run_checks().await;
    assert_eq!(other.calls(), 0);
    assert_eq!(tags_of(&store, "bbb-01"), set(&["lbGroup=bbb"]));
}

#[tokio::test]
async fn test_one_failing_object_does_not_affect_others() {
    let store = Arc::new(ObjectStore::new());
    let failing = Failing::new();
    let hanging = Slow::new(Duration::from_secs(5), 200);
    let healthy = Recording::new(200);
    record(&store, "aaa-a", "aaa", &["state=active"], failing.clone());
    record(&store, "aaa-b", "aaa", &["state=active"], hanging);
    record(&store, "aaa-c", "aaa", &["state=unreachable"], healthy.clone());

    let monitor = HealthCheckMonitoringService::new(
        store.clone(),
        MonitorSettings::new("aaa", "/", Duration::from_millis(100))
            .with_thresholds(3, 3)
            .with_probe_timeout(Duration::from_millis(50)),
    );

    let summary = tokio::time::timeout(Duration::from_secs(2), monitor.run_checks())
        .await
        .expect("a hanging origin must not stall the cycle");

    assert_eq!(summary.probed, 3);
    assert_eq!(failing.calls(), 1);
    assert_eq!(healthy.calls(), 1);
    assert_eq!(health_tags_of(&store, "aaa-a"), vec!["healthcheck=failing:1", "state=active"]);
    assert_eq!(health_tags_of(&store, "aaa-b"), vec!["healthcheck=failing:1", "state=active"]);
    assert_eq!(
        health_tags_of(&store, "aaa-c"),
        vec!["healthcheck=passing:1", "state=unreachable"]
    );
}

#[tokio::test]
async fn test_object_removed_mid_cycle_is_skipped() {
    let store = Arc::new(ObjectStore::new());
    let remover = Arc::new(Meddling {
        store: store.clone(),
        effect: |store: &origin_health::ObjectStore| {
            store.remove("aaa-01");
        },
    });
    record(&store, "aaa-01", "aaa", &[], remover);
    record(&store, "aaa-02", "aaa", &[], Recording::new(200));
    let monitor = monitor(&store, "/", 1, 1);

    let summary = monitor.run_checks().await;

    assert_eq!(
        summary,
        CheckSummary {
            probed: 2,
            skipped: 0,
            transitions: 1,
            vanished: 1
        }
    );
    assert!(store.get("aaa-01").is_none());
    assert_eq!(health_tags_of(&store, "aaa-02"), vec!["state=active"]);
}

#[tokio::test]
async fn test_administrative_state_set_during_probe_is_honoured() {
    let store = Arc::new(ObjectStore::new());
    let closer = Arc::new(Meddling {
        store: store.clone(),
        effect: |store: &origin_health::ObjectStore| {
            store.update_tags("aaa-01", |tags| {
                let mut next: std::collections::BTreeSet<String> =
                    tags.iter().filter(|t| !t.starts_with("state=")).cloned().collect();
                next.insert("state=closed".to_string());
                next
            });
        },
    });
    record(&store, "aaa-01", "aaa", &["state=unreachable"], closer);
    let monitor = monitor(&store, "/", 1, 1);

    monitor.run_checks().await;
    assert_eq!(health_tags_of(&store, "aaa-01"), vec!["state=closed"]);
}

#[tokio::test]
async fn test_stop_normalizes_group() {
    let store = Arc::new(ObjectStore::new());
    let created = "created:test";
    record(&store, "aaa-01", "aaa", &[created], Recording::new(200));
    record(&store, "aaa-02", "aaa", &["state=active"], Recording::new(200));
    record(&store, "aaa-03", "aaa", &["state=active", "healthcheck=failing:1"], Recording::new(200));
    record(&store, "aaa-04", "aaa", &["state=unreachable"], Recording::new(200));
    record(&store, "aaa-05", "aaa", &["state=unreachable", "healthcheck=passing:1", created], Recording::new(200));
    record(&store, "aaa-06", "aaa", &["state=closed"], Recording::new(200));
    record(&store, "bbb-01", "bbb", &["state=unreachable"], Recording::new(200));

    let monitor = monitor(&store, "/", 2, 2);
    monitor.start().await.unwrap();
    let normalized = monitor.stop().await;

    assert_eq!(normalized, 4);
    assert_eq!(tags_of(&store, "aaa-01"), set(&["lbGroup=aaa", created, "state=active"]));
    assert_eq!(tags_of(&store, "aaa-02"), set(&["lbGroup=aaa", "state=active"]));
    assert_eq!(tags_of(&store, "aaa-03"), set(&["lbGroup=aaa", "state=active"]));
    assert_eq!(tags_of(&store, "aaa-04"), set(&["lbGroup=aaa", "state=active"]));
    assert_eq!(tags_of(&store, "aaa-05"), set(&["lbGroup=aaa", created, "state=active"]));
    assert_eq!(tags_of(&store, "aaa-06"), set(&["lbGroup=aaa", "state=closed"]));
    assert_eq!(tags_of(&store, "bbb-01"), set(&["lbGroup=bbb", "state=unreachable"]));
}

#[tokio::test]
async fn test_scheduled_checks_run_until_stopped() {
    let store = Arc::new(ObjectStore::new());
    let handler = Recording::new(200);
    record(&store, "aaa-01", "aaa", &[], handler.clone());

    let monitor = HealthCheckMonitoringService::new(
        store.clone(),
        MonitorSettings::new("aaa", "/health", Duration::from_millis(20)).with_thresholds(2, 2),
    );
    monitor.start().await.unwrap();

    let became_active = eventually(Duration::from_secs(2), || {
        health_tags_of(&store, "aaa-01") == vec!["state=active"]
    })
    .await;
    assert!(became_active, "tags: {:?}", tags_of(&store, "aaa-01"));

    monitor.stop().await;
    let calls_at_stop = handler.calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handler.calls(), calls_at_stop, "no probes after stop returns");
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_cycle() {
    let store = Arc::new(ObjectStore::new());
    let slow = Slow::new(Duration::from_millis(150), 500);
    record(&store, "aaa-01", "aaa", &["state=active"], slow.clone());

    let monitor = HealthCheckMonitoringService::new(
        store.clone(),
        MonitorSettings::new("aaa", "/", Duration::from_millis(10))
            .with_thresholds(1, 1)
            .with_probe_timeout(Duration::from_secs(1)),
    );
    monitor.start().await.unwrap();

    // Stop while the first probe is still waiting on the origin.
    slow.started.notified().await;
    monitor.stop().await;

    // The failed probe committed unreachable first, then normalization ran.
    let record = store.get("aaa-01").unwrap();
    assert_eq!(health_tags_of(&store, "aaa-01"), vec!["state=active"]);
    assert_eq!(record.version, 3);
}
