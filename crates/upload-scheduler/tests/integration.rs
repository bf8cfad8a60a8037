//! Integration tests exercising `UploadScheduler` end-to-end.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use upload_scheduler::testing::MapUserService;
use upload_scheduler::{GroupConfig, SchedulerConfig};
use upload_scheduler::UploadScheduler;

fn default_group_config(priority: i64, slots: i64, strategy: &str) -> SchedulerConfig {
    let mut config = SchedulerConfig::single_slot_default();
    config.default = GroupConfig {
        priority,
        slots,
        strategy: strategy.to_string(),
    };
    config
}

async fn resolved(fut: &mut (impl std::future::Future<Output = ()> + Unpin)) -> bool {
    timeout(Duration::from_millis(50), fut).await.is_ok()
}

#[tokio::test]
async fn single_slot_fifo_across_users() {
    // Scenario A.
    let users = Arc::new(MapUserService::new([
        ("alice".to_string(), "default".to_string()),
        ("bob".to_string(), "default".to_string()),
    ]));
    let mut config = default_group_config(1, 1, "FirstInFirstOut");
    config.global_slots = 1;
    let scheduler = UploadScheduler::new(config, users).unwrap();

    scheduler.enqueue("alice", "f1").await;
    scheduler.enqueue("bob", "f2").await;

    let mut alice = scheduler.await_start("alice", "f1").await.unwrap();
    let mut bob = scheduler.await_start("bob", "f2").await.unwrap();

    assert!(resolved(&mut alice).await, "alice's upload should resolve immediately");
    assert!(!resolved(&mut bob).await, "bob's upload should remain pending");

    scheduler.complete("alice", "f1").await.unwrap();
    assert!(
        resolved(&mut bob).await,
        "bob's upload should resolve after alice completes"
    );
    scheduler.complete("bob", "f2").await.unwrap();
}

#[tokio::test]
async fn privileged_group_wins_over_default_regardless_of_arrival_order() {
    // Scenario B.
    let users = Arc::new(MapUserService::new([
        ("bob".to_string(), "default".to_string()),
        ("carol".to_string(), "privileged".to_string()),
        ("dan".to_string(), "default".to_string()),
    ]));
    let mut config = default_group_config(1, 2, "FirstInFirstOut");
    config.global_slots = 1;
    let scheduler = UploadScheduler::new(config, users).unwrap();

    scheduler.enqueue("bob", "f1").await;
    scheduler.await_start("bob", "f1").await.unwrap().await;

    // The single global slot is now held by bob. Both dan and carol queue up
    // behind it; dan arrives first, but carol's privileged group outranks
    // dan's default group.
    scheduler.enqueue("dan", "f3").await;
    let mut dan = scheduler.await_start("dan", "f3").await.unwrap();

    scheduler.enqueue("carol", "f4").await;
    let mut carol_f4 = scheduler.await_start("carol", "f4").await.unwrap();

    assert!(!resolved(&mut dan).await, "dan should still be waiting on bob's slot");
    assert!(
        !resolved(&mut carol_f4).await,
        "carol should still be waiting on bob's slot"
    );

    scheduler.complete("bob", "f1").await.unwrap();

    assert!(
        resolved(&mut carol_f4).await,
        "carol's privileged upload should jump ahead of dan's once the slot frees up"
    );
    assert!(
        !resolved(&mut dan).await,
        "dan's default-group upload should still be waiting on a slot"
    );

    scheduler.complete("carol", "f4").await.unwrap();

    assert!(
        resolved(&mut dan).await,
        "dan's upload should release once carol's completes and no other privileged upload is ready"
    );
    scheduler.complete("dan", "f3").await.unwrap();
}

#[tokio::test]
async fn round_robin_interleaves_a_newly_ready_user() {
    // Scenario C.
    let users = Arc::new(MapUserService::new([
        ("alice".to_string(), "default".to_string()),
        ("bob".to_string(), "default".to_string()),
    ]));
    let mut config = default_group_config(1, 1, "RoundRobin");
    config.global_slots = 1;
    let scheduler = UploadScheduler::new(config, users).unwrap();

    scheduler.enqueue("alice", "f1").await;
    scheduler.enqueue("alice", "f2").await;
    scheduler.enqueue("alice", "f3").await;

    let f1 = scheduler.await_start("alice", "f1").await.unwrap();
    f1.await;
    scheduler.complete("alice", "f1").await.unwrap();

    scheduler.enqueue("bob", "g1").await;
    let mut g1 = scheduler.await_start("bob", "g1").await.unwrap();
    let mut f2 = scheduler.await_start("alice", "f2").await.unwrap();

    assert!(
        resolved(&mut g1).await,
        "bob's g1 became ready before alice's f2, so it goes next"
    );
    assert!(!resolved(&mut f2).await, "alice's f2 should still be waiting");
    scheduler.complete("bob", "g1").await.unwrap();

    assert!(resolved(&mut f2).await, "alice's f2 should release once g1 completes");
    scheduler.complete("alice", "f2").await.unwrap();

    let mut f3 = scheduler.await_start("alice", "f3").await.unwrap();
    assert!(resolved(&mut f3).await);
    scheduler.complete("alice", "f3").await.unwrap();
}

#[tokio::test]
async fn reconfiguration_preserves_in_flight_accounting() {
    // Scenario D.
    let users = Arc::new(MapUserService::new([
        ("alice".to_string(), "default".to_string()),
        ("bob".to_string(), "default".to_string()),
    ]));
    let mut config = default_group_config(1, 1, "FirstInFirstOut");
    config.global_slots = 1;
    let scheduler = UploadScheduler::new(config, users).unwrap();

    scheduler.enqueue("alice", "f1").await;
    scheduler.await_start("alice", "f1").await.unwrap().await;

    let mut wider = default_group_config(1, 2, "FirstInFirstOut");
    wider.global_slots = 2;
    scheduler.reconfigure(wider).await.unwrap();

    scheduler.enqueue("bob", "g1").await;
    let mut bob = scheduler.await_start("bob", "g1").await.unwrap();
    assert!(
        resolved(&mut bob).await,
        "bob should be released immediately once default has a second slot"
    );

    scheduler.complete("alice", "f1").await.unwrap();
    scheduler.complete("bob", "g1").await.unwrap();
}

#[tokio::test]
async fn completing_an_upload_whose_group_vanished_does_not_crash() {
    // Scenario E.
    let users = Arc::new(MapUserService::new([
        ("alice".to_string(), "experimental".to_string()),
        ("bob".to_string(), "default".to_string()),
    ]));
    let mut config = default_group_config(1, 1, "FirstInFirstOut");
    config.global_slots = 2;
    config.user_defined.insert(
        "experimental".to_string(),
        GroupConfig {
            priority: 2,
            slots: 1,
            strategy: "FirstInFirstOut".to_string(),
        },
    );
    let scheduler = UploadScheduler::new(config, users).unwrap();

    scheduler.enqueue("alice", "f1").await;
    scheduler.await_start("alice", "f1").await.unwrap().await;

    let mut without_experimental = default_group_config(1, 1, "FirstInFirstOut");
    without_experimental.global_slots = 2;
    scheduler.reconfigure(without_experimental).await.unwrap();

    scheduler.complete("alice", "f1").await.unwrap();
    assert_eq!(scheduler.metrics().snapshot().orphaned_slots_total, 1);

    scheduler.enqueue("bob", "g1").await;
    let mut bob = scheduler.await_start("bob", "g1").await.unwrap();
    assert!(resolved(&mut bob).await, "bob's default-group slot is unaffected");
    scheduler.complete("bob", "g1").await.unwrap();
}

#[tokio::test]
async fn position_estimate_is_fifo_order_across_the_group() {
    // Scenario F.
    let users = Arc::new(MapUserService::new([
        ("alice".to_string(), "default".to_string()),
        ("bob".to_string(), "default".to_string()),
        ("carol".to_string(), "default".to_string()),
    ]));
    let mut config = default_group_config(1, 1, "FirstInFirstOut");
    config.global_slots = 1;
    let scheduler = UploadScheduler::new(config, users).unwrap();

    scheduler.enqueue("alice", "f1").await;
    scheduler.enqueue("bob", "g1").await;
    scheduler.enqueue("alice", "f2").await;
    scheduler.enqueue("carol", "h1").await;

    assert_eq!(
        scheduler.estimate_position_for("alice", "f2").await.unwrap(),
        2
    );
    assert_eq!(
        scheduler.estimate_position_for("carol", "h1").await.unwrap(),
        3
    );
}

#[tokio::test]
async fn await_start_on_unknown_upload_fails() {
    let users = Arc::new(MapUserService::new([]));
    let scheduler =
        UploadScheduler::new(SchedulerConfig::single_slot_default(), users).unwrap();

    let err = scheduler.await_start("nobody", "nothing").await.unwrap_err();
    assert!(matches!(err, upload_scheduler::SchedulerError::NotEnqueued { .. }));
}

#[tokio::test]
#[should_panic(expected = "AwaitStart called twice")]
async fn await_start_twice_panics() {
    let users = Arc::new(MapUserService::new([(
        "alice".to_string(),
        "default".to_string(),
    )]));
    let scheduler =
        UploadScheduler::new(SchedulerConfig::single_slot_default(), users).unwrap();

    scheduler.enqueue("alice", "f1").await;
    let _first = scheduler.await_start("alice", "f1").await.unwrap();
    let _second = scheduler.await_start("alice", "f1").await.unwrap();
}
