//! Demonstration of the upload-scheduler crate.
//!
//! Run with: `cargo run -p upload-scheduler-demo`

use std::sync::Arc;
use std::time::Duration;
use upload_scheduler::testing::MapUserService;
use upload_scheduler::{GroupConfig, SchedulerConfig, UploadScheduler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== upload-scheduler Demo ===\n");

    demo_basic_admission().await?;
    demo_priority_preemption().await?;
    demo_round_robin_fairness().await?;
    demo_reconfiguration().await?;

    println!("\n=== All demos completed successfully! ===");
    Ok(())
}

/// Demo 1: a single group, one slot, two uploads competing for it.
async fn demo_basic_admission() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 1: Basic Admission ---");

    let users = Arc::new(MapUserService::new([(
        "alice".to_string(),
        "default".to_string(),
    )]));
    let scheduler = UploadScheduler::new(SchedulerConfig::single_slot_default(), users)?;

    scheduler.enqueue("alice", "report.bin").await;
    scheduler.enqueue("alice", "backup.bin").await;

    let first = scheduler.await_start("alice", "report.bin").await?;
    let second = scheduler.await_start("alice", "backup.bin").await?;

    first.await;
    println!("  report.bin released first");
    scheduler.complete("alice", "report.bin").await?;

    second.await;
    println!("  backup.bin released after report.bin completed");
    scheduler.complete("alice", "backup.bin").await?;

    println!("  metrics: {:?}", scheduler.metrics().snapshot());
    println!("  done\n");
    Ok(())
}

/// Demo 2: a privileged user always jumps ahead of lower-priority groups.
async fn demo_priority_preemption() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 2: Priority Ordering ---");

    let users = Arc::new(MapUserService::new([
        ("leecher".to_string(), "leechers".to_string()),
        ("vip".to_string(), "vip".to_string()),
    ]));

    let mut config = SchedulerConfig::single_slot_default();
    config.global_slots = 1;
    config.user_defined.insert(
        "vip".to_string(),
        GroupConfig {
            priority: -1,
            slots: 1,
            strategy: "FirstInFirstOut".to_string(),
        },
    );

    let scheduler = UploadScheduler::new(config, users)?;

    scheduler.enqueue("leecher", "movie.mkv").await;
    let leecher_wait = scheduler.await_start("leecher", "movie.mkv").await?;
    tokio::time::sleep(Duration::from_millis(10)).await;

    scheduler.enqueue("vip", "invoice.pdf").await;
    let vip_wait = scheduler.await_start("vip", "invoice.pdf").await?;

    // Nothing has completed yet, so the one global slot is still held by
    // whichever upload the Admission Loop already released; since the
    // leecher arrived first and the global slot was free, it already holds
    // the only slot. Complete it to watch the vip upload take over.
    leecher_wait.await;
    println!("  leecher's upload released first (arrived when the slot was free)");
    scheduler.complete("leecher", "movie.mkv").await?;

    vip_wait.await;
    println!("  vip's upload released once the slot freed up");
    scheduler.complete("vip", "invoice.pdf").await?;

    println!("  done\n");
    Ok(())
}

/// Demo 3: round-robin gives every user in a group an equal turn.
async fn demo_round_robin_fairness() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 3: Round-Robin Fairness ---");

    let users = Arc::new(MapUserService::new([
        ("alice".to_string(), "default".to_string()),
        ("bob".to_string(), "default".to_string()),
    ]));

    let mut config = SchedulerConfig::single_slot_default();
    config.default.strategy = "RoundRobin".to_string();
    config.default.slots = 1;
    config.global_slots = 1;

    let scheduler = UploadScheduler::new(config, users)?;

    scheduler.enqueue("alice", "a1.bin").await;
    scheduler.enqueue("alice", "a2.bin").await;
    scheduler.enqueue("bob", "b1.bin").await;

    // Alice's first upload becomes ready first, takes the only slot.
    let a1 = scheduler.await_start("alice", "a1.bin").await?;
    a1.await;
    println!("  a1.bin released (first ready upload, slot was free)");
    scheduler.complete("alice", "a1.bin").await?;

    // Bob becomes ready before alice's second upload, so round-robin picks
    // him next even though a2.bin was enqueued earlier.
    let b1 = scheduler.await_start("bob", "b1.bin").await?;
    let a2 = scheduler.await_start("alice", "a2.bin").await?;

    b1.await;
    println!("  b1.bin released next (became ready first, own turn)");
    scheduler.complete("bob", "b1.bin").await?;

    a2.await;
    println!("  a2.bin released last");
    scheduler.complete("alice", "a2.bin").await?;

    println!("  done\n");
    Ok(())
}

/// Demo 4: reconfiguring group slots while uploads are in flight.
async fn demo_reconfiguration() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 4: Hot Reconfiguration ---");

    let users = Arc::new(MapUserService::new([(
        "alice".to_string(),
        "default".to_string(),
    )]));
    let scheduler = UploadScheduler::new(SchedulerConfig::single_slot_default(), users)?;

    scheduler.enqueue("alice", "f1.bin").await;
    scheduler.enqueue("alice", "f2.bin").await;
    let f1 = scheduler.await_start("alice", "f1.bin").await?;
    let f2 = scheduler.await_start("alice", "f2.bin").await?;
    f1.await;
    println!("  f1.bin released under the original 1-slot config");

    let mut wider = SchedulerConfig::single_slot_default();
    wider.global_slots = 2;
    wider.default.slots = 2;
    scheduler.reconfigure(wider).await?;
    println!("  reconfigured to 2 slots without losing f1.bin's in-flight state");

    f2.await;
    println!("  f2.bin released immediately after reconfiguration widened capacity");
    scheduler.complete("alice", "f1.bin").await?;
    scheduler.complete("alice", "f2.bin").await?;

    // Reapplying the same configuration is a no-op, recorded as skipped.
    scheduler.reconfigure(SchedulerConfig::single_slot_default()).await.ok();
    println!(
        "  reconfigurations applied/skipped: {:?}",
        scheduler.metrics().snapshot()
    );

    println!("  done\n");
    Ok(())
}
