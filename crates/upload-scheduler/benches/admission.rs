use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use upload_scheduler::testing::MapUserService;
use upload_scheduler::{GroupConfig, SchedulerConfig, UploadScheduler};

const USERS_PER_GROUP: u32 = 64;

fn config_for(group_count: usize, slots_per_group: i64) -> SchedulerConfig {
    let mut config = SchedulerConfig::single_slot_default();
    config.global_slots = (group_count as i64) * slots_per_group;
    config.default = GroupConfig {
        priority: 1,
        slots: slots_per_group,
        strategy: "FirstInFirstOut".to_string(),
    };
    config.leechers = GroupConfig {
        priority: 2,
        slots: slots_per_group,
        strategy: "RoundRobin".to_string(),
    };
    for g in 2..group_count {
        config.user_defined.insert(
            format!("group-{g}"),
            GroupConfig {
                priority: (g + 1) as i64,
                slots: slots_per_group,
                strategy: if g % 2 == 0 {
                    "FirstInFirstOut".to_string()
                } else {
                    "RoundRobin".to_string()
                },
            },
        );
    }
    config
}

fn bench_enqueue_await_complete_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission_cycle");

    for group_count in [1usize, 4, 8] {
        group.throughput(Throughput::Elements(USERS_PER_GROUP as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{group_count}_groups")),
            &group_count,
            |b, &group_count| {
                let rt = tokio::runtime::Runtime::new().unwrap();
                b.to_async(&rt).iter(|| async {
                    let names: Vec<(String, String)> = (0..group_count)
                        .flat_map(|g| {
                            let group_name = group_name(g);
                            (0..USERS_PER_GROUP).map(move |u| {
                                (format!("user-{g}-{u}"), group_name.clone())
                            })
                        })
                        .collect();
                    let users = Arc::new(MapUserService::new(names.clone()));
                    let scheduler =
                        UploadScheduler::new(config_for(group_count, 1), users).unwrap();

                    for (username, _) in &names {
                        scheduler.enqueue(username, "f").await;
                    }
                    let mut waits = Vec::with_capacity(names.len());
                    for (username, _) in &names {
                        waits.push(scheduler.await_start(username, "f").await.unwrap());
                    }
                    for (wait, (username, _)) in waits.into_iter().zip(&names) {
                        wait.await;
                        scheduler.complete(username, "f").await.unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn group_name(index: usize) -> String {
    match index {
        0 => "default".to_string(),
        1 => "leechers".to_string(),
        g => format!("group-{g}"),
    }
}

criterion_group!(benches, bench_enqueue_await_complete_cycle);
criterion_main!(benches);
