// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use agentscrape::infrastructure::cancel_registry::JobCancelRegistry;
use futures::future::join_all;
use uuid::Uuid;

#[test]
fn test_pre_cancellation_then_register_yields_set_flag() {
    let registry = JobCancelRegistry::new();
    for _ in 0..20 {
        let job = Uuid::new_v4();
        assert!(!registry.signal_cancel(job));
        assert!(registry.register(job).is_set());
    }
}

#[test]
fn test_double_register_returns_same_flag() {
    let registry = JobCancelRegistry::new();
    let job = Uuid::new_v4();

    let first = registry.register(job);
    let second = registry.register(job);

    assert!(first.ptr_eq(&second));
    registry.signal_cancel(job);
    assert!(first.is_set() && second.is_set());
}

#[test]
fn test_cleanup_then_register_yields_fresh_flag() {
    let registry = JobCancelRegistry::new();
    let job = Uuid::new_v4();

    let flag = registry.register(job);
    registry.signal_cancel(job);
    assert!(flag.is_set());

    registry.cleanup(job);
    let fresh = registry.register(job);

    assert!(!fresh.is_set());
    assert!(!fresh.ptr_eq(&flag));
}

#[test]
fn test_registries_are_isolated() {
    let first = JobCancelRegistry::new();
    let second = JobCancelRegistry::new();
    let job = Uuid::new_v4();

    first.signal_cancel(job);

    assert!(!second.register(job).is_set());
    assert!(first.register(job).is_set());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_jobs_from_many_tasks() {
    let registry = JobCancelRegistry::new();
    let jobs: Vec<Uuid> = (0..64).map(|_| Uuid::new_v4()).collect();

    let registrations = jobs.iter().map(|&job| {
        let registry = registry.clone();
        tokio::spawn(async move { registry.register(job) })
    });
    let cancellations = jobs.iter().step_by(2).map(|&job| {
        let registry = registry.clone();
        tokio::spawn(async move { registry.signal_cancel(job) })
    });

    let flags: Vec<_> = join_all(registrations)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    join_all(cancellations).await;

    // 偶数位置的任务都收到了取消，无论信号早于还是晚于注册
    for (index, job) in jobs.iter().enumerate() {
        let flag = registry.lookup(*job).unwrap();
        assert!(flag.ptr_eq(&flags[index]));
        assert_eq!(flag.is_set(), index % 2 == 0, "job #{}", index);
    }

    for job in &jobs {
        registry.cleanup(*job);
    }
    assert_eq!(registry.active_jobs(), 0);
    assert_eq!(registry.pending_signals(), 0);
}
