mod fixtures;
mod helpers;

use hairstyle_studio::models::run::ItemStatus;
use hairstyle_studio::services::scheduler::{
    BatchScheduler, GenerationRun, RunReport, DEFAULT_CONCURRENCY, GENERATION_FAILED_MESSAGE,
};
use helpers::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn statuses(run: &GenerationRun) -> Vec<&'static str> {
    run.snapshot()
        .items
        .iter()
        .map(|item| (&item.status).into())
        .collect()
}

/// Five items, concurrency 3, the fourth call fails.
#[tokio::test]
async fn test_waves_of_three_with_isolated_failure() {
    let mutator = Arc::new(MockMutator::new().failing_on(&["style-4"]));
    let scheduler = BatchScheduler::new(mutator.clone(), DEFAULT_CONCURRENCY);
    let run = GenerationRun::with_styles(source_image(), descriptors(5));
    mutator.observe(run.subscribe());

    let report = scheduler.run(&run).await;

    assert_eq!(
        report,
        RunReport {
            scheduled: 5,
            succeeded: 4,
            failed: 1,
            discarded: 0,
            cancelled: false,
        }
    );
    assert_eq!(
        mutator.call_log(),
        vec!["style-1", "style-2", "style-3", "style-4", "style-5"]
    );

    // Every call of a wave starts after the whole wave was marked Loading
    let seen = mutator.loading_seen.lock().unwrap().clone();
    assert_eq!(seen[0], vec![1, 2, 3]);
    assert_eq!(seen[1], vec![1, 2, 3]);
    assert_eq!(seen[2], vec![1, 2, 3]);
    assert_eq!(seen[3], vec![4, 5]);
    assert_eq!(seen[4], vec![4, 5]);

    assert_eq!(
        statuses(&run),
        vec!["success", "success", "success", "error", "success"]
    );

    let state = run.snapshot();
    assert!(!state.processing);
    match &state.item(4).unwrap().status {
        ItemStatus::Error { message } => {
            assert_eq!(message, GENERATION_FAILED_MESSAGE);
            assert!(!message.is_empty());
        }
        other => panic!("item 4 should have failed, got {}", other),
    }
    assert!(state.item(4).unwrap().result_image().is_none());
    assert_eq!(
        state.item(2).unwrap().result_image().unwrap().decode().unwrap(),
        b"style-2".to_vec()
    );
}

#[tokio::test]
async fn test_never_more_than_three_loading() {
    let mutator = Arc::new(MockMutator::new());
    let scheduler = BatchScheduler::new(mutator.clone(), 3);
    let run = GenerationRun::with_styles(source_image(), descriptors(18));
    mutator.observe(run.subscribe());

    let report = scheduler.run(&run).await;

    assert_eq!(report.scheduled, 18);
    assert_eq!(report.succeeded, 18);
    assert_eq!(mutator.max_in_flight.load(Ordering::SeqCst), 3);
    for loading in mutator.loading_seen.lock().unwrap().iter() {
        assert!(loading.len() <= 3, "too many loading items: {:?}", loading);
    }
    assert_eq!(run.snapshot().summary().succeeded, 18);
}

#[tokio::test]
async fn test_no_eligible_items_is_a_no_op() {
    let mutator = Arc::new(MockMutator::new());
    let scheduler = BatchScheduler::new(mutator.clone(), 3);
    let run = GenerationRun::with_styles(source_image(), descriptors(4));
    scheduler.run(&run).await;
    assert_eq!(mutator.call_count(), 4);

    let before = run.snapshot();
    let mut updates = run.subscribe();
    let report = scheduler.run(&run).await;

    assert_eq!(report, RunReport::default());
    assert_eq!(mutator.call_count(), 4);
    assert_eq!(run.snapshot(), before);
    assert!(!updates.has_changed().unwrap());
}

#[tokio::test]
async fn test_rerun_only_touches_failed_items() {
    let mutator = Arc::new(MockMutator::new().failing_on(&["style-2", "style-5"]));
    let scheduler = BatchScheduler::new(mutator.clone(), 3);
    let run = GenerationRun::with_styles(source_image(), descriptors(6));

    let first = scheduler.run(&run).await;
    assert_eq!(first.failed, 2);
    let succeeded_before = run.snapshot().item(1).unwrap().clone();

    mutator.set_failing(&[]);
    let second = scheduler.run(&run).await;

    assert_eq!(second.scheduled, 2);
    assert_eq!(second.succeeded, 2);
    assert_eq!(&mutator.call_log()[6..], &["style-2", "style-5"]);
    assert_eq!(statuses(&run), vec!["success"; 6]);
    // Already succeeded items were not regenerated
    assert_eq!(run.snapshot().item(1).unwrap(), &succeeded_before);
}

#[tokio::test]
async fn test_cancelled_run_discards_late_results() {
    let (mutator, gate) = MockMutator::gated();
    let mutator = Arc::new(mutator);
    let scheduler = Arc::new(BatchScheduler::new(mutator.clone(), 3));
    let run = Arc::new(GenerationRun::with_styles(source_image(), descriptors(5)));

    let mut progress = run.subscribe();
    let handle = {
        let scheduler = scheduler.clone();
        let run = run.clone();
        tokio::spawn(async move { scheduler.run(&run).await })
    };

    // Wait until the first wave is in flight
    tokio::time::timeout(
        Duration::from_secs(5),
        progress.wait_for(|state| state.loading_count() == 3),
    )
    .await
    .expect("first wave never started")
    .unwrap();

    run.cancel();
    let items_at_cancel = run.snapshot().items;

    gate.send(true).unwrap();
    let report = handle.await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.scheduled, 3);
    assert_eq!(report.discarded, 3);
    assert_eq!(report.succeeded + report.failed, 0);
    assert_eq!(mutator.call_count(), 3);
    assert_eq!(run.snapshot().items, items_at_cancel);
    assert_eq!(
        statuses(&run),
        vec!["loading", "loading", "loading", "pending", "pending"]
    );
}

#[tokio::test]
async fn test_cancel_before_start_makes_no_calls() {
    let mutator = Arc::new(MockMutator::new());
    let scheduler = BatchScheduler::new(mutator.clone(), 3);
    let run = GenerationRun::with_styles(source_image(), descriptors(3));
    run.cancel();

    let report = scheduler.run(&run).await;

    assert!(report.cancelled);
    assert_eq!(report.scheduled, 0);
    assert_eq!(mutator.call_count(), 0);
    assert_eq!(statuses(&run), vec!["pending"; 3]);
    assert!(!run.snapshot().processing);
}

#[tokio::test]
async fn test_run_waiting_for_analysis_is_not_scheduled() {
    let mutator = Arc::new(MockMutator::new());
    let scheduler = BatchScheduler::new(mutator.clone(), 3);
    let run = GenerationRun::new(source_image());

    let report = scheduler.run(&run).await;

    assert_eq!(report, RunReport::default());
    assert!(run.snapshot().analyzing);
    assert_eq!(mutator.call_count(), 0);
}

#[tokio::test]
async fn test_claimed_run_is_not_scheduled_twice() {
    let mutator = Arc::new(MockMutator::new());
    let scheduler = BatchScheduler::new(mutator.clone(), 3);
    let run = GenerationRun::with_styles(source_image(), descriptors(4));

    let eligible = scheduler.claim(&run).expect("fresh run is claimable");
    assert_eq!(eligible.len(), 4);
    let state = run.snapshot();
    assert!(state.processing);
    assert_eq!(state.summary().pending, 4);

    assert!(scheduler.claim(&run).is_none());
    assert_eq!(scheduler.run(&run).await, RunReport::default());
    assert_eq!(mutator.call_count(), 0);

    let report = scheduler.process(&run, eligible).await;
    assert_eq!(report.succeeded, 4);
    assert!(!run.snapshot().processing);
    assert!(scheduler.claim(&run).is_none());
}

#[test]
fn test_zero_concurrency_is_clamped() {
    let scheduler = BatchScheduler::new(Arc::new(MockMutator::new()), 0);
    assert_eq!(scheduler.concurrency(), 1);
}
