mod common;

use common::{generate, harness, harness_with, published, Harness};
use interface_engine::service::batch::{INELIGIBLE_STATE, NOT_FOUND};
use interface_engine::service::TaskStatus;
use interface_engine::{AppError, BatchOperation, BatchRequest, BatchSubmission, EngineSettings, InterfaceStatus, Outcome};
use std::time::Duration;

fn batch(ids: &[String], operation: BatchOperation) -> BatchRequest {
    BatchRequest {
        ids: ids.to_vec(),
        operation,
        force_mode: false,
        run_async: false,
    }
}

/// Ten interfaces, the first three already published.
async fn ten_with_three_published(h: &Harness) -> Vec<String> {
    let mut ids = Vec::new();
    for i in 0..10 {
        let name = format!("iface_{}", i);
        let id = if i < 3 {
            published(h, &name).await
        } else {
            generate(h, &name).await
        };
        ids.push(id);
    }
    ids
}

#[tokio::test]
async fn publish_batch_skips_already_published() {
    let h = harness();
    let ids = ten_with_three_published(&h).await;

    let out = h.engine.batch(&batch(&ids, BatchOperation::Publish), "ops").await.unwrap();
    assert_eq!(out.operation, "publish");
    assert_eq!(out.total_count, 10);
    assert_eq!(out.success_count, 7);
    assert_eq!(out.failed_count, 3);
    assert_eq!(out.success_ids, ids[3..].to_vec());
    for failed in &out.failed_items {
        assert!(ids[..3].contains(&failed.id));
        assert_eq!(failed.reason, INELIGIBLE_STATE);
    }

    let stats = h.engine.status_statistics().await.unwrap();
    assert_eq!(stats.published_count, 10);
}

#[tokio::test]
async fn force_mode_counts_every_item_but_keeps_real_outcomes() {
    let h = harness();
    let ids = ten_with_three_published(&h).await;
    let mut req = batch(&ids, BatchOperation::Publish);
    req.force_mode = true;

    let out = h.engine.batch(&req, "ops").await.unwrap();
    assert_eq!(out.success_count, 10);
    assert_eq!(out.failed_count, 0);
    let forced: Vec<_> = out.items.iter().filter(|i| i.forced).collect();
    assert_eq!(forced.len(), 3);
    assert!(forced
        .iter()
        .all(|i| i.outcome == Outcome::Skipped(INELIGIBLE_STATE.into())));
}

#[tokio::test]
async fn one_failing_item_does_not_stop_the_rest() {
    let h = harness();
    let a = generate(&h, "a").await;
    let b = generate(&h, "b").await;
    let ids = vec![a.clone(), "nope".to_string(), b.clone()];

    let out = h.engine.batch(&batch(&ids, BatchOperation::Publish), "ops").await.unwrap();
    assert_eq!(out.success_ids, vec![a, b]);
    assert_eq!(out.items[1].outcome, Outcome::Skipped(NOT_FOUND.into()));
}

#[tokio::test]
async fn gateway_failure_is_reported_per_item() {
    let h = harness();
    let ids = vec![generate(&h, "a").await, generate(&h, "b").await];
    h.gateway.set_failing(true);

    let out = h.engine.batch(&batch(&ids, BatchOperation::Publish), "ops").await.unwrap();
    assert_eq!(out.failed_count, 2);
    assert!(out.items.iter().all(|i| matches!(i.outcome, Outcome::Failed(_))));
    let stats = h.engine.status_statistics().await.unwrap();
    assert_eq!(stats.unpublished_count, 2);
}

#[tokio::test]
async fn offline_then_delete_batch() {
    let h = harness();
    let ids = vec![published(&h, "a").await, published(&h, "b").await];
    let offline = BatchOperation::Offline {
        reason: "quarterly cleanup".into(),
    };
    let out = h.engine.batch(&batch(&ids, offline), "ops").await.unwrap();
    assert_eq!(out.success_count, 2);
    let detail = h.engine.get_interface(&ids[0]).await.unwrap();
    assert_eq!(detail.interface.status, InterfaceStatus::Offline);
    assert_eq!(detail.interface.offline_reason.as_deref(), Some("quarterly cleanup"));

    let out = h.engine.batch(&batch(&ids, BatchOperation::Delete), "ops").await.unwrap();
    assert_eq!(out.success_count, 2);
    assert_eq!(h.engine.status_statistics().await.unwrap().total_count, 0);
}

#[tokio::test]
async fn malformed_batches_are_rejected_whole() {
    let mut settings = EngineSettings::default();
    settings.batch_max_size = 3;
    let h = harness_with(settings);
    let a = generate(&h, "a").await;

    let empty = batch(&[], BatchOperation::Publish);
    let duplicated = batch(&[a.clone(), a.clone()], BatchOperation::Publish);
    let oversized = batch(
        &["1", "2", "3", "4"].map(String::from),
        BatchOperation::Publish,
    );
    let no_reason = batch(&[a.clone()], BatchOperation::Offline { reason: " ".into() });
    for req in [empty, duplicated, oversized, no_reason] {
        let err = h.engine.batch(&req, "ops").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
    }
    let detail = h.engine.get_interface(&a).await.unwrap();
    assert_eq!(detail.interface.status, InterfaceStatus::Unpublished);
}

#[tokio::test]
async fn async_batch_completes_in_background() {
    let h = harness();
    let ids = vec![generate(&h, "a").await, generate(&h, "b").await];
    let mut req = batch(&ids, BatchOperation::Publish);
    req.run_async = true;

    let task_id = match h.engine.submit_batch(req, "ops").await.unwrap() {
        BatchSubmission::Queued { task_id } => task_id,
        other => panic!("expected a queued task, got {:?}", other),
    };

    let mut snapshot = h.engine.task(&task_id).unwrap();
    for _ in 0..100 {
        if snapshot.status != TaskStatus::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        snapshot = h.engine.task(&task_id).unwrap();
    }
    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(snapshot.processed, 2);
    assert_eq!(snapshot.result.unwrap().success_count, 2);

    assert!(h.engine.remove_task(&task_id));
    assert!(h.engine.task(&task_id).is_none());
}

#[tokio::test]
async fn async_batch_is_validated_before_queueing() {
    let h = harness();
    let mut req = batch(&[], BatchOperation::Publish);
    req.run_async = true;
    let err = h.engine.submit_batch(req, "ops").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn copy_batch_reports_new_ids() {
    let h = harness();
    let a = published(&h, "a").await;
    let b = generate(&h, "b").await;
    let copy = BatchOperation::Copy {
        new_names: vec!["a_copy".into(), "a".into()],
    };

    let out = h.engine.batch(&batch(&[a.clone(), b.clone()], copy), "ops").await.unwrap();
    assert_eq!(out.operation, "copy");
    assert_eq!(out.success_count, 1);
    let created = out.items[0].created_id.clone().unwrap();
    assert_eq!(out.success_ids, vec![created.clone()]);
    assert_eq!(out.failed_items[0].id, b);
    assert!(out.failed_items[0].reason.contains("already in use"), "{}", out.failed_items[0].reason);

    let detail = h.engine.get_interface(&created).await.unwrap();
    assert_eq!(detail.interface.name, "a_copy");
    assert_eq!(detail.interface.status, InterfaceStatus::Unpublished);
    assert_eq!(detail.parameters.len(), 1);
}

#[tokio::test]
async fn copy_batch_needs_a_name_per_id() {
    let h = harness();
    let a = generate(&h, "a").await;
    let b = generate(&h, "b").await;
    let copy = BatchOperation::Copy {
        new_names: vec!["only_one".into()],
    };
    let err = h.engine.batch(&batch(&[a, b], copy), "ops").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
}

#[tokio::test]
async fn category_update_skips_published_interfaces() {
    let h = harness();
    let live = published(&h, "live").await;
    let draft = generate(&h, "draft").await;
    let op = BatchOperation::UpdateCategory {
        category_id: "BUSINESS_DATA".into(),
    };

    let out = h.engine.batch(&batch(&[live.clone(), draft.clone()], op), "ops").await.unwrap();
    assert_eq!(out.success_ids, vec![draft.clone()]);
    assert_eq!(out.items[0].outcome, Outcome::Skipped(INELIGIBLE_STATE.into()));

    let updated = h.engine.get_interface(&draft).await.unwrap().interface;
    assert_eq!(updated.category_id.as_deref(), Some("BUSINESS_DATA"));
    let untouched = h.engine.get_interface(&live).await.unwrap().interface;
    assert!(untouched.category_id.is_none());
}
