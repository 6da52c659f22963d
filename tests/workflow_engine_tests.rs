//! Workflow Engine Integration Tests
//!
//! Record-level and screen-level workflows driven through the public engine
//! API over the in-memory store.

mod common;

use common::*;
use statportal_workflow::persistence::{RecordTarget, TransitionCommit, WorkflowStore};
use statportal_workflow::{
    Actor, StatusCatalog, TableBinding, WorkflowAction, WorkflowError, WorkflowState,
};
use std::sync::Arc;

#[tokio::test]
async fn test_full_approval_path() {
    let engine = engine();

    let steps = [
        ("SubmitToChecker", MAKER, 2, "Pending Checker"),
        ("CheckerApprove", CHECKER, 4, "Pending Head"),
        ("HeadApprove", HEAD, 6, "Approved"),
    ];
    for (action, actor, status, name) in steps {
        let result = engine
            .execute_action(GDP_TABLE, 1, action, None, actor)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.new_status_id, status);
        assert_eq!(result.new_status_name, name);
    }

    assert_eq!(engine.get_current_status(GDP_TABLE, 1).await.unwrap(), 6);
    assert!(engine.available_actions(6).is_empty());
}

#[tokio::test]
async fn test_every_invalid_pair_is_rejected_without_side_effects() {
    let engine = engine();
    let store = engine.store();

    for state in WorkflowState::ALL {
        for action in WorkflowAction::ALL {
            let valid = engine.available_actions(state.id()).contains(&action);
            if valid {
                continue;
            }

            store.set_record_status(GDP_TABLE, 2, state.id());
            let audit_before = store.audit_len();

            let err = engine
                .execute_action(GDP_TABLE, 2, action.name(), Some("remarks"), MAKER)
                .await
                .unwrap_err();

            match err {
                WorkflowError::InvalidTransition {
                    current_status, ..
                } => assert_eq!(current_status, state.id()),
                other => panic!("expected InvalidTransition for {action} from {state}, got {other:?}"),
            }
            assert_eq!(store.record_status(GDP_TABLE, 2), Some(state.id()));
            assert_eq!(store.audit_len(), audit_before);
        }
    }
}

#[tokio::test]
async fn test_rejections_require_remarks() {
    let engine = engine();
    engine
        .execute_action(GDP_TABLE, 1, "SubmitToChecker", None, MAKER)
        .await
        .unwrap();

    for remarks in [None, Some(""), Some("   \t")] {
        let err = engine
            .execute_action(GDP_TABLE, 1, "CheckerReject", remarks, CHECKER)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RemarksRequired { .. }));
    }
    assert_eq!(engine.get_current_status(GDP_TABLE, 1).await.unwrap(), 2);
    assert_eq!(engine.store().audit_len(), 1);

    let result = engine
        .execute_action(GDP_TABLE, 1, "CheckerReject", Some("  wrong base year  "), CHECKER)
        .await
        .unwrap();
    assert_eq!(result.new_status_id, 1);

    let history = engine.get_audit_history(GDP_TABLE, 1).await.unwrap();
    assert_eq!(history[0].remarks.as_deref(), Some("wrong base year"));
}

#[tokio::test]
async fn test_each_transition_writes_exactly_one_audit_entry() {
    let engine = engine();

    engine
        .execute_action(GDP_TABLE, 1, "SubmitToChecker", None, MAKER)
        .await
        .unwrap();
    let result = engine
        .execute_action(GDP_TABLE, 1, "CheckerApprove", Some("looks fine"), CHECKER)
        .await
        .unwrap();

    let history = engine.get_audit_history(GDP_TABLE, 1).await.unwrap();
    assert_eq!(history.len(), 2);

    let latest = &history[0];
    assert_eq!(Some(latest.audit_id), result.audit_id);
    assert_eq!(latest.table_name, GDP_TABLE);
    assert_eq!(latest.record_id, 1);
    assert_eq!(latest.action_name, "CheckerApprove");
    assert_eq!(latest.from_status_id, Some(2));
    assert_eq!(latest.to_status_id, 4);
    assert_eq!(latest.acted_by, CHECKER);
    assert_eq!(latest.remarks.as_deref(), Some("looks fine"));
    assert_eq!(latest.screen_workflow_id, None);

    assert_eq!(history[1].action_name, "SubmitToChecker");
    assert_eq!(history[1].remarks, None);

    // other records are untouched
    assert!(engine.get_audit_history(GDP_TABLE, 2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_head_rejection_round_trip() {
    let engine = engine();
    let engine_ref = &engine;
    let run = move |action: &'static str, remarks: Option<&'static str>, actor: i64| async move {
        engine_ref
            .execute_action(GDP_TABLE, 3, action, remarks, actor)
            .await
    };

    run("SubmitToChecker", None, MAKER).await.unwrap();
    run("CheckerApprove", None, CHECKER).await.unwrap();
    let rejected = run("HeadReject", Some("missing totals"), HEAD).await.unwrap();
    assert_eq!(rejected.new_status_id, 2);

    run("CheckerApprove", None, CHECKER).await.unwrap();
    let approved = run("HeadApprove", None, HEAD).await.unwrap();
    assert_eq!(approved.new_status_id, 6);

    let err = run("SubmitToChecker", None, MAKER).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            current_status: 6,
            ..
        }
    ));

    let history = engine.get_audit_history(GDP_TABLE, 3).await.unwrap();
    let actions: Vec<&str> = history.iter().map(|e| e.action_name.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "HeadApprove",
            "CheckerApprove",
            "HeadReject",
            "CheckerApprove",
            "SubmitToChecker"
        ]
    );
    assert_eq!(history[2].remarks.as_deref(), Some("missing totals"));
}

#[tokio::test]
async fn test_action_names_are_parsed_leniently() {
    let engine = engine();
    let result = engine
        .execute_action(GDP_TABLE, 1, "  submittochecker ", None, MAKER)
        .await
        .unwrap();
    assert_eq!(result.new_status_id, 2);

    let err = engine
        .execute_action(GDP_TABLE, 1, "Publish", None, MAKER)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnknownAction(_)));
}

#[tokio::test]
async fn test_missing_and_unregistered_targets() {
    let engine = engine();

    let err = engine
        .execute_action(GDP_TABLE, 404, "SubmitToChecker", None, MAKER)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::RecordNotFound { record_id: 404, .. }));

    let err = engine
        .get_current_status("trade_balance", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::PrimaryKeyNotFound { .. }));

    let err = engine
        .get_audit_history("gdp-quarterly", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTableName(_)));
}

#[tokio::test]
async fn test_table_names_resolve_case_insensitively() {
    let engine = engine();
    engine
        .execute_action("GDP_Quarterly", 1, "SubmitToChecker", None, MAKER)
        .await
        .unwrap();
    assert_eq!(engine.get_current_status("gdp_quarterly", 1).await.unwrap(), 2);
    assert_eq!(engine.get_audit_history("GDP_QUARTERLY", 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_record_deleted_between_read_and_write() {
    let engine = engine();
    let store = engine.store();
    let record = store.resolve_record(GDP_TABLE, 1).await.unwrap();
    assert!(store.remove_record(GDP_TABLE, 1));

    let commit = TransitionCommit {
        target: statportal_workflow::WorkflowTarget::Record(record),
        action: WorkflowAction::SubmitToChecker,
        from_status_id: 1,
        to_status: engine.catalog().resolve(2).unwrap().clone(),
        remarks: None,
        actor_id: MAKER,
    };
    let err = store.commit_transition(&commit).await.unwrap_err();
    assert!(matches!(err, WorkflowError::RecordNotFound { .. }));
    assert_eq!(store.audit_len(), 0);
}

#[tokio::test]
async fn test_stale_commit_is_a_concurrent_modification() {
    let engine = engine();
    let store = engine.store();
    let binding = store.registry().get(GDP_TABLE).unwrap();

    engine
        .execute_action(GDP_TABLE, 2, "SubmitToChecker", None, MAKER)
        .await
        .unwrap();

    // validated against Maker Entry, but the record has moved on
    let commit = TransitionCommit {
        target: statportal_workflow::WorkflowTarget::Record(RecordTarget {
            binding,
            record_id: 2,
            current_status_id: 1,
        }),
        action: WorkflowAction::SubmitToChecker,
        from_status_id: 1,
        to_status: engine.catalog().resolve(2).unwrap().clone(),
        remarks: None,
        actor_id: MAKER,
    };
    let err = store.commit_transition(&commit).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::ConcurrentModification {
            expected_status: 1,
            ..
        }
    ));
    assert_eq!(store.record_status(GDP_TABLE, 2), Some(2));
    assert_eq!(store.audit_len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_apply_once() {
    let engine = Arc::new(engine());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .execute_action(GDP_TABLE, 1, "SubmitToChecker", None, MAKER + i)
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => {
                assert_eq!(result.new_status_id, 2);
                successes += 1;
            }
            Err(WorkflowError::ConcurrentModification { .. })
            | Err(WorkflowError::InvalidTransition { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(engine.store().audit_len(), 1);
    assert_eq!(engine.get_current_status(GDP_TABLE, 1).await.unwrap(), 2);
}

#[tokio::test]
async fn test_typed_records_through_status_field() {
    let engine = engine();
    let mut survey = LabourSurvey {
        labour_survey_id: 7,
        workflow_status_id: 1,
    };
    engine.store().insert(&survey).unwrap();

    let result = engine
        .execute_action("labour_survey", 7, "SubmitToChecker", None, MAKER)
        .await
        .unwrap();
    result.apply_to(&mut survey);

    assert_eq!(survey.workflow_status_id, 2);
    assert_eq!(
        statportal_workflow::StatusField::workflow_state(&survey),
        Some(WorkflowState::PendingChecker)
    );
}

// ----- screen-level -----

#[tokio::test]
async fn test_screen_workflow_lifecycle() {
    let engine = engine();
    let screen = engine
        .register_screen("CPI_MONTHLY", "cpi_monthly", MAKER)
        .await
        .unwrap();
    assert_eq!(screen.current_status_id, 1);
    assert_eq!(screen.current_status_name, "Maker Entry (Draft)");
    assert!(screen.is_active);

    engine
        .execute_screen_action("CPI_MONTHLY", "SubmitToChecker", None, MAKER)
        .await
        .unwrap();
    engine
        .execute_screen_action("CPI_MONTHLY", "CheckerApprove", None, CHECKER)
        .await
        .unwrap();

    let screen = engine.get_screen("CPI_MONTHLY").await.unwrap();
    assert_eq!(screen.current_status_id, 4);
    assert_eq!(screen.current_status_name, "Pending Head");
    assert_eq!(
        engine.get_screen_current_status("CPI_MONTHLY").await.unwrap(),
        4
    );

    let history = engine.get_screen_audit_history("CPI_MONTHLY").await.unwrap();
    assert_eq!(history.len(), 2);
    for entry in &history {
        assert_eq!(entry.screen_workflow_id, Some(screen.screen_workflow_id));
        assert_eq!(entry.record_id, 0);
        assert_eq!(entry.table_name, "cpi_monthly");
    }
    assert_eq!(history[0].action_name, "CheckerApprove");
}

#[tokio::test]
async fn test_screen_head_rejection_round_trip() {
    let engine = engine();
    engine
        .register_screen("GDP_QUARTERLY_SCREEN", GDP_TABLE, MAKER)
        .await
        .unwrap();

    let steps = [
        ("SubmitToChecker", None, MAKER, 2),
        ("CheckerApprove", None, CHECKER, 4),
        ("HeadReject", Some("missing totals"), HEAD, 2),
        ("CheckerApprove", None, CHECKER, 4),
        ("HeadApprove", None, HEAD, 6),
    ];
    for (action, remarks, actor, status) in steps {
        let result = engine
            .execute_screen_action("GDP_QUARTERLY_SCREEN", action, remarks, actor)
            .await
            .unwrap();
        assert_eq!(result.new_status_id, status);
    }
    assert_eq!(
        engine
            .get_screen_current_status("GDP_QUARTERLY_SCREEN")
            .await
            .unwrap(),
        6
    );

    let err = engine
        .execute_screen_action("GDP_QUARTERLY_SCREEN", "SubmitToChecker", None, MAKER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            current_status: 6,
            ..
        }
    ));

    let history = engine
        .get_screen_audit_history("GDP_QUARTERLY_SCREEN")
        .await
        .unwrap();
    assert_eq!(history.len(), 5);
    let rejection = history
        .iter()
        .find(|e| e.action_name == "HeadReject")
        .unwrap();
    assert_eq!(rejection.remarks.as_deref(), Some("missing totals"));
    assert_eq!(rejection.from_status_id, Some(4));
    assert_eq!(rejection.to_status_id, 2);

    // the record-level trail for the same table is separate
    assert!(engine.get_audit_history(GDP_TABLE, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_screen_registration_conflicts() {
    let engine = engine();
    engine
        .register_screen("CPI_MONTHLY", "cpi_monthly", MAKER)
        .await
        .unwrap();

    let err = engine
        .register_screen("CPI_MONTHLY", "cpi_weekly", MAKER)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ScreenAlreadyRegistered { .. }));

    let err = engine
        .execute_screen_action("UNKNOWN", "SubmitToChecker", None, MAKER)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ScreenNotFound { .. }));
}

#[tokio::test]
async fn test_screen_reset_requires_administrator() {
    let engine = engine();
    engine
        .register_screen("CPI_MONTHLY", "cpi_monthly", MAKER)
        .await
        .unwrap();
    engine
        .execute_screen_action("CPI_MONTHLY", "SubmitToChecker", None, MAKER)
        .await
        .unwrap();

    let err = engine
        .reset_screen_workflow("CPI_MONTHLY", &maker())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthorized(_)));
    assert_eq!(
        engine.get_screen_current_status("CPI_MONTHLY").await.unwrap(),
        2
    );
    assert_eq!(
        engine.get_screen_audit_history("CPI_MONTHLY").await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_screen_reset_purges_only_that_screen() {
    let engine = engine();
    for code in ["CPI_MONTHLY", "PPI_MONTHLY"] {
        engine.register_screen(code, "price_index", MAKER).await.unwrap();
        engine
            .execute_screen_action(code, "SubmitToChecker", None, MAKER)
            .await
            .unwrap();
        engine
            .execute_screen_action(code, "CheckerApprove", None, CHECKER)
            .await
            .unwrap();
    }
    engine
        .execute_action(GDP_TABLE, 1, "SubmitToChecker", None, MAKER)
        .await
        .unwrap();
    assert_eq!(engine.store().audit_len(), 5);

    let result = engine
        .reset_screen_workflow("CPI_MONTHLY", &admin())
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.new_status_id, 1);
    assert_eq!(result.new_status_name, "Maker Entry (Draft)");
    assert_eq!(result.audit_id, None);

    assert_eq!(
        engine.get_screen_current_status("CPI_MONTHLY").await.unwrap(),
        1
    );
    assert!(engine
        .get_screen_audit_history("CPI_MONTHLY")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        engine.get_screen_audit_history("PPI_MONTHLY").await.unwrap().len(),
        2
    );
    assert_eq!(engine.get_audit_history(GDP_TABLE, 1).await.unwrap().len(), 1);
    assert_eq!(engine.store().audit_len(), 3);

    // the reset screen re-enters the normal flow
    engine
        .execute_screen_action("CPI_MONTHLY", "SubmitToChecker", None, MAKER)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_deactivated_screen_is_not_found() {
    let engine = engine();
    engine
        .register_screen("CPI_MONTHLY", "cpi_monthly", MAKER)
        .await
        .unwrap();

    let err = engine
        .deactivate_screen("CPI_MONTHLY", &maker())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthorized(_)));

    engine
        .deactivate_screen("CPI_MONTHLY", &Actor::administrator(ADMIN))
        .await
        .unwrap();

    for err in [
        engine.get_screen_current_status("CPI_MONTHLY").await.unwrap_err(),
        engine
            .execute_screen_action("CPI_MONTHLY", "SubmitToChecker", None, MAKER)
            .await
            .unwrap_err(),
        engine
            .reset_screen_workflow("CPI_MONTHLY", &admin())
            .await
            .unwrap_err(),
    ] {
        assert!(matches!(err, WorkflowError::ScreenNotFound { .. }));
    }
}

#[tokio::test]
async fn test_catalog_missing_target_status_fails_before_commit() {
    let statuses = StatusCatalog::canonical()
        .list_active()
        .into_iter()
        .filter(|s| s.workflow_status_id != 2)
        .collect();
    let engine = statportal_workflow::WorkflowEngine::new(
        statportal_workflow::InMemoryWorkflowStore::new(),
        StatusCatalog::from_statuses(statuses),
    );
    engine.store().register_table(
        TableBinding::new(GDP_TABLE, "gdp_quarterly_id", "workflow_status_id").unwrap(),
    );
    engine.store().insert_record(GDP_TABLE, 1, 1).unwrap();

    let err = engine
        .execute_action(GDP_TABLE, 1, "SubmitToChecker", None, MAKER)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::StatusNotFound(2)));
    assert_eq!(engine.store().record_status(GDP_TABLE, 1), Some(1));
    assert_eq!(engine.store().audit_len(), 0);
}
