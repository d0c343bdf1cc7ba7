use std::sync::Barrier;
use std::thread;

use super::common::*;
use crate::workflows::carbon_intensity::domain::ReportStatus;
use crate::workflows::carbon_intensity::lifecycle::TransitionError;
use crate::workflows::carbon_intensity::{ReportServiceError, VerificationAction};

#[test]
fn racing_approve_and_reject_commit_exactly_once() {
    for _ in 0..25 {
        let (service, _, _) = build_service();
        let report = service.create(submission()).expect("create succeeds");
        service
            .verify(&report.report_id, VerificationAction::StartReview, auditor())
            .expect("start_review succeeds");

        let barrier = Barrier::new(2);
        let (approved, rejected) = thread::scope(|scope| {
            let approve = scope.spawn(|| {
                barrier.wait();
                service.verify(
                    &report.report_id,
                    VerificationAction::Approve { notes: None },
                    auditor(),
                )
            });
            let reject = scope.spawn(|| {
                barrier.wait();
                service.verify(
                    &report.report_id,
                    VerificationAction::Reject {
                        reason: "duplicate claim".to_string(),
                    },
                    second_auditor(),
                )
            });
            (
                approve.join().expect("approve thread"),
                reject.join().expect("reject thread"),
            )
        });

        let (winner, loser) = match (approved, rejected) {
            (Ok(outcome), Err(error)) => (outcome, error),
            (Err(error), Ok(outcome)) => (outcome, error),
            other => panic!("expected exactly one success, got {other:?}"),
        };

        match loser {
            ReportServiceError::Transition(TransitionError::InvalidTransition { from, .. }) => {
                assert_eq!(from, winner.report.status);
            }
            other => panic!("expected invalid transition, got {other:?}"),
        }

        let stored = service.get(&report.report_id).expect("report loads");
        assert!(matches!(
            stored.status,
            ReportStatus::Verified | ReportStatus::Rejected
        ));
        assert_eq!(stored.status, winner.report.status);
        assert_eq!(stored.audit_log.len(), 3);
        assert_eq!(stored.audit_log.last(), Some(&winner.entry));
    }
}

#[test]
fn concurrent_start_review_assigns_a_single_auditor() {
    let (service, _, _) = build_service();
    let report = service.create(submission()).expect("create succeeds");

    let barrier = Barrier::new(4);
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = [auditor(), second_auditor(), auditor(), second_auditor()]
            .into_iter()
            .map(|actor| {
                let barrier = &barrier;
                let service = &service;
                let report_id = &report.report_id;
                scope.spawn(move || {
                    barrier.wait();
                    service.verify(report_id, VerificationAction::StartReview, actor)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("review thread"))
            .collect()
    });

    let winners: Vec<_> = results.iter().filter_map(|result| result.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);

    let stored = service.get(&report.report_id).expect("report loads");
    assert_eq!(stored.status, ReportStatus::UnderReview);
    assert_eq!(stored.assigned_auditor, Some(winners[0].entry.actor.clone()));
    assert_eq!(stored.audit_log.len(), 2);
}
