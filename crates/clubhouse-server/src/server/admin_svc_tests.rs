//! Tests for `PremiumAdminService` gRPC implementation.

use std::sync::Arc;

use tonic::{Code, Request};

use clubhouse_proto::v1::premium_admin_service_server::PremiumAdminService;
use clubhouse_proto::v1::{
    ApproveRequestRequest, ListRequestsRequest, RejectRequestRequest,
    RequestStatus as ProtoStatus,
};

use super::admin_svc::PremiumAdminServiceImpl;
use super::test_helpers::{admin, alice, authed, bank, local_workflow, png_proof, seeded_db};
use crate::premium::PremiumWorkflow;

/// Admin service plus the id of one pending request owned by `u1`.
async fn setup() -> (PremiumAdminServiceImpl, Arc<PremiumWorkflow>, String, tempfile::TempDir) {
    let (workflow, dir) = local_workflow(seeded_db().await);
    let pending = workflow
        .submit(&alice(), png_proof(), &bank())
        .await
        .unwrap();
    let svc = PremiumAdminServiceImpl::new(Arc::clone(&workflow));
    (svc, workflow, pending.id, dir)
}

fn approve(request_id: &str, user_id: &str) -> ApproveRequestRequest {
    ApproveRequestRequest {
        request_id: request_id.into(),
        user_id: user_id.into(),
    }
}

#[tokio::test]
async fn list_pending_requests() {
    let (svc, _workflow, id, _dir) = setup().await;

    let resp = svc
        .list_requests(authed(
            ListRequestsRequest {
                status_filter: ProtoStatus::Pending as i32,
                limit: 0,
                offset: 0,
            },
            &admin(),
        ))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(resp.total, 1);
    assert_eq!(resp.requests.len(), 1);
    let info = &resp.requests[0];
    assert_eq!(info.request_id, id);
    assert_eq!(info.bank.as_ref().unwrap().bank_name, "Acme Bank");
    assert!(info.notes.is_none());
}

#[tokio::test]
async fn approve_returns_new_expiry() {
    let (svc, _workflow, id, _dir) = setup().await;

    let resp = svc
        .approve_request(authed(approve(&id, "u1"), &admin()))
        .await
        .unwrap()
        .into_inner();

    let request = resp.request.unwrap();
    assert_eq!(request.status, ProtoStatus::Approved as i32);
    assert_eq!(request.reviewed_by.as_deref(), Some("a1"));
    assert!(request.reviewed_at.is_some());
    assert!(resp.premium_until.unwrap().seconds > request.created_at.unwrap().seconds);
}

#[tokio::test]
async fn approve_twice_is_failed_precondition() {
    let (svc, _workflow, id, _dir) = setup().await;
    svc.approve_request(authed(approve(&id, ""), &admin()))
        .await
        .unwrap();

    let err = svc
        .approve_request(authed(approve(&id, ""), &admin()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);
}

#[tokio::test]
async fn approve_errors() {
    let (svc, _workflow, id, _dir) = setup().await;

    let err = svc
        .approve_request(authed(approve("  ", ""), &admin()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = svc
        .approve_request(authed(approve("missing", ""), &admin()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);

    let err = svc
        .approve_request(authed(approve(&id, "a1"), &admin()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn reject_records_reason() {
    let (svc, workflow, id, _dir) = setup().await;

    let resp = svc
        .reject_request(authed(
            RejectRequestRequest {
                request_id: id.clone(),
                reason: "Proof is unreadable".into(),
            },
            &admin(),
        ))
        .await
        .unwrap()
        .into_inner();

    let request = resp.request.unwrap();
    assert_eq!(request.status, ProtoStatus::Rejected as i32);
    assert_eq!(request.notes.as_deref(), Some("Proof is unreadable"));

    let profile = workflow.profile(&alice()).await.unwrap();
    assert_eq!(profile.user.premium_until, None);

    let err = svc
        .approve_request(authed(approve(&id, ""), &admin()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);
}

#[tokio::test]
async fn members_are_denied() {
    let (svc, _workflow, id, _dir) = setup().await;

    let err = svc
        .list_requests(authed(
            ListRequestsRequest {
                status_filter: 0,
                limit: 10,
                offset: 0,
            },
            &alice(),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::PermissionDenied);

    let err = svc
        .approve_request(authed(approve(&id, ""), &alice()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::PermissionDenied);
}

#[tokio::test]
async fn missing_claims_are_unauthenticated() {
    let (svc, _workflow, id, _dir) = setup().await;

    let err = svc
        .reject_request(Request::new(RejectRequestRequest {
            request_id: id,
            reason: "no".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Unauthenticated);
}
