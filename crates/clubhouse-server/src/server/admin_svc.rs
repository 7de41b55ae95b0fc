//! `PremiumAdminService` gRPC implementation.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::instrument;

use clubhouse_proto::v1::premium_admin_service_server::PremiumAdminService;
use clubhouse_proto::v1::{
    ApproveRequestRequest, ApproveRequestResponse, ListRequestsRequest, ListRequestsResponse,
    RejectRequestRequest, RejectRequestResponse,
};

use super::convert::{request_to_proto, status_filter, timestamp};
use crate::premium::PremiumWorkflow;
use crate::server::interceptor::extract_identity;

pub struct PremiumAdminServiceImpl {
    workflow: Arc<PremiumWorkflow>,
}

impl PremiumAdminServiceImpl {
    pub const fn new(workflow: Arc<PremiumWorkflow>) -> Self {
        Self { workflow }
    }
}

#[allow(clippy::result_large_err)]
fn require_id(request_id: &str) -> Result<&str, Status> {
    let id = request_id.trim();
    if id.is_empty() {
        return Err(Status::invalid_argument("request_id is required"));
    }
    Ok(id)
}

#[tonic::async_trait]
impl PremiumAdminService for PremiumAdminServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "ListRequests"))]
    async fn list_requests(
        &self,
        request: Request<ListRequestsRequest>,
    ) -> Result<Response<ListRequestsResponse>, Status> {
        let who = extract_identity(&request)?;
        let req = request.into_inner();

        let (requests, total) = self
            .workflow
            .list(&who, status_filter(req.status_filter), req.limit, req.offset)
            .await?;

        Ok(Response::new(ListRequestsResponse {
            requests: requests.iter().map(request_to_proto).collect(),
            total: u32::try_from(total).unwrap_or(u32::MAX),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "ApproveRequest"))]
    async fn approve_request(
        &self,
        request: Request<ApproveRequestRequest>,
    ) -> Result<Response<ApproveRequestResponse>, Status> {
        let who = extract_identity(&request)?;
        let req = request.into_inner();
        let request_id = require_id(&req.request_id)?;
        let owner = Some(req.user_id.trim()).filter(|id| !id.is_empty());

        let approval = self.workflow.approve(&who, request_id, owner).await?;

        Ok(Response::new(ApproveRequestResponse {
            request: Some(request_to_proto(&approval.request)),
            premium_until: Some(timestamp(approval.premium_until)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "RejectRequest"))]
    async fn reject_request(
        &self,
        request: Request<RejectRequestRequest>,
    ) -> Result<Response<RejectRequestResponse>, Status> {
        let who = extract_identity(&request)?;
        let req = request.into_inner();
        let request_id = require_id(&req.request_id)?;

        let rejected = self.workflow.reject(&who, request_id, &req.reason).await?;

        Ok(Response::new(RejectRequestResponse {
            request: Some(request_to_proto(&rejected)),
        }))
    }
}
