//! `PremiumService` gRPC implementation (member-facing).

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::instrument;

use clubhouse_core::RequestState;
use clubhouse_proto::v1::premium_service_server::PremiumService;
use clubhouse_proto::v1::{
    GetLatestRequestRequest, GetLatestRequestResponse, GetProfileRequest, GetProfileResponse,
    RequestState as ProtoState, SubmitPremiumRequest, SubmitPremiumResponse,
};

use super::convert::{request_to_proto, timestamp};
use crate::premium::{BankDetails, PremiumWorkflow, ProofUpload};
use crate::server::interceptor::extract_identity;

pub struct PremiumServiceImpl {
    workflow: Arc<PremiumWorkflow>,
}

impl PremiumServiceImpl {
    pub const fn new(workflow: Arc<PremiumWorkflow>) -> Self {
        Self { workflow }
    }
}

#[tonic::async_trait]
impl PremiumService for PremiumServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "SubmitRequest"))]
    async fn submit_request(
        &self,
        request: Request<SubmitPremiumRequest>,
    ) -> Result<Response<SubmitPremiumResponse>, Status> {
        let who = extract_identity(&request)?;
        let req = request.into_inner();

        let proof = req
            .proof
            .ok_or_else(|| Status::invalid_argument("Payment proof is required"))?;
        let bank = req
            .bank
            .ok_or_else(|| Status::invalid_argument("Bank details are required"))?;

        let created = self
            .workflow
            .submit(
                &who,
                ProofUpload {
                    file_name: &proof.file_name,
                    content_type: &proof.content_type,
                    content: &proof.content,
                },
                &BankDetails {
                    bank_name: bank.bank_name,
                    account_number: bank.account_number,
                    account_holder: bank.account_holder,
                },
            )
            .await?;

        Ok(Response::new(SubmitPremiumResponse {
            request: Some(request_to_proto(&created)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "GetLatestRequest"))]
    async fn get_latest_request(
        &self,
        request: Request<GetLatestRequestRequest>,
    ) -> Result<Response<GetLatestRequestResponse>, Status> {
        let who = extract_identity(&request)?;
        let latest = self.workflow.latest(&who).await?;

        let state = match latest.state {
            RequestState::NoRequest => ProtoState::NoRequest,
            RequestState::Pending => ProtoState::Pending,
            RequestState::Resolved(_) => ProtoState::Resolved,
        };

        Ok(Response::new(GetLatestRequestResponse {
            state: state as i32,
            request: latest.request.as_ref().map(request_to_proto),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "GetProfile"))]
    async fn get_profile(
        &self,
        request: Request<GetProfileRequest>,
    ) -> Result<Response<GetProfileResponse>, Status> {
        let who = extract_identity(&request)?;
        let profile = self.workflow.profile(&who).await?;

        Ok(Response::new(GetProfileResponse {
            user_id: profile.user.id,
            username: profile.user.username,
            premium_until: profile.user.premium_until.map(timestamp),
            premium_active: profile.premium_active,
        }))
    }
}
