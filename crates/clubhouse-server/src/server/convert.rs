//! Storage model to protobuf conversions.

use clubhouse_core::RequestStatus;
use clubhouse_proto::v1::{
    BankDetails as ProtoBankDetails, PremiumRequestInfo, RequestStatus as ProtoStatus,
};

use crate::storage::PremiumRequest;

pub(super) const fn timestamp(seconds: i64) -> prost_types::Timestamp {
    prost_types::Timestamp { seconds, nanos: 0 }
}

pub(super) const fn status_to_proto(status: RequestStatus) -> ProtoStatus {
    match status {
        RequestStatus::Pending => ProtoStatus::Pending,
        RequestStatus::Approved => ProtoStatus::Approved,
        RequestStatus::Rejected => ProtoStatus::Rejected,
    }
}

/// `None` for `UNSPECIFIED` (no filter) and unknown values.
pub(super) fn status_filter(raw: i32) -> Option<RequestStatus> {
    match ProtoStatus::try_from(raw) {
        Ok(ProtoStatus::Pending) => Some(RequestStatus::Pending),
        Ok(ProtoStatus::Approved) => Some(RequestStatus::Approved),
        Ok(ProtoStatus::Rejected) => Some(RequestStatus::Rejected),
        _ => None,
    }
}

pub(super) fn request_to_proto(r: &PremiumRequest) -> PremiumRequestInfo {
    PremiumRequestInfo {
        request_id: r.id.clone(),
        user_id: r.user_id.clone(),
        proof_url: r.proof_url.clone(),
        bank: Some(ProtoBankDetails {
            bank_name: r.bank_name.clone(),
            account_number: r.account_number.clone(),
            account_holder: r.account_holder.clone(),
        }),
        status: status_to_proto(r.status) as i32,
        notes: r.notes.clone(),
        created_at: Some(timestamp(r.created_at)),
        reviewed_at: r.reviewed_at.map(timestamp),
        reviewed_by: r.reviewed_by.clone(),
    }
}
