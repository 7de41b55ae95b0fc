//! Input validation for premium submissions.

use clubhouse_core::config::PremiumConfig;

use super::error::PremiumError;

const MAX_FIELD_LEN: usize = 200;

/// Sender's bank details as entered by the member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

impl BankDetails {
    /// Trim every field and require it to be non-empty.
    pub fn normalized(&self) -> Result<Self, PremiumError> {
        Ok(Self {
            bank_name: required("bank_name", &self.bank_name)?,
            account_number: required("account_number", &self.account_number)?,
            account_holder: required("account_holder", &self.account_holder)?,
        })
    }
}

/// An uploaded payment proof.
#[derive(Debug, Clone, Copy)]
pub struct ProofUpload<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub content: &'a [u8],
}

impl ProofUpload<'_> {
    /// Check size and type limits, returning the file extension to store under.
    pub fn check(&self, limits: &PremiumConfig) -> Result<&'static str, PremiumError> {
        if self.content.is_empty() {
            return Err(PremiumError::InvalidArgument(
                "Payment proof is required".into(),
            ));
        }
        if self.content.len() > limits.max_proof_bytes {
            return Err(PremiumError::InvalidArgument(format!(
                "Payment proof exceeds {} bytes",
                limits.max_proof_bytes
            )));
        }

        let content_type = self.content_type.trim().to_ascii_lowercase();
        if !limits
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&content_type))
        {
            return Err(PremiumError::InvalidArgument(format!(
                "Unsupported proof type: {}",
                self.content_type
            )));
        }

        Ok(extension_for(&content_type))
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

fn required(field: &str, value: &str) -> Result<String, PremiumError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PremiumError::InvalidArgument(format!("{field} is required")));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(PremiumError::InvalidArgument(format!(
            "{field} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

/// Trim a rejection reason and require it to be non-empty.
pub(super) fn rejection_reason(reason: &str) -> Result<String, PremiumError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(PremiumError::InvalidArgument(
            "A rejection reason is required".into(),
        ));
    }
    Ok(reason.to_string())
}
