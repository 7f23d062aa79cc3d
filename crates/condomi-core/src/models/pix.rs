use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Brazilian taxpayer document kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    Cpf,
    Cnpj,
}

impl DocumentType {
    pub fn digit_count(&self) -> usize {
        match self {
            DocumentType::Cpf => 11,
            DocumentType::Cnpj => 14,
        }
    }
}

/// Payer data collected before requesting a PIX charge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PixPayer {
    pub email: String,
    pub name: String,
    pub document_type: DocumentType,
    pub document_number: String,
}

/// Body sent to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PixChargeRequest {
    pub invoice_id: Uuid,
    pub payer_email: String,
    pub payer_name: String,
    pub payer_document_type: DocumentType,
    /// Digits only.
    pub payer_document_number: String,
}

/// Payable QR code returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PixCharge {
    pub qr_code: String,
    pub qr_code_base64: String,
}
