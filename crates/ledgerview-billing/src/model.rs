//! Billing record kinds and the bill overview composite.
//!
//! Amounts are carried as decimal strings exactly as the ledger reports them.

use ledgerview_core::{JoinKey, Record, RecordKind};
use serde::{Deserialize, Serialize};

// ─── Payloads ────────────────────────────────────────────

/// A bill owed by a patient for one encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientObligation {
    /// Claim-side bill identifier
    pub bill_id: String,
    /// Payment identifier shared with the receipt
    pub payment_id: String,
    /// Provider party
    pub provider: String,
    /// Amount owed
    pub amount: String,
    /// Clinical details, absent for manually issued bills
    pub encounter_details: Option<EncounterDetails>,
}

/// Clinical details attached to an obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDetails {
    /// Procedure code
    pub procedure_code: String,
    /// Diagnosis code
    pub diagnosis_code: String,
    /// Site of service code
    pub site_service_code: String,
    /// Appointment priority
    pub appointment_priority: String,
    /// Co-payment, when the policy has one
    pub co_pay: Option<String>,
    /// Share the patient is responsible for
    pub patient_responsibility: Option<String>,
}

/// Proof that an obligation was paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Payment identifier of the settled obligation
    pub payment_id: String,
    /// Amount paid
    pub amount: String,
    /// Paying party
    pub payer: String,
}

// ─── Kinds ───────────────────────────────────────────────

/// Patient obligation records, joined on payment id.
#[derive(Debug, Clone, Copy)]
pub struct PatientObligations;

impl RecordKind for PatientObligations {
    const NAME: &'static str = "PatientObligation";
    type Payload = PatientObligation;

    fn join_key(payload: &PatientObligation) -> JoinKey {
        JoinKey::new(payload.payment_id.clone())
    }
}

/// Payment receipt records, joined on payment id.
#[derive(Debug, Clone, Copy)]
pub struct PaymentReceipts;

impl RecordKind for PaymentReceipts {
    const NAME: &'static str = "PaymentReceipt";
    type Payload = PaymentReceipt;

    fn join_key(payload: &PaymentReceipt) -> JoinKey {
        JoinKey::new(payload.payment_id.clone())
    }
}

// ─── Composite ───────────────────────────────────────────

/// A bill together with its receipt, if it has been paid.
#[derive(Debug, Clone, PartialEq)]
pub struct BillOverview {
    /// The obligation
    pub bill: Record<PatientObligation>,
    /// Matching receipt
    pub receipt: Option<Record<PaymentReceipt>>,
}

impl BillOverview {
    /// Whether a receipt exists for this bill.
    pub fn is_paid(&self) -> bool {
        self.receipt.is_some()
    }

    /// Encounter details of the bill, if any.
    pub fn encounter(&self) -> Option<&EncounterDetails> {
        self.bill.payload.encounter_details.as_ref()
    }

    /// Procedure code, or `None` when the bill has no encounter details.
    pub fn procedure_code(&self) -> Option<&str> {
        self.encounter().map(|details| details.procedure_code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_kinds_join_on_payment_id() {
        let bill = PatientObligation {
            bill_id: "B-1".to_string(),
            payment_id: "P-1".to_string(),
            provider: "Radiologist".to_string(),
            amount: "120.0".to_string(),
            encounter_details: None,
        };
        let receipt = PaymentReceipt {
            payment_id: "P-1".to_string(),
            amount: "120.0".to_string(),
            payer: "Patient".to_string(),
        };
        assert_eq!(
            PatientObligations::join_key(&bill),
            PaymentReceipts::join_key(&receipt)
        );
    }

    #[test]
    fn test_overview_without_details() {
        let overview = BillOverview {
            bill: Record::new(
                "#b1",
                PatientObligation {
                    bill_id: "B-1".to_string(),
                    payment_id: "P-1".to_string(),
                    provider: "Radiologist".to_string(),
                    amount: "120.0".to_string(),
                    encounter_details: None,
                },
            ),
            receipt: None,
        };
        assert!(!overview.is_paid());
        assert_eq!(overview.procedure_code(), None);
    }
}
