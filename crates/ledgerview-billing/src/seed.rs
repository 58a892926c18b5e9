//! In-memory billing ledger used by the CLI and tests.

use ledgerview_core::{ActionOutcome, ActionPayload, MemoryStore, RecordId, RecordKind, StoreError};

use crate::bills::PAY_CHOICE;
use crate::model::{
    EncounterDetails, PatientObligation, PatientObligations, PaymentReceipt, PaymentReceipts,
};

/// Payer recorded when the action argument names none.
pub const DEFAULT_PAYER: &str = "Patient";

/// Register both billing kinds and the pay handler on `store`.
///
/// # Errors
///
/// Fails only if a kind was already registered with another payload type.
pub fn install(store: &MemoryStore) -> Result<(), StoreError> {
    store.register::<PatientObligations>()?;
    store.register::<PaymentReceipts>()?;
    store.on_action::<PatientObligations, _>(PAY_CHOICE, pay_obligation);
    Ok(())
}

/// Settle an obligation by issuing a receipt for its payment id.
///
/// The obligation stays live so the list can show it as paid. Paying twice
/// is rejected.
fn pay_obligation(
    store: &MemoryStore,
    record_id: &RecordId,
    action: &ActionPayload,
) -> Result<ActionOutcome, StoreError> {
    let bill = store
        .records::<PatientObligations>()
        .into_iter()
        .find(|record| &record.record_id == record_id)
        .ok_or_else(|| StoreError::not_found(PatientObligations::NAME, record_id.as_str()))?;

    let payment_id = bill.payload.payment_id;
    if store
        .records::<PaymentReceipts>()
        .iter()
        .any(|receipt| receipt.payload.payment_id == payment_id)
    {
        return Err(StoreError::action_rejected(
            &action.choice,
            format!("payment {payment_id} already settled"),
        ));
    }

    let payer = action
        .argument
        .get("payer")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(DEFAULT_PAYER)
        .to_string();
    let receipt_id = store.insert::<PaymentReceipts>(PaymentReceipt {
        payment_id,
        amount: bill.payload.amount,
        payer,
    })?;

    Ok(ActionOutcome {
        result: serde_json::Value::String(receipt_id.to_string()),
        created: vec![receipt_id],
        archived: Vec::new(),
    })
}

// ─── Sample Data ─────────────────────────────────────────

fn encounter(
    procedure: &str,
    diagnosis: &str,
    site: &str,
    priority: &str,
    co_pay: Option<&str>,
    responsibility: Option<&str>,
) -> EncounterDetails {
    EncounterDetails {
        procedure_code: procedure.to_string(),
        diagnosis_code: diagnosis.to_string(),
        site_service_code: site.to_string(),
        appointment_priority: priority.to_string(),
        co_pay: co_pay.map(str::to_string),
        patient_responsibility: responsibility.map(str::to_string),
    }
}

fn obligation(
    bill_id: &str,
    payment_id: &str,
    provider: &str,
    amount: &str,
    details: Option<EncounterDetails>,
) -> PatientObligation {
    PatientObligation {
        bill_id: bill_id.to_string(),
        payment_id: payment_id.to_string(),
        provider: provider.to_string(),
        amount: amount.to_string(),
        encounter_details: details,
    }
}

/// Install the billing kinds and load a small demo ledger: three bills, one
/// of them already paid.
///
/// # Errors
///
/// See [`install`].
pub fn sample_ledger(store: &MemoryStore) -> Result<(), StoreError> {
    install(store)?;

    store.insert_with_id::<PatientObligations>(
        "bill-1",
        obligation(
            "B-1001",
            "PAY-1001",
            "Radiologist",
            "240.00",
            Some(encounter(
                "X-Ray",
                "Fracture",
                "11",
                "Elective",
                Some("20.00"),
                Some("220.00"),
            )),
        ),
    )?;
    store.insert_with_id::<PatientObligations>(
        "bill-2",
        obligation(
            "B-1002",
            "PAY-1002",
            "Primary Care",
            "80.00",
            Some(encounter("Physical", "Checkup", "11", "Routine", None, Some("80.00"))),
        ),
    )?;
    store.insert_with_id::<PatientObligations>(
        "bill-3",
        obligation("B-1003", "PAY-1003", "Pharmacy", "15.50", None),
    )?;

    store.insert_with_id::<PaymentReceipts>(
        "receipt-2",
        PaymentReceipt {
            payment_id: "PAY-1002".to_string(),
            amount: "80.00".to_string(),
            payer: DEFAULT_PAYER.to_string(),
        },
    )?;

    tracing::debug!("Loaded sample billing ledger");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerview_core::RecordStore;

    #[tokio::test]
    async fn test_pay_creates_receipt_once() {
        let store = MemoryStore::new();
        sample_ledger(&store).unwrap();

        let outcome = store
            .submit_action::<PatientObligations>(
                &RecordId::new("bill-1"),
                ActionPayload::new(PAY_CHOICE, serde_json::json!({ "payer": "Insurer" })),
            )
            .await
            .unwrap();
        assert_eq!(outcome.created.len(), 1);

        let receipts = store.records::<PaymentReceipts>();
        let receipt = receipts
            .iter()
            .find(|r| r.payload.payment_id == "PAY-1001")
            .unwrap();
        assert_eq!(receipt.payload.payer, "Insurer");
        assert_eq!(receipt.payload.amount, "240.00");
        assert_eq!(store.records::<PatientObligations>().len(), 3);

        let again = store
            .submit_action::<PatientObligations>(
                &RecordId::new("bill-1"),
                ActionPayload::new(PAY_CHOICE, serde_json::Value::Null),
            )
            .await;
        assert!(matches!(again, Err(StoreError::ActionRejected { .. })));
    }

    #[tokio::test]
    async fn test_payer_defaults_to_patient() {
        let store = MemoryStore::new();
        sample_ledger(&store).unwrap();
        store
            .submit_action::<PatientObligations>(
                &RecordId::new("bill-3"),
                ActionPayload::new(PAY_CHOICE, serde_json::Value::Null),
            )
            .await
            .unwrap();
        assert!(store
            .records::<PaymentReceipts>()
            .iter()
            .any(|r| r.payload.payment_id == "PAY-1003" && r.payload.payer == DEFAULT_PAYER));
    }
}
