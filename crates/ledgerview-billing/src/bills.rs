//! # Bills Screen
//!
//! Lists patient obligations joined with their payment receipts and shows a
//! single bill with a "Pay Bill" action.

use std::sync::Arc;

use ledgerview_core::fields::{opt_text, text, yes_no};
use ledgerview_core::view::SearchPredicate;
use ledgerview_core::{
    submit_action, ActionDescriptor, ActionOutcome, DetailView, FieldDeclaration, ListView,
    RecordId, RecordPair, RecordStore, TabularScreen, ViewError, ViewModel, ViewModelBuilder,
    ViewRouter, ViewsConfig,
};

use crate::model::{BillOverview, PatientObligations, PaymentReceipts};

/// Route parameter naming the bill's record id.
pub const BILL_PARAM: &str = "billId";

/// Choice exercised to pay an obligation.
pub const PAY_CHOICE: &str = "PayPatientObligation";

/// Bills joined with receipts on payment id.
#[derive(Debug, Clone, Copy)]
pub struct BillsViewModel;

impl ViewModel for BillsViewModel {
    type Left = PatientObligations;
    type Right = PaymentReceipts;
    type Composite = BillOverview;

    fn shape(pair: RecordPair<Self>) -> BillOverview {
        BillOverview {
            bill: pair.left,
            receipt: pair.right,
        }
    }
}

/// The screen type returned by [`bill_routes`].
pub type BillsScreen<S> = TabularScreen<BillsViewModel, S>;

// ─── List ────────────────────────────────────────────────

/// The "Bills" list.
pub fn bills_list() -> ListView<BillOverview> {
    let fields = vec![
        FieldDeclaration::new("Provider", |o: &BillOverview| o.bill.payload.provider.clone()),
        FieldDeclaration::new("Amount", |o: &BillOverview| text(&o.bill.payload.amount)),
        FieldDeclaration::new("Procedure Code", |o: &BillOverview| opt_text(o.procedure_code())),
        FieldDeclaration::new("Paid", |o: &BillOverview| yes_no(o.is_paid())),
    ];
    ListView::new(
        "Bills",
        fields,
        |o: &BillOverview| o.bill.record_id.to_string(),
        |o: &BillOverview| o.bill.record_id.to_string(),
    )
    .with_search(search_bills)
}

/// Case-insensitive match on provider or procedure code. Blank search
/// matches everything.
pub fn search_bills(search: &str) -> SearchPredicate<BillOverview> {
    let needle = search.trim().to_lowercase();
    Box::new(move |overview: &BillOverview| {
        needle.is_empty()
            || overview.bill.payload.provider.to_lowercase().contains(&needle)
            || overview
                .procedure_code()
                .is_some_and(|code| code.to_lowercase().contains(&needle))
    })
}

// ─── Detail ──────────────────────────────────────────────

/// The "Bill" detail view with its pay action.
pub fn bill_detail() -> DetailView<BillOverview> {
    let groups = vec![
        vec![
            FieldDeclaration::new("CoPay", |o: &BillOverview| {
                opt_text(o.encounter().and_then(|d| d.co_pay.as_ref()))
            }),
            FieldDeclaration::new("Patient Responsibility", |o: &BillOverview| {
                opt_text(o.encounter().and_then(|d| d.patient_responsibility.as_ref()))
            }),
        ],
        vec![
            FieldDeclaration::new("Provider", |o: &BillOverview| o.bill.payload.provider.clone()),
            FieldDeclaration::new("Appointment Priority", |o: &BillOverview| {
                opt_text(o.encounter().map(|d| &d.appointment_priority))
            }),
        ],
        vec![
            FieldDeclaration::new("Procedure Code", |o: &BillOverview| {
                opt_text(o.procedure_code())
            }),
            FieldDeclaration::new("Diagnosis Code", |o: &BillOverview| {
                opt_text(o.encounter().map(|d| &d.diagnosis_code))
            }),
            FieldDeclaration::new("Site Service Code", |o: &BillOverview| {
                opt_text(o.encounter().map(|d| &d.site_service_code))
            }),
        ],
    ];
    DetailView::new("Bill", groups, |o: &BillOverview| o.bill.record_id.to_string())
        .with_actions(|o: &BillOverview| vec![pay_bill(o.bill.record_id.clone())])
}

/// The "Pay Bill" action on one obligation.
pub fn pay_bill(record_id: RecordId) -> ActionDescriptor {
    ActionDescriptor::new::<PatientObligations>(record_id, PAY_CHOICE)
        .with_button_title("Pay Bill")
        .with_submit_title("Pay Bill Now")
        .with_prompt("Pay Bill", "This bill is accurate and ready to be paid?")
        .with_success(
            "Bill has been paid!",
            "The bill for this procedure has been paid.",
        )
}

/// Submit the pay action for `record_id`.
///
/// # Errors
///
/// Returns `ViewError::Action` if the store rejects the payment.
pub async fn pay<S: RecordStore>(store: &S, record_id: RecordId) -> Result<ActionOutcome, ViewError> {
    submit_action::<PatientObligations, S>(store, &pay_bill(record_id)).await
}

// ─── Routes ──────────────────────────────────────────────

/// Mount the bills list and bill detail at `config.base_path`.
///
/// # Errors
///
/// Returns `ViewError::Config` if the base path is not a valid route root.
pub fn bill_routes<S: RecordStore>(
    store: Arc<S>,
    config: &ViewsConfig,
) -> Result<BillsScreen<S>, ViewError> {
    let router = ViewRouter::new(config.base_path.clone(), BILL_PARAM)?;
    let list = bills_list()
        .with_placeholder(config.search_placeholder.clone())
        .with_empty_value(config.empty_value.clone());
    let detail = bill_detail().with_empty_value(config.empty_value.clone());
    tracing::debug!(base_path = %config.base_path, "Mounted bill routes");
    Ok(TabularScreen::new(
        router,
        list,
        detail,
        ViewModelBuilder::new(store),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EncounterDetails, PatientObligation, PaymentReceipt};
    use ledgerview_core::{compose, Record};

    fn obligation(payment_id: &str, provider: &str, code: Option<&str>) -> PatientObligation {
        PatientObligation {
            bill_id: format!("B-{payment_id}"),
            payment_id: payment_id.to_string(),
            provider: provider.to_string(),
            amount: "50.0".to_string(),
            encounter_details: code.map(|code| EncounterDetails {
                procedure_code: code.to_string(),
                diagnosis_code: "D1".to_string(),
                site_service_code: "11".to_string(),
                appointment_priority: "Routine".to_string(),
                co_pay: None,
                patient_responsibility: Some("10.0".to_string()),
            }),
        }
    }

    fn overviews() -> Vec<BillOverview> {
        compose::<BillsViewModel>(
            &[
                Record::new("#1", obligation("P1", "Radiologist", Some("X-RAY"))),
                Record::new("#2", obligation("P2", "Clinic", None)),
            ],
            &[Record::new(
                "#r1",
                PaymentReceipt {
                    payment_id: "P1".to_string(),
                    amount: "50.0".to_string(),
                    payer: "Patient".to_string(),
                },
            )],
        )
    }

    #[test]
    fn test_list_columns() {
        let list = bills_list().render("/bills", &overviews());
        assert_eq!(
            list.headers,
            vec!["Provider", "Amount", "Procedure Code", "Paid", ""]
        );
        assert_eq!(list.column("Paid"), vec!["Yes", "No"]);
        assert_eq!(list.column("Procedure Code"), vec!["X-RAY", ""]);
        assert_eq!(list.rows[0].url, "/bills/#1");
    }

    #[test]
    fn test_search_provider_or_procedure_code() {
        let records = overviews();
        let predicate = search_bills("x-ray");
        assert_eq!(records.iter().filter(|&o| predicate(o)).count(), 1);

        let predicate = search_bills("CLINIC");
        assert_eq!(records.iter().filter(|&o| predicate(o)).count(), 1);

        let predicate = search_bills("  ");
        assert_eq!(records.iter().filter(|&o| predicate(o)).count(), 2);
    }

    #[test]
    fn test_paid_follows_receipt_match() {
        let receipt = Record::new(
            "#r1",
            PaymentReceipt {
                payment_id: "P1".to_string(),
                amount: "50.0".to_string(),
                payer: "Patient".to_string(),
            },
        );
        let paid = RecordPair::<BillsViewModel>::new(
            Record::new("#1", obligation("P1", "Radiologist", None)),
            Some(receipt),
        );
        let unpaid = RecordPair::<BillsViewModel>::new(
            Record::new("#2", obligation("P2", "Clinic", None)),
            None,
        );
        assert!(paid.is_matched());
        assert!(!unpaid.is_matched());
        assert!(BillsViewModel::shape(paid).is_paid());
        assert!(!BillsViewModel::shape(unpaid).is_paid());
    }

    #[test]
    fn test_pay_action_copy() {
        let action = pay_bill(RecordId::new("#1"));
        assert_eq!(action.kind, "PatientObligation");
        assert_eq!(action.choice, PAY_CHOICE);
        assert_eq!(action.button_title, "Pay Bill");
        assert_eq!(action.submit_title, "Pay Bill Now");
        assert_eq!(action.prompt.title, "Pay Bill");
        assert_eq!(action.success.content, "The bill for this procedure has been paid.");
    }
}
