//! # ledgerview-billing
//!
//! Patient billing screens over `ledgerview-core`: a "Bills" list of
//! patient obligations joined with their payment receipts, and a "Bill"
//! detail view offering the "Pay Bill" action.
//!
//! [`seed`] provides an in-memory ledger for the `ledgerview` binary and
//! tests.

pub mod bills;
pub mod model;
pub mod seed;

pub use bills::{bill_routes, pay, BillsScreen, BillsViewModel, BILL_PARAM, PAY_CHOICE};
pub use model::{
    BillOverview, EncounterDetails, PatientObligation, PatientObligations, PaymentReceipt,
    PaymentReceipts,
};
