//! Metrics collection.
//!
//! # Metrics
//! - `sale_network_switch_total` (counter): by currency, outcome
//! - `sale_transactions_total` (counter): by kind (approve/purchase/revoke), outcome
//! - `sale_purchases_total` (counter): by final outcome
//! - `sale_journal_records` (gauge): records held in the purchase journal
//!
//! No exporter is installed here; an embedding application may install one.

use metrics::{counter, gauge};

pub fn record_network_switch(currency: &'static str, success: bool) {
    counter!(
        "sale_network_switch_total",
        "currency" => currency,
        "outcome" => outcome(success)
    )
    .increment(1);
}

pub fn record_transaction(kind: &'static str, outcome: &'static str) {
    counter!("sale_transactions_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_purchase(outcome: &'static str) {
    counter!("sale_purchases_total", "outcome" => outcome).increment(1);
}

pub fn record_journal_size(size: usize) {
    gauge!("sale_journal_records").set(size as f64);
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}
