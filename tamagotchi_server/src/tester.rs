//! Synthetic test batches.
//!
//! A test suite sends a fixed mix of payouts to the configured tester creditors:
//! * `payouts_per_creditor` single payouts per creditor, each with a distinct small amount so that callbacks can be
//!   told apart by eye,
//! * optionally, multi-instruction envelopes,
//! * one payout per creditor that is far too large, which the network is expected to refuse.
use actix_web::web;
use clearing_client::{
    ClearingTransport,
    FinancialInstitution,
    Party,
    PayoutMessage,
    PayoutTransaction,
    PersonId,
};
use log::*;
use tamagotchi_engine::{BatchItem, DispatchApi, MessageStore, TestSuiteApi, TestSuiteManagement};
use tmg_common::CLP_CURRENCY_CODE;

use crate::{
    config::{MerchantConfig, TesterConfig},
    errors::ServerError,
};

pub const TOO_MANY_PESOS: &str = "10000000";

/// Parses `name:rut:bank_id:account_number:account_type:email`.
pub fn creditor_from_colon_separated_string(s: &str) -> Result<Party, ServerError> {
    let fields = s.split(':').collect::<Vec<_>>();
    let [name, rut, bank_id, account, account_type, email] = fields.as_slice() else {
        return Err(ServerError::ConfigurationError(format!(
            "Expected 6 colon separated fields for a creditor, but found {}",
            fields.len()
        )));
    };
    Ok(Party {
        name: name.to_string(),
        identification: PersonId::chilean(*rut),
        financial_institution: FinancialInstitution::new(*bank_id),
        account: account.to_string(),
        account_type: account_type.to_string(),
        email: email.to_string(),
    })
}

fn payout(merchant: &MerchantConfig, transactions: &[(&str, &str, &Party)]) -> PayoutMessage {
    let transactions = transactions
        .iter()
        .map(|&(amount, description, creditor)| {
            PayoutTransaction::new(CLP_CURRENCY_CODE, amount, description, merchant.party(), creditor.clone())
        })
        .collect();
    PayoutMessage::new(merchant.outbound_header(), transactions)
}

/// The envelopes a new test suite sends, in order.
pub fn compose_batch(merchant: &MerchantConfig, tester: &TesterConfig) -> Vec<BatchItem> {
    let n = tester.payouts_per_creditor;
    let mut items = Vec::with_capacity(tester.creditors.len() * (n + 2) + 1);
    for (i, creditor) in tester.creditors.iter().enumerate() {
        for j in 0..n {
            let amount = (i * n + j + 1).to_string();
            let description = format!("Test {i}-{j}");
            let message = payout(merchant, &[(amount.as_str(), description.as_str(), creditor)]);
            items.push(BatchItem::new(format!("One peso single payout {i}-{j}"), message));
        }
    }
    if tester.multi_payouts {
        for (i, creditor) in tester.creditors.iter().enumerate() {
            let message = payout(merchant, &[
                ("2", "Two pesos with company", creditor),
                ("3", "Three pesos with company", creditor),
                ("4", "Four pesos with company", creditor),
            ]);
            items.push(BatchItem::new(format!("Few pesos multi payout {i}"), message));
        }
        if let [first, second, ..] = tester.creditors.as_slice() {
            let message = payout(merchant, &[
                ("3000", "Three thousand pesos mixed creditors", first),
                ("4000", "Four thousand pesos mixed creditors", second),
            ]);
            items.push(BatchItem::new("Mixed creditors", message));
        }
    }
    for (i, creditor) in tester.creditors.iter().enumerate() {
        let message = payout(merchant, &[(TOO_MANY_PESOS, "Ten million pesos alone", creditor)]);
        items.push(BatchItem::new(format!("Too many pesos single payout {i}"), message));
    }
    items
}

/// Runs the batch on the actix runtime and returns immediately. The outcome is only logged.
pub fn spawn_batch<S, B, T>(
    suites: web::Data<TestSuiteApi<S>>,
    dispatcher: web::Data<DispatchApi<B, T>>,
    suite_id: i64,
    items: Vec<BatchItem>,
) where
    S: TestSuiteManagement + 'static,
    B: MessageStore + 'static,
    T: ClearingTransport + 'static,
{
    actix_web::rt::spawn(async move {
        match suites.run_batch(suite_id, &dispatcher, items).await {
            Ok(summary) => debug!("🧪️ Batch for test suite {suite_id} done. {summary:?}"),
            Err(e) => error!("🧪️ Batch for test suite {suite_id} failed. {e}"),
        }
    });
}
