use actix_web::HttpRequest;
use clearing_client::{
    FinancialInstitution,
    Party,
    PayinMessage,
    PayinTransaction,
    PayoutMessage,
    PayoutTransaction,
    PersonId,
    SIGNATURE_HEADER,
};
use log::*;
use regex::Regex;
use tmg_common::{digits_only, CLP_CURRENCY_CODE};

use crate::{
    config::MerchantConfig,
    data_objects::{PayinForm, PayoutForm},
    errors::ServerError,
};

/// Normalises a Chilean RUT to `NNNNNNNN-D`. Separators and stray characters are dropped, and the last remaining
/// character is taken as the check digit.
pub fn force_rut_format(raw_rut: &str) -> Result<String, ServerError> {
    let re = Regex::new(r"[^0-9kK]+").map_err(|e| ServerError::Unspecified(e.to_string()))?;
    let rut = re.replace_all(raw_rut, "");
    if rut.len() < 2 {
        return Err(ServerError::InvalidRequestBody(format!("'{raw_rut}' is not a valid RUT")));
    }
    let (body, check_digit) = rut.split_at(rut.len() - 1);
    Ok(format!("{body}-{check_digit}"))
}

/// Reads the digits out of a free-text amount and lowers it to `max_amount` when that is set.
pub fn clamp_amount(raw: &str, max_amount: Option<u64>) -> Result<u64, ServerError> {
    let amount = digits_only(raw).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    match max_amount {
        Some(max) if amount > max => {
            info!("💻️ Amount {amount} exceeds the maximum of {max}. Using {max} instead.");
            Ok(max)
        },
        _ => Ok(amount),
    }
}

pub fn creditor_from_form(form: &PayoutForm) -> Result<Party, ServerError> {
    Ok(Party {
        name: form.name.clone(),
        identification: PersonId::chilean(force_rut_format(&form.rut)?),
        financial_institution: FinancialInstitution::new(form.bank_id.as_str()),
        account: form.account_number.clone(),
        account_type: form.account_type.clone(),
        email: form.email.clone(),
    })
}

/// Builds a single-payout envelope from the merchant to the creditor named in the form.
pub fn payout_from_form(
    form: &PayoutForm,
    merchant: &MerchantConfig,
    max_amount: Option<u64>,
) -> Result<PayoutMessage, ServerError> {
    let amount = clamp_amount(&form.amount, max_amount)?.to_string();
    let creditor = creditor_from_form(form)?;
    let description = form.description.as_str();
    let tx = PayoutTransaction::new(CLP_CURRENCY_CODE, amount.as_str(), description, merchant.party(), creditor);
    Ok(PayoutMessage::new(merchant.outbound_header(), vec![tx]))
}

/// Builds a single interactive payin envelope in favour of the merchant.
pub fn payin_from_form(
    form: &PayinForm,
    merchant: &MerchantConfig,
    max_amount: Option<u64>,
) -> Result<PayinMessage, ServerError> {
    let amount = clamp_amount(&form.amount, max_amount)?.to_string();
    let description = form.description.as_str();
    let tx = PayinTransaction::interactive(CLP_CURRENCY_CODE, amount.as_str(), description, merchant.party())
        .with_redirects(form.success_url.clone(), form.failure_url.clone());
    Ok(PayinMessage::new(merchant.outbound_header(), vec![tx]))
}

/// The detached signature of a network callback. A header that is not valid text counts as missing.
pub fn callback_signature(req: &HttpRequest) -> Option<&str> {
    req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod test {
    use super::*;

    fn payout_form(rut: &str, amount: &str) -> PayoutForm {
        PayoutForm {
            name: "Bob".into(),
            rut: rut.into(),
            email: "bob@example.com".into(),
            bank_id: "BANCO_BICE_CL".into(),
            account_number: "4242".into(),
            account_type: "current_account".into(),
            amount: amount.into(),
            description: "Rent".into(),
        }
    }

    #[test]
    fn rut_formatting() {
        assert_eq!(force_rut_format("12.345.678-9").unwrap(), "12345678-9");
        assert_eq!(force_rut_format("7654321k").unwrap(), "7654321-k");
        assert_eq!(force_rut_format(" 11 111 111 K ").unwrap(), "11111111-K");
        assert!(force_rut_format("-").is_err());
        assert!(force_rut_format("").is_err());
    }

    #[test]
    fn amounts_are_cleaned_and_clamped() {
        assert_eq!(clamp_amount("$1.500", None).unwrap(), 1500);
        assert_eq!(clamp_amount("1.500.000", Some(100_000)).unwrap(), 100_000);
        assert_eq!(clamp_amount("99", Some(100)).unwrap(), 99);
        assert!(matches!(clamp_amount("lots", None), Err(ServerError::InvalidRequestBody(_))));
    }

    #[test]
    fn payout_is_built_from_the_form() {
        let merchant = MerchantConfig { legal_name: "Tamagotchi".into(), ..MerchantConfig::default() };
        let message = payout_from_form(&payout_form("22.222.222-2", "2.000"), &merchant, Some(1000)).unwrap();
        assert_eq!(message.transactions.len(), 1);
        let tx = &message.transactions[0];
        assert_eq!(tx.amount, "1000");
        assert_eq!(tx.currency, CLP_CURRENCY_CODE);
        assert_eq!(tx.creditor.identification.id, "22222222-2");
        assert_eq!(tx.debtor.name, "Tamagotchi");
        assert_eq!(message.header.sender.fin_id, merchant.merchant_id);
    }

    #[test]
    fn payin_is_in_favour_of_the_merchant() {
        let merchant = MerchantConfig { legal_name: "Tamagotchi".into(), ..MerchantConfig::default() };
        let form = PayinForm {
            amount: "5000".into(),
            description: "Top up".into(),
            success_url: Some("https://shop.example/ok".into()),
            failure_url: None,
        };
        let message = payin_from_form(&form, &merchant, None).unwrap();
        let tx = &message.transactions[0];
        assert_eq!(tx.creditor.name, "Tamagotchi");
        assert!(tx.debtor.is_none());
        assert_eq!(tx.success_url.as_deref(), Some("https://shop.example/ok"));
    }
}
