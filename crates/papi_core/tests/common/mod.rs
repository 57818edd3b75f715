#![allow(dead_code)]

use papi_core::{
    ChargesInformation, MapPaymentRepository, Money, Payment, PaymentFx, PaymentRepository,
    StorageConfig,
};
use uuid::Uuid;

/// Fully populated payment, every optional group present.
pub fn sample_payment() -> Payment {
    let id = Uuid::parse_str("4ee3a8d8-ca7b-4290-a52c-dd5b6165ec43").unwrap();
    let org = Uuid::parse_str("743d5b63-8e6f-432e-a8fa-c5d8d2ee5fcb").unwrap();
    let mut payment = Payment::new(id, org);

    let attrs = &mut payment.attributes;
    attrs.amount = "100.21".to_string();
    attrs.currency = "GBP".to_string();

    attrs.beneficiary_party.account_name = "W Owens".to_string();
    attrs.beneficiary_party.account_number = "31926819".to_string();
    attrs.beneficiary_party.account_number_code = "BBAN".to_string();
    attrs.beneficiary_party.address = "1 The Beneficiary Localtown SE2".to_string();
    attrs.beneficiary_party.bank_id = "403000".to_string();
    attrs.beneficiary_party.bank_id_code = "GBDSC".to_string();
    attrs.beneficiary_party.name = "Wilfred Jeremiah Owens".to_string();

    attrs.debtor_party.account_name = "EJ Brown Black".to_string();
    attrs.debtor_party.account_number = "GB29XABC10161234567801".to_string();
    attrs.debtor_party.account_number_code = "IBAN".to_string();
    attrs.debtor_party.address = "10 Debtor Crescent Sourcetown NE1".to_string();
    attrs.debtor_party.bank_id = "203301".to_string();
    attrs.debtor_party.bank_id_code = "GBDSC".to_string();
    attrs.debtor_party.name = "Emelia Jane Brown".to_string();

    attrs.charges_information = Some(ChargesInformation {
        bearer_code: "SHAR".to_string(),
        receiver_charges_amount: "1.00".to_string(),
        receiver_charges_currency: "USD".to_string(),
        sender_charges: vec![Money::new("5.00", "GBP"), Money::new("10.00", "USD")],
    });
    attrs.fx = Some(PaymentFx {
        contract_reference: "FX123".to_string(),
        exchange_rate: "2.00000".to_string(),
        original_amount: "200.42".to_string(),
        original_currency: "USD".to_string(),
    });

    attrs.end_to_end_reference = "Wil piano Jan".to_string();
    attrs.numeric_reference = "1002001".to_string();
    attrs.payment_id = "123456789012345678".to_string();
    attrs.payment_purpose = "Paying for goods/services".to_string();
    attrs.payment_scheme = "FPS".to_string();
    attrs.payment_type = "Credit".to_string();
    attrs.processing_date = "2017-01-18".to_string();
    attrs.reference = "Payment for Em's piano lessons".to_string();
    attrs.scheme_payment_sub_type = "InternetBanking".to_string();
    attrs.scheme_payment_type = "ImmediatePayment".to_string();

    attrs.sponsor_party.account_number = "56781234".to_string();
    attrs.sponsor_party.bank_id = "123123".to_string();
    attrs.sponsor_party.bank_id_code = "GBDSC".to_string();

    payment
}

/// Id whose text form sorts in the same order as `n`.
pub fn ordered_id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Sample payment re-addressed to `ordered_id(n)`.
pub fn numbered_payment(n: u128) -> Payment {
    let mut payment = sample_payment();
    payment.id = ordered_id(n);
    payment
}

/// One fresh instance of every backend, labelled for assertion messages.
pub fn backends() -> Vec<(&'static str, Box<dyn PaymentRepository>)> {
    vec![
        ("memory", Box::new(MapPaymentRepository::new())),
        (
            "sqlite",
            Box::new(StorageConfig::open_sqlite_in_memory().unwrap()),
        ),
    ]
}
