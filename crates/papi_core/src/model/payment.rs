//! Payment domain model.
//!
//! # Responsibility
//! - Define the nested payment document shared by every repository backend.
//! - Check the format constraints that storage encodings rely on.
//!
//! # Invariants
//! - `id` is assigned by the caller and never changes after creation.
//! - `resource_type` is normalized to [`PAYMENT_RESOURCE_TYPE`] by repositories.
//! - Amount fields never contain commas, quotes or parentheses once validated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Value of the `type` attribute of every stored payment.
pub const PAYMENT_RESOURCE_TYPE: &str = "Payment";

const MAX_AMOUNT_CHARS: usize = 20;

static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]*(\.[0-9]*)?$").expect("valid amount regex"));
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

/// Stable payment identifier, assigned by the caller.
pub type PaymentId = Uuid;

/// Amount of money paired with its ISO 4217 currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Money {
    /// Decimal value as text, digits and at most one `.`.
    pub amount: String,
    /// Three uppercase letters.
    pub currency: String,
}

impl Money {
    pub fn new(amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
        }
    }
}

/// Beneficiary or debtor details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentParty {
    pub account_name: String,
    pub account_number: String,
    /// `IBAN` or `BBAN`.
    pub account_number_code: String,
    /// Single digit account type, defaults to 0.
    pub account_type: i64,
    pub address: String,
    pub bank_id: String,
    pub bank_id_code: String,
    /// Client name, as opposed to the name given with the account.
    pub name: String,
}

/// Charges applied to the payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargesInformation {
    pub bearer_code: String,
    pub receiver_charges_amount: String,
    pub receiver_charges_currency: String,
    /// Ordered, duplicates allowed.
    pub sender_charges: Vec<Money>,
}

impl ChargesInformation {
    /// Receiver charge as one amount/currency pair.
    pub fn receiver_charges(&self) -> Money {
        Money::new(
            self.receiver_charges_amount.as_str(),
            self.receiver_charges_currency.as_str(),
        )
    }
}

/// Foreign exchange details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentFx {
    pub contract_reference: String,
    pub exchange_rate: String,
    pub original_amount: String,
    pub original_currency: String,
}

impl PaymentFx {
    /// Original amount as one amount/currency pair.
    pub fn original(&self) -> Money {
        Money::new(
            self.original_amount.as_str(),
            self.original_currency.as_str(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsorParty {
    pub account_number: String,
    pub bank_id: String,
    pub bank_id_code: String,
}

/// Payment attributes carried by a [`Payment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentAttributes {
    pub amount: String,
    pub currency: String,
    pub beneficiary_party: PaymentParty,
    pub debtor_party: PaymentParty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charges_information: Option<ChargesInformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<PaymentFx>,
    pub sponsor_party: SponsorParty,
    pub end_to_end_reference: String,
    pub numeric_reference: String,
    pub payment_id: String,
    pub payment_purpose: String,
    pub payment_scheme: String,
    pub payment_type: String,
    /// ISO 8601 calendar date, `YYYY-MM-DD`.
    pub processing_date: String,
    pub reference: String,
    pub scheme_payment_sub_type: String,
    pub scheme_payment_type: String,
}

/// Root payment resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Serialized as `type`. Repositories overwrite whatever the caller set.
    #[serde(rename = "type", default)]
    pub resource_type: String,
    pub id: PaymentId,
    pub organisation_id: Uuid,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub attributes: PaymentAttributes,
}

impl Payment {
    /// Creates an empty payment at version 0.
    pub fn new(id: PaymentId, organisation_id: Uuid) -> Self {
        Self {
            resource_type: PAYMENT_RESOURCE_TYPE.to_string(),
            id,
            organisation_id,
            version: 0,
            attributes: PaymentAttributes::default(),
        }
    }

    /// Returns a copy with `resource_type` forced to the canonical value.
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.resource_type = PAYMENT_RESOURCE_TYPE.to_string();
        copy
    }

    /// Checks the format constraints every stored payment must satisfy.
    ///
    /// Empty values are accepted for every checked field.
    ///
    /// # Errors
    /// - Returns the first offending field when an amount, currency or
    ///   processing date is malformed.
    pub fn validate(&self) -> Result<(), PaymentValidationError> {
        let attrs = &self.attributes;
        check_amount("amount", &attrs.amount)?;
        check_currency("currency", &attrs.currency)?;

        if let Some(charges) = &attrs.charges_information {
            check_amount(
                "charges_information.receiver_charges_amount",
                &charges.receiver_charges_amount,
            )?;
            check_currency(
                "charges_information.receiver_charges_currency",
                &charges.receiver_charges_currency,
            )?;
            for charge in &charges.sender_charges {
                check_amount("charges_information.sender_charges.amount", &charge.amount)?;
                check_currency(
                    "charges_information.sender_charges.currency",
                    &charge.currency,
                )?;
            }
        }

        if let Some(fx) = &attrs.fx {
            check_amount("fx.original_amount", &fx.original_amount)?;
            check_currency("fx.original_currency", &fx.original_currency)?;
        }

        if !attrs.processing_date.is_empty() && !DATE_RE.is_match(&attrs.processing_date) {
            return Err(PaymentValidationError::InvalidProcessingDate(
                attrs.processing_date.clone(),
            ));
        }

        Ok(())
    }
}

/// Format violations detected by [`Payment::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentValidationError {
    InvalidAmount { field: &'static str, value: String },
    InvalidCurrency { field: &'static str, value: String },
    InvalidProcessingDate(String),
    /// Incrementing the version would overflow.
    VersionOverflow(u32),
}

impl Display for PaymentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAmount { field, value } => {
                write!(f, "invalid amount `{value}` in `{field}`")
            }
            Self::InvalidCurrency { field, value } => {
                write!(f, "invalid currency `{value}` in `{field}`")
            }
            Self::InvalidProcessingDate(value) => {
                write!(f, "invalid processing date `{value}`; expected YYYY-MM-DD")
            }
            Self::VersionOverflow(version) => {
                write!(f, "version {version} cannot be incremented")
            }
        }
    }
}

impl Error for PaymentValidationError {}

fn check_amount(field: &'static str, value: &str) -> Result<(), PaymentValidationError> {
    if value.is_empty() || (value.len() <= MAX_AMOUNT_CHARS && AMOUNT_RE.is_match(value)) {
        return Ok(());
    }
    Err(PaymentValidationError::InvalidAmount {
        field,
        value: value.to_string(),
    })
}

fn check_currency(field: &'static str, value: &str) -> Result<(), PaymentValidationError> {
    if value.is_empty() || CURRENCY_RE.is_match(value) {
        return Ok(());
    }
    Err(PaymentValidationError::InvalidCurrency {
        field,
        value: value.to_string(),
    })
}
