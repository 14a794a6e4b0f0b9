//! Mock checkout
//!
//! No payment is processed. The flow only checks the shipping/payment form,
//! clears the persisted shopping list and hands back a receipt.
//!
//! ```text
//! EnteringInfo ──submit──► Validating ──ok──► Finalizing ──► Done
//!      ▲                       │                   │
//!      └──── field error ──────┘                   └──► Rejected (storage failure, may resubmit)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};
use validator::{Validate, ValidationError as FieldError, ValidationErrors};

use crate::domain::value_objects::Money;
use crate::repositories::ShoppingListRepository;
use crate::{Result, ShopError, ValidationError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Credit,
    Debit,
    Pix,
}

impl PaymentMethod {
    pub fn uses_card(&self) -> bool { matches!(self, Self::Credit | Self::Debit) }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "pix" => Ok(Self::Pix),
            other => Err(format!("unknown payment method {other:?} (credit, debit, pix)")),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Credit => write!(f, "credit"), Self::Debit => write!(f, "debit"), Self::Pix => write!(f, "pix") }
    }
}

/// Shipping and payment details as typed by the user.
#[derive(Clone, Debug, Default, Validate)]
#[validate(schema(function = "validate_card", skip_on_field_errors = false))]
pub struct CheckoutForm {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    pub payment_method: PaymentMethod,
    pub card_number: String,
    pub card_expiry: String,
    pub card_cvv: String,
}

impl CheckoutForm {
    pub fn pix(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self { name: name.into(), address: address.into(), payment_method: PaymentMethod::Pix, ..Default::default() }
    }

    pub fn card(
        name: impl Into<String>,
        address: impl Into<String>,
        method: PaymentMethod,
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            payment_method: method,
            card_number: number.into(),
            card_expiry: expiry.into(),
            card_cvv: cvv.into(),
        }
    }

    /// First violated rule, in form order: name, address, card number,
    /// expiry, CVV.
    pub fn check(&self) -> std::result::Result<(), ValidationError> {
        match self.validate() {
            Ok(()) => Ok(()),
            Err(errors) => Err(first_violation(&errors)),
        }
    }
}

fn not_blank(value: &str) -> std::result::Result<(), FieldError> {
    if value.trim().is_empty() { Err(FieldError::new("blank")) } else { Ok(()) }
}

fn validate_card(form: &CheckoutForm) -> std::result::Result<(), FieldError> {
    if !form.payment_method.uses_card() { return Ok(()); }
    if card_digits(&form.card_number).len() != 16 || !form.card_number.chars().all(is_card_char) {
        return Err(FieldError::new("card_number"));
    }
    let expiry = form.card_expiry.trim();
    if expiry.chars().count() != 5 || !expiry.contains('/') {
        return Err(FieldError::new("card_expiry"));
    }
    let cvv = form.card_cvv.trim();
    if cvv.len() != 3 || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new("card_cvv"));
    }
    Ok(())
}

fn is_card_char(c: char) -> bool { c.is_ascii_digit() || c.is_whitespace() || c == '-' }

fn card_digits(number: &str) -> String { number.chars().filter(char::is_ascii_digit).collect() }

fn first_violation(errors: &ValidationErrors) -> ValidationError {
    let fields = errors.field_errors();
    if fields.contains_key("name") { return ValidationError::MissingName; }
    if fields.contains_key("address") { return ValidationError::MissingAddress; }
    let card_code = fields.get("__all__").and_then(|errs| errs.first()).map(|e| &*e.code);
    match card_code {
        Some("card_expiry") => ValidationError::InvalidCardExpiry,
        Some("card_cvv") => ValidationError::InvalidCardCvv,
        _ => ValidationError::InvalidCardNumber,
    }
}

/// `"1234567812345678"` → `"1234 5678 1234 5678"`; non-digits dropped, at most 16 digits.
pub fn format_card_number(input: &str) -> String {
    let digits: Vec<char> = card_digits(input).chars().take(16).collect();
    digits.chunks(4).map(|c| c.iter().collect::<String>()).collect::<Vec<_>>().join(" ")
}

/// `"1228"` → `"12/28"`; non-digits dropped, at most four digits kept.
pub fn format_expiry(input: &str) -> String {
    let digits: String = card_digits(input).chars().take(4).collect();
    if digits.len() > 2 { format!("{}/{}", &digits[..2], &digits[2..]) } else { digits }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    EnteringInfo,
    Validating,
    Finalizing,
    Done,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub customer: String,
    pub payment_method: PaymentMethod,
    pub total: Money,
    /// Last four digits for card payments.
    pub card_last4: Option<String>,
}

/// One pass through the checkout screen for a list totalling `total`.
#[derive(Debug)]
pub struct CheckoutFlow {
    state: CheckoutState,
    total: Money,
}

impl CheckoutFlow {
    pub fn new(total: Money) -> Self { Self { state: CheckoutState::EnteringInfo, total } }

    pub fn state(&self) -> CheckoutState { self.state }
    pub fn total(&self) -> Money { self.total }

    /// Validates `form` and, if it passes, clears the persisted shopping list.
    ///
    /// A field error leaves the flow in `EnteringInfo`; a storage failure
    /// moves it to `Rejected`, from which the form can be submitted again.
    pub async fn submit(&mut self, form: &CheckoutForm, list: &ShoppingListRepository) -> Result<CheckoutReceipt> {
        if self.state == CheckoutState::Done { return Err(ShopError::CheckoutCompleted); }

        self.state = CheckoutState::Validating;
        if let Err(e) = form.check() {
            warn!(error = %e, "checkout form rejected");
            self.state = CheckoutState::EnteringInfo;
            return Err(e.into());
        }

        self.state = CheckoutState::Finalizing;
        if let Err(e) = list.try_clear().await {
            warn!(error = %e, "could not clear shopping list at checkout");
            self.state = CheckoutState::Rejected;
            return Err(e.into());
        }

        self.state = CheckoutState::Done;
        info!(total = %self.total, method = %form.payment_method, "checkout completed");
        let card_last4 = form.payment_method.uses_card().then(|| {
            let digits = card_digits(&form.card_number);
            digits[digits.len().saturating_sub(4)..].to_string()
        });
        Ok(CheckoutReceipt {
            customer: form.name.trim().to_string(),
            payment_method: form.payment_method,
            total: self.total,
            card_last4,
        })
    }
}
