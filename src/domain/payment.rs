//! Payment methods, the payment step machine and the records exchanged with
//! the payment service.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::money;
use super::order::PaymentStatus;
use super::timestamp;

pub const PAYMENT_SUCCESS_MESSAGE: &str = "Payment completed successfully!";
pub const PAYMENT_FAILURE_MESSAGE: &str = "Payment failed";
pub const PROVIDER_SUCCESS_MESSAGE: &str = "Payment processed successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Mpesa,
    OrangeMoney,
    AirtelMoney,
    AfriMoney,
    CarteBancaire,
    CashOnDelivery,
}

/// How a method is presented in the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInfo {
    pub label: &'static str,
    pub icon: &'static str,
    pub accent_color: &'static str,
}

/// Inputs the details step asks for, per method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredInput {
    PhoneNumber,
    CardNumber,
    CardExpiry,
    CardCvv,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Mpesa,
        PaymentMethod::OrangeMoney,
        PaymentMethod::AirtelMoney,
        PaymentMethod::AfriMoney,
        PaymentMethod::CarteBancaire,
        PaymentMethod::CashOnDelivery,
    ];

    pub fn info(self) -> MethodInfo {
        let (label, icon, accent_color) = match self {
            PaymentMethod::Mpesa => ("M-Pesa", "📱", "#00A859"),
            PaymentMethod::OrangeMoney => ("Orange Money", "🍊", "#FF6600"),
            PaymentMethod::AirtelMoney => ("Airtel Money", "📲", "#ED1C24"),
            PaymentMethod::AfriMoney => ("Afri Money", "💵", "#1E90FF"),
            PaymentMethod::CarteBancaire => ("Bank card", "💳", "#0066CC"),
            PaymentMethod::CashOnDelivery => ("Cash on delivery", "💰", "#28A745"),
        };
        MethodInfo {
            label,
            icon,
            accent_color,
        }
    }

    pub fn is_mobile_money(self) -> bool {
        matches!(
            self,
            PaymentMethod::Mpesa
                | PaymentMethod::OrangeMoney
                | PaymentMethod::AirtelMoney
                | PaymentMethod::AfriMoney
        )
    }

    pub fn required_inputs(self) -> &'static [RequiredInput] {
        match self {
            PaymentMethod::Mpesa
            | PaymentMethod::OrangeMoney
            | PaymentMethod::AirtelMoney
            | PaymentMethod::AfriMoney => &[RequiredInput::PhoneNumber],
            PaymentMethod::CarteBancaire => &[
                RequiredInput::CardNumber,
                RequiredInput::CardExpiry,
                RequiredInput::CardCvv,
            ],
            PaymentMethod::CashOnDelivery => &[],
        }
    }

    /// Parses the backend code (`MPESA`, `CASH_ON_DELIVERY`, ...), case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn code(self) -> &'static str {
        match self {
            PaymentMethod::Mpesa => "MPESA",
            PaymentMethod::OrangeMoney => "ORANGE_MONEY",
            PaymentMethod::AirtelMoney => "AIRTEL_MONEY",
            PaymentMethod::AfriMoney => "AFRI_MONEY",
            PaymentMethod::CarteBancaire => "CARTE_BANCAIRE",
            PaymentMethod::CashOnDelivery => "CASH_ON_DELIVERY",
        }
    }
}

/// Card fields shown for bank cards. They are collected but never checked
/// nor transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodInput {
    MobileMoney { phone_number: String },
    Card(CardFields),
    CashOnDelivery,
}

impl MethodInput {
    fn empty_for(method: PaymentMethod) -> Self {
        match method {
            m if m.is_mobile_money() => MethodInput::MobileMoney {
                phone_number: String::new(),
            },
            PaymentMethod::CarteBancaire => MethodInput::Card(CardFields::default()),
            _ => MethodInput::CashOnDelivery,
        }
    }

    fn phone_number(&self) -> Option<&str> {
        match self {
            MethodInput::MobileMoney { phone_number } => Some(phone_number.trim()),
            _ => None,
        }
    }
}

/// What the caller knows about the charge before a method is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentContext {
    pub order_id: String,
    pub user_id: String,
    pub amount: BigDecimal,
    pub currency: String,
}

/// Body of `POST /paiements`. Built once per attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    order_id: String,
    user_id: String,
    #[serde(rename = "montant", with = "money::as_number")]
    amount: BigDecimal,
    currency: String,
    #[serde(rename = "methode")]
    method: PaymentMethod,
    phone_number: Option<String>,
}

impl PaymentRequest {
    /// Fails when a mobile money method has no phone number. The phone number
    /// is dropped for every other method.
    pub fn new(
        context: &PaymentContext,
        method: PaymentMethod,
        phone_number: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let phone_number = if method.is_mobile_money() {
            match phone_number.map(str::trim).filter(|p| !p.is_empty()) {
                Some(p) => Some(p.to_string()),
                None => return Err(ValidationError::MissingPhoneNumber),
            }
        } else {
            None
        };
        Ok(Self {
            order_id: context.order_id.clone(),
            user_id: context.user_id.clone(),
            amount: context.amount.clone(),
            currency: context.currency.clone(),
            method,
            phone_number,
        })
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn amount(&self) -> &BigDecimal {
        &self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }
}

/// Acknowledgment sent to `POST /paiements/{id}/confirm` in place of a
/// provider webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub message: String,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
}

/// A payment as the backend reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    #[serde(rename = "montant", with = "money::as_number")]
    pub amount: BigDecimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(rename = "methode")]
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub transaction_reference: Option<String>,
    #[serde(default)]
    pub provider_response: Option<String>,
    #[serde(deserialize_with = "timestamp::lenient", default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Outcome shown at the end of a payment attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentResult {
    transaction_reference: Option<String>,
    message: String,
    raw_provider_response: Option<String>,
}

impl PaymentResult {
    pub fn success(transaction_reference: String, raw_provider_response: Option<String>) -> Self {
        Self {
            transaction_reference: Some(transaction_reference),
            message: PAYMENT_SUCCESS_MESSAGE.to_string(),
            raw_provider_response,
        }
    }

    pub fn failure(message: Option<String>) -> Self {
        Self {
            transaction_reference: None,
            message: message.unwrap_or_else(|| PAYMENT_FAILURE_MESSAGE.to_string()),
            raw_provider_response: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.transaction_reference.is_some()
    }

    pub fn transaction_reference(&self) -> Option<&str> {
        self.transaction_reference.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn raw_provider_response(&self) -> Option<&str> {
        self.raw_provider_response.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentStep {
    Select,
    Details {
        method: PaymentMethod,
        input: MethodInput,
    },
    Processing {
        method: PaymentMethod,
    },
    Result(PaymentResult),
}

impl PaymentStep {
    pub fn name(&self) -> &'static str {
        match self {
            PaymentStep::Select => "select",
            PaymentStep::Details { .. } => "details",
            PaymentStep::Processing { .. } => "processing",
            PaymentStep::Result(_) => "result",
        }
    }
}

/// Presentation state of the payment dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSelector {
    step: PaymentStep,
}

impl Default for PaymentSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentSelector {
    pub fn new() -> Self {
        Self {
            step: PaymentStep::Select,
        }
    }

    pub fn step(&self) -> &PaymentStep {
        &self.step
    }

    fn invalid(&self, action: &'static str) -> ValidationError {
        ValidationError::InvalidStep {
            action,
            step: self.step.name(),
        }
    }

    /// Select (or Details, to switch method) → Details.
    pub fn choose(&mut self, method: PaymentMethod) -> Result<(), ValidationError> {
        match self.step {
            PaymentStep::Select | PaymentStep::Details { .. } => {
                self.step = PaymentStep::Details {
                    method,
                    input: MethodInput::empty_for(method),
                };
                Ok(())
            }
            _ => Err(self.invalid("choose a payment method")),
        }
    }

    pub fn set_phone_number(&mut self, phone: &str) -> Result<(), ValidationError> {
        match &mut self.step {
            PaymentStep::Details {
                input: MethodInput::MobileMoney { phone_number },
                ..
            } => {
                *phone_number = phone.to_string();
                Ok(())
            }
            _ => Err(self.invalid("enter a phone number")),
        }
    }

    pub fn set_card_fields(&mut self, fields: CardFields) -> Result<(), ValidationError> {
        match &mut self.step {
            PaymentStep::Details {
                input: MethodInput::Card(card),
                ..
            } => {
                *card = fields;
                Ok(())
            }
            _ => Err(self.invalid("enter card details")),
        }
    }

    /// Whether the confirm button is enabled.
    pub fn can_submit(&self) -> bool {
        match &self.step {
            PaymentStep::Details { method, input } => {
                !method.is_mobile_money() || input.phone_number().is_some_and(|p| !p.is_empty())
            }
            _ => false,
        }
    }

    /// Details → Processing. Returns the request to send.
    pub fn submit(&mut self, context: &PaymentContext) -> Result<PaymentRequest, ValidationError> {
        let PaymentStep::Details { method, input } = &self.step else {
            return Err(self.invalid("submit"));
        };
        let method = *method;
        let request = PaymentRequest::new(context, method, input.phone_number())?;
        self.step = PaymentStep::Processing { method };
        Ok(request)
    }

    /// Processing → Result.
    pub fn complete(&mut self, result: PaymentResult) -> Result<(), ValidationError> {
        match self.step {
            PaymentStep::Processing { .. } => {
                self.step = PaymentStep::Result(result);
                Ok(())
            }
            _ => Err(self.invalid("complete")),
        }
    }

    /// Details → Select.
    pub fn back(&mut self) -> Result<(), ValidationError> {
        match self.step {
            PaymentStep::Details { .. } => {
                self.step = PaymentStep::Select;
                Ok(())
            }
            _ => Err(self.invalid("go back")),
        }
    }

    /// Any step → Select. This is also the manual retry after a failure.
    pub fn reset(&mut self) {
        self.step = PaymentStep::Select;
    }
}
