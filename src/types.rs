use crate::error::{GatewayError, GatewayResult};
use crate::utils::{ensure_non_empty, ensure_positive};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderName {
    MoovMoney,
    OrangeMoney,
    Ligdicash,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::MoovMoney => "moov-money",
            ProviderName::OrangeMoney => "orange-money",
            ProviderName::Ligdicash => "ligdicash",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "moov" | "moov-money" | "moovmoney" => Ok(ProviderName::MoovMoney),
            "orange" | "orange-money" | "orangemoney" => Ok(ProviderName::OrangeMoney),
            "ligdicash" => Ok(ProviderName::Ligdicash),
            _ => Err(GatewayError::Configuration {
                message: format!("unsupported provider: {}", value),
                field: Some("provider".to_string()),
            }),
        }
    }
}

/// Target environment. Resolves to a provider base URL at adapter
/// construction; switching is a configuration change, never a code change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Dev,
    Prod,
}

/// API credential owned by exactly one adapter instance.
///
/// Immutable once constructed; the secret never appears in `Debug` output.
#[derive(Clone)]
pub struct Credential {
    username: String,
    password: String,
    merchant_msisdn: Option<String>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> GatewayResult<Self> {
        let username = username.into();
        let password = password.into();
        ensure_non_empty(&username, "credential.username")?;
        ensure_non_empty(&password, "credential.password")?;
        Ok(Self {
            username,
            password,
            merchant_msisdn: None,
        })
    }

    pub fn with_merchant_msisdn(mut self, msisdn: impl Into<String>) -> GatewayResult<Self> {
        let msisdn = msisdn.into();
        ensure_non_empty(&msisdn, "credential.merchant_msisdn")?;
        self.merchant_msisdn = Some(msisdn);
        Ok(self)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn merchant_msisdn(&self) -> Option<&str> {
        self.merchant_msisdn.as_deref()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("merchant_msisdn", &self.merchant_msisdn)
            .finish()
    }
}

/// Input to OTP send/resend on an OTP-capable provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRequest {
    pub customer_phone: String,
    pub amount: u64,
    pub reference: Option<String>,
}

impl OtpRequest {
    pub fn validate(&self) -> GatewayResult<()> {
        ensure_non_empty(&self.customer_phone, "customer_phone")?;
        ensure_positive(self.amount, "amount")
    }
}

/// Input to `validate_payment`: commits a direct debit with the OTP the
/// customer received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpPaymentRequest {
    pub customer_phone: String,
    pub amount: u64,
    pub otp_code: String,
    pub narrative: String,
    pub otp_transaction_id: String,
    pub reference: Option<String>,
}

impl OtpPaymentRequest {
    pub fn validate(&self) -> GatewayResult<()> {
        ensure_non_empty(&self.customer_phone, "customer_phone")?;
        ensure_positive(self.amount, "amount")?;
        ensure_non_empty(&self.otp_code, "otp_code")?;
        ensure_non_empty(&self.narrative, "narrative")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
    Pending,
}

impl PaymentStatus {
    /// Tri-state view: `Succeeded → Some(true)`, `Failed → Some(false)`,
    /// `Pending → None`.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            PaymentStatus::Succeeded => Some(true),
            PaymentStatus::Failed => Some(false),
            PaymentStatus::Pending => None,
        }
    }
}

/// The canonical result every adapter normalizes provider responses into.
///
/// Always fully populated: an unparsable provider body still yields an
/// outcome with an error-classified status and the raw payload preserved
/// for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    pub provider_status_code: String,
    pub message: String,
    pub transaction_id: String,
    pub raw_payload: Option<String>,
}

impl PaymentOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }

    pub(crate) fn protocol_failure(code: &str, raw_body: &str) -> Self {
        Self {
            status: PaymentStatus::Failed,
            provider_status_code: code.to_string(),
            message: "malformed/incomplete provider response".to_string(),
            transaction_id: String::new(),
            raw_payload: Some(raw_body.to_string()),
        }
    }
}

/// Completion state of a hosted invoice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Completed,
    NotCompleted,
    Pending,
}

impl InvoiceStatus {
    /// Anything the provider reports outside the three known states reads
    /// as `Pending`: a drifting status string or a hiccup mid-poll must not
    /// be mistaken for a definitive negative.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "completed" => InvoiceStatus::Completed,
            "nocompleted" => InvoiceStatus::NotCompleted,
            _ => InvoiceStatus::Pending,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            InvoiceStatus::Completed => Some(true),
            InvoiceStatus::NotCompleted => Some(false),
            InvoiceStatus::Pending => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub total_price: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub items: Vec<LineItem>,
    pub total_amount: u64,
    #[serde(rename = "devise")]
    pub currency: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub name: String,
    pub website_url: String,
}

/// Redirect targets for the hosted payment page. All three are mandatory
/// and must be syntactically valid URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actions {
    pub cancel_url: String,
    pub return_url: String,
    pub callback_url: String,
}

/// Caller-owned reference data echoed back verbatim by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomData {
    pub transaction_id: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceCommand {
    pub invoice: Invoice,
    pub store: Store,
    pub actions: Actions,
    pub custom_data: CustomData,
}

impl InvoiceCommand {
    pub fn validate(&self) -> GatewayResult<()> {
        ensure_positive(self.invoice.total_amount, "invoice.total_amount")?;
        ensure_non_empty(&self.invoice.currency, "invoice.devise")?;
        for (index, item) in self.invoice.items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(GatewayError::Configuration {
                    message: format!("invoice.items[{}].quantity must be at least 1", index),
                    field: Some("invoice.items.quantity".to_string()),
                });
            }
        }
        ensure_url(&self.actions.cancel_url, "actions.cancel_url")?;
        ensure_url(&self.actions.return_url, "actions.return_url")?;
        ensure_url(&self.actions.callback_url, "actions.callback_url")?;
        ensure_non_empty(&self.custom_data.transaction_id, "custom_data.transaction_id")?;

        // The provider does not document a consistency rule between line
        // totals and the invoice total; mismatches are the caller's call.
        let line_total: u64 = self.invoice.items.iter().map(|item| item.total_price).sum();
        if !self.invoice.items.is_empty() && line_total != self.invoice.total_amount {
            warn!(
                line_total,
                total_amount = self.invoice.total_amount,
                transaction_id = %self.custom_data.transaction_id,
                "invoice line totals do not add up to total_amount"
            );
        }
        Ok(())
    }
}

fn ensure_url(value: &str, field: &str) -> GatewayResult<()> {
    reqwest::Url::parse(value).map_err(|e| GatewayError::Configuration {
        message: format!("{} is not a valid URL: {}", field, e),
        field: Some(field.to_string()),
    })?;
    Ok(())
}

/// A hosted-invoice session created by the aggregator.
///
/// The caller presents `redirect_url` to the payer (browser, WebView — not
/// this crate's concern) and later polls completion with `token`. Nothing is
/// persisted here; the session's lifetime belongs to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceSession {
    pub redirect_url: String,
    pub token: String,
    pub custom_data: CustomData,
}

#[derive(Debug, Clone)]
pub enum InvoiceCreation {
    Session(InvoiceSession),
    Failed(PaymentOutcome),
}

impl InvoiceCreation {
    pub fn session(&self) -> Option<&InvoiceSession> {
        match self {
            InvoiceCreation::Session(session) => Some(session),
            InvoiceCreation::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&PaymentOutcome> {
        match self {
            InvoiceCreation::Session(_) => None,
            InvoiceCreation::Failed(outcome) => Some(outcome),
        }
    }
}
