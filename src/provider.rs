use crate::error::GatewayResult;
use crate::types::{
    InvoiceCommand, InvoiceCreation, InvoiceStatus, OtpPaymentRequest, OtpRequest, PaymentOutcome,
    ProviderName,
};
use async_trait::async_trait;

/// A provider that can commit an OTP-authorized direct debit.
///
/// Dev vs prod is a constructor parameter on the concrete adapter, never a
/// separate implementation.
#[async_trait]
pub trait DirectDebitProvider: Send + Sync {
    async fn validate_payment(&self, request: OtpPaymentRequest) -> GatewayResult<PaymentOutcome>;

    fn name(&self) -> ProviderName;
}

/// A direct-debit provider that also issues the OTP through this API.
///
/// Orange-style integrations deliver the OTP on the provider's own channel
/// and therefore implement only [`DirectDebitProvider`].
#[async_trait]
pub trait OtpChannel: DirectDebitProvider {
    async fn send_otp(&self, request: OtpRequest) -> GatewayResult<PaymentOutcome>;

    async fn resend_otp(&self, request: OtpRequest) -> GatewayResult<PaymentOutcome>;
}

/// A provider that hosts an invoice page and reports completion by token.
#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    async fn create_invoice(&self, command: InvoiceCommand) -> GatewayResult<InvoiceCreation>;

    async fn verify_invoice_token(&self, token: &str) -> GatewayResult<InvoiceStatus>;

    fn name(&self) -> ProviderName;
}
