use crate::error::{GatewayError, GatewayResult};
use crate::provider::{DirectDebitProvider, InvoiceProvider, OtpChannel};
use crate::providers::{
    LigdicashConfig, LigdicashProvider, MoovConfig, MoovProvider, OrangeConfig, OrangeProvider,
};
use crate::types::{
    InvoiceCommand, InvoiceCreation, InvoiceStatus, OtpPaymentRequest, OtpRequest, PaymentOutcome,
    ProviderName,
};

/// Per-provider configuration assembled by the caller's configuration
/// loader. The crate itself never reads environment variables or files.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub moov: Option<MoovConfig>,
    pub orange: Option<OrangeConfig>,
    pub ligdicash: Option<LigdicashConfig>,
}

/// One stable contract over three divergent providers.
///
/// Pure construction and delegation: adapters are built once, hold only
/// immutable credential and URL state, and can be shared across tasks for
/// concurrent fan-out without locking.
pub struct PaymentGateway {
    moov: Option<MoovProvider>,
    orange: Option<OrangeProvider>,
    ligdicash: Option<LigdicashProvider>,
}

impl PaymentGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        Ok(Self {
            moov: config.moov.map(MoovProvider::new).transpose()?,
            orange: config.orange.map(OrangeProvider::new).transpose()?,
            ligdicash: config.ligdicash.map(LigdicashProvider::new).transpose()?,
        })
    }

    pub fn available_providers(&self) -> Vec<ProviderName> {
        let mut providers = Vec::new();
        if self.moov.is_some() {
            providers.push(ProviderName::MoovMoney);
        }
        if self.orange.is_some() {
            providers.push(ProviderName::OrangeMoney);
        }
        if self.ligdicash.is_some() {
            providers.push(ProviderName::Ligdicash);
        }
        providers
    }

    pub async fn send_otp(
        &self,
        provider: ProviderName,
        request: OtpRequest,
    ) -> GatewayResult<PaymentOutcome> {
        match provider {
            ProviderName::MoovMoney => self.moov()?.send_otp(request).await,
            ProviderName::OrangeMoney | ProviderName::Ligdicash => {
                Err(Self::unsupported(provider, "send_otp"))
            }
        }
    }

    pub async fn resend_otp(
        &self,
        provider: ProviderName,
        request: OtpRequest,
    ) -> GatewayResult<PaymentOutcome> {
        match provider {
            ProviderName::MoovMoney => self.moov()?.resend_otp(request).await,
            ProviderName::OrangeMoney | ProviderName::Ligdicash => {
                Err(Self::unsupported(provider, "resend_otp"))
            }
        }
    }

    pub async fn validate_payment(
        &self,
        provider: ProviderName,
        request: OtpPaymentRequest,
    ) -> GatewayResult<PaymentOutcome> {
        match provider {
            ProviderName::MoovMoney => self.moov()?.validate_payment(request).await,
            ProviderName::OrangeMoney => self.orange()?.validate_payment(request).await,
            ProviderName::Ligdicash => Err(Self::unsupported(provider, "validate_payment")),
        }
    }

    pub async fn create_invoice(
        &self,
        provider: ProviderName,
        command: InvoiceCommand,
    ) -> GatewayResult<InvoiceCreation> {
        match provider {
            ProviderName::Ligdicash => self.ligdicash()?.create_invoice(command).await,
            ProviderName::MoovMoney | ProviderName::OrangeMoney => {
                Err(Self::unsupported(provider, "create_invoice"))
            }
        }
    }

    pub async fn verify_invoice_token(
        &self,
        provider: ProviderName,
        token: &str,
    ) -> GatewayResult<InvoiceStatus> {
        match provider {
            ProviderName::Ligdicash => self.ligdicash()?.verify_invoice_token(token).await,
            ProviderName::MoovMoney | ProviderName::OrangeMoney => {
                Err(Self::unsupported(provider, "verify_invoice_token"))
            }
        }
    }

    fn moov(&self) -> GatewayResult<&MoovProvider> {
        self.moov
            .as_ref()
            .ok_or_else(|| Self::not_configured(ProviderName::MoovMoney))
    }

    fn orange(&self) -> GatewayResult<&OrangeProvider> {
        self.orange
            .as_ref()
            .ok_or_else(|| Self::not_configured(ProviderName::OrangeMoney))
    }

    fn ligdicash(&self) -> GatewayResult<&LigdicashProvider> {
        self.ligdicash
            .as_ref()
            .ok_or_else(|| Self::not_configured(ProviderName::Ligdicash))
    }

    fn not_configured(provider: ProviderName) -> GatewayError {
        GatewayError::Configuration {
            message: format!("provider {} is not configured", provider),
            field: Some("provider".to_string()),
        }
    }

    fn unsupported(provider: ProviderName, operation: &str) -> GatewayError {
        GatewayError::UnsupportedOperation {
            provider: provider.as_str().to_string(),
            operation: operation.to_string(),
        }
    }
}
