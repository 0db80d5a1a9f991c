//! Mobile-money payment client for the Burkina Faso market.
//!
//! One facade over three gateways: Moov Money (JSON OTP direct debit over
//! `command-id` headers), Orange Money (XML OTP direct debit) and LigdiCash
//! (hosted invoice/redirect, completion polled by token). The crate encodes
//! payment intents into each provider's wire format, performs the outbound
//! HTTP call and normalizes the heterogeneous responses into one canonical
//! result shape.
//!
//! Transport faults and malformed provider bodies never surface as errors:
//! they come back as failure-classified [`types::PaymentOutcome`] values.
//! Only caller-contract violations (bad phone, zero amount, invalid URL)
//! return [`error::GatewayError`], and always before any network call.
//!
//! ```no_run
//! use mobilemoney::{
//!     Credential, Environment, GatewayConfig, MoovConfig, OtpRequest, PaymentGateway,
//!     ProviderName,
//! };
//!
//! # async fn demo() -> mobilemoney::GatewayResult<()> {
//! let config = GatewayConfig {
//!     moov: Some(MoovConfig::new(
//!         Credential::new("merchant", "secret")?,
//!         Environment::Prod,
//!     )),
//!     ..GatewayConfig::default()
//! };
//! let gateway = PaymentGateway::new(config)?;
//! let ack = gateway
//!     .send_otp(
//!         ProviderName::MoovMoney,
//!         OtpRequest {
//!             customer_phone: "65010203".to_string(),
//!             amount: 100,
//!             reference: None,
//!         },
//!     )
//!     .await?;
//! println!("{}: {}", ack.provider_status_code, ack.message);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gateway;
pub mod provider;
pub mod providers;
pub mod reference;
pub mod transport;
pub mod types;
pub mod utils;

pub use error::{GatewayError, GatewayResult};
pub use gateway::{GatewayConfig, PaymentGateway};
pub use provider::{DirectDebitProvider, InvoiceProvider, OtpChannel};
pub use providers::{
    LigdicashConfig, LigdicashProvider, MoovConfig, MoovProvider, OrangeConfig, OrangeProvider,
};
pub use reference::generate_reference;
pub use types::{
    Actions, Credential, CustomData, Environment, Invoice, InvoiceCommand, InvoiceCreation,
    InvoiceSession, InvoiceStatus, LineItem, OtpPaymentRequest, OtpRequest, PaymentOutcome,
    PaymentStatus, ProviderName, Store,
};
