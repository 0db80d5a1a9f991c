use crate::error::{GatewayError, GatewayResult};
use crate::provider::DirectDebitProvider;
use crate::transport::{HttpTransport, RequestBody};
use crate::types::{
    Credential, Environment, OtpPaymentRequest, PaymentOutcome, PaymentStatus, ProviderName,
};
use crate::utils::{normalize_msisdn, COUNTRY_CALLING_CODE};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const ORANGE_DEV_URL: &str = "https://testom.orange.bf:9008/payment";
const ORANGE_PROD_URL: &str = "https://apiom.orange.bf:9007/payment";

const COMMAND_TYPE: &str = "OMPREQ";
const PROVIDER_CODE: &str = "101";
const PAY_ID: &str = "12";
const SUCCESS_STATUS: &str = "200";
const PARSE_FAILURE_CODE: &str = "OM-500";

// The response drifts across provider versions; the lazy wildcards bridge
// whatever separators show up between the three fields.
const FRAGMENT_PATTERN: &str =
    r"(?s)<status>(?P<status>.*?)</status>.*?<message>(?P<message>.*?)</message>.*?<transID>(?P<trans_id>.*?)</transID>";

#[derive(Debug, Clone)]
pub struct OrangeConfig {
    pub credential: Credential,
    pub environment: Environment,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub verify_tls: bool,
}

impl OrangeConfig {
    pub fn new(credential: Credential, environment: Environment) -> Self {
        Self {
            credential,
            environment,
            base_url: None,
            timeout_secs: 30,
            verify_tls: true,
        }
    }
}

pub struct OrangeProvider {
    config: OrangeConfig,
    transport: HttpTransport,
}

/// The provider expects these elements in exactly this order; the struct
/// declaration order is the wire order.
#[derive(Debug, Serialize)]
struct OrangeCommand<'a> {
    #[serde(rename = "TYPE")]
    command_type: &'a str,
    customer_msisdn: &'a str,
    merchant_msisdn: &'a str,
    api_username: &'a str,
    api_password: &'a str,
    amount: String,
    #[serde(rename = "PROVIDER")]
    provider: &'a str,
    #[serde(rename = "PROVIDER2")]
    provider2: &'a str,
    #[serde(rename = "PAYID")]
    pay_id: &'a str,
    #[serde(rename = "PAYID2")]
    pay_id2: &'a str,
    otp: &'a str,
    reference_number: &'a str,
    ext_txn_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct OrangeReply {
    status: Option<String>,
    message: Option<String>,
    #[serde(rename = "transID")]
    trans_id: Option<String>,
}

impl OrangeProvider {
    pub fn new(config: OrangeConfig) -> GatewayResult<Self> {
        if config.credential.merchant_msisdn().is_none() {
            return Err(GatewayError::Configuration {
                message: "orange-money requires the merchant msisdn on the credential"
                    .to_string(),
                field: Some("credential.merchant_msisdn".to_string()),
            });
        }
        let transport = HttpTransport::new(
            Duration::from_secs(config.timeout_secs),
            config.verify_tls,
        )?;
        Ok(Self { config, transport })
    }

    fn endpoint(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(match self.config.environment {
                Environment::Dev => ORANGE_DEV_URL,
                Environment::Prod => ORANGE_PROD_URL,
            })
    }

    fn encode_command(&self, request: &OtpPaymentRequest) -> GatewayResult<String> {
        let destination = normalize_msisdn(&request.customer_phone, COUNTRY_CALLING_CODE);
        let command = OrangeCommand {
            command_type: COMMAND_TYPE,
            customer_msisdn: &destination,
            merchant_msisdn: self.config.credential.merchant_msisdn().unwrap_or_default(),
            api_username: self.config.credential.username(),
            api_password: self.config.credential.password(),
            amount: request.amount.to_string(),
            provider: PROVIDER_CODE,
            provider2: PROVIDER_CODE,
            pay_id: PAY_ID,
            pay_id2: PAY_ID,
            otp: &request.otp_code,
            reference_number: &request.narrative,
            ext_txn_id: request.reference.as_deref().unwrap_or_default(),
        };
        quick_xml::se::to_string_with_root("COMMAND", &command).map_err(|e| {
            GatewayError::Configuration {
                message: format!("failed to encode orange-money command: {}", e),
                field: None,
            }
        })
    }

    /// Extracts `status`, `message` and `transID` from the bare fragment the
    /// provider returns. The fragment is not a well-formed document, so it
    /// is wrapped in a synthetic root for structural parsing; a regex sweep
    /// covers format drift when that fails.
    pub(crate) fn parse_fragment(body: &str) -> Option<(String, String, String)> {
        let wrapped = format!("<reply>{}</reply>", body);
        if let Ok(reply) = quick_xml::de::from_str::<OrangeReply>(&wrapped) {
            if let (Some(status), Some(message), Some(trans_id)) =
                (reply.status, reply.message, reply.trans_id)
            {
                return Some((status, message, trans_id));
            }
        }

        let pattern = Regex::new(FRAGMENT_PATTERN).ok()?;
        let captures = pattern.captures(body)?;
        Some((
            captures.name("status")?.as_str().to_string(),
            captures.name("message")?.as_str().to_string(),
            captures.name("trans_id")?.as_str().to_string(),
        ))
    }

    pub(crate) fn decode_outcome(body: &str) -> PaymentOutcome {
        match Self::parse_fragment(body) {
            Some((status, message, trans_id)) => PaymentOutcome {
                status: if status == SUCCESS_STATUS {
                    PaymentStatus::Succeeded
                } else {
                    PaymentStatus::Failed
                },
                provider_status_code: status,
                message,
                transaction_id: trans_id,
                raw_payload: Some(body.to_string()),
            },
            None => {
                warn!("orange-money response fragment is incomplete");
                PaymentOutcome::protocol_failure(PARSE_FAILURE_CODE, body)
            }
        }
    }
}

#[async_trait]
impl DirectDebitProvider for OrangeProvider {
    async fn validate_payment(&self, request: OtpPaymentRequest) -> GatewayResult<PaymentOutcome> {
        request.validate()?;
        let body = self.encode_command(&request)?;
        info!(amount = request.amount, "orange-money payment commit dispatched");

        let response = self
            .transport
            .send(
                Method::POST,
                self.endpoint(),
                Some((
                    self.config.credential.username(),
                    self.config.credential.password(),
                )),
                &[],
                Some(RequestBody::Xml(&body)),
            )
            .await;

        match response {
            Ok(raw) => Ok(Self::decode_outcome(&raw.body)),
            Err(failure) => {
                warn!(
                    kind = failure.kind.status_code(),
                    "orange-money transport failure"
                );
                Ok(failure.into_outcome())
            }
        }
    }

    fn name(&self) -> ProviderName {
        ProviderName::OrangeMoney
    }
}
