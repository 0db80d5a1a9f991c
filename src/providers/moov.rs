use crate::error::GatewayResult;
use crate::provider::{DirectDebitProvider, OtpChannel};
use crate::reference::generate_reference;
use crate::transport::{HttpTransport, RawResponse, RequestBody};
use crate::types::{
    Credential, Environment, OtpPaymentRequest, OtpRequest, PaymentOutcome, PaymentStatus,
    ProviderName,
};
use crate::utils::{ensure_non_empty, normalize_msisdn, COUNTRY_CALLING_CODE};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::{info, warn};

const MOOV_DEV_URL: &str = "https://testapi.moov-africa.bf/merchotp";
const MOOV_PROD_URL: &str = "https://api.moov-africa.bf/merchotp";

const SEND_OTP_COMMAND: &str = "process-create-mror-otp";
const RESEND_OTP_COMMAND: &str = "process-mror-resend-otp";
const COMMIT_PAYMENT_COMMAND: &str = "process-commit-otppay";

const EXTENDED_DATA_MODULE: &str = "MERCHOTPPAY";
const SUCCESS_STATUS: &str = "0";
const DECODE_FAILURE_CODE: &str = "MM-500";

#[derive(Debug, Clone)]
pub struct MoovConfig {
    pub credential: Credential,
    pub environment: Environment,
    /// Deployment-specific endpoint; the telco hands each merchant its own.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub verify_tls: bool,
}

impl MoovConfig {
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

pub struct MoovProvider {
    config: MoovConfig,
    transport: HttpTransport,
}

impl MoovProvider {
    pub fn new(config: MoovConfig) -> GatewayResult<Self> {
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
                Environment::Dev => MOOV_DEV_URL,
                Environment::Prod => MOOV_PROD_URL,
            })
    }

    fn resolve_reference(supplied: Option<&str>) -> String {
        match supplied {
            Some(reference) => reference.to_string(),
            None => generate_reference(Utc::now(), &mut rand::thread_rng()),
        }
    }

    pub(crate) fn otp_payload(reference: &str, destination: &str, amount: u64) -> JsonValue {
        json!({
            "request-id": reference,
            "destination": destination,
            "amount": amount,
            "remarks": "Merchant Payment with OTP",
            "extended-data": { "module": EXTENDED_DATA_MODULE },
        })
    }

    pub(crate) fn commit_payload(
        reference: &str,
        destination: &str,
        request: &OtpPaymentRequest,
    ) -> JsonValue {
        json!({
            "request-id": reference,
            "destination": destination,
            // The commit endpoint wants the amount as a string, unlike the
            // OTP issuance endpoint.
            "amount": request.amount.to_string(),
            "remarks": request.narrative,
            "extended-data": {
                "module": EXTENDED_DATA_MODULE,
                "otp": request.otp_code,
                "trans-id": request.otp_transaction_id,
            },
        })
    }

    /// Maps the provider's JSON body onto the canonical shape. A body that
    /// does not decode, or decodes without a status, yields the sentinel
    /// failure instead of an error.
    pub(crate) fn decode_outcome(reference: &str, response: &RawResponse) -> PaymentOutcome {
        let parsed: JsonValue = match serde_json::from_str(&response.body) {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    http_status = response.status_code,
                    "moov response body is not JSON"
                );
                return PaymentOutcome::protocol_failure(DECODE_FAILURE_CODE, &response.body);
            }
        };

        let Some(status) = field_string(&parsed, &["status"]) else {
            warn!(
                http_status = response.status_code,
                "moov response is missing the status field"
            );
            return PaymentOutcome::protocol_failure(DECODE_FAILURE_CODE, &response.body);
        };

        let message = field_string(&parsed, &["message"]).unwrap_or_default();
        let transaction_id = field_string(&parsed, &["trans_id", "trans-id", "transid"])
            .unwrap_or_else(|| reference.to_string());

        PaymentOutcome {
            status: if status == SUCCESS_STATUS {
                PaymentStatus::Succeeded
            } else {
                PaymentStatus::Failed
            },
            provider_status_code: status,
            message,
            transaction_id,
            raw_payload: Some(response.body.clone()),
        }
    }

    async fn post_command(
        &self,
        command: &str,
        reference: &str,
        payload: &JsonValue,
    ) -> GatewayResult<PaymentOutcome> {
        let result = self
            .transport
            .send(
                Method::POST,
                self.endpoint(),
                Some((
                    self.config.credential.username(),
                    self.config.credential.password(),
                )),
                &[("command-id", command)],
                Some(RequestBody::Json(payload)),
            )
            .await;

        match result {
            Ok(response) => Ok(Self::decode_outcome(reference, &response)),
            Err(failure) => {
                warn!(
                    command,
                    kind = failure.kind.status_code(),
                    "moov transport failure"
                );
                let mut outcome = failure.into_outcome();
                outcome.transaction_id = reference.to_string();
                Ok(outcome)
            }
        }
    }

    async fn dispatch_otp(
        &self,
        request: &OtpRequest,
        command: &'static str,
    ) -> GatewayResult<PaymentOutcome> {
        request.validate()?;
        let reference = Self::resolve_reference(request.reference.as_deref());
        let destination = normalize_msisdn(&request.customer_phone, COUNTRY_CALLING_CODE);
        let payload = Self::otp_payload(&reference, &destination, request.amount);
        info!(reference = %reference, command, "moov otp command dispatched");
        self.post_command(command, &reference, &payload).await
    }
}

#[async_trait]
impl DirectDebitProvider for MoovProvider {
    async fn validate_payment(&self, request: OtpPaymentRequest) -> GatewayResult<PaymentOutcome> {
        request.validate()?;
        ensure_non_empty(&request.otp_transaction_id, "otp_transaction_id")?;

        let reference = Self::resolve_reference(request.reference.as_deref());
        let destination = normalize_msisdn(&request.customer_phone, COUNTRY_CALLING_CODE);
        let payload = Self::commit_payload(&reference, &destination, &request);
        info!(reference = %reference, "moov payment commit dispatched");
        self.post_command(COMMIT_PAYMENT_COMMAND, &reference, &payload)
            .await
    }

    fn name(&self) -> ProviderName {
        ProviderName::MoovMoney
    }
}

#[async_trait]
impl OtpChannel for MoovProvider {
    async fn send_otp(&self, request: OtpRequest) -> GatewayResult<PaymentOutcome> {
        self.dispatch_otp(&request, SEND_OTP_COMMAND).await
    }

    async fn resend_otp(&self, request: OtpRequest) -> GatewayResult<PaymentOutcome> {
        self.dispatch_otp(&request, RESEND_OTP_COMMAND).await
    }
}

fn field_string(value: &JsonValue, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value.get(key).and_then(|field| {
            field
                .as_str()
                .map(|s| s.to_string())
                .or_else(|| field.as_i64().map(|n| n.to_string()))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(body: &str) -> RawResponse {
        RawResponse {
            status_code: 200,
            headers: HashMap::new(),
            body: body.to_string(),
        }
    }

    fn commit_request() -> OtpPaymentRequest {
        OtpPaymentRequest {
            customer_phone: "65010203".to_string(),
            amount: 100,
            otp_code: "123456".to_string(),
            narrative: "Paiement marchand".to_string(),
            otp_transaction_id: "OTP-42".to_string(),
            reference: Some("REF-1".to_string()),
        }
    }

    #[test]
    fn commit_payload_normalizes_destination_and_embeds_otp() {
        let request = commit_request();
        let destination = normalize_msisdn(&request.customer_phone, COUNTRY_CALLING_CODE);
        let payload = MoovProvider::commit_payload("REF-1", &destination, &request);

        assert_eq!(payload["destination"], "22665010203");
        assert_eq!(payload["extended-data"]["otp"], "123456");
        assert_eq!(payload["extended-data"]["trans-id"], "OTP-42");
        assert_eq!(payload["extended-data"]["module"], "MERCHOTPPAY");
        assert_eq!(payload["amount"], "100");
        assert_eq!(payload["request-id"], "REF-1");
    }

    #[test]
    fn otp_payload_keeps_amount_numeric() {
        let payload = MoovProvider::otp_payload("REF-2", "22665010203", 250);
        assert_eq!(payload["amount"], 250);
        assert_eq!(payload["remarks"], "Merchant Payment with OTP");
        assert_eq!(payload["extended-data"]["module"], "MERCHOTPPAY");
        assert!(payload["extended-data"].get("otp").is_none());
    }

    #[test]
    fn decode_maps_success_reply() {
        let outcome = MoovProvider::decode_outcome(
            "REF-1",
            &response(r#"{"status":"0","message":"Success","trans_id":"MM-778"}"#),
        );
        assert!(outcome.succeeded());
        assert_eq!(outcome.provider_status_code, "0");
        assert_eq!(outcome.message, "Success");
        assert_eq!(outcome.transaction_id, "MM-778");
        assert!(outcome.raw_payload.is_some());
    }

    #[test]
    fn decode_maps_declined_reply() {
        let outcome = MoovProvider::decode_outcome(
            "REF-1",
            &response(r#"{"status":"12","message":"Fail","trans_id":"MM-779"}"#),
        );
        assert_eq!(outcome.status, PaymentStatus::Failed);
        assert_eq!(outcome.provider_status_code, "12");
    }

    #[test]
    fn decode_accepts_numeric_status_and_dashed_trans_id() {
        let outcome = MoovProvider::decode_outcome(
            "REF-1",
            &response(r#"{"status":0,"message":"Success","trans-id":"MM-780"}"#),
        );
        assert!(outcome.succeeded());
        assert_eq!(outcome.transaction_id, "MM-780");
    }

    #[test]
    fn decode_falls_back_to_the_request_reference_without_trans_id() {
        let outcome =
            MoovProvider::decode_outcome("REF-9", &response(r#"{"status":"0","message":"ok"}"#));
        assert_eq!(outcome.transaction_id, "REF-9");
    }

    #[test]
    fn missing_status_yields_sentinel_failure() {
        let outcome =
            MoovProvider::decode_outcome("REF-1", &response(r#"{"message":"Success"}"#));
        assert_eq!(outcome.status, PaymentStatus::Failed);
        assert_eq!(outcome.provider_status_code, "MM-500");
        assert_eq!(outcome.message, "malformed/incomplete provider response");
    }

    #[test]
    fn non_json_body_yields_sentinel_failure_with_raw_payload() {
        let outcome = MoovProvider::decode_outcome("REF-1", &response("<html>504</html>"));
        assert_eq!(outcome.provider_status_code, "MM-500");
        assert_eq!(outcome.raw_payload.as_deref(), Some("<html>504</html>"));
    }

    #[tokio::test]
    async fn validation_errors_block_the_network_call() {
        let config = MoovConfig::new(
            Credential::new("merchant", "secret").unwrap(),
            Environment::Dev,
        );
        let provider = MoovProvider::new(config).unwrap();

        let mut request = commit_request();
        request.otp_transaction_id = String::new();
        assert!(provider.validate_payment(request).await.is_err());

        let zero_amount = OtpRequest {
            customer_phone: "65010203".to_string(),
            amount: 0,
            reference: None,
        };
        assert!(provider.send_otp(zero_amount).await.is_err());
    }

    #[tokio::test]
    async fn transport_failure_becomes_a_classified_outcome() {
        let mut config = MoovConfig::new(
            Credential::new("merchant", "secret").unwrap(),
            Environment::Dev,
        );
        // Loopback discard port: the connection is refused without touching
        // the network, exercising the failure path deterministically.
        config.base_url = Some("http://127.0.0.1:9/merchotp".to_string());
        config.timeout_secs = 2;
        let provider = MoovProvider::new(config).unwrap();

        let outcome = provider
            .validate_payment(commit_request())
            .await
            .expect("transport faults must not surface as errors");
        assert_eq!(outcome.status, PaymentStatus::Failed);
        assert_eq!(outcome.transaction_id, "REF-1");
        assert!(matches!(
            outcome.provider_status_code.as_str(),
            "timeout" | "connection-error" | "transport-error"
        ));
    }
}
