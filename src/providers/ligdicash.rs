use crate::error::GatewayResult;
use crate::provider::InvoiceProvider;
use crate::transport::{HttpTransport, RawResponse, RequestBody};
use crate::types::{
    Credential, CustomData, Environment, InvoiceCommand, InvoiceCreation, InvoiceSession,
    InvoiceStatus, PaymentOutcome, PaymentStatus, ProviderName,
};
use crate::utils::ensure_non_empty;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::{info, warn};

// One host serves both environments today; the seam stays so a future
// dev/prod split is a configuration change.
const LIGDICASH_BASE_URL: &str = "https://app.ligdicash.com/pay/v01";
const CREATE_INVOICE_PATH: &str = "/redirect/checkout-invoice/create";
const CONFIRM_INVOICE_PATH: &str = "/redirect/checkout-invoice/confirm/";

const SUCCESS_RESPONSE_CODE: &str = "00";
const DECODE_FAILURE_CODE: &str = "LC-500";

#[derive(Debug, Clone)]
pub struct LigdicashConfig {
    /// `username` is the Apikey header value, `password` the bearer token.
    pub credential: Credential,
    pub environment: Environment,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub verify_tls: bool,
}

impl LigdicashConfig {
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

pub struct LigdicashProvider {
    config: LigdicashConfig,
    transport: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct LigdicashReply {
    response_code: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    response_text: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    custom_data: Option<CustomData>,
}

impl LigdicashProvider {
    pub fn new(config: LigdicashConfig) -> GatewayResult<Self> {
        let transport = HttpTransport::new(
            Duration::from_secs(config.timeout_secs),
            config.verify_tls,
        )?;
        Ok(Self { config, transport })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(match self.config.environment {
                Environment::Dev | Environment::Prod => LIGDICASH_BASE_URL,
            })
    }

    /// Decodes the creation response. `response_text` carries the hosted
    /// payment page URL and is returned verbatim; presenting it to the payer
    /// is the caller's job, never this adapter's.
    pub(crate) fn decode_creation(
        command: &InvoiceCommand,
        response: &RawResponse,
    ) -> InvoiceCreation {
        let transaction_id = command.custom_data.transaction_id.clone();

        let reply: LigdicashReply = match serde_json::from_str(&response.body) {
            Ok(reply) => reply,
            Err(_) => {
                warn!(
                    http_status = response.status_code,
                    "ligdicash creation response is not JSON"
                );
                let mut outcome =
                    PaymentOutcome::protocol_failure(DECODE_FAILURE_CODE, &response.body);
                outcome.transaction_id = transaction_id;
                return InvoiceCreation::Failed(outcome);
            }
        };

        let Some(code) = reply.response_code else {
            let mut outcome = PaymentOutcome::protocol_failure(DECODE_FAILURE_CODE, &response.body);
            outcome.transaction_id = transaction_id;
            return InvoiceCreation::Failed(outcome);
        };

        if code != SUCCESS_RESPONSE_CODE {
            return InvoiceCreation::Failed(PaymentOutcome {
                status: PaymentStatus::Failed,
                provider_status_code: code,
                message: reply
                    .description
                    .or(reply.response_text)
                    .unwrap_or_default(),
                transaction_id,
                raw_payload: Some(response.body.clone()),
            });
        }

        match (reply.token, reply.response_text) {
            (Some(token), Some(redirect_url)) => InvoiceCreation::Session(InvoiceSession {
                redirect_url,
                token,
                // If the echo is missing the caller's copy still holds; the
                // contract is that it round-trips unchanged.
                custom_data: reply
                    .custom_data
                    .unwrap_or_else(|| command.custom_data.clone()),
            }),
            _ => {
                warn!("ligdicash accepted the invoice but omitted token or redirect URL");
                let mut outcome =
                    PaymentOutcome::protocol_failure(DECODE_FAILURE_CODE, &response.body);
                outcome.transaction_id = transaction_id;
                InvoiceCreation::Failed(outcome)
            }
        }
    }

    pub(crate) fn decode_status(body: &str) -> InvoiceStatus {
        serde_json::from_str::<JsonValue>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("status")
                    .and_then(|status| status.as_str())
                    .map(InvoiceStatus::from_wire)
            })
            .unwrap_or(InvoiceStatus::Pending)
    }
}

#[async_trait]
impl InvoiceProvider for LigdicashProvider {
    async fn create_invoice(&self, command: InvoiceCommand) -> GatewayResult<InvoiceCreation> {
        command.validate()?;

        let payload = json!({ "commande": command });
        let authorization = format!("Bearer {}", self.config.credential.password());
        let headers = [
            ("Apikey", self.config.credential.username()),
            ("Authorization", authorization.as_str()),
            ("Accept", "application/json"),
        ];
        let url = format!("{}{}", self.base_url(), CREATE_INVOICE_PATH);
        info!(
            transaction_id = %command.custom_data.transaction_id,
            total_amount = command.invoice.total_amount,
            "ligdicash invoice creation dispatched"
        );

        match self
            .transport
            .send(Method::POST, &url, None, &headers, Some(RequestBody::Json(&payload)))
            .await
        {
            Ok(response) => Ok(Self::decode_creation(&command, &response)),
            Err(failure) => {
                warn!(
                    kind = failure.kind.status_code(),
                    "ligdicash transport failure"
                );
                let mut outcome = failure.into_outcome();
                outcome.transaction_id = command.custom_data.transaction_id.clone();
                Ok(InvoiceCreation::Failed(outcome))
            }
        }
    }

    async fn verify_invoice_token(&self, token: &str) -> GatewayResult<InvoiceStatus> {
        ensure_non_empty(token, "token")?;

        let authorization = format!("Bearer {}", self.config.credential.password());
        let headers = [
            ("Apikey", self.config.credential.username()),
            ("Authorization", authorization.as_str()),
            ("Accept", "application/json"),
        ];
        let url = format!(
            "{}{}?invoiceToken={}",
            self.base_url(),
            CONFIRM_INVOICE_PATH,
            token
        );

        match self.transport.send(Method::GET, &url, None, &headers, None).await {
            Ok(response) => Ok(Self::decode_status(&response.body)),
            Err(failure) => {
                // A hiccup mid-poll is not a definitive negative.
                warn!(
                    kind = failure.kind.status_code(),
                    "ligdicash status poll failed, reporting pending"
                );
                Ok(InvoiceStatus::Pending)
            }
        }
    }

    fn name(&self) -> ProviderName {
        ProviderName::Ligdicash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Actions, Invoice, LineItem, Store};
    use std::collections::{BTreeMap, HashMap};

    fn command() -> InvoiceCommand {
        InvoiceCommand {
            invoice: Invoice {
                items: vec![LineItem {
                    name: "Jus de fruits".to_string(),
                    description: "Achat de jus de fruits".to_string(),
                    quantity: 1,
                    unit_price: 100,
                    total_price: 100,
                }],
                total_amount: 100,
                currency: "XOF".to_string(),
                description: "Achat de jus de fruits".to_string(),
                customer: None,
                customer_firstname: None,
                customer_lastname: None,
                customer_email: None,
                external_id: None,
                otp: None,
            },
            store: Store {
                name: "Ma boutique".to_string(),
                website_url: "https://etimbre.dgi.bf".to_string(),
            },
            actions: Actions {
                cancel_url: "http://localhost".to_string(),
                return_url: "http://localhost".to_string(),
                callback_url: "http://localhost".to_string(),
            },
            custom_data: CustomData {
                transaction_id: "2021000000001".to_string(),
                extra: BTreeMap::new(),
            },
        }
    }

    fn response(body: &str) -> RawResponse {
        RawResponse {
            status_code: 200,
            headers: HashMap::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn creation_success_yields_session_with_echoed_custom_data() {
        let body = r#"{
            "response_code": "00",
            "token": "eyJ0eXAiOiJKV1QifQ.tok",
            "response_text": "https://client.ligdicash.com/directpayment/invoice/eyJ0eXAiOiJKV1QifQ.tok",
            "description": "",
            "custom_data": {
                "transaction_id": "2021000000001",
                "logfile": "2023022318241263f7af4ccc792"
            }
        }"#;
        let creation = LigdicashProvider::decode_creation(&command(), &response(body));
        let session = creation.session().expect("session expected");
        assert_eq!(session.token, "eyJ0eXAiOiJKV1QifQ.tok");
        assert!(session.redirect_url.starts_with("https://client.ligdicash.com/"));
        assert_eq!(session.custom_data.transaction_id, "2021000000001");
        assert_eq!(
            session.custom_data.extra.get("logfile"),
            Some(&serde_json::json!("2023022318241263f7af4ccc792"))
        );
    }

    #[test]
    fn creation_without_echo_falls_back_to_the_caller_copy() {
        let body = r#"{"response_code":"00","token":"tok","response_text":"https://pay.example/x"}"#;
        let creation = LigdicashProvider::decode_creation(&command(), &response(body));
        let session = creation.session().expect("session expected");
        assert_eq!(session.custom_data.transaction_id, "2021000000001");
    }

    #[test]
    fn rejected_invoice_maps_to_failed_outcome() {
        let body = r#"{"response_code":"40","description":"Cle API invalide"}"#;
        let creation = LigdicashProvider::decode_creation(&command(), &response(body));
        let outcome = creation.failure().expect("failure expected");
        assert_eq!(outcome.provider_status_code, "40");
        assert_eq!(outcome.message, "Cle API invalide");
        assert_eq!(outcome.transaction_id, "2021000000001");
    }

    #[test]
    fn accepted_invoice_without_token_is_a_protocol_failure() {
        let body = r#"{"response_code":"00","description":"ok"}"#;
        let creation = LigdicashProvider::decode_creation(&command(), &response(body));
        let outcome = creation.failure().expect("failure expected");
        assert_eq!(outcome.provider_status_code, "LC-500");
    }

    #[test]
    fn non_json_creation_body_is_a_protocol_failure() {
        let creation =
            LigdicashProvider::decode_creation(&command(), &response("<html>bad gateway</html>"));
        let outcome = creation.failure().expect("failure expected");
        assert_eq!(outcome.provider_status_code, "LC-500");
        assert_eq!(outcome.raw_payload.as_deref(), Some("<html>bad gateway</html>"));
    }

    #[test]
    fn status_decoding_covers_the_three_states_and_drift() {
        assert_eq!(
            LigdicashProvider::decode_status(r#"{"status":"completed"}"#),
            InvoiceStatus::Completed
        );
        assert_eq!(
            LigdicashProvider::decode_status(r#"{"status":"nocompleted"}"#),
            InvoiceStatus::NotCompleted
        );
        assert_eq!(
            LigdicashProvider::decode_status(r#"{"status":"pending"}"#),
            InvoiceStatus::Pending
        );
        assert_eq!(
            LigdicashProvider::decode_status(r#"{"status":"weird"}"#),
            InvoiceStatus::Pending
        );
        assert_eq!(
            LigdicashProvider::decode_status("not json"),
            InvoiceStatus::Pending
        );
        assert_eq!(
            LigdicashProvider::decode_status(r#"{"other":"field"}"#),
            InvoiceStatus::Pending
        );
    }

    #[tokio::test]
    async fn invalid_command_is_rejected_before_any_network_call() {
        let credential = Credential::new("apikey", "token").unwrap();
        let provider =
            LigdicashProvider::new(LigdicashConfig::new(credential, Environment::Prod)).unwrap();

        let mut bad = command();
        bad.custom_data.transaction_id = String::new();
        assert!(provider.create_invoice(bad).await.is_err());

        assert!(provider.verify_invoice_token("").await.is_err());
    }
}
