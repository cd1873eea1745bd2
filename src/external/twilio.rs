use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TwilioConfig;

const VERIFY_BASE_URL: &str = "https://verify.twilio.com/v2/Services";

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS verification is not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Rejected(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SmsError {
    fn from(value: reqwest::Error) -> Self {
        SmsError::Network(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub sid: Option<String>,
    pub to: String,
    pub channel: Option<String>,
    pub status: String,
    #[serde(default)]
    pub valid: bool,
}

#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send_code(&self, to: &str) -> Result<Verification, SmsError>;

    async fn check_code(&self, to: &str, code: &str) -> Result<Verification, SmsError>;
}

/// Twilio Verify v2 over its REST API.
pub struct TwilioVerify {
    client: reqwest::Client,
    config: TwilioConfig,
}

#[derive(Deserialize)]
struct TwilioErrorBody {
    message: String,
}

impl TwilioVerify {
    pub fn new(client: reqwest::Client, config: TwilioConfig) -> Self {
        Self { client, config }
    }

    async fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<Verification, SmsError> {
        let url = format!("{}/{}/{}", VERIFY_BASE_URL, self.config.service_sid, path);
        let resp = self
            .client
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await?;

        if resp.status().is_client_error() {
            let message = resp
                .json::<TwilioErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| "Verification request rejected".to_string());
            return Err(SmsError::Rejected(message));
        }
        if !resp.status().is_success() {
            return Err(SmsError::Network(format!("Twilio returned {}", resp.status())));
        }

        resp.json::<Verification>()
            .await
            .map_err(|e| SmsError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SmsProvider for TwilioVerify {
    async fn send_code(&self, to: &str) -> Result<Verification, SmsError> {
        self.post("Verifications", &[("To", to), ("Channel", "sms")]).await
    }

    async fn check_code(&self, to: &str, code: &str) -> Result<Verification, SmsError> {
        self.post("VerificationCheck", &[("To", to), ("Code", code)]).await
    }
}
