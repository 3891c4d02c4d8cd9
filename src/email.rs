// src/email.rs

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AppError;

/// Outbound mail collaborator. The service only ever sends one kind of
/// message (an OTP), so the seam is exactly that narrow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), AppError>;
}

/// Default mailer: logs the send instead of talking to an SMTP relay.
/// Delivery mechanics belong to the deployment, not this service.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), AppError> {
        tracing::info!(recipient = to, "OTP email queued (code {code}, valid 10 minutes)");
        Ok(())
    }
}

/// Test/dev mailer that records every send so flows can read the code
/// back instead of watching a mailbox.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last code sent to the address, if any.
    pub async fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|(recipient, _)| recipient == to)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .await
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}
