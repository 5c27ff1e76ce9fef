use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use thiserror::Error;

/// One outbound email. Bodies are HTML; templating beyond these fields
/// belongs to the delivery side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Email delivery error.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound email delivery boundary. No delivery receipts: success means the
/// gateway accepted the message, nothing more.
pub trait EmailGateway: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), GatewayError>;
}

impl<G> EmailGateway for Arc<G>
where
    G: EmailGateway + ?Sized,
{
    fn send(&self, message: &EmailMessage) -> Result<(), GatewayError> {
        (**self).send(message)
    }
}

/// Gateway that records messages instead of delivering them, for tests/dev.
/// Can be switched into a failing mode to exercise error paths.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: RwLock<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl EmailGateway for RecordingGateway {
    fn send(&self, message: &EmailMessage) -> Result<(), GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Send("gateway unavailable".to_string()));
        }
        if let Ok(mut sent) = self.sent.write() {
            sent.push(message.clone());
        }
        Ok(())
    }
}
