//! Combined alert sink: native popup plus optional SMTP delivery.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use dlp_core::ports::{AdminReport, AlertPort};
use dlp_infra::AlertMailer;

pub struct AgentAlertSink {
    mailer: Option<Arc<AlertMailer>>,
}

impl AgentAlertSink {
    pub fn new(mailer: Option<Arc<AlertMailer>>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl AlertPort for AgentAlertSink {
    async fn notify_user(&self, title: &str, message: &str) {
        dlp_platform::popup::show(title, message).await;
    }

    async fn notify_admin(&self, report: AdminReport) {
        match &self.mailer {
            Some(mailer) => mailer.send(&report).await,
            None => debug!(?report, "email disabled, dropping admin report"),
        }
    }
}
