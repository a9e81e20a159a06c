//! SMTP alert mailer
//!
//! Renders the three admin report kinds to the fixed HTML template and
//! delivers them over authenticated SMTP with STARTTLS. Delivery is
//! best-effort: failures are logged and swallowed, there is no retry queue.

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use dlp_core::ports::AdminReport;

use crate::config::EmailConfig;

pub struct AlertMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl AlertMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = config
            .sender
            .parse()
            .context("EMAIL_SENDER is not a valid email address")?;
        let to: Mailbox = config
            .receiver
            .parse()
            .context("EMAIL_RECEIVER is not a valid email address")?;

        let creds = Credentials::new(config.sender.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.relay)
            .context("failed to create SMTP STARTTLS transport")?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, from, to })
    }

    /// Render and deliver one report. Never propagates failure.
    pub async fn send(&self, report: &AdminReport) {
        let facts = SystemFacts::collect();
        let Rendered { subject, html } = render(report, &facts);

        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html);

        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "failed to build alert email");
                return;
            }
        };

        match self.mailer.send(message).await {
            Ok(_) => info!(alert_id = %facts.alert_id, "admin alert delivered"),
            Err(e) => warn!(error = %e, "admin alert delivery failed"),
        }
    }
}

struct Rendered {
    subject: String,
    html: String,
}

/// Facts attached to every report: who, where, when.
struct SystemFacts {
    mailbox: String,
    device: String,
    ip: String,
    local_time: String,
    alert_id: String,
}

impl SystemFacts {
    fn collect() -> Self {
        let device = gethostname::gethostname().to_string_lossy().into_owned();
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "Unknown".to_owned());
        let ip = local_ip_address::local_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|_| "127.0.0.1".to_owned());
        let local_time = chrono::Local::now()
            .format("%d/%m/%Y %I:%M:%S %p")
            .to_string();
        Self {
            mailbox: format!("{user}@{device}"),
            device,
            ip,
            local_time,
            alert_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

fn render(report: &AdminReport, facts: &SystemFacts) -> Rendered {
    let (activity, subject_kind, detail) = match report {
        AdminReport::ClipboardPaste { preview, app } => (
            "DlpRuleMatch (Clipboard Paste)",
            "clipboard paste",
            format!(
                "Attempted to paste source code into <b>{}</b>.<br>Preview:<br><pre>{}</pre>",
                escape_html(app),
                escape_html(preview)
            ),
        ),
        AdminReport::FileCopy { path, app } => (
            "DlpRuleMatch (File Copy)",
            "file copy",
            format!(
                "Attempted to copy source file <b>{}</b> into <b>{}</b>.",
                escape_html(path),
                escape_html(app)
            ),
        ),
        AdminReport::GitPush { url } => (
            "DlpRuleMatch (Git Push)",
            "git push",
            format!(
                "Attempted to push code to external repository outside whitelist: <b>{}</b>",
                escape_html(url)
            ),
        ),
    };

    let subject =
        format!("Medium-severity alert: DLP policy matched for {subject_kind} in a device");

    let html = format!(
        r#"<html><body style="font-family: 'Segoe UI', sans-serif; color: #333; background-color: #f8f9fa; padding: 20px;">
  <div style="background-color: #fff; padding: 40px; border-radius: 8px; border-top: 6px solid #d83b01; max-width: 750px; margin: auto;">
    <h2 style="color: #212529; margin-top: 0;">A medium-severity alert has been triggered</h2>
    <p style="font-size: 15px; color: #666;">DLP policy matched for {subject_kind} on a managed device.</p>
    <div style="background-color: #faf9f8; padding: 15px; border-left: 4px solid #a4262c; margin: 20px 0;">
      <strong style="color: #a4262c;">Severity: Medium</strong>
    </div>
    <table style="width: 100%; font-size: 14px; line-height: 1.8; border-collapse: collapse;">
      <tr><td style="width: 220px; font-weight: bold; color: #444;">Time of occurrence:</td><td>{time}</td></tr>
      <tr><td style="font-weight: bold; color: #444;">Activity:</td><td>{activity}</td></tr>
      <tr><td style="font-weight: bold; color: #444;">User:</td><td style="color: #0078d4;">{mailbox}</td></tr>
      <tr><td style="font-weight: bold; color: #444;">Policy:</td><td>DLP_Block_SourceCode</td></tr>
      <tr><td style="font-weight: bold; color: #444;">Alert ID:</td><td style="color: #666; font-family: monospace;">{alert_id}</td></tr>
      <tr><td style="font-weight: bold; color: #444;">Device:</td><td>{device}</td></tr>
      <tr><td style="font-weight: bold; color: #444;">IP:</td><td>{ip}</td></tr>
      <tr><td style="font-weight: bold; color: #444;">Status:</td><td style="color: #a4262c; font-weight: bold;">BLOCK</td></tr>
    </table>
    <hr style="border: 0; border-top: 1px solid #e1dfdd; margin: 25px 0;">
    <h3 style="font-size: 16px;">Details:</h3>
    <div style="background-color: #f3f2f1; padding: 15px; border: 1px solid #e1dfdd; font-family: Consolas, monospace; font-size: 13px; color: #d13438;">
      {detail}
    </div>
  </div>
</body></html>
"#,
        subject_kind = subject_kind,
        time = escape_html(&facts.local_time),
        activity = activity,
        mailbox = escape_html(&facts.mailbox),
        alert_id = facts.alert_id,
        device = escape_html(&facts.device),
        ip = escape_html(&facts.ip),
        detail = detail,
    );

    Rendered { subject, html }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> SystemFacts {
        SystemFacts {
            mailbox: "dev@host".into(),
            device: "host".into(),
            ip: "10.0.0.7".into(),
            local_time: "01/08/2026 09:00:00 AM".into(),
            alert_id: "0000-1111".into(),
        }
    }

    #[test]
    fn git_push_report_carries_the_url() {
        let rendered = render(
            &AdminReport::GitPush {
                url: "git@github.com:someone/other.git".into(),
            },
            &facts(),
        );
        assert!(rendered.subject.contains("git push"));
        assert!(rendered.html.contains("git@github.com:someone/other.git"));
        assert!(rendered.html.contains("DlpRuleMatch (Git Push)"));
    }

    #[test]
    fn clipboard_preview_is_html_escaped() {
        let rendered = render(
            &AdminReport::ClipboardPaste {
                preview: "<script>alert(1)</script>".into(),
                app: "Slack".into(),
            },
            &facts(),
        );
        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("&lt;script&gt;"));
        assert!(rendered.subject.contains("clipboard paste"));
    }

    #[test]
    fn file_copy_uses_its_own_activity_line() {
        let rendered = render(
            &AdminReport::FileCopy {
                path: "/src/main.rs".into(),
                app: "Discord".into(),
            },
            &facts(),
        );
        assert!(rendered.html.contains("DlpRuleMatch (File Copy)"));
        assert!(rendered.html.contains("/src/main.rs"));
    }
}
