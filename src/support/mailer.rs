use async_trait::async_trait;
use evlog::meta;

use crate::runtime::get_logger;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, text: &str) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the event log instead of a transport.
pub struct LogMailer {
    pub from: String,
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, text: &str) -> anyhow::Result<()> {
        get_logger().info("Outgoing email.", meta! {
            "From" => self.from.clone(),
            "To" => to,
            "Subject" => subject,
            "Body" => text,
        });

        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<(String, String, String)>>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn last_to(&self, to: &str) -> Option<String> {
        self.sent.lock().unwrap().iter().rev()
            .find(|(t, _, _)| t == to)
            .map(|(_, _, text)| text.clone())
    }

    /// Pulls the six-digit code out of the most recent mail to `to`.
    pub fn last_code_to(&self, to: &str) -> Option<String> {
        let text = self.last_to(to)?;
        text.split(|c: char| !c.is_ascii_digit())
            .find(|w| w.len() == 6)
            .map(|w| w.to_owned())
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, text: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((to.to_owned(), subject.to_owned(), text.to_owned()));
        Ok(())
    }
}
