use std::sync::Arc;

use async_trait::async_trait;
use game::Notifier;
use settings::Configuration;
use tracing::{debug, info, warn};

/// User-facing feedback for automated actions.
///
/// Gated on `enableNotifications` and strictly best-effort: a failed delivery
/// is logged and never changes the outcome of the action that produced it.
#[derive(Clone)]
pub struct Feedback {
    notifier: Arc<dyn Notifier>,
}

impl Feedback {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn emit(&self, cfg: &Configuration, title: &str, body: &str) {
        if !cfg.enable_notifications {
            debug!(target: "feedback", title, "notifications disabled; not sent");
            return;
        }

        if let Err(e) = self.notifier.notify_user(title, body).await {
            warn!(
                target: "feedback",
                title,
                error = %format!("{e:#}"),
                "notification not delivered"
            );
        }
    }
}

/// Notifier that only writes to the log; used when no viewer channel exists.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_user(&self, title: &str, body: &str) -> anyhow::Result<()> {
        info!(target: "notify", title, body, "user notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn notify_user(&self, title: &str, body: &str) -> anyhow::Result<()> {
            self.sent.lock().push((title.into(), body.into()));
            Ok(())
        }
    }

    struct Refusing;

    #[async_trait]
    impl Notifier for Refusing {
        async fn notify_user(&self, _: &str, _: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("permission not granted"))
        }
    }

    #[tokio::test]
    async fn disabled_notifications_are_dropped() {
        let rec = Arc::new(Recorder::default());
        let fb = Feedback::new(rec.clone());

        let cfg = Configuration {
            enable_notifications: false,
            ..Default::default()
        };
        fb.emit(&cfg, "Fuel purchased", "100t").await;
        assert!(rec.sent.lock().is_empty());

        fb.emit(&Configuration::default(), "Fuel purchased", "100t")
            .await;
        assert_eq!(rec.sent.lock().len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn delivery_failure_is_only_logged() {
        let fb = Feedback::new(Arc::new(Refusing));
        fb.emit(&Configuration::default(), "Repair", "done").await;

        assert!(logs_contain("notification not delivered"));
        assert!(logs_contain("permission not granted"));
    }

    #[tokio::test]
    #[traced_test]
    async fn log_notifier_writes_the_message() {
        LogNotifier
            .notify_user("Campaign renewed", "green for $500")
            .await
            .unwrap();

        assert!(logs_contain("green for $500"));
    }
}
