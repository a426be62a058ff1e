//! Simulated contact-form submission
//!
//! Nothing is sent anywhere. Submitting shows a busy button for
//! `send_delay`, then a confirmation with the fields cleared, then puts the
//! button back after `reset_after`.

use crate::config::FormConfig;
use crate::errors::{LoaderError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::info;

pub const SENDING_LABEL: &str = "Sending...";
pub const SENT_LABEL: &str = "Request Sent!";

/// Submission lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Sending,
    Sent,
}

impl FormState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormState::Idle => "idle",
            FormState::Sending => "sending",
            FormState::Sent => "sent",
        }
    }
}

/// Submit button presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    pub label: String,
    pub disabled: bool,
}

/// Form fields and submit button
#[derive(Debug, Clone)]
pub struct ContactForm {
    state: FormState,
    fields: BTreeMap<String, String>,
    button: SubmitButton,
    original_label: String,
}

impl ContactForm {
    pub fn new(button_label: &str) -> Self {
        Self {
            state: FormState::Idle,
            fields: BTreeMap::new(),
            button: SubmitButton {
                label: button_label.to_string(),
                disabled: false,
            },
            original_label: button_label.to_string(),
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn button(&self) -> &SubmitButton {
        &self.button
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn set_field(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }

    /// Idle → Sending
    pub fn begin(&mut self) -> Result<()> {
        if self.state != FormState::Idle {
            return Err(LoaderError::FormBusy {
                state: self.state.as_str().to_string(),
            });
        }
        self.state = FormState::Sending;
        self.button.label = SENDING_LABEL.to_string();
        self.button.disabled = true;
        Ok(())
    }

    /// Sending → Sent; clears the fields
    pub fn mark_sent(&mut self) {
        if self.state == FormState::Sending {
            self.state = FormState::Sent;
            self.button.label = SENT_LABEL.to_string();
            self.fields.clear();
        }
    }

    /// Sent → Idle; restores the original button
    pub fn restore(&mut self) {
        if self.state == FormState::Sent {
            self.state = FormState::Idle;
            self.button.label = self.original_label.clone();
            self.button.disabled = false;
        }
    }
}

/// Drives a shared [`ContactForm`] through a fake submission
#[derive(Clone)]
pub struct FormSimulator {
    form: Arc<Mutex<ContactForm>>,
    send_delay: Duration,
    reset_after: Duration,
}

impl FormSimulator {
    pub fn new(form: ContactForm, config: &FormConfig) -> Self {
        Self {
            form: Arc::new(Mutex::new(form)),
            send_delay: Duration::from_millis(config.send_delay_ms),
            reset_after: Duration::from_millis(config.reset_after_ms),
        }
    }

    /// Snapshot of the form
    pub async fn snapshot(&self) -> ContactForm {
        self.form.lock().await.clone()
    }

    pub async fn set_field(&self, name: &str, value: &str) {
        self.form.lock().await.set_field(name, value);
    }

    /// Run one full submission cycle
    ///
    /// Fails fast with `FormBusy` if a cycle is already in flight. The lock
    /// is released while waiting so the form stays observable.
    pub async fn submit(&self) -> Result<()> {
        let field_count = {
            let mut form = self.form.lock().await;
            form.begin()?;
            form.fields().len()
        };
        info!(fields = field_count, "simulating form submission");

        sleep(self.send_delay).await;
        self.form.lock().await.mark_sent();

        sleep(self.reset_after).await;
        self.form.lock().await.restore();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_ok, task};

    #[test]
    fn test_state_cycle() {
        let mut form = ContactForm::new("Send Request");
        form.set_field("email", "a@example.com");

        form.begin().unwrap();
        assert_eq!(form.state(), FormState::Sending);
        assert_eq!(form.button().label, SENDING_LABEL);
        assert!(form.button().disabled);

        form.mark_sent();
        assert_eq!(form.state(), FormState::Sent);
        assert!(form.fields().is_empty());
        assert_eq!(form.button().label, SENT_LABEL);

        form.restore();
        assert_eq!(form.state(), FormState::Idle);
        assert_eq!(form.button().label, "Send Request");
        assert!(!form.button().disabled);
    }

    #[test]
    fn test_double_submit_rejected() {
        let mut form = ContactForm::new("Send");
        form.begin().unwrap();
        let err = form.begin().unwrap_err();
        assert!(matches!(err, LoaderError::FormBusy { .. }));
    }

    #[test]
    fn test_out_of_order_calls_ignored() {
        let mut form = ContactForm::new("Send");
        form.set_field("name", "Ada");
        form.mark_sent();
        form.restore();
        assert_eq!(form.state(), FormState::Idle);
        assert_eq!(form.fields().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_submission_timeline() {
        let sim = FormSimulator::new(ContactForm::new("Send"), &FormConfig::default());
        sim.set_field("message", "hello").await;

        let running = tokio::spawn({
            let sim = sim.clone();
            async move { sim.submit().await }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sim.snapshot().await.state(), FormState::Sending);
        assert!(matches!(sim.submit().await, Err(LoaderError::FormBusy { .. })));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let form = sim.snapshot().await;
        assert_eq!(form.state(), FormState::Sent);
        assert!(form.fields().is_empty());

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(sim.snapshot().await.state(), FormState::Idle);
        assert_eq!(sim.snapshot().await.button().label, "Send");
        running.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_pending_until_reset() {
        let sim = FormSimulator::new(ContactForm::new("Send"), &FormConfig::default());
        let mut submission = task::spawn(sim.submit());

        assert_pending!(submission.poll());
        tokio::time::sleep(Duration::from_millis(4001)).await;
        assert!(submission.is_woken());
        assert_pending!(submission.poll());
        tokio::time::sleep(Duration::from_millis(3001)).await;
        assert_ready_ok!(submission.poll());
    }
}
