//! Delivery handler for the sendmail stream.
//!
//! Decodes each delivery into a [`Request`], runs the [`Mailer`] and turns the
//! outcome into an ack or reject decision:
//!
//! | Outcome                         | Disposition                     |
//! |---------------------------------|---------------------------------|
//! | sent                            | ack                             |
//! | payload not a request           | reject, never requeued          |
//! | request or message violations   | reject, never requeued          |
//! | render or delivery failure      | reject, requeued if configured  |

use crate::error::{FailureKind, SendMailError};
use crate::mailer::Mailer;
use crate::model::Request;
use async_trait::async_trait;
use metrics::counter;
use stream_worker::{Delivery, DeliveryHandler, Disposition};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Stream handler driving the send pipeline.
#[derive(Clone)]
pub struct SendmailProcessor {
    mailer: Mailer,
    requeue: bool,
}

impl SendmailProcessor {
    /// `requeue` decides whether internal failures are redelivered.
    pub fn new(mailer: Mailer, requeue: bool) -> Self {
        Self { mailer, requeue }
    }

    pub fn requeue(&self) -> bool {
        self.requeue
    }

    fn reject(&self, kind: FailureKind) -> Disposition {
        counter!("sendmail_failures_total", "kind" => kind.as_ref().to_string()).increment(1);
        Disposition::Reject {
            requeue: kind.is_retryable() && self.requeue,
        }
    }
}

#[async_trait]
impl DeliveryHandler for SendmailProcessor {
    async fn handle(&self, delivery: &Delivery) -> Disposition {
        // Correlates the log lines of one delivery; not used for dedup.
        let delivery_id = Uuid::new_v4();

        let request = match Request::from_slice(&delivery.body) {
            Ok(request) => request,
            Err(e) => {
                error!(
                    %delivery_id,
                    stream_id = %delivery.id,
                    error = %e,
                    "malformed request"
                );
                return self.reject(FailureKind::Malformed);
            }
        };

        debug!(
            %delivery_id,
            stream_id = %delivery.id,
            redelivered = delivery.redelivered,
            template_lang = %request.template_lang,
            template_name = %request.template_name,
            "request received"
        );

        match self.mailer.send_mail(&request).await {
            Ok(()) => {
                counter!("sendmail_sent_total").increment(1);
                info!(
                    %delivery_id,
                    template_lang = %request.template_lang,
                    template_name = %request.template_name,
                    "request completed"
                );
                Disposition::Ack
            }
            Err(SendMailError::Input(violations)) => {
                error!(%delivery_id, violations = %violations.to_json(), "invalid request");
                self.reject(FailureKind::Input)
            }
            Err(SendMailError::Assembly(violations)) => {
                error!(%delivery_id, violations = %violations.to_json(), "invalid message");
                self.reject(FailureKind::Assembly)
            }
            Err(SendMailError::Internal(e)) => {
                error!(
                    %delivery_id,
                    error = %e,
                    requeue = self.requeue,
                    "unable to send email"
                );
                self.reject(FailureKind::Internal)
            }
        }
    }

    fn name(&self) -> &'static str {
        "SendmailProcessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{DeliveryError, MockDeliverySink};
    use crate::template::MockTemplateSource;
    use serde_json::json;
    use std::sync::Arc;

    const VALID: &str = "From:\n  Email: user@mail.com\nSubject: Subject\nBodyType: text/plain\nBody: Hello {{.Username}}\n";

    fn delivery(body: serde_json::Value) -> Delivery {
        Delivery::new("1700000000000-0", body.to_string().into_bytes())
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "templateLang": "en",
            "templateName": "valid",
            "templateArgs": {"Username": "SuperUser"},
            "to": [{"email": "user@mail.com"}]
        })
    }

    fn processor(sink_result: fn() -> Result<(), DeliveryError>, requeue: bool) -> SendmailProcessor {
        let mut templates = MockTemplateSource::new();
        templates
            .expect_load()
            .returning(|_, _| Ok(VALID.to_string()));

        let mut sink = MockDeliverySink::new();
        sink.expect_name().return_const("mock");
        sink.expect_send().returning(move |_| sink_result());

        SendmailProcessor::new(Mailer::new(Arc::new(templates), Arc::new(sink)), requeue)
    }

    fn ok() -> Result<(), DeliveryError> {
        Ok(())
    }

    fn fail() -> Result<(), DeliveryError> {
        Err(DeliveryError::Other("provider down".into()))
    }

    #[tokio::test]
    async fn test_success_acks() {
        let handler = processor(ok, true);
        assert_eq!(handler.handle(&delivery(valid_body())).await, Disposition::Ack);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_dropped() {
        let handler = processor(ok, true);
        let delivery = Delivery::new("1-0", b"{not json".to_vec());
        assert_eq!(
            handler.handle(&delivery).await,
            Disposition::Reject { requeue: false }
        );
    }

    #[tokio::test]
    async fn test_input_errors_never_requeue() {
        for requeue in [true, false] {
            let handler = processor(ok, requeue);
            let mut body = valid_body();
            body["to"] = json!([]);
            assert_eq!(
                handler.handle(&delivery(body)).await,
                Disposition::Reject { requeue: false }
            );
        }
    }

    #[tokio::test]
    async fn test_internal_errors_follow_requeue_flag() {
        for requeue in [true, false] {
            let handler = processor(fail, requeue);
            assert_eq!(
                handler.handle(&delivery(valid_body())).await,
                Disposition::Reject { requeue }
            );
        }
    }

    #[test]
    fn test_handler_name() {
        let handler = processor(ok, false);
        assert_eq!(handler.name(), "SendmailProcessor");
        assert!(!handler.requeue());
    }
}
