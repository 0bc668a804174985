//! The send pipeline: validate, load, render, assemble, deliver.

use crate::assemble::assemble;
use crate::error::{SendMailError, SendMailResult};
use crate::model::Request;
use crate::render::render;
use crate::rules::{ERR_LOAD_TEMPLATE, REQUEST_RULES};
use crate::sink::DeliverySink;
use crate::template::TemplateSource;
use crate::validation::{Violation, Violations};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Builds a message from a request and hands it to the sink.
///
/// Holds no per-request state; the collaborators are shared read-only.
#[derive(Clone)]
pub struct Mailer {
    templates: Arc<dyn TemplateSource>,
    sink: Arc<dyn DeliverySink>,
}

impl Mailer {
    pub fn new(templates: Arc<dyn TemplateSource>, sink: Arc<dyn DeliverySink>) -> Self {
        Self { templates, sink }
    }

    /// Run the pipeline for one request.
    ///
    /// Request violations and template load failures are `Input` errors,
    /// message violations `Assembly` errors, render and delivery failures
    /// `Internal` errors. The sink is called at most once.
    pub async fn send_mail(&self, request: &Request) -> SendMailResult<()> {
        REQUEST_RULES
            .validate(request)
            .into_result()
            .map_err(SendMailError::Input)?;

        let template = self
            .templates
            .load(&request.template_lang, &request.template_name)
            .await
            .map_err(|e| SendMailError::Input(load_failure(request, &e.to_string())))?;

        let draft = render(&template, &request.template_args)?;
        let message = assemble(draft, request).map_err(SendMailError::Assembly)?;

        debug!(
            template_lang = %request.template_lang,
            template_name = %request.template_name,
            recipients = message.recipient_count(),
            sink = self.sink.name(),
            "Delivering message"
        );

        self.sink.send(&message).await?;
        Ok(())
    }
}

fn load_failure(request: &Request, cause: &str) -> Violations {
    let mut params = Map::new();
    params.insert("lang".into(), Value::String(request.template_lang.clone()));
    params.insert("name".into(), Value::String(request.template_name.clone()));
    params.insert("cause".into(), Value::String(cause.to_string()));
    Violation::new("", ERR_LOAD_TEMPLATE).with_params(params).into()
}
