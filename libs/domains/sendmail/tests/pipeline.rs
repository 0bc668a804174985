//! End-to-end tests: requests published on an in-process channel, handled by
//! the stream worker, rendered from in-memory templates and recorded by a
//! memory sink.

use domain_sendmail::{
    Address, InMemoryTemplateSource, Mailer, MemorySink, Request, SendMailError, SendmailProcessor,
    Violation,
};
use serde_json::{Value, json};
use std::sync::Arc;
use stream_worker::{Disposition, Settlement, StreamWorker, channel};
use tokio::sync::watch;

const LANG: &str = "en";

const VALID: &str = r#"
From:
  Email: user@mail.com
  Name: Sender
Subject: Subject
BodyType: "text/plain"
Body: |
  Hello {{.Username}}!
  This is test body!
"#;

const INVALID_BODY_TYPE: &str = r#"
From:
  Email: user@mail.com
  Name: LevelUp
Subject: Subject
BodyType: "text/xxx"
Body: |
  Hello {{.Username}}!
"#;

const MISSING_BODY_TYPE: &str = r#"
From:
  Email: user@mail.com
  Name: LevelUp
Subject: Subject
Body: |
  Hello {{.Username}}!
"#;

const MISSING_BODY: &str = r#"
From:
  Email: user@mail.com
  Name: LevelUp
Subject: Subject
BodyType: "text/plain"
"#;

const MISSING_SUBJECT: &str = r#"
From:
  Email: user@mail.com
  Name: LevelUp
BodyType: "text/plain"
Body: |
  Hello {{.Username}}!
"#;

const MISSING_FROM: &str = r#"
Subject: Subject
BodyType: "text/plain"
Body: |
  Hello {{.Username}}!
"#;

const MISSING_FROM_EMAIL: &str = r#"
From:
  Name: LevelUp
Subject: Subject
BodyType: "text/plain"
Body: |
  Hello {{.Username}}!
"#;

const INVALID_FROM_EMAIL: &str = r#"
From:
  Email: user.mail.com
  Name: LevelUp
Subject: Subject
BodyType: "text/plain"
Body: |
  Hello {{.Username}}!
"#;

const UNRENDERABLE: &str = "Body: {{.Username\n";

fn templates() -> InMemoryTemplateSource {
    InMemoryTemplateSource::new()
        .with_template(LANG, "valid", VALID)
        .with_template(LANG, "invalid-body-type", INVALID_BODY_TYPE)
        .with_template(LANG, "invalid-missing-body-type", MISSING_BODY_TYPE)
        .with_template(LANG, "invalid-missing-body", MISSING_BODY)
        .with_template(LANG, "invalid-missing-subject", MISSING_SUBJECT)
        .with_template(LANG, "invalid-missing-from", MISSING_FROM)
        .with_template(LANG, "invalid-missing-from-email", MISSING_FROM_EMAIL)
        .with_template(LANG, "invalid-from-email", INVALID_FROM_EMAIL)
        .with_template(LANG, "unrenderable", UNRENDERABLE)
}

fn request(name: &str) -> Value {
    json!({
        "templateLang": LANG,
        "templateName": name,
        "templateArgs": {"Username": "user@mail.com"},
        "to": [{"email": "to1@mail.com"}]
    })
}

/// Publish every body, close the channel, run the worker to completion and
/// collect the settlements in order.
async fn run_worker(bodies: &[Value], sink: MemorySink, requeue: bool) -> Vec<Settlement> {
    let (source, mut handle) = channel("sendmail-test");
    let mailer = Mailer::new(Arc::new(templates()), Arc::new(sink));
    let worker = StreamWorker::new(source, SendmailProcessor::new(mailer, requeue));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    for body in bodies {
        handle.publish(body.to_string()).unwrap();
    }
    handle.close();

    worker.run(shutdown_rx).await.unwrap();

    let mut settlements = Vec::new();
    while let Some(settlement) = handle.next_settlement().await {
        settlements.push(settlement);
    }
    settlements
}

fn dispositions(settlements: &[Settlement]) -> Vec<Disposition> {
    settlements.iter().map(|s| s.disposition).collect()
}

#[tokio::test]
async fn mail_sent_and_acknowledged() {
    let sink = MemorySink::new();
    let body = json!({
        "templateLang": "en",
        "templateName": "valid",
        "templateArgs": {"Username": "SuperUser"},
        "to": [{"email": "user@mail.com"}]
    });

    let settlements = run_worker(&[body], sink.clone(), true).await;
    assert_eq!(dispositions(&settlements), vec![Disposition::Ack]);

    let inbox = sink.messages().await;
    assert_eq!(inbox.len(), 1);
    let message = &inbox[0];
    assert_eq!(message.body, "Hello SuperUser!\nThis is test body!\n");
    assert_eq!(message.subject, "Subject");
    assert_eq!(message.body_type, "text/plain");
    assert_eq!(message.from, Address::new("user@mail.com").with_name("Sender"));
    assert_eq!(message.to, vec![Address::new("user@mail.com")]);
    assert!(message.cc.is_empty());
    assert!(message.bcc.is_empty());
}

#[tokio::test]
async fn missing_argument_is_sent_and_acknowledged() {
    for requeue in [true, false] {
        let sink = MemorySink::new();
        let mut body = request("valid");
        body["templateArgs"] = json!({});

        let settlements = run_worker(&[body], sink.clone(), requeue).await;
        assert_eq!(dispositions(&settlements), vec![Disposition::Ack]);

        let inbox = sink.messages().await;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].body, "Hello <no value>!\nThis is test body!\n");
    }
}

#[tokio::test]
async fn deliveries_are_processed_in_order() {
    let sink = MemorySink::new();
    let mut second = request("valid");
    second["templateArgs"]["Username"] = json!("Second");
    let mut first = request("valid");
    first["templateArgs"]["Username"] = json!("First");

    let settlements = run_worker(&[first, request("xxx"), second], sink.clone(), true).await;

    let ids: Vec<_> = settlements.iter().map(|s| s.delivery_id.as_str()).collect();
    assert_eq!(ids, vec!["channel-1", "channel-2", "channel-3"]);
    assert_eq!(
        dispositions(&settlements),
        vec![
            Disposition::Ack,
            Disposition::Reject { requeue: false },
            Disposition::Ack
        ]
    );

    let bodies: Vec<_> = sink.messages().await.into_iter().map(|m| m.body).collect();
    assert_eq!(
        bodies,
        vec![
            "Hello First!\nThis is test body!\n",
            "Hello Second!\nThis is test body!\n"
        ]
    );
}

#[tokio::test]
async fn invalid_input_is_dropped_regardless_of_requeue_flag() {
    let malformed = Value::String("not a request".into());
    let mut no_recipients = request("valid");
    no_recipients["to"] = json!([]);
    let bodies = [
        malformed,
        no_recipients,
        request("xxx"),
        request("invalid-body-type"),
    ];

    for requeue in [true, false] {
        let sink = MemorySink::new();
        let settlements = run_worker(&bodies, sink.clone(), requeue).await;

        assert_eq!(
            dispositions(&settlements),
            vec![Disposition::Reject { requeue: false }; 4]
        );
        assert!(sink.messages().await.is_empty());
    }
}

#[tokio::test]
async fn internal_failures_follow_requeue_flag() {
    for requeue in [true, false] {
        let settlements = run_worker(
            &[request("valid"), request("unrenderable")],
            MemorySink::failing("provider unavailable"),
            requeue,
        )
        .await;

        assert_eq!(
            dispositions(&settlements),
            vec![Disposition::Reject { requeue }, Disposition::Reject { requeue }]
        );
    }
}

async fn send(body: Value) -> Result<(), SendMailError> {
    let mailer = Mailer::new(Arc::new(templates()), Arc::new(MemorySink::new()));
    let request: Request = serde_json::from_value(body).unwrap();
    mailer.send_mail(&request).await
}

fn input_violations(result: Result<(), SendMailError>) -> Vec<Violation> {
    match result {
        Err(SendMailError::Input(v)) => v.into_inner(),
        other => panic!("expected input error, got {other:?}"),
    }
}

fn assembly_violations(result: Result<(), SendMailError>) -> Vec<Violation> {
    match result {
        Err(SendMailError::Assembly(v)) => v.into_inner(),
        other => panic!("expected assembly error, got {other:?}"),
    }
}

#[tokio::test]
async fn request_violations() {
    let mut body = request("valid");
    body["templateLang"] = json!("");
    assert_eq!(
        input_violations(send(body).await),
        vec![Violation::new(".templateLang", "cannot be blank")]
    );

    let mut body = request("valid");
    body.as_object_mut().unwrap().remove("templateName");
    assert_eq!(
        input_violations(send(body).await),
        vec![Violation::new(".templateName", "cannot be blank")]
    );

    let mut body = request("valid");
    body.as_object_mut().unwrap().remove("to");
    assert_eq!(
        input_violations(send(body).await),
        vec![Violation::new("", "missing recipients")]
    );

    for email in ["", "to1.mail.com"] {
        let mut body = request("valid");
        body["to"] = json!([{"email": email, "name": ""}]);
        assert_eq!(
            input_violations(send(body).await),
            vec![Violation::new(".to[0].Email", "invalid email")]
        );
    }
}

#[tokio::test]
async fn template_not_found() {
    let violations = input_violations(send(request("xxx")).await);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, "");
    assert_eq!(violations[0].message, "cannot load template");
    assert_eq!(
        Value::Object(violations[0].params.clone().unwrap()),
        json!({"lang": "en", "name": "xxx", "cause": "template not found"})
    );
}

#[tokio::test]
async fn message_violations() {
    let supported = json!(["text/plain", "text/html"]);

    let violations = assembly_violations(send(request("invalid-missing-body-type")).await);
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0], Violation::new(".BodyType", "cannot be blank"));
    assert_eq!(violations[1].message, "invalid body type");
    assert_eq!(
        Value::Object(violations[1].params.clone().unwrap()),
        json!({"unsupported": "", "supported": supported})
    );

    let violations = assembly_violations(send(request("invalid-body-type")).await);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, ".BodyType");
    assert_eq!(
        Value::Object(violations[0].params.clone().unwrap()),
        json!({"unsupported": "text/xxx", "supported": supported})
    );

    assert_eq!(
        assembly_violations(send(request("invalid-missing-body")).await),
        vec![Violation::new(".Body", "cannot be blank")]
    );
    assert_eq!(
        assembly_violations(send(request("invalid-missing-subject")).await),
        vec![Violation::new(".Subject", "cannot be blank")]
    );

    for name in ["invalid-missing-from", "invalid-missing-from-email", "invalid-from-email"] {
        assert_eq!(
            assembly_violations(send(request(name)).await),
            vec![Violation::new(".From.Email", "invalid email")],
            "{name}"
        );
    }
}
