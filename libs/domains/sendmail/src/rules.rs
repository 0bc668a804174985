//! Rule tables for requests and assembled messages.

use crate::model::{Address, Message, Request};
use crate::validation::{Rules, StrRule};
use std::sync::LazyLock;

pub const ERR_BLANK: &str = "cannot be blank";
pub const ERR_MISSING_RECIPIENTS: &str = "missing recipients";
pub const ERR_INVALID_EMAIL: &str = "invalid email";
pub const ERR_INVALID_BODY_TYPE: &str = "invalid body type";
pub const ERR_LOAD_TEMPLATE: &str = "cannot load template";

/// Supported `BodyType` values.
pub const BODY_TYPES: &[&str] = &["text/plain", "text/html"];

const REQUIRED: StrRule = StrRule::Required(ERR_BLANK);
const EMAIL: StrRule = StrRule::Email(ERR_INVALID_EMAIL);
const BODY_TYPE: StrRule = StrRule::OneOf {
    allowed: BODY_TYPES,
    message: ERR_INVALID_BODY_TYPE,
};

pub static ADDRESS_RULES: LazyLock<Rules<Address>> =
    LazyLock::new(|| Rules::<Address>::new().field("Email", |a| a.email.as_str(), &[EMAIL]));

pub static REQUEST_RULES: LazyLock<Rules<Request>> = LazyLock::new(|| {
    Rules::<Request>::new()
        .field("templateLang", |r| r.template_lang.as_str(), &[REQUIRED])
        .field("templateName", |r| r.template_name.as_str(), &[REQUIRED])
        .each("to", |r| r.to.as_slice(), &*ADDRESS_RULES)
        .each("cc", |r| r.cc.as_slice(), &*ADDRESS_RULES)
        .each("bcc", |r| r.bcc.as_slice(), &*ADDRESS_RULES)
        .object(|r| (!r.has_recipients()).then_some(ERR_MISSING_RECIPIENTS))
});

pub static MESSAGE_RULES: LazyLock<Rules<Message>> = LazyLock::new(|| {
    Rules::<Message>::new()
        .field("Subject", |m| m.subject.as_str(), &[REQUIRED])
        .field("BodyType", |m| m.body_type.as_str(), &[REQUIRED, BODY_TYPE])
        .field("Body", |m| m.body.as_str(), &[REQUIRED])
        .nested("From", |m| &m.from, &*ADDRESS_RULES)
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Violation;
    use serde_json::json;

    fn request() -> Request {
        Request {
            template_lang: "en".into(),
            template_name: "valid".into(),
            to: vec![Address::new("to1@mail.com")],
            ..Default::default()
        }
    }

    fn message() -> Message {
        Message {
            from: Address::new("user@mail.com").with_name("Sender"),
            to: vec![Address::new("to1@mail.com")],
            subject: "Subject".into(),
            body_type: "text/plain".into(),
            body: "Hello".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(REQUEST_RULES.validate(&request()).is_empty());
    }

    #[test]
    fn test_blank_template_lang() {
        let req = Request {
            template_lang: "  ".into(),
            ..request()
        };
        assert_eq!(
            REQUEST_RULES.validate(&req).into_inner(),
            vec![Violation::new(".templateLang", ERR_BLANK)]
        );
    }

    #[test]
    fn test_blank_template_name() {
        let req = Request {
            template_name: String::new(),
            ..request()
        };
        assert_eq!(
            REQUEST_RULES.validate(&req).into_inner(),
            vec![Violation::new(".templateName", ERR_BLANK)]
        );
    }

    #[test]
    fn test_missing_recipients() {
        let req = Request {
            to: vec![],
            ..request()
        };
        assert_eq!(
            REQUEST_RULES.validate(&req).into_inner(),
            vec![Violation::new("", ERR_MISSING_RECIPIENTS)]
        );
    }

    #[test]
    fn test_invalid_recipient_emails_are_indexed() {
        let req = Request {
            to: vec![Address::new("ok@mail.com"), Address::new("to1.mail.com")],
            cc: vec![Address::new("")],
            ..request()
        };
        assert_eq!(
            REQUEST_RULES.validate(&req).into_inner(),
            vec![
                Violation::new(".to[1].Email", ERR_INVALID_EMAIL),
                Violation::new(".cc[0].Email", ERR_INVALID_EMAIL),
            ]
        );
    }

    #[test]
    fn test_cc_only_counts_as_recipients() {
        let req = Request {
            to: vec![],
            cc: vec![Address::new("cc@mail.com")],
            ..request()
        };
        assert!(REQUEST_RULES.validate(&req).is_empty());
    }

    #[test]
    fn test_valid_message() {
        assert!(MESSAGE_RULES.validate(&message()).is_empty());
    }

    #[test]
    fn test_missing_body_type_reports_blank_and_unsupported() {
        let msg = Message {
            body_type: String::new(),
            ..message()
        };
        let violations = MESSAGE_RULES.validate(&msg).into_inner();

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0], Violation::new(".BodyType", ERR_BLANK));
        assert_eq!(violations[1].path, ".BodyType");
        assert_eq!(violations[1].message, ERR_INVALID_BODY_TYPE);
        assert_eq!(
            violations[1].params.clone().map(serde_json::Value::Object),
            Some(json!({"unsupported": "", "supported": ["text/plain", "text/html"]}))
        );
    }

    #[test]
    fn test_invalid_from_email() {
        let msg = Message {
            from: Address::new("user.mail.com"),
            ..message()
        };
        assert_eq!(
            MESSAGE_RULES.validate(&msg).into_inner(),
            vec![Violation::new(".From.Email", ERR_INVALID_EMAIL)]
        );
    }

    #[test]
    fn test_blank_subject_and_body() {
        let msg = Message {
            subject: String::new(),
            body: String::new(),
            ..message()
        };
        assert_eq!(
            MESSAGE_RULES.validate(&msg).into_inner(),
            vec![
                Violation::new(".Subject", ERR_BLANK),
                Violation::new(".Body", ERR_BLANK),
            ]
        );
    }
}
