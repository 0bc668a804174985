//! Merge a rendered draft with the request's recipients.

use crate::model::{DraftMessage, Message, Request};
use crate::rules::MESSAGE_RULES;
use crate::validation::Violations;

/// Build the final message: each recipient list is the draft's list followed
/// by the request's, order preserved and nothing deduplicated. The result is
/// validated before it is returned.
pub fn assemble(draft: DraftMessage, request: &Request) -> Result<Message, Violations> {
    let message = Message {
        to: concat(draft.to, &request.to),
        cc: concat(draft.cc, &request.cc),
        bcc: concat(draft.bcc, &request.bcc),
        from: draft.from,
        subject: draft.subject,
        body_type: draft.body_type,
        body: draft.body,
    };

    MESSAGE_RULES.validate(&message).into_result()?;
    Ok(message)
}

fn concat<T: Clone>(mut head: Vec<T>, tail: &[T]) -> Vec<T> {
    head.extend_from_slice(tail);
    head
}
