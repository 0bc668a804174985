//! Stream definitions for the sendmail domain.

use stream_worker::StreamDef;

/// Inbound send requests.
pub struct SendmailStream;

impl StreamDef for SendmailStream {
    const STREAM_NAME: &'static str = "sendmail";

    const CONSUMER_GROUP: &'static str = "sendmail_workers";
}
