//! Sendmail Worker - Entry Point
//!
//! Consumes send requests from the Redis stream and delivers emails.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    sendmail_worker::run().await
}
