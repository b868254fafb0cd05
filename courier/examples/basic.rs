//! Queue a templated message and drain it through the in-memory transport.
//!
//! ```text
//! RUST_LOG=courier=debug cargo run -p courier --example basic
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use courier::jobs::MemoryQueue;
use courier::mail::{Mailer, MemoryTransport, TeraRenderer};
use courier::MailError;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), MailError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut templates = HashMap::new();
    templates.insert(
        "welcome.html".to_string(),
        "<p>Welcome aboard, {{ name }}!</p>".to_string(),
    );
    templates.insert(
        "welcome.txt".to_string(),
        "Welcome aboard, {{ name }}!".to_string(),
    );
    let renderer = Arc::new(TeraRenderer::from_strings(templates)?);

    let transport = MemoryTransport::new();
    let queue = MemoryQueue::new();
    let mut mailer = Mailer::new(Arc::new(transport.clone()), renderer)
        .with_queue(Arc::new(queue.clone()));
    mailer.always_from("noreply@example.com", Some("Example"));

    let job_id = mailer
        .queue_view(("welcome.html", "welcome.txt"), &json!({ "name": "Ann" }), |m| {
            m.to(("ann@example.com", "Ann")).subject("Welcome!");
        })
        .await?;
    println!("queued job {job_id}");

    let report = mailer.drainer()?.handle_batch().await;
    println!(
        "processed {}, sent {}, failed {}",
        report.processed, report.succeeded, report.failed
    );

    for message in transport.sent().await {
        println!("-> {} | {}", message.to[0], message.subject);
    }
    Ok(())
}
