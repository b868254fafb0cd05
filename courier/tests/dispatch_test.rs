use std::collections::HashMap;
use std::sync::Arc;

use courier::mail::{Body, Mailbox, Mailer, MemoryTransport, TeraRenderer, TransportConfig, View};
use courier::{MailConfig, MailError};
use serde_json::json;

fn renderer() -> Arc<TeraRenderer> {
    let mut templates = HashMap::new();
    templates.insert("welcome.html".to_string(), "<h1>Welcome {{ name }}</h1>".to_string());
    templates.insert("welcome.txt".to_string(), "Welcome {{ name }}".to_string());
    Arc::new(TeraRenderer::from_strings(templates).unwrap())
}

#[tokio::test]
async fn send_uses_default_from_and_html_body() {
    let transport = MemoryTransport::new();
    let mut mailer = Mailer::new(Arc::new(transport.clone()), renderer());
    mailer.always_from("a@x.com", Some("A"));

    mailer
        .send(Body::html("hello"), |m| {
            m.to("b@y.com");
        })
        .await
        .unwrap();

    let sent = transport.sent().await;
    assert_eq!(transport.attempts().await, 1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, Some(Mailbox::from(("a@x.com", "A"))));
    assert_eq!(sent[0].to, vec![Mailbox::from("b@y.com")]);
    assert_eq!(sent[0].html(), Some("hello"));
    assert_eq!(sent[0].plain(), None);
}

#[tokio::test]
async fn mail_driver_builds_from_config() {
    let config = MailConfig {
        driver: "mail".into(),
        from_address: Some("a@x.com".into()),
        from_name: Some("A".into()),
        ..Default::default()
    };

    assert_eq!(config.transport().unwrap(), TransportConfig::Mail);
    assert!(Mailer::from_config(&config, renderer()).is_ok());
}

#[tokio::test]
async fn smtp_config_without_host_fails_at_startup() {
    let config = MailConfig {
        driver: "smtp".into(),
        port: Some(25),
        ..Default::default()
    };

    let err = Mailer::from_config(&config, renderer()).err().unwrap();
    assert!(matches!(err, MailError::Config(m) if m == "missing host/port"));
}

#[tokio::test]
async fn keyed_view_renders_html_and_text_into_matching_parts() {
    let transport = MemoryTransport::new();
    let mut mailer = Mailer::new(Arc::new(transport.clone()), renderer());
    mailer.always_from("a@x.com", None);

    let view = View::try_from(json!({ "text": "welcome.txt", "html": "welcome.html" })).unwrap();
    mailer
        .send_view(view, &json!({ "name": "Ann" }), |m| {
            m.to("ann@example.com").subject("Welcome");
        })
        .await
        .unwrap();

    let sent = transport.sent().await;
    assert_eq!(sent[0].html(), Some("<h1>Welcome Ann</h1>"));
    assert_eq!(sent[0].plain(), Some("Welcome Ann"));
    assert_eq!(sent[0].subject, "Welcome");
}

#[tokio::test]
async fn missing_template_is_render_error() {
    let transport = MemoryTransport::new();
    let mut mailer = Mailer::new(Arc::new(transport.clone()), renderer());
    mailer.always_from("a@x.com", None);

    let err = mailer
        .send_view("goodbye.html", &json!({}), |m| {
            m.to("ann@example.com");
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MailError::Render { template, .. } if template == "goodbye.html"));
    assert_eq!(transport.attempts().await, 0);
}
