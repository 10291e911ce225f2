//! Region directory and notifier adapters against a mock HTTP server.
//!
//! Run with: `cargo test -p registrar-gateways --test collaborators_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use registrar_core::notify::{
    NotifyError, ParticipantMessage, ScholarshipMessenger, StaffReport, TicketNotice,
    TicketNotifier,
};
use registrar_core::region::{RegionDirectory, RegionError};
use registrar_core::{Contact, Currency, PaymentProvider, Ticket, TicketId, TicketType, Utc};
use registrar_gateways::{CmsRegionDirectory, HttpNotifier, NotifierEndpoints};
use registrar_testing::fixtures::EventBuilder;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn regions_payload(items: serde_json::Value) -> serde_json::Value {
    json!({ "data": { "cms": { "regions": { "items": items } } } })
}

#[tokio::test]
async fn test_region_payment_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "webname": "mumbai" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(regions_payload(json!([
            { "paymentProvider": "razorpay", "currency": "INR" }
        ]))))
        .mount(&server)
        .await;

    let directory = CmsRegionDirectory::new(format!("{}/graphql", server.uri())).unwrap();
    let info = directory.payment_info("mumbai").await.unwrap();

    assert_eq!(info.payment_provider, Some(PaymentProvider::Razorpay));
    assert_eq!(info.currency, Some(Currency::inr()));
}

#[tokio::test]
async fn test_region_nulls_use_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(regions_payload(json!([
            { "paymentProvider": null, "currency": null }
        ]))))
        .mount(&server)
        .await;

    let directory = CmsRegionDirectory::new(server.uri()).unwrap();
    let info = directory.payment_info("seattle").await.unwrap();

    assert_eq!(info.payment_provider, None);
    assert_eq!(info.currency, None);
}

#[tokio::test]
async fn test_region_missing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(regions_payload(json!([]))))
        .mount(&server)
        .await;

    let directory = CmsRegionDirectory::new(server.uri()).unwrap();
    let err = directory.payment_info("atlantis").await.unwrap_err();
    assert_eq!(err, RegionError::NotFound("atlantis".to_string()));
}

#[tokio::test]
async fn test_region_service_down() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let directory = CmsRegionDirectory::new(server.uri()).unwrap();
    assert!(matches!(
        directory.payment_info("seattle").await,
        Err(RegionError::Unavailable(_))
    ));
}

fn notice() -> TicketNotice {
    let event = EventBuilder::new().build();
    TicketNotice {
        ticket: Ticket {
            id: TicketId::new(),
            event_id: event.id,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            age: Some(19),
            contact: Contact { email: Some("ada@example.com".to_string()), ..Contact::default() },
            ticket_type: TicketType::Student,
            guardian_id: None,
            payment_id: None,
            promo_code_id: None,
            created_at: Utc::now(),
        },
        event,
        guardian: None,
    }
}

#[tokio::test]
async fn test_ticket_notices_posted() {
    let server = MockServer::start().await;
    let notice = notice();
    Mock::given(method("POST"))
        .and(path("/waivers"))
        .and(body_partial_json(json!({ "firstName": "Ada", "adult": true })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webhooks"))
        .and(body_json(json!({
            "eventId": notice.event.id.to_string(),
            "title": "New Spring Hack Registration",
            "message": "Ada L registered for Spring Hack"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = HttpNotifier::new(NotifierEndpoints {
        waiver_url: Some(format!("{}/waivers", server.uri())),
        webhook_url: Some(format!("{}/webhooks", server.uri())),
        ..NotifierEndpoints::default()
    })
    .unwrap();

    notifier.send_waiver_reminder(&notice).await.unwrap();
    notifier.send_ticket_webhook(&notice).await.unwrap();
}

#[tokio::test]
async fn test_unconfigured_endpoints_skip() {
    let notifier = HttpNotifier::new(NotifierEndpoints::default()).unwrap();
    let notice = notice();

    assert!(notifier.send_waiver_reminder(&notice).await.is_ok());
    assert!(notifier.send_ticket_webhook(&notice).await.is_ok());
}

#[tokio::test]
async fn test_participant_message_prefers_whatsapp() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_json(json!({
            "phone": "whatsapp:+919800000000",
            "email": "ada@example.com",
            "subject": "Scholarship Request",
            "body": "Hello"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = HttpNotifier::new(NotifierEndpoints {
        message_url: Some(format!("{}/messages", server.uri())),
        ..NotifierEndpoints::default()
    })
    .unwrap();
    let contact = Contact {
        email: Some("ada@example.com".to_string()),
        phone: Some("+12065550100".to_string()),
        whatsapp: Some("+919800000000".to_string()),
    };
    let message = ParticipantMessage { subject: "Scholarship Request".to_string(), body: "Hello".to_string() };

    notifier.message_participant(&contact, &message).await.unwrap();
}

#[tokio::test]
async fn test_participant_without_contact() {
    let notifier = HttpNotifier::new(NotifierEndpoints::default()).unwrap();
    let message = ParticipantMessage { subject: String::new(), body: String::new() };

    let err = notifier.message_participant(&Contact::default(), &message).await.unwrap_err();
    assert!(matches!(err, NotifyError::NoRecipient(_)));
}

#[tokio::test]
async fn test_staff_relay_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/staff"))
        .respond_with(ResponseTemplate::new(500).set_body_string("inbox full"))
        .mount(&server)
        .await;

    let notifier = HttpNotifier::new(NotifierEndpoints {
        staff_url: Some(format!("{}/staff", server.uri())),
        ..NotifierEndpoints::default()
    })
    .unwrap();
    let report = StaffReport {
        reason: "OTHER".to_string(),
        error: "Could not automatically handle this scholarship type.".to_string(),
        request: json!({}),
    };

    let err = notifier.forward_to_staff(&report).await.unwrap_err();
    assert!(matches!(err, NotifyError::Delivery(message) if message.contains("inbox full")));
}
