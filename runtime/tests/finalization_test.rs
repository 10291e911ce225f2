//! Payment finalization and withdrawal tests.
//!
//! Run with: `cargo test -p registrar-runtime --test finalization_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use common::{Harness, REGIONAL};
use registrar_core::gateway::GatewayError;
use registrar_core::{PaymentProvider, RegistrationError};
use registrar_testing::fixtures::{self, EventBuilder};

async fn paid_registration(h: &Harness, event_id: registrar_core::EventId) -> String {
    let mut request = fixtures::request(event_id, vec![fixtures::minor("Ada"), fixtures::adult("Alan")]);
    request.guardian = Some(fixtures::guardian());
    h.registrar.register_for_event(request).await.unwrap();
    h.store.payments().await[0].intent_id.clone()
}

#[tokio::test]
async fn test_finalize_before_payment_is_incomplete() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    let intent = paid_registration(&h, event.id).await;

    let err = h
        .registrar
        .finalize_payment(&intent, PaymentProvider::Stripe)
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::PaymentIncomplete));
    assert_eq!(err.to_string(), "Payment has not yet completed. Please contact support.");
    assert!(!h.store.payments().await[0].complete);
    assert!(h.notifier.waivers().await.is_empty());
}

#[tokio::test]
async fn test_finalize_marks_complete_and_notifies() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    let intent = paid_registration(&h, event.id).await;
    h.stripe.mark_paid(&intent).await;

    let ticket_ids = h.registrar.finalize_payment(&intent, PaymentProvider::Stripe).await.unwrap();

    assert_eq!(ticket_ids.len(), 2);
    assert!(h.store.payments().await[0].complete);

    let waivers = h.notifier.waivers().await;
    assert_eq!(waivers.len(), 2);
    // Guardian gets the minor's waiver, the adult gets their own
    assert_eq!(waivers[0].waiver_contact().email.as_deref(), Some("grace@example.com"));
    assert_eq!(waivers[1].waiver_contact().email.as_deref(), Some("alan@example.com"));

    let webhooks = h.notifier.webhooks().await;
    assert_eq!(webhooks[0].webhook_title(), "New Spring Hack Registration");
    assert_eq!(webhooks[0].webhook_message(), "Ada L registered for Spring Hack");
}

#[tokio::test]
async fn test_finalize_twice_resends_notices() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    let intent = paid_registration(&h, event.id).await;
    h.stripe.mark_paid(&intent).await;

    h.registrar.finalize_payment(&intent, PaymentProvider::Stripe).await.unwrap();
    let again = h.registrar.finalize_payment(&intent, PaymentProvider::Stripe).await.unwrap();

    assert_eq!(again.len(), 2);
    assert_eq!(h.notifier.waivers().await.len(), 4);
}

#[tokio::test]
async fn test_finalize_unknown_intent_is_empty() {
    let h = Harness::new();
    h.stripe.mark_paid("pi_unknown").await;

    let ticket_ids = h.registrar.finalize_payment("pi_unknown", PaymentProvider::Stripe).await.unwrap();

    assert!(ticket_ids.is_empty());
    assert!(h.notifier.waivers().await.is_empty());
}

#[tokio::test]
async fn test_finalize_scoped_to_provider() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    let intent = paid_registration(&h, event.id).await;
    h.razorpay.mark_paid(&intent).await;

    let ticket_ids = h.registrar.finalize_payment(&intent, PaymentProvider::Razorpay).await.unwrap();

    assert!(ticket_ids.is_empty());
    assert!(!h.store.payments().await[0].complete);
}

#[tokio::test]
async fn test_gateway_error_surfaces_on_finalize() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    let intent = paid_registration(&h, event.id).await;
    h.stripe
        .fail_with(Some(GatewayError::Api { status: 503, message: "unavailable".to_string() }))
        .await;

    let err = h
        .registrar
        .finalize_payment(&intent, PaymentProvider::Stripe)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Gateway(GatewayError::Api { status: 503, .. })));
}

#[tokio::test]
async fn test_withdraw_releases_seats() {
    let event = EventBuilder::new().capacity(2).build();
    let h = Harness::new().with_event(&event).await;
    let intent = paid_registration(&h, event.id).await;

    let full = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Grace")]))
        .await
        .unwrap_err();
    assert!(matches!(full, RegistrationError::CapacityExceeded { remaining: 0, .. }));

    assert!(h.registrar.withdraw_failed_payment(&intent, PaymentProvider::Stripe).await.unwrap());
    assert!(h.store.tickets().await.is_empty());

    h.registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Grace")]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_withdraw_twice_is_harmless() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    let intent = paid_registration(&h, event.id).await;

    assert!(h.registrar.withdraw_failed_payment(&intent, PaymentProvider::Stripe).await.unwrap());
    assert!(h.registrar.withdraw_failed_payment(&intent, PaymentProvider::Stripe).await.unwrap());
    assert!(h.store.tickets().await.is_empty());
}

#[tokio::test]
async fn test_withdraw_paid_intent_refused() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    let intent = paid_registration(&h, event.id).await;
    h.stripe.mark_paid(&intent).await;

    let err = h
        .registrar
        .withdraw_failed_payment(&intent, PaymentProvider::Stripe)
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::AlreadyPaid));
    assert_eq!(h.store.tickets().await.len(), 2);
}

#[tokio::test]
async fn test_regional_finalize_uses_regional_gateway() {
    let event = EventBuilder::new().region(REGIONAL).build();
    let h = Harness::new().with_event(&event).await;

    let mut request = fixtures::request(event.id, vec![fixtures::adult("Ada")]);
    request.provider = PaymentProvider::Razorpay;
    let order = h.registrar.register_for_event(request).await.unwrap().unwrap();
    h.razorpay.mark_paid(&order).await;

    let ticket_ids = h.registrar.finalize_payment(&order, PaymentProvider::Razorpay).await.unwrap();

    assert_eq!(ticket_ids.len(), 1);
    assert_eq!(h.razorpay.status_checks().await, 1);
    assert_eq!(h.stripe.status_checks().await, 0);
}
