//! Registration orchestrator tests.
//!
//! Drive `Registrar::register_for_event` through the in-memory doubles and check what
//! was persisted, charged and notified.
//!
//! Run with: `cargo test -p registrar-runtime --test registration_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use chrono::Duration;
use common::{Harness, REGIONAL};
use registrar_core::admission::Audience;
use registrar_core::environment::Clock;
use registrar_core::gateway::GatewayError;
use registrar_core::{Currency, Discount, EventId, Money, PaymentProvider, RegistrationError};
use registrar_testing::fixtures::{self, EventBuilder};
use registrar_testing::{RecordingNotifier, StaticRegionDirectory};

#[tokio::test]
async fn test_paid_registration_returns_client_secret() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;

    let mut request = fixtures::request(event.id, vec![fixtures::adult("Ada"), fixtures::adult("Alan")]);
    request.promo_code = None;
    let reference = h.registrar.register_for_event(request).await.unwrap();

    assert_eq!(reference.as_deref(), Some("pi_mock_1_secret"));

    let created = h.stripe.created().await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].unit_price, Money::from_cents(2000));
    assert_eq!(created[0].quantity, 2);
    assert_eq!(created[0].currency, Currency::usd());

    let payments = h.store.payments().await;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].intent_id, "pi_mock_1");
    assert!(!payments[0].complete);

    let tickets = h.store.tickets().await;
    assert_eq!(tickets.len(), 2);
    assert!(tickets.iter().all(|t| t.payment_id == Some(payments[0].id)));

    // Paid tickets are notified on finalization, not at issuance
    assert!(h.notifier.waivers().await.is_empty());
}

#[tokio::test]
async fn test_payment_row_written_before_tickets() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;

    let mut request = fixtures::request(event.id, vec![fixtures::minor("Ada")]);
    request.guardian = Some(fixtures::guardian());
    h.registrar.register_for_event(request).await.unwrap();

    let journal = h.store.journal().await;
    assert!(matches!(journal.first(), Some(registrar_testing::store::Write::Payment(_))));
    assert_eq!(h.store.payments().await.len(), 1);
}

#[tokio::test]
async fn test_free_registration_notifies_immediately() {
    let event = EventBuilder::new().free().build();
    let h = Harness::new().with_event(&event).await;

    let reference = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada"), fixtures::adult("Alan")]))
        .await
        .unwrap();

    assert_eq!(reference, None);
    assert!(h.store.payments().await.is_empty());
    assert!(h.stripe.created().await.is_empty());
    assert_eq!(h.regions.lookups(), 0);
    assert_eq!(h.notifier.waivers().await.len(), 2);
    assert_eq!(h.notifier.webhooks().await.len(), 2);
}

#[tokio::test]
async fn test_notification_failure_does_not_abort_other_tickets() {
    let event = EventBuilder::new().free().build();
    let h = Harness::with_notifier(RecordingNotifier::new().fail_for("Ada"))
        .with_event(&event)
        .await;

    let result = h
        .registrar
        .register_for_event(fixtures::request(
            event.id,
            vec![fixtures::adult("Ada"), fixtures::adult("Alan")],
        ))
        .await;

    assert!(result.is_ok());
    assert_eq!(h.store.tickets().await.len(), 2);
    let waivers = h.notifier.waivers().await;
    assert_eq!(waivers.len(), 1);
    assert_eq!(waivers[0].ticket.first_name, "Alan");
}

#[tokio::test]
async fn test_capacity_ten_with_nine_sold() {
    let event = EventBuilder::new().capacity(10).free().build();
    let h = Harness::new().with_event(&event).await;

    let nine = (0..9).map(|i| fixtures::adult(&format!("P{i}"))).collect();
    h.registrar.register_for_event(fixtures::request(event.id, nine)).await.unwrap();

    let err = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada"), fixtures::adult("Alan")]))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::CapacityExceeded { remaining: 1, requested: 2 }));
    assert_eq!(err.to_string(), "Sorry, only 1 tickets are still available for this event.");

    h.registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada")]))
        .await
        .unwrap();
    assert_eq!(h.store.tickets().await.len(), 10);
}

#[tokio::test]
async fn test_concurrent_registrations_never_oversell() {
    let event = EventBuilder::new().capacity(5).free().build();
    let h = Harness::new().with_event(&event).await;

    let attempts = (0..8).map(|i| {
        let registrar = h.registrar.clone();
        let request = fixtures::request(event.id, vec![fixtures::adult(&format!("P{i}"))]);
        async move { registrar.register_for_event(request).await }
    });
    let results = futures::future::join_all(attempts).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 5);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(
        e,
        RegistrationError::CapacityExceeded { .. }
    )));
    assert_eq!(h.store.tickets().await.len(), 5);
}

#[tokio::test]
async fn test_minor_without_guardian() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;

    let err = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::ticket("Ada", 15)]))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::GuardianRequired));
    assert!(h.stripe.created().await.is_empty());
    assert!(h.store.tickets().await.is_empty());
}

#[tokio::test]
async fn test_guardian_linked_only_to_minors() {
    let event = EventBuilder::new().free().build();
    let h = Harness::new().with_event(&event).await;

    let mut request = fixtures::request(event.id, vec![fixtures::minor("Ada"), fixtures::adult("Alan")]);
    request.guardian = Some(fixtures::guardian());
    h.registrar.register_for_event(request).await.unwrap();

    let people = h.store.people().await;
    assert_eq!(people.len(), 1);
    let tickets = h.store.tickets().await;
    assert_eq!(tickets[0].guardian_id, Some(people[0].id));
    assert_eq!(tickets[1].guardian_id, None);

    // The minor's waiver goes to the guardian
    let waivers = h.notifier.waivers().await;
    assert_eq!(waivers[0].waiver_contact().email.as_deref(), Some("grace@example.com"));
}

#[tokio::test]
async fn test_validation_collects_messages() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;

    let mut bad = fixtures::ticket("Ada", 30);
    bad.contact.email = Some("not-an-email".to_string());
    let err = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![bad]))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "You must be under 25 to participate. not-an-email is not a valid email."
    );
}

#[tokio::test]
async fn test_promo_code_discounts_intent() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    h.store
        .insert_promo(fixtures::promo(event.id, "SAVE10", Discount::Percent(1000), Some(5)))
        .await;

    let mut request = fixtures::request(event.id, vec![fixtures::adult("Ada")]);
    request.promo_code = Some("  save10 ".to_string());
    h.registrar.register_for_event(request).await.unwrap();

    let created = h.stripe.created().await;
    assert_eq!(created[0].unit_price, Money::from_cents(1800));
    assert!(h.store.tickets().await[0].promo_code_id.is_some());
}

#[tokio::test]
async fn test_free_promo_skips_payment() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    h.store
        .insert_promo(fixtures::promo(event.id, "FREE", Discount::Percent(10_000), None))
        .await;

    let mut request = fixtures::request(event.id, vec![fixtures::adult("Ada")]);
    request.promo_code = Some("FREE".to_string());
    let reference = h.registrar.register_for_event(request).await.unwrap();

    assert_eq!(reference, None);
    assert!(h.store.payments().await.is_empty());
    assert_eq!(h.notifier.webhooks().await.len(), 1);
}

#[tokio::test]
async fn test_promo_with_too_few_uses_left_is_rejected_at_issuance() {
    let event = EventBuilder::new().free().build();
    let h = Harness::new().with_event(&event).await;
    h.store
        .insert_promo(fixtures::promo(event.id, "ONE", Discount::Percent(1000), Some(1)))
        .await;

    let mut request = fixtures::request(event.id, vec![fixtures::adult("Ada"), fixtures::adult("Alan")]);
    request.promo_code = Some("ONE".to_string());
    let err = h.registrar.register_for_event(request).await.unwrap_err();

    assert!(matches!(err, RegistrationError::PromoExhausted { .. }));
    assert!(h.store.tickets().await.is_empty());
}

#[tokio::test]
async fn test_exhausted_promo_is_ignored() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    h.store
        .insert_promo(fixtures::promo(event.id, "ONCE", Discount::Percent(5000), Some(1)))
        .await;

    for name in ["Ada", "Alan"] {
        let mut request = fixtures::request(event.id, vec![fixtures::adult(name)]);
        request.promo_code = Some("ONCE".to_string());
        h.registrar.register_for_event(request).await.unwrap();
    }

    let prices: Vec<Money> = h.stripe.created().await.iter().map(|r| r.unit_price).collect();
    assert_eq!(prices, vec![Money::from_cents(1000), Money::from_cents(2000)]);
}

#[tokio::test]
async fn test_promo_required_without_code() {
    let event = EventBuilder::new().free().requires_promo_code().build();
    let h = Harness::new().with_event(&event).await;

    let err = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada")]))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::PromoRequired));
    assert_eq!(err.to_string(), "A code is required to register for this event.");
}

#[tokio::test]
async fn test_regional_provider_and_currency() {
    let event = EventBuilder::new().region(REGIONAL).build();
    let h = Harness::new().with_event(&event).await;

    let err = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada")]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::WrongProvider { expected: PaymentProvider::Razorpay, requested: PaymentProvider::Stripe }
    ));

    let mut request = fixtures::request(event.id, vec![fixtures::adult("Ada")]);
    request.provider = PaymentProvider::Razorpay;
    let reference = h.registrar.register_for_event(request).await.unwrap();

    assert_eq!(reference.as_deref(), Some("order_mock_1"));
    assert_eq!(h.razorpay.created().await[0].currency, Currency::inr());
    assert_eq!(h.store.payments().await[0].provider, PaymentProvider::Razorpay);
}

#[tokio::test]
async fn test_gateway_timeout_persists_nothing() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    h.stripe.fail_with(Some(GatewayError::Timeout)).await;

    let err = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada")]))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::Gateway(GatewayError::Timeout)));
    assert!(h.store.payments().await.is_empty());
    assert!(h.store.tickets().await.is_empty());
}

#[tokio::test]
async fn test_region_outage_fails_paid_registration() {
    let event = EventBuilder::new().build();
    let h = Harness::with_parts(StaticRegionDirectory::unavailable(), RecordingNotifier::new())
        .with_event(&event)
        .await;

    let err = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada")]))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Region(_)));
}

#[tokio::test]
async fn test_closed_and_unknown_events() {
    let closed = EventBuilder::new().closed().build();
    let no_venue = EventBuilder::new().without_venue().build();
    let h = Harness::new().with_event(&closed).await.with_event(&no_venue).await;

    for event_id in [closed.id, no_venue.id] {
        let err = h
            .registrar
            .register_for_event(fixtures::request(event_id, vec![fixtures::adult("Ada")]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Registrations for this event are not open.");
    }

    let err = h
        .registrar
        .register_for_event(fixtures::request(EventId::new(), vec![fixtures::adult("Ada")]))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::EventNotFound(_)));
}

#[tokio::test]
async fn test_past_cutoff_is_closed() {
    let h = Harness::new();
    let event = EventBuilder::new()
        .registration_cutoff(h.clock.now() - Duration::hours(1))
        .build();
    let h = h.with_event(&event).await;

    let err = h
        .registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada")]))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::RegistrationClosed));
}

#[tokio::test]
async fn test_early_bird_price_until_cutoff() {
    let h = Harness::new();
    let cutoff = h.clock.now() + Duration::days(1);
    let event = EventBuilder::new().early_bird(Money::from_cents(1200), cutoff).build();
    let h = h.with_event(&event).await;

    h.registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Ada")]))
        .await
        .unwrap();
    h.clock.set(cutoff);
    h.registrar
        .register_for_event(fixtures::request(event.id, vec![fixtures::adult("Alan")]))
        .await
        .unwrap();

    let prices: Vec<Money> = h.stripe.created().await.iter().map(|r| r.unit_price).collect();
    assert_eq!(prices, vec![Money::from_cents(1200), Money::from_cents(2000)]);
}

#[tokio::test]
async fn test_check_promo_code_preview() {
    let event = EventBuilder::new().build();
    let h = Harness::new().with_event(&event).await;
    h.store
        .insert_promo(fixtures::promo(event.id, "save10", Discount::Percent(1000), Some(3)))
        .await;

    let check = h.registrar.check_promo_code(event.id, "SAVE10").await.unwrap();
    assert!(check.valid);
    assert_eq!(check.display_discount_name.as_deref(), Some("SAVE10"));
    assert_eq!(check.effective_price, Some(Money::from_cents(1800)));
    assert_eq!(check.remaining_uses, Some(3));

    let unknown = h.registrar.check_promo_code(event.id, "NOPE").await.unwrap();
    assert!(!unknown.valid);
    assert_eq!(unknown.effective_price, Some(Money::from_cents(2000)));

    // Previews never persist anything
    assert!(h.store.tickets().await.is_empty());
}

#[tokio::test]
async fn test_remaining_tickets_by_audience() {
    let event = EventBuilder::new().capacity(40).free().build();
    let h = Harness::new().with_event(&event).await;
    let three = (0..3).map(|i| fixtures::adult(&format!("P{i}"))).collect();
    h.registrar.register_for_event(fixtures::request(event.id, three)).await.unwrap();

    assert_eq!(h.registrar.remaining_tickets(event.id, Audience::Public).await.unwrap(), Some(35));
    assert_eq!(h.registrar.remaining_tickets(event.id, Audience::Staff).await.unwrap(), Some(37));

    let uncapped = EventBuilder::new().without_venue().build();
    let h = h.with_event(&uncapped).await;
    assert_eq!(h.registrar.remaining_tickets(uncapped.id, Audience::Public).await.unwrap(), None);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_sequential_registrations_never_oversell(
            capacity in 1u32..20,
            sizes in proptest::collection::vec(1usize..5, 1..12),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let issued = runtime.block_on(async {
                let event = EventBuilder::new().capacity(capacity).free().build();
                let h = Harness::new().with_event(&event).await;
                for (batch, size) in sizes.iter().enumerate() {
                    let tickets = (0..*size).map(|i| fixtures::adult(&format!("P{batch}x{i}"))).collect();
                    let _ = h.registrar.register_for_event(fixtures::request(event.id, tickets)).await;
                }
                h.store.tickets().await.len()
            });
            prop_assert!(issued <= capacity as usize);
        }
    }
}
