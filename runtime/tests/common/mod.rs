//! Shared harness for runtime integration tests.

#![allow(dead_code)]

use registrar_core::gateway::GatewayRegistry;
use registrar_core::region::RegionPaymentInfo;
use registrar_core::{Event, PaymentProvider};
use registrar_runtime::{Registrar, RegistrarEnvironment};
use registrar_testing::{
    FixedClock, InMemoryStore, MockGateway, RecordingNotifier, StaticRegionDirectory, test_clock,
};
use std::sync::Arc;

/// Region whose events are paid through the regional gateway
pub const REGIONAL: &str = "mumbai";

/// Orchestrator wired to in-memory doubles.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub stripe: Arc<MockGateway>,
    pub razorpay: Arc<MockGateway>,
    pub regions: Arc<StaticRegionDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: FixedClock,
    pub registrar: Registrar,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(default_regions(), RecordingNotifier::new())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self::with_parts(default_regions(), notifier)
    }

    pub fn with_parts(regions: StaticRegionDirectory, notifier: RecordingNotifier) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let stripe = MockGateway::shared(PaymentProvider::Stripe);
        let razorpay = MockGateway::shared(PaymentProvider::Razorpay);
        let regions = Arc::new(regions);
        let notifier = Arc::new(notifier);
        let clock = test_clock();

        let registrar = Registrar::new(RegistrarEnvironment {
            store: store.clone(),
            gateways: GatewayRegistry::new().with(stripe.clone()).with(razorpay.clone()),
            regions: regions.clone(),
            notifier: notifier.clone(),
            clock: Arc::new(clock.clone()),
        });

        Self { store, stripe, razorpay, regions, notifier, clock, registrar }
    }

    pub async fn with_event(self, event: &Event) -> Self {
        self.store.insert_event(event.clone()).await;
        self
    }
}

fn default_regions() -> StaticRegionDirectory {
    StaticRegionDirectory::new().with_region(
        REGIONAL,
        RegionPaymentInfo { payment_provider: Some(PaymentProvider::Razorpay), currency: None },
    )
}
