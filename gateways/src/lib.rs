//! # Registrar Gateways
//!
//! HTTP adapters for the collaborators the registration engine talks to:
//!
//! - [`StripeGateway`]: card payments through payment intents
//! - [`RazorpayGateway`]: regional payments through orders
//! - [`CmsRegionDirectory`]: region payment settings from the content service
//! - [`HttpNotifier`]: waiver reminders, ticket webhooks and scholarship messages
//!
//! Every adapter uses a `reqwest` client with a bounded timeout. A timeout surfaces as
//! [`GatewayError::Timeout`](registrar_core::gateway::GatewayError::Timeout); nothing
//! is retried.
//!
//! ## Example
//!
//! ```no_run
//! use registrar_core::gateway::GatewayRegistry;
//! use registrar_gateways::{StripeConfig, StripeGateway};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stripe = StripeGateway::new(StripeConfig::new("sk_test_123"))?;
//! let gateways = GatewayRegistry::new().with(Arc::new(stripe));
//! # Ok(())
//! # }
//! ```

pub mod cms;
pub mod error;
pub mod http;
pub mod notify;
pub mod razorpay;
pub mod stripe;

pub use cms::CmsRegionDirectory;
pub use error::ClientError;
pub use notify::{HttpNotifier, NotifierEndpoints};
pub use razorpay::{RazorpayConfig, RazorpayGateway};
pub use stripe::{StripeConfig, StripeGateway};
