//! Shared HTTP plumbing.

use crate::error::{ClientError, HttpFailure};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default client timeout for collaborator calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds a client that gives up after `timeout`.
///
/// # Errors
///
/// Returns [`ClientError::Build`] if the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Build(e.to_string()))
}

/// Sends the request and rejects non-success statuses, keeping the body as message.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, HttpFailure> {
    let response = request
        .send()
        .await
        .map_err(|e| HttpFailure::from_reqwest(&e))?;

    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(HttpFailure::Status(status, body))
    }
}

/// Sends the request and decodes a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, HttpFailure> {
    let response = send(request).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                HttpFailure::Timeout
            } else {
                HttpFailure::Decode(e.to_string())
            }
        })
}

/// Joins a base URL and a path without doubling the slash.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// `base` with each entry of `segments` appended as one percent-encoded path segment.
///
/// Blank, `.` and `..` segments are refused, so a caller-supplied ID can never address
/// another resource.
pub(crate) fn resource(base: &str, segments: &[&str]) -> Result<Url, HttpFailure> {
    if let Some(bad) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
        return Err(HttpFailure::Url(format!("Invalid path segment: {bad:?}")));
    }

    let mut url = Url::parse(base).map_err(|e| HttpFailure::Url(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| HttpFailure::Url(format!("{base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_encodes_each_segment() {
        let url = resource("https://api.stripe.com/", &["v1", "payment_intents", "pi_1"]).unwrap();
        assert_eq!(url.as_str(), "https://api.stripe.com/v1/payment_intents/pi_1");

        let url = resource("http://localhost:1234", &["v1", "orders", "../refunds?x=1#y"]).unwrap();
        assert_eq!(url.path(), "/v1/orders/..%2Frefunds%3Fx=1%23y");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_resource_rejects_relative_segments() {
        for bad in ["..", ".", " "] {
            assert!(matches!(
                resource("http://localhost:1234", &["v1", "orders", bad]),
                Err(HttpFailure::Url(_))
            ));
        }
        assert!(matches!(resource("not a url", &["v1"]), Err(HttpFailure::Url(_))));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("https://api.stripe.com/", "/v1/payment_intents"), "https://api.stripe.com/v1/payment_intents");
        assert_eq!(join("http://localhost:1234", "v1/orders"), "http://localhost:1234/v1/orders");
    }
}
