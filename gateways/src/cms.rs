//! Region directory backed by the content service's GraphQL API.

use crate::error::ClientError;
use crate::http::{self, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use registrar_core::region::{RegionDirectory, RegionError, RegionPaymentInfo};
use registrar_core::{Currency, PaymentProvider};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const PAYMENT_INFO_QUERY: &str = r"query GetPaymentInfoQuery($webname: String!) {
  cms {
    regions(where: { webname: $webname }, limit: 1) {
      items {
        paymentProvider
        currency
      }
    }
  }
}";

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Data {
    cms: Cms,
}

#[derive(Debug, Deserialize)]
struct Cms {
    regions: Regions,
}

#[derive(Debug, Deserialize)]
struct Regions {
    items: Vec<RegionItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionItem {
    payment_provider: Option<String>,
    currency: Option<String>,
}

impl RegionItem {
    fn into_info(self) -> Result<RegionPaymentInfo, RegionError> {
        let payment_provider = non_blank(self.payment_provider)
            .map(|tag| {
                tag.parse::<PaymentProvider>()
                    .map_err(|e| RegionError::InvalidResponse(e.to_string()))
            })
            .transpose()?;

        Ok(RegionPaymentInfo {
            payment_provider,
            currency: non_blank(self.currency).map(|code| Currency::new(&code)),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Looks up region payment settings by webname.
#[derive(Debug, Clone)]
pub struct CmsRegionDirectory {
    client: Client,
    endpoint: String,
}

impl CmsRegionDirectory {
    /// Directory querying `endpoint` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Directory with an explicit client timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the HTTP client cannot be built.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self { client: http::build_client(timeout)?, endpoint: endpoint.into() })
    }
}

#[async_trait]
impl RegionDirectory for CmsRegionDirectory {
    async fn payment_info(&self, webname: &str) -> Result<RegionPaymentInfo, RegionError> {
        let request = GraphQlRequest {
            query: PAYMENT_INFO_QUERY,
            variables: json!({ "webname": webname }),
        };

        let response: GraphQlResponse =
            http::send_json(self.client.post(&self.endpoint).json(&request)).await?;

        if let Some(error) = response.errors.first() {
            return Err(RegionError::InvalidResponse(error.message.clone()));
        }

        let item = response
            .data
            .and_then(|data| data.cms.regions.items.into_iter().next())
            .ok_or_else(|| RegionError::NotFound(webname.to_string()))?;

        item.into_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_fall_back() {
        let info = RegionItem { payment_provider: Some(String::new()), currency: Some(" ".to_string()) }
            .into_info();
        assert_eq!(info, Ok(RegionPaymentInfo::default()));
    }

    #[test]
    fn test_unknown_provider_is_invalid() {
        let info = RegionItem { payment_provider: Some("paypal".to_string()), currency: None }.into_info();
        assert!(matches!(info, Err(RegionError::InvalidResponse(_))));
    }
}
