// src/clients/finlife.rs

//! Client for the FSS "finlife" product comparison feeds.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{UpstreamError, check_status};
use crate::config::ProviderConfig;
use crate::models::product::ProductKind;

/// Raw records of one feed page, parsed lazily per record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedPage {
    #[serde(rename = "baseList", default)]
    pub base_list: Vec<Value>,
    #[serde(rename = "optionList", default)]
    pub option_list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<FeedPage>,
}

#[derive(Clone)]
pub struct FinlifeClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FinlifeClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.finlife_base_url.trim_end_matches('/').to_string(),
            api_key: config.finlife_api_key.clone(),
        }
    }

    /// Feed endpoint for a product type.
    pub fn endpoint(kind: ProductKind) -> Option<&'static str> {
        match kind {
            ProductKind::Deposit => Some("depositProductsSearch.json"),
            ProductKind::Saving => Some("savingProductsSearch.json"),
            ProductKind::Annuity => Some("annuitySavingProductsSearch.json"),
            ProductKind::Mortgage => Some("mortgageLoanProductsSearch.json"),
            ProductKind::Rent => Some("rentHouseLoanProductsSearch.json"),
            ProductKind::Credit => Some("creditLoanProductsSearch.json"),
            ProductKind::Etf => None,
        }
    }

    /// Financial sector code: insurers for annuities, banks otherwise.
    pub fn financial_group(kind: ProductKind) -> &'static str {
        if kind == ProductKind::Annuity {
            "050000"
        } else {
            "020000"
        }
    }

    pub async fn fetch(&self, kind: ProductKind) -> Result<FeedPage, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("FINLIFE_API_KEY"))?;
        let endpoint = Self::endpoint(kind)
            .ok_or_else(|| UpstreamError::Decode(format!("no feed for {}", kind.as_str())))?;

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("auth", api_key),
                ("topFinGrpNo", Self::financial_group(kind)),
                ("pageNo", "1"),
            ])
            .send()
            .await?;
        let envelope: Envelope = check_status(response).await?.json().await?;

        envelope
            .result
            .ok_or_else(|| UpstreamError::Decode("response has no 'result' key".to_string()))
    }
}
