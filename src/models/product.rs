// src/models/product.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// Financial product categories.
/// Stored as lowercase text in `products.product_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ProductKind {
    Deposit,
    Saving,
    Annuity,
    Mortgage,
    Rent,
    Credit,
    Etf,
}

impl ProductKind {
    /// Types ingested from the product feeds, in ingestion order.
    pub const FEEDS: [ProductKind; 6] = [
        ProductKind::Deposit,
        ProductKind::Saving,
        ProductKind::Annuity,
        ProductKind::Mortgage,
        ProductKind::Rent,
        ProductKind::Credit,
    ];

    pub const LOANS: [ProductKind; 3] = [ProductKind::Mortgage, ProductKind::Rent, ProductKind::Credit];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Deposit => "deposit",
            ProductKind::Saving => "saving",
            ProductKind::Annuity => "annuity",
            ProductKind::Mortgage => "mortgage",
            ProductKind::Rent => "rent",
            ProductKind::Credit => "credit",
            ProductKind::Etf => "etf",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "deposit" => Some(ProductKind::Deposit),
            "saving" => Some(ProductKind::Saving),
            "annuity" => Some(ProductKind::Annuity),
            "mortgage" => Some(ProductKind::Mortgage),
            "rent" => Some(ProductKind::Rent),
            "credit" => Some(ProductKind::Credit),
            "etf" => Some(ProductKind::Etf),
            _ => None,
        }
    }

    pub fn is_loan(self) -> bool {
        Self::LOANS.contains(&self)
    }

    /// Display name shown to users.
    pub fn label(self) -> &'static str {
        match self {
            ProductKind::Deposit => "정기예금",
            ProductKind::Saving => "적금",
            ProductKind::Annuity => "연금저축",
            ProductKind::Mortgage => "주택담보대출",
            ProductKind::Rent => "전세자금대출",
            ProductKind::Credit => "개인신용대출",
            ProductKind::Etf => "ETF/주식",
        }
    }
}

/// Represents the 'products' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,

    /// External product code, unique across the catalog.
    pub code: String,

    /// Issuing bank or company.
    pub company: String,

    pub name: String,
    pub etc_note: Option<String>,
    pub join_deny: Option<i64>,
    pub join_member: Option<String>,
    pub join_way: Option<String>,
    pub special_condition: Option<String>,
    pub product_type: ProductKind,

    /// Interest after maturity (deposit and saving only).
    pub maturity_interest: Option<String>,
    pub max_limit: Option<i64>,
}

/// Represents the 'product_options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: i64,
    pub product_id: i64,
    pub code: String,

    /// Rate-type label reported by the provider.
    pub rate_type: String,

    /// Base rate, minimum lending rate, payout amount or 1y return.
    /// `-1.0` means unknown.
    pub rate1: f64,

    /// Preferential rate, maximum lending rate or dividend yield.
    /// `-1.0` means unknown.
    pub rate2: f64,

    /// Term in months.
    pub term: Option<i64>,

    /// Type-specific metadata stored as a JSON object.
    pub extras: Json<serde_json::Value>,
}

/// A product together with its options, as served by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub options: Vec<ProductOption>,
}

/// Product detail including the viewer's relation to it.
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub is_liked: bool,
    pub is_joined: bool,
}

/// Query parameters for listing products.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    /// 'top_rate', 'dividend' or 'popular'.
    pub sort: Option<String>,

    /// A product type, or 'loan' for every loan type.
    #[serde(rename = "type")]
    pub product_type: Option<String>,

    pub bank: Option<String>,

    /// Term in months, kept as text so malformed values can be ignored.
    pub term: Option<String>,
}

/// Per-type row count for the status endpoint.
#[derive(Debug, Serialize, FromRow)]
pub struct TypeCount {
    pub product_type: ProductKind,
    pub count: i64,
}
