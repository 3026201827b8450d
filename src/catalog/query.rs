// src/catalog/query.rs

//! Filtering and ranking of the product catalog.
//!
//! A [`CatalogQuery`] is planned from the request parameters first and then
//! rendered into a single SQL statement, so the plan can be tested without
//! a database.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::product::{Product, ProductKind, ProductListParams, ProductOption, ProductResponse, TypeCount};

const PRODUCT_COLUMNS: &str = "p.id, p.code, p.company, p.name, p.etc_note, p.join_deny, p.join_member, \
     p.join_way, p.special_condition, p.product_type, p.maturity_interest, p.max_limit";

/// Option column an aggregate is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateColumn {
    Rate1,
    Rate2,
}

impl RateColumn {
    fn aggregate(self) -> &'static str {
        match self {
            RateColumn::Rate1 => "r.rate1_max",
            RateColumn::Rate2 => "r.rate2_max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    /// Best rate first. Unknown rates always come last.
    Rate { column: RateColumn, ascending: bool },
    /// Most joined first.
    Popular,
}

/// Which product types to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFilter {
    Any,
    Only(Vec<ProductKind>),
    /// The requested type does not exist, nothing matches.
    Unmatched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub types: TypeFilter,
    pub bank: Option<String>,
    pub term: Option<i64>,
    pub ranking: Ranking,
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "null")
}

impl CatalogQuery {
    pub fn from_params(params: &ProductListParams) -> Self {
        let requested = present(&params.product_type);

        let types = match requested {
            None => TypeFilter::Any,
            Some("loan") => TypeFilter::Only(ProductKind::LOANS.to_vec()),
            Some(raw) => match ProductKind::parse(raw) {
                Some(kind) => TypeFilter::Only(vec![kind]),
                None => TypeFilter::Unmatched,
            },
        };

        let loans = matches!(requested, Some("loan"))
            || requested.and_then(ProductKind::parse).is_some_and(ProductKind::is_loan);
        let annuity = requested == Some("annuity");

        // Loans rank by their lowest rate; annuities by payout amount.
        let rank_column = if loans || annuity {
            RateColumn::Rate1
        } else {
            RateColumn::Rate2
        };

        let ranking = match present(&params.sort) {
            Some("dividend") => Ranking::Rate {
                column: RateColumn::Rate2,
                ascending: false,
            },
            Some("popular") => Ranking::Popular,
            _ => Ranking::Rate {
                column: rank_column,
                ascending: loans,
            },
        };

        let term = if loans {
            None
        } else {
            present(&params.term).and_then(|t| t.parse::<i64>().ok())
        };

        Self {
            types,
            bank: present(&params.bank).map(str::to_string),
            term,
            ranking,
        }
    }

    /// Renders the plan as one SELECT over products.
    pub fn build(&self) -> QueryBuilder<'_, Sqlite> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM products p ", PRODUCT_COLUMNS));
        builder.push(
            "LEFT JOIN (
                SELECT product_id,
                       MAX(CASE WHEN rate1 >= 0 THEN rate1 END) AS rate1_max,
                       MAX(CASE WHEN rate2 >= 0 THEN rate2 END) AS rate2_max
                FROM product_options GROUP BY product_id
            ) r ON r.product_id = p.id ",
        );
        if self.ranking == Ranking::Popular {
            builder.push(
                "LEFT JOIN (
                    SELECT product_id, COUNT(*) AS joins FROM product_joins GROUP BY product_id
                ) j ON j.product_id = p.id ",
            );
        }

        builder.push("WHERE 1 = 1");

        match &self.types {
            TypeFilter::Any => {}
            TypeFilter::Unmatched => {
                builder.push(" AND 1 = 0");
            }
            TypeFilter::Only(kinds) => {
                builder.push(" AND p.product_type IN (");
                let mut separated = builder.separated(", ");
                for kind in kinds {
                    separated.push_bind(*kind);
                }
                separated.push_unseparated(")");
            }
        }

        if let Some(bank) = &self.bank {
            builder.push(" AND p.company = ").push_bind(bank.as_str());
        }

        if let Some(term) = self.term {
            builder
                .push(" AND EXISTS (SELECT 1 FROM product_options t WHERE t.product_id = p.id AND t.term = ")
                .push_bind(term)
                .push(")");
        }

        match self.ranking {
            Ranking::Rate { column, ascending } => {
                let aggregate = column.aggregate();
                builder.push(format!(
                    " ORDER BY {agg} IS NULL, {agg} {dir}, p.id ASC",
                    agg = aggregate,
                    dir = if ascending { "ASC" } else { "DESC" },
                ));
            }
            Ranking::Popular => {
                builder.push(" ORDER BY COALESCE(j.joins, 0) DESC, p.id ASC");
            }
        }

        builder
    }

    pub async fn fetch(&self, pool: &SqlitePool) -> Result<Vec<ProductResponse>, sqlx::Error> {
        let products = self.build().build_query_as::<Product>().fetch_all(pool).await?;
        with_options(pool, products).await
    }
}

/// Loads the options of the given products and pairs them up, keeping
/// the product order.
pub async fn with_options(pool: &SqlitePool, products: Vec<Product>) -> Result<Vec<ProductResponse>, sqlx::Error> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, product_id, code, rate_type, rate1, rate2, term, extras FROM product_options WHERE product_id IN (",
    );
    {
        let mut separated = builder.separated(", ");
        for product in &products {
            separated.push_bind(product.id);
        }
        separated.push_unseparated(") ORDER BY id");
    }

    let options = builder.build_query_as::<ProductOption>().fetch_all(pool).await?;

    let mut by_product: HashMap<i64, Vec<ProductOption>> = HashMap::new();
    for option in options {
        by_product.entry(option.product_id).or_default().push(option);
    }

    Ok(products
        .into_iter()
        .map(|product| ProductResponse {
            options: by_product.remove(&product.id).unwrap_or_default(),
            product,
        })
        .collect())
}

pub async fn find_product(pool: &SqlitePool, id: i64) -> Result<Option<ProductResponse>, sqlx::Error> {
    let product = sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products p WHERE p.id = ?", PRODUCT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match product {
        Some(product) => Ok(with_options(pool, vec![product]).await?.pop()),
        None => Ok(None),
    }
}

/// Products the user liked, most recent relation first.
pub async fn liked_by(pool: &SqlitePool, user_id: i64) -> Result<Vec<ProductResponse>, sqlx::Error> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products p JOIN product_likes l ON l.product_id = p.id WHERE l.user_id = ? ORDER BY l.rowid DESC",
        PRODUCT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    with_options(pool, products).await
}

/// Products the user joined, most recent first.
pub async fn joined_by(pool: &SqlitePool, user_id: i64) -> Result<Vec<ProductResponse>, sqlx::Error> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products p JOIN product_joins j ON j.product_id = p.id WHERE j.user_id = ? \
         ORDER BY j.created_at DESC, p.id ASC",
        PRODUCT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    with_options(pool, products).await
}

/// A product with its best preferential rate, as offered to the model.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatedProduct {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub company: String,
    pub product_type: ProductKind,
    pub etc_note: Option<String>,
    pub max_rate: Option<f64>,
}

/// The `limit` products with the highest MAX(rate2).
pub async fn top_by_rate2(pool: &SqlitePool, limit: i64) -> Result<Vec<RatedProduct>, sqlx::Error> {
    sqlx::query_as::<_, RatedProduct>(
        r"
        SELECT p.id, p.code, p.name, p.company, p.product_type, p.etc_note,
               MAX(CASE WHEN o.rate2 >= 0 THEN o.rate2 END) AS max_rate
        FROM products p
        LEFT JOIN product_options o ON o.product_id = p.id
        GROUP BY p.id
        ORDER BY max_rate IS NULL, max_rate DESC, p.id ASC
        LIMIT ?
        ",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Serialize)]
pub struct CatalogStatus {
    pub total_products: i64,
    pub by_type: Vec<TypeCount>,
}

pub async fn status(pool: &SqlitePool) -> Result<CatalogStatus, sqlx::Error> {
    let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    let by_type = sqlx::query_as::<_, TypeCount>(
        "SELECT product_type, COUNT(*) AS count FROM products GROUP BY product_type ORDER BY product_type",
    )
    .fetch_all(pool)
    .await?;

    Ok(CatalogStatus {
        total_products,
        by_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(product_type: Option<&str>, sort: Option<&str>, bank: Option<&str>, term: Option<&str>) -> ProductListParams {
        ProductListParams {
            sort: sort.map(str::to_string),
            product_type: product_type.map(str::to_string),
            bank: bank.map(str::to_string),
            term: term.map(str::to_string),
        }
    }

    #[test]
    fn test_default_plan_ranks_by_preferential_rate() {
        let query = CatalogQuery::from_params(&ProductListParams::default());
        assert_eq!(query.types, TypeFilter::Any);
        assert_eq!(
            query.ranking,
            Ranking::Rate { column: RateColumn::Rate2, ascending: false }
        );
    }

    #[test]
    fn test_loan_plan_is_cheapest_first_and_ignores_term() {
        let query = CatalogQuery::from_params(&params(Some("loan"), Some("top_rate"), None, Some("12")));
        assert_eq!(query.types, TypeFilter::Only(ProductKind::LOANS.to_vec()));
        assert_eq!(
            query.ranking,
            Ranking::Rate { column: RateColumn::Rate1, ascending: true }
        );
        assert_eq!(query.term, None);

        let credit = CatalogQuery::from_params(&params(Some("credit"), None, None, Some("12")));
        assert_eq!(credit.term, None);
        assert_eq!(
            credit.ranking,
            Ranking::Rate { column: RateColumn::Rate1, ascending: true }
        );
    }

    #[test]
    fn test_annuity_ranks_by_payout_descending() {
        let query = CatalogQuery::from_params(&params(Some("annuity"), None, None, None));
        assert_eq!(
            query.ranking,
            Ranking::Rate { column: RateColumn::Rate1, ascending: false }
        );
    }

    #[test]
    fn test_dividend_and_popular_sorts() {
        let dividend = CatalogQuery::from_params(&params(Some("mortgage"), Some("dividend"), None, None));
        assert_eq!(
            dividend.ranking,
            Ranking::Rate { column: RateColumn::Rate2, ascending: false }
        );

        let popular = CatalogQuery::from_params(&params(None, Some("popular"), None, None));
        assert_eq!(popular.ranking, Ranking::Popular);
        assert!(popular.build().sql().contains("COALESCE(j.joins, 0) DESC"));
    }

    #[test]
    fn test_null_and_malformed_filters_are_ignored() {
        let query = CatalogQuery::from_params(&params(Some("null"), None, Some("null"), Some("twelve")));
        assert_eq!(query.types, TypeFilter::Any);
        assert_eq!(query.bank, None);
        assert_eq!(query.term, None);

        let empty_bank = CatalogQuery::from_params(&params(None, None, Some(""), Some("6")));
        assert_eq!(empty_bank.bank, None);
        assert_eq!(empty_bank.term, Some(6));
    }

    #[test]
    fn test_unknown_type_matches_nothing() {
        let query = CatalogQuery::from_params(&params(Some("bond"), None, None, None));
        assert_eq!(query.types, TypeFilter::Unmatched);
        assert!(query.build().sql().contains("1 = 0"));
    }

    #[test]
    fn test_rendered_sql_binds_filters() {
        let query = CatalogQuery::from_params(&params(Some("deposit"), None, Some("우리은행"), Some("12")));
        let builder = query.build();
        let sql = builder.sql();
        assert!(sql.contains("p.product_type IN (?)"));
        assert!(sql.contains("p.company = ?"));
        assert!(sql.contains("t.term = ?"));
        assert!(sql.ends_with("ORDER BY r.rate2_max IS NULL, r.rate2_max DESC, p.id ASC"));
    }

    async fn seeded_pool() -> SqlitePool {
        let pool = crate::db::connect("sqlite::memory:").await.unwrap();
        crate::db::migrate(&pool).await.unwrap();

        sqlx::raw_sql(
            r"
            INSERT INTO products (id, code, company, name, product_type) VALUES
                (1, 'D1', '우리은행', 'A', 'deposit'),
                (2, 'D2', '국민은행', 'B', 'deposit'),
                (3, 'D3', '우리은행', 'C', 'deposit'),
                (4, 'M1', '우리은행', 'D', 'mortgage'),
                (5, 'R1', '국민은행', 'E', 'rent');
            INSERT INTO product_options (product_id, code, rate_type, rate1, rate2, term) VALUES
                (1, 'D1', '단리', 3.0, 3.5, 12),
                (1, 'D1', '단리', 3.1, 3.9, 24),
                (2, 'D2', '단리', 3.0, 3.9, 6),
                (3, 'D3', '단리', -1, -1, 12),
                (4, 'M1', '변동', 4.1, 5.0, NULL),
                (5, 'R1', '고정', 3.5, 4.2, NULL);
            ",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    fn ids(products: &[ProductResponse]) -> Vec<i64> {
        products.iter().map(|p| p.product.id).collect()
    }

    #[tokio::test]
    async fn test_deposits_rank_descending_with_ties_by_id() {
        let pool = seeded_pool().await;
        let result = CatalogQuery::from_params(&params(Some("deposit"), None, None, None))
            .fetch(&pool)
            .await
            .unwrap();

        // 1 and 2 tie at 3.9; 3 only has unknown rates.
        assert_eq!(ids(&result), vec![1, 2, 3]);
        assert_eq!(result[0].options.len(), 2);
    }

    #[tokio::test]
    async fn test_loans_rank_cheapest_first() {
        let pool = seeded_pool().await;
        let result = CatalogQuery::from_params(&params(Some("loan"), None, None, None))
            .fetch(&pool)
            .await
            .unwrap();
        assert_eq!(ids(&result), vec![5, 4]);
    }

    #[tokio::test]
    async fn test_bank_and_term_filters() {
        let pool = seeded_pool().await;
        let result = CatalogQuery::from_params(&params(None, None, Some("우리은행"), Some("12")))
            .fetch(&pool)
            .await
            .unwrap();
        assert_eq!(ids(&result), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_status_counts_by_type() {
        let pool = seeded_pool().await;
        let status = status(&pool).await.unwrap();
        assert_eq!(status.total_products, 5);
        let deposits = status
            .by_type
            .iter()
            .find(|c| c.product_type == ProductKind::Deposit)
            .unwrap();
        assert_eq!(deposits.count, 3);
    }

    #[tokio::test]
    async fn test_top_by_rate2_orders_candidates() {
        let pool = seeded_pool().await;
        let top = top_by_rate2(&pool, 3).await.unwrap();
        let ids: Vec<i64> = top.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 5, 1]);
    }
}
