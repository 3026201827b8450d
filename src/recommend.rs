// src/recommend.rs

//! Product recommendation: the similar-user cohort heuristic and the
//! model-assisted re-ranking, plus the prompts for the advisor endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::catalog::query::{RatedProduct, with_options};
use crate::clients::{ChatRequest, UpstreamError};
use crate::models::product::{Product, ProductResponse};

/// Cohort bounds around the caller, inclusive.
pub const AGE_WINDOW: i64 = 5;
pub const MONEY_WINDOW: i64 = 10_000_000;
pub const COHORT_PICKS: usize = 5;

/// Candidates handed to the model.
pub const CANDIDATE_LIMIT: i64 = 100;

/// Counts how often each product appears and returns the `limit` most
/// frequent. Equal counts keep the order in which products were first seen.
pub fn rank_by_frequency(product_ids: &[i64], limit: usize) -> Vec<i64> {
    let mut order: Vec<i64> = Vec::new();
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for id in product_ids {
        let count = counts.entry(*id).or_insert(0);
        if *count == 0 {
            order.push(*id);
        }
        *count += 1;
    }

    // Stable sort keeps first-seen order among equal counts.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(limit);
    order
}

/// Products most joined by users of similar age and assets.
pub async fn cohort_picks(pool: &SqlitePool, user_id: i64, age: i64, money: i64) -> Result<Vec<ProductResponse>, sqlx::Error> {
    let joined: Vec<i64> = sqlx::query_scalar(
        r"
        SELECT j.product_id
        FROM users u
        JOIN product_joins j ON j.user_id = u.id
        WHERE u.id <> ?
          AND u.age BETWEEN ? AND ?
          AND u.money BETWEEN ? AND ?
        ORDER BY u.id, j.created_at, j.product_id
        ",
    )
    .bind(user_id)
    .bind(age - AGE_WINDOW)
    .bind(age + AGE_WINDOW)
    .bind(money - MONEY_WINDOW)
    .bind(money + MONEY_WINDOW)
    .fetch_all(pool)
    .await?;

    let ranked = rank_by_frequency(&joined, COHORT_PICKS);
    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = sqlx::QueryBuilder::<Sqlite>::new(
        "SELECT id, code, company, name, etc_note, join_deny, join_member, join_way, \
         special_condition, product_type, maturity_interest, max_limit FROM products WHERE id IN (",
    );
    {
        let mut separated = builder.separated(", ");
        for id in &ranked {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
    }
    let mut products = builder.build_query_as::<Product>().fetch_all(pool).await?;
    products.sort_by_key(|p| ranked.iter().position(|id| *id == p.id));

    with_options(pool, products).await
}

const ANALYSIS_SYSTEM: &str = "너는 금융 전문가야. 답변은 반드시 순수한 JSON 형식으로만 해줘.";

const RECOMMEND_SYSTEM: &str = "너는 대한민국 최고의 자산관리사(CFA)이자 금융 분석 전문가야.
사용자의 분석 결과와 제공된 금융 상품 데이터를 정밀하게 대조해서 가장 적합한 상품을 추천해줘.

반드시 지켜야 할 규칙:
1. 추천 이유(reason)에 금리, 수익률, 자산 대비 비율 같은 구체적인 수치를 포함할 것.
2. 시장 평균이나 다른 상품과 비교해 어떤 장점이 있는지 언급할 것.
3. 사용자의 투자 성향과 상품의 위험도를 논리적으로 연결할 것.
4. 사용자의 상황을 간단히 브리핑할 것.
5. 답변은 반드시 순수한 JSON 형식으로만 할 것.";

const CONSULT_SYSTEM: &str = "너는 친절한 금융 전문가야. 한국어로 명확하게 답변해줘.";

/// Persona analysis of a user's self-reported situation.
/// The model answers `{"type", "score", "advice"}`.
pub fn analysis_request(model: &str, user_info: &Value) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        system: ANALYSIS_SYSTEM.to_string(),
        user: format!(
            "[사용자 정보] {} 분석 결과 JSON: {{ \"type\": \"성향\", \"score\": 점수, \"advice\": \"조언\" }}",
            user_info
        ),
        json_output: true,
    }
}

pub fn consult_request(model: &str, query: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        system: CONSULT_SYSTEM.to_string(),
        user: query.to_string(),
        json_output: false,
    }
}

/// One line per candidate: name, bank, best rate, type and the start of the note.
pub fn candidate_line(product: &RatedProduct) -> String {
    let note: String = product.etc_note.as_deref().unwrap_or("").chars().take(50).collect();
    let rate = product
        .max_rate
        .map(|r| r.to_string())
        .unwrap_or_else(|| "None".to_string());
    format!(
        "- 상품명: {}, 금융사: {}, 최고금리: {}%, 유형: {}, 특징: {}",
        product.name,
        product.company,
        rate,
        product.product_type.as_str(),
        note
    )
}

pub fn recommend_request(model: &str, analysis: &Value, candidates: &[RatedProduct]) -> ChatRequest {
    let lines: Vec<String> = candidates.iter().map(candidate_line).collect();
    let user = format!(
        r#"[사용자 투자 성향 분석 결과]
{analysis}

[추천 후보 상품 리스트]
{candidates}

위 데이터를 기반으로 다음 JSON 형식에 맞춰 5개를 추천해줘:
{{
  "recommendations": [
    {{ "name": "정확한 상품명", "reason": "데이터와 수치를 기반으로 한 구체적인 추천 이유 (최소 2문장 이상)" }}
  ]
}}"#,
        analysis = analysis,
        candidates = lines.join("\n"),
    );

    ChatRequest {
        model: model.to_string(),
        system: RECOMMEND_SYSTEM.to_string(),
        user,
        json_output: true,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    pub name: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestionList {
    #[serde(default)]
    recommendations: Vec<Suggestion>,
}

/// Reads the model's `{"recommendations": [...]}` answer.
pub fn parse_suggestions(answer: Value) -> Result<Vec<Suggestion>, UpstreamError> {
    serde_json::from_value::<SuggestionList>(answer)
        .map(|list| list.recommendations)
        .map_err(|e| UpstreamError::Decode(format!("unexpected recommendation shape: {}", e)))
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub id: i64,
    pub fin_prdt_cd: String,
    pub name: String,
    pub bank: String,
    pub reason: Option<String>,
    pub is_liked: bool,
}

#[derive(sqlx::FromRow)]
struct MatchedProduct {
    id: i64,
    code: String,
    name: String,
    company: String,
    is_liked: bool,
}

/// Resolves suggested names to catalog products. A suggestion matches the
/// first product (by id) whose name contains it; unmatched ones are dropped.
pub async fn resolve_suggestions(
    pool: &SqlitePool,
    user_id: i64,
    suggestions: Vec<Suggestion>,
) -> Result<Vec<Recommendation>, sqlx::Error> {
    let mut resolved = Vec::with_capacity(suggestions.len());

    for suggestion in suggestions {
        let needle = suggestion.name.trim();
        if needle.is_empty() {
            continue;
        }

        let matched = sqlx::query_as::<_, MatchedProduct>(
            r"
            SELECT p.id, p.code, p.name, p.company,
                   EXISTS (SELECT 1 FROM product_likes l WHERE l.product_id = p.id AND l.user_id = ?) AS is_liked
            FROM products p
            WHERE instr(p.name, ?) > 0
            ORDER BY p.id
            LIMIT 1
            ",
        )
        .bind(user_id)
        .bind(needle)
        .fetch_optional(pool)
        .await?;

        match matched {
            Some(product) => resolved.push(Recommendation {
                id: product.id,
                fin_prdt_cd: product.code,
                name: product.name,
                bank: product.company,
                reason: suggestion.reason,
                is_liked: product.is_liked,
            }),
            None => tracing::debug!(name = needle, "suggested product not in catalog"),
        }
    }

    Ok(resolved)
}

/// Appends an analysis snapshot to the user's history.
pub async fn append_portfolio<'e, E>(executor: E, user_id: i64, user_info: &Value, analysis: &Value) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO user_portfolios (user_id, user_info, analysis_result) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(sqlx::types::Json(user_info))
        .bind(sqlx::types::Json(analysis))
        .execute(executor)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::ProductKind;
    use serde_json::json;

    #[test]
    fn test_frequency_ranking_keeps_first_seen_order_on_ties() {
        assert_eq!(rank_by_frequency(&[7, 3, 3, 9, 7, 1], 5), vec![7, 3, 9, 1]);
        assert_eq!(rank_by_frequency(&[1, 2, 2, 3, 3, 3], 2), vec![3, 2]);
        assert!(rank_by_frequency(&[], 5).is_empty());
    }

    #[test]
    fn test_candidate_line_truncates_note() {
        let product = RatedProduct {
            id: 1,
            code: "D1".into(),
            name: "WON플러스예금".into(),
            company: "우리은행".into(),
            product_type: ProductKind::Deposit,
            etc_note: Some("가".repeat(80)),
            max_rate: Some(3.5),
        };
        let line = candidate_line(&product);
        assert!(line.starts_with("- 상품명: WON플러스예금, 금융사: 우리은행, 최고금리: 3.5%, 유형: deposit"));
        assert!(line.ends_with(&"가".repeat(50)));
        assert!(!line.ends_with(&"가".repeat(51)));
    }

    #[test]
    fn test_recommend_request_embeds_analysis_and_candidates() {
        let candidates = vec![RatedProduct {
            id: 2,
            code: "S1".into(),
            name: "자유적금".into(),
            company: "국민은행".into(),
            product_type: ProductKind::Saving,
            etc_note: None,
            max_rate: None,
        }];
        let request = recommend_request("gpt-4o", &json!({ "type": "안정형" }), &candidates);
        assert!(request.json_output);
        assert!(request.user.contains("안정형"));
        assert!(request.user.contains("자유적금"));
        assert!(request.user.contains("최고금리: None%"));
    }

    #[test]
    fn test_parse_suggestions() {
        let parsed = parse_suggestions(json!({
            "recommendations": [
                { "name": "자유적금", "reason": "금리 4.2%" },
                { "name": "SPDR S&P 500" }
            ]
        }))
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].reason, None);

        assert!(parse_suggestions(json!({})).unwrap().is_empty());
        assert!(parse_suggestions(json!({ "recommendations": [{ "reason": "no name" }] })).is_err());
    }

    async fn pool() -> SqlitePool {
        let pool = crate::db::connect("sqlite::memory:").await.unwrap();
        crate::db::migrate(&pool).await.unwrap();
        sqlx::raw_sql(
            r"
            INSERT INTO users (id, username, password, age, money) VALUES
                (1, 'me', 'x', 30, 50000000),
                (2, 'peer', 'x', 35, 60000000),
                (3, 'peer2', 'x', 26, 41000000),
                (4, 'older', 'x', 36, 50000000),
                (5, 'richer', 'x', 30, 60000001);
            INSERT INTO products (id, code, name, company, product_type) VALUES
                (10, 'A', '우리 WON플러스 예금', '우리은행', 'deposit'),
                (11, 'B', '자유적금', '국민은행', 'saving'),
                (12, 'C', 'WON플러스 적금', '우리은행', 'saving');
            INSERT INTO product_joins (user_id, product_id) VALUES
                (1, 10), (2, 11), (2, 12), (3, 12), (4, 10), (5, 10);
            INSERT INTO product_likes (user_id, product_id) VALUES (1, 12);
            ",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_cohort_is_inclusive_and_excludes_self() {
        let pool = pool().await;
        let picks = cohort_picks(&pool, 1, 30, 50_000_000).await.unwrap();
        let ids: Vec<i64> = picks.iter().map(|p| p.product.id).collect();
        // Users 2 and 3 are on the window edges; 4 and 5 are just outside.
        assert_eq!(ids, vec![12, 11]);
    }

    #[tokio::test]
    async fn test_suggestions_match_by_containment() {
        let pool = pool().await;
        let suggestions = vec![
            Suggestion { name: "WON플러스".into(), reason: Some("first".into()) },
            Suggestion { name: "없는 상품".into(), reason: None },
            Suggestion { name: "WON플러스 적금".into(), reason: None },
        ];
        let resolved = resolve_suggestions(&pool, 1, suggestions).await.unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].id, 10);
        assert!(!resolved[0].is_liked);
        assert_eq!(resolved[1].id, 12);
        assert!(resolved[1].is_liked);
        assert_eq!(resolved[1].bank, "우리은행");
    }
}
