// src/catalog/normalize.rs

//! Pure mapping from provider records to the canonical product shape.
//!
//! Every feed type has its own raw option schema. Records are parsed into
//! one [`RawOption`] variant per type and each variant knows how to turn
//! itself into a [`NewOption`]. Numeric fields arrive as JSON numbers or as
//! strings; anything missing or malformed degrades to `0` for counts and
//! `-1.0` for rates instead of failing.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::models::product::ProductKind;

/// Rate value meaning "unknown / not applicable".
pub const UNKNOWN_RATE: f64 = -1.0;

/// Credit-grade rate fields considered for credit loans.
const CREDIT_GRADE_FIELDS: [&str; 8] = [
    "crdt_grad_1",
    "crdt_grad_4",
    "crdt_grad_5",
    "crdt_grad_6",
    "crdt_grad_10",
    "crdt_grad_11",
    "crdt_grad_12",
    "crdt_grad_13",
];

/// A loosely typed provider value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl Scalar {
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
            Scalar::Flag(b) => b.to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Scalar::Number(n) => json!(n),
            Scalar::Text(s) => json!(s),
            Scalar::Flag(b) => json!(b),
        }
    }
}

/// Coerces a rate. Missing, blank or unparsable input yields [`UNKNOWN_RATE`].
pub fn safe_float(value: Option<&Scalar>) -> f64 {
    match value {
        Some(Scalar::Number(n)) if n.is_finite() => *n,
        Some(Scalar::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(UNKNOWN_RATE),
        _ => UNKNOWN_RATE,
    }
}

/// Coerces a count. Missing, blank or unparsable input yields `0`.
pub fn safe_int(value: Option<&Scalar>) -> i64 {
    match value {
        Some(Scalar::Number(n)) if n.is_finite() => n.trunc() as i64,
        Some(Scalar::Text(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

fn text(value: Option<&Scalar>) -> Option<String> {
    value.map(Scalar::as_text)
}

fn text_or(value: Option<&Scalar>, default: &str) -> String {
    text(value)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn extra(value: Option<&Scalar>) -> Value {
    value.map(Scalar::to_json).unwrap_or(Value::Null)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Errors raised while reading a provider record.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0} products are not delivered by the product feeds")]
    NotAFeed(&'static str),
}

/// Product fields ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub code: String,
    pub company: String,
    pub name: String,
    pub etc_note: Option<String>,
    pub join_deny: Option<i64>,
    pub join_member: Option<String>,
    pub join_way: Option<String>,
    pub special_condition: Option<String>,
    pub product_type: ProductKind,
    pub maturity_interest: Option<String>,
    pub max_limit: Option<i64>,
}

/// Option fields ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOption {
    pub rate_type: String,
    pub rate1: f64,
    pub rate2: f64,
    pub term: Option<i64>,
    pub extras: Map<String, Value>,
}

/// Base product record shared by every feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBase {
    pub fin_prdt_cd: Option<Scalar>,
    pub kor_co_nm: Option<Scalar>,
    pub fin_prdt_nm: Option<Scalar>,
    pub etc_note: Option<Scalar>,
    pub join_deny: Option<Scalar>,
    pub join_member: Option<Scalar>,
    pub join_way: Option<Scalar>,
    pub spcl_cnd: Option<Scalar>,
    pub mtrt_int: Option<Scalar>,
    pub max_limit: Option<Scalar>,
}

impl RawBase {
    /// Maps the record to a product of the given type.
    /// Records without a product code are dropped.
    pub fn normalize(&self, kind: ProductKind) -> Option<NewProduct> {
        let code = text(self.fin_prdt_cd.as_ref()).filter(|c| !c.trim().is_empty())?;
        let savings = matches!(kind, ProductKind::Deposit | ProductKind::Saving);

        Some(NewProduct {
            code,
            company: text_or(self.kor_co_nm.as_ref(), ""),
            name: text_or(self.fin_prdt_nm.as_ref(), ""),
            etc_note: Some(text_or(self.etc_note.as_ref(), "")),
            join_deny: Some(safe_int(self.join_deny.as_ref())),
            join_member: Some(text_or(self.join_member.as_ref(), "")),
            join_way: Some(text_or(self.join_way.as_ref(), "")),
            special_condition: Some(text_or(self.spcl_cnd.as_ref(), "")),
            product_type: kind,
            maturity_interest: savings.then(|| text_or(self.mtrt_int.as_ref(), "")),
            max_limit: if savings {
                self.max_limit.as_ref().map(|v| safe_int(Some(v)))
            } else {
                None
            },
        })
    }
}

/// Deposit and saving options: base and preferential rate per term.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateOption {
    pub fin_prdt_cd: Option<Scalar>,
    pub intr_rate_type_nm: Option<Scalar>,
    pub intr_rate: Option<Scalar>,
    pub intr_rate2: Option<Scalar>,
    pub save_trm: Option<Scalar>,
}

/// Mortgage and rent-loan options: lending rate range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LendingOption {
    pub fin_prdt_cd: Option<Scalar>,
    pub lend_rate_type_nm: Option<Scalar>,
    pub lend_rate_min: Option<Scalar>,
    pub lend_rate_max: Option<Scalar>,
    pub rpay_type_nm: Option<Scalar>,
    pub mrtg_type_nm: Option<Scalar>,
}

/// Credit-loan options: one rate per credit-grade bucket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreditOption {
    pub fin_prdt_cd: Option<Scalar>,
    pub crdt_prdt_type_nm: Option<Scalar>,
    /// Every other field, the grade buckets among them.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Annuity options: pension payout and payment period.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnuityOption {
    pub fin_prdt_cd: Option<Scalar>,
    pub pnsn_recp_trm_nm: Option<Scalar>,
    pub pnsn_recp_amt: Option<Scalar>,
    pub paym_prd: Option<Scalar>,
    pub pnsn_entr_age_nm: Option<Scalar>,
    pub pnsn_strt_age_nm: Option<Scalar>,
    pub mon_paym_atm_nm: Option<Scalar>,
    pub paym_prd_nm: Option<Scalar>,
}

/// A provider option record, one variant per feed type.
#[derive(Debug, Clone)]
pub enum RawOption {
    Deposit(RateOption),
    Saving(RateOption),
    Mortgage(LendingOption),
    Rent(LendingOption),
    Credit(CreditOption),
    Annuity(AnnuityOption),
}

impl RawOption {
    /// Reads a record of the given feed type.
    pub fn parse(kind: ProductKind, value: Value) -> Result<Self, NormalizeError> {
        Ok(match kind {
            ProductKind::Deposit => RawOption::Deposit(serde_json::from_value(value)?),
            ProductKind::Saving => RawOption::Saving(serde_json::from_value(value)?),
            ProductKind::Mortgage => RawOption::Mortgage(serde_json::from_value(value)?),
            ProductKind::Rent => RawOption::Rent(serde_json::from_value(value)?),
            ProductKind::Credit => RawOption::Credit(serde_json::from_value(value)?),
            ProductKind::Annuity => RawOption::Annuity(serde_json::from_value(value)?),
            ProductKind::Etf => return Err(NormalizeError::NotAFeed("etf")),
        })
    }

    /// Code of the product this option belongs to.
    pub fn product_code(&self) -> Option<String> {
        let code = match self {
            RawOption::Deposit(o) | RawOption::Saving(o) => o.fin_prdt_cd.as_ref(),
            RawOption::Mortgage(o) | RawOption::Rent(o) => o.fin_prdt_cd.as_ref(),
            RawOption::Credit(o) => o.fin_prdt_cd.as_ref(),
            RawOption::Annuity(o) => o.fin_prdt_cd.as_ref(),
        };
        text(code).filter(|c| !c.trim().is_empty())
    }

    pub fn normalize(&self) -> NewOption {
        match self {
            RawOption::Deposit(o) | RawOption::Saving(o) => NewOption {
                rate_type: text_or(o.intr_rate_type_nm.as_ref(), ""),
                rate1: safe_float(o.intr_rate.as_ref()),
                rate2: safe_float(o.intr_rate2.as_ref()),
                term: Some(safe_int(o.save_trm.as_ref())),
                extras: Map::new(),
            },
            RawOption::Mortgage(o) | RawOption::Rent(o) => {
                let mut extras = Map::new();
                extras.insert("rpay_type_nm".into(), extra(o.rpay_type_nm.as_ref()));
                extras.insert("mrtg_type_nm".into(), extra(o.mrtg_type_nm.as_ref()));
                NewOption {
                    rate_type: text_or(o.lend_rate_type_nm.as_ref(), ""),
                    rate1: safe_float(o.lend_rate_min.as_ref()),
                    rate2: safe_float(o.lend_rate_max.as_ref()),
                    term: None,
                    extras,
                }
            }
            RawOption::Credit(o) => {
                let rates: Vec<f64> = CREDIT_GRADE_FIELDS
                    .iter()
                    .filter_map(|field| o.fields.get(*field))
                    .filter_map(|value| serde_json::from_value::<Scalar>(value.clone()).ok())
                    .map(|grade| safe_float(Some(&grade)))
                    .filter(|rate| *rate != UNKNOWN_RATE)
                    .collect();

                let (rate1, rate2) = if rates.is_empty() {
                    (UNKNOWN_RATE, UNKNOWN_RATE)
                } else {
                    (
                        rates.iter().copied().fold(f64::INFINITY, f64::min),
                        rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    )
                };

                let mut extras = Map::new();
                extras.insert("crdt_prdt_type_nm".into(), extra(o.crdt_prdt_type_nm.as_ref()));
                NewOption {
                    rate_type: text_or(o.crdt_prdt_type_nm.as_ref(), "신용대출"),
                    rate1,
                    rate2,
                    term: None,
                    extras,
                }
            }
            RawOption::Annuity(o) => {
                let period_years = safe_int(o.paym_prd.as_ref());
                let mut extras = Map::new();
                extras.insert("pnsn_entr_age_nm".into(), extra(o.pnsn_entr_age_nm.as_ref()));
                extras.insert("pnsn_strt_age_nm".into(), extra(o.pnsn_strt_age_nm.as_ref()));
                extras.insert("mon_paym_atm_nm".into(), extra(o.mon_paym_atm_nm.as_ref()));
                extras.insert("paym_prd_nm".into(), extra(o.paym_prd_nm.as_ref()));
                NewOption {
                    rate_type: text_or(o.pnsn_recp_trm_nm.as_ref(), "연금"),
                    rate1: safe_float(o.pnsn_recp_amt.as_ref()),
                    rate2: 0.0,
                    term: (period_years != 0).then_some(period_years * 12),
                    extras,
                }
            }
        }
    }
}

/// A curated equity or ETF ticker.
#[derive(Debug, Clone, Copy)]
pub struct CuratedEquity {
    pub symbol: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const CURATED_EQUITIES: [CuratedEquity; 16] = [
    CuratedEquity { symbol: "SPY", name: "SPDR S&P 500", description: "미국 S&P500 지수 추종 ETF (안정적 우상향)" },
    CuratedEquity { symbol: "QQQ", name: "Invesco QQQ", description: "나스닥 100 추종 (기술주 중심 성장)" },
    CuratedEquity { symbol: "SCHD", name: "Schwab US Dividend", description: "미국 배당 성장 ETF (현금 흐름 중시)" },
    CuratedEquity { symbol: "TQQQ", name: "ProShares UltraPro QQQ", description: "나스닥 3배 레버리지 (고위험 고수익)" },
    CuratedEquity { symbol: "O", name: "Realty Income", description: "매달 배당을 주는 미국의 대표적인 리츠(부동산) 주식" },
    CuratedEquity { symbol: "TSLA", name: "Tesla", description: "전기차 시장의 선두주자 및 자율주행 기술 보유" },
    CuratedEquity { symbol: "NVDA", name: "NVIDIA", description: "AI 컴퓨팅의 핵심인 GPU 반도체 시장 지배자" },
    CuratedEquity { symbol: "GLD", name: "SPDR Gold Shares", description: "금 현물 투자 ETF (안전자산)" },
    CuratedEquity { symbol: "AAPL", name: "Apple Inc", description: "아이폰, 맥북 등을 만드는 세계 1위 기술 기업" },
    CuratedEquity { symbol: "MSFT", name: "Microsoft", description: "윈도우, 오피스, 클라우드(Azure) 및 AI 선두 기업" },
    CuratedEquity { symbol: "GOOGL", name: "Alphabet (Google)", description: "검색 엔진, 유튜브, 안드로이드 운영체제 보유" },
    CuratedEquity { symbol: "AMZN", name: "Amazon", description: "세계 최대 이커머스 및 클라우드(AWS) 기업" },
    CuratedEquity { symbol: "META", name: "Meta Platforms", description: "페이스북, 인스타그램, 왓츠앱 등 소셜 미디어 제국" },
    CuratedEquity { symbol: "NFLX", name: "Netflix", description: "글로벌 1위 OTT 스트리밍 서비스" },
    CuratedEquity { symbol: "SBUX", name: "Starbucks", description: "세계 최대의 커피 프랜차이즈" },
    CuratedEquity { symbol: "KO", name: "Coca-Cola", description: "워렌 버핏이 사랑하는 필수 소비재 배당주" },
];

/// Market snapshot of one ticker. Ratios are fractions (`0.15` is 15%).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquityQuote {
    pub current_price: Option<f64>,
    pub year_change: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub sector: Option<String>,
    pub currency: Option<String>,
}

/// Maps a ticker snapshot to its product and single option.
pub fn normalize_equity(equity: &CuratedEquity, quote: &EquityQuote) -> (NewProduct, NewOption) {
    let product = NewProduct {
        code: equity.symbol.to_string(),
        company: "미국 주식/ETF".to_string(),
        name: equity.name.to_string(),
        etc_note: Some(equity.description.to_string()),
        join_deny: Some(1),
        join_member: None,
        join_way: None,
        special_condition: None,
        product_type: ProductKind::Etf,
        maturity_interest: None,
        max_limit: None,
    };

    let mut extras = Map::new();
    extras.insert("current_price".into(), json!(quote.current_price.unwrap_or(0.0)));
    extras.insert(
        "sector".into(),
        json!(quote.sector.clone().unwrap_or_else(|| "ETF".to_string())),
    );
    extras.insert(
        "currency".into(),
        json!(quote.currency.clone().unwrap_or_else(|| "USD".to_string())),
    );

    let option = NewOption {
        rate_type: "투자 수익률".to_string(),
        rate1: round2(quote.year_change.unwrap_or(0.0) * 100.0),
        rate2: round2(quote.dividend_yield.unwrap_or(0.0) * 100.0),
        term: Some(12),
        extras,
    };

    (product, option)
}
