// src/models/services.rs

use serde::Deserialize;

/// Default search point (Yeoksam, Seoul).
pub const DEFAULT_X: &str = "127.039585";
pub const DEFAULT_Y: &str = "37.5012743";

#[derive(Debug, Deserialize)]
pub struct BankSearchParams {
    pub keyword: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Route endpoints as "x,y" pairs.
#[derive(Debug, Deserialize)]
pub struct RouteParams {
    pub sp: Option<String>,
    pub ep: Option<String>,
}
