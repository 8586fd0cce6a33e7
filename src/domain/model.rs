use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Code family expected by a batch or inferred from a code's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Unit,
    Aggregate,
    Unknown,
}

/// Families a caller may ask for. `Unknown` is only ever a classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeFamily {
    Unit,
    Aggregate,
}

impl CodeFamily {
    pub fn prefix(self) -> &'static str {
        match self {
            CodeFamily::Unit => "01",
            CodeFamily::Aggregate => "00",
        }
    }

    /// Value of the ledger's `"Type"` column for this family.
    pub fn ledger_type(self) -> i64 {
        match self {
            CodeFamily::Unit => 1,
            CodeFamily::Aggregate => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotAString,
    TooShort,
    WrongPrefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkCode {
    pub raw: String,
    pub kind: CodeKind,
    pub valid: bool,
    pub gtin: Option<String>,
    pub rejection: Option<SkipReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub gtin: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,
    #[serde(rename = "productName", default)]
    pub product_name: String,
    #[serde(rename = "totalAmount", default, deserialize_with = "lenient_price")]
    pub total_amount: f64,
    /// Caller fields we do not interpret; echoed back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn lenient_price<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

// total/totalAmount are recomputed, so whatever the caller sent is only a placeholder.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().unwrap_or(0))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GtinCount {
    pub gtin: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub total_distinct_codes: usize,
    pub per_gtin_counts: Vec<GtinCount>,
    pub updated_products: Vec<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    pub not_a_string: usize,
    pub too_short: usize,
    pub wrong_prefix: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NotAString => self.not_a_string += 1,
            SkipReason::TooShort => self.too_short += 1,
            SkipReason::WrongPrefix => self.wrong_prefix += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.not_a_string + self.too_short + self.wrong_prefix
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlBatchResult {
    pub total_input: usize,
    pub processed: usize,
    pub skipped: usize,
    pub skip_counts: SkipCounts,
    pub statements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurlExtraction {
    pub token: Option<String>,
    pub bin: Option<String>,
    pub codes: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Bearer value handed out by the registry. Lives for one request only.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryToken(String);

impl RegistryToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RegistryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistryToken(*** {} chars)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStage {
    Token,
    CodeInfo,
}

/// Outcome of the advisory registry lookup attached to a code batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistryLookup {
    NotRequested,
    Fetched { payload: serde_json::Value },
    Unavailable { stage: LookupStage, reason: String },
}

impl RegistryLookup {
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            RegistryLookup::Fetched { payload } => Some(payload),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeBatchOutcome {
    pub sql: SqlBatchResult,
    pub registry: RegistryLookup,
}
