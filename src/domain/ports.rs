use crate::domain::model::{RegistryCredentials, RegistryToken};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Registry-side settings every registry adapter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    pub token_url: Option<String>,
    pub info_url: String,
    pub document_url: String,
    pub document_auth: Option<String>,
    pub commodity_group: String,
    pub token_timeout_seconds: u64,
    pub info_timeout_seconds: u64,
    pub document_timeout_seconds: u64,
    pub probe_timeout_seconds: u64,
}

/// Target tables for generated statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub table: String,
    pub archive_table: String,
    pub prod_group: String,
}

impl LedgerSettings {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            archive_table: format!("{}_arch", table),
            table,
            prod_group: "pharma".to_string(),
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::new("docflow_go.marks_go")
    }
}

pub trait ConfigProvider: Send + Sync {
    fn registry(&self) -> RegistrySettings;
    fn ledger(&self) -> LedgerSettings;
    fn credentials(&self) -> Option<RegistryCredentials>;
    fn output_path(&self) -> &str;
}

/// Outbound calls to the marking registry. Every call is a single attempt.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn acquire_token(&self, credentials: &RegistryCredentials) -> Result<RegistryToken>;

    async fn fetch_code_info(
        &self,
        token: &RegistryToken,
        bin: &str,
        codes: &[String],
    ) -> Result<serde_json::Value>;

    async fn fetch_document_codes(
        &self,
        document_id: &str,
        innbin: &str,
    ) -> Result<serde_json::Value>;

    /// `false` on 401 or any transport failure.
    async fn validate_token(&self, token: &RegistryToken) -> bool;
}
