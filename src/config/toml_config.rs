use crate::core::ConfigProvider;
use crate::domain::model::RegistryCredentials;
use crate::domain::ports::{LedgerSettings, RegistrySettings};
use crate::utils::error::{MarkError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_INFO_URL: &str = "https://api.edo.markirovka.kz/apiUot/api/v1/private/info-km";
pub const DEFAULT_DOCUMENT_URL: &str =
    "https://edo.markirovka.kz/adm/camunda/api/v1/private/document/codesList";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub token_url: Option<String>,
    #[serde(default = "default_info_url")]
    pub info_url: String,
    #[serde(default = "default_document_url")]
    pub document_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Base64 `user:password` sent as `Authorization: Basic` to the document endpoint.
    pub document_auth: Option<String>,
    #[serde(default = "default_commodity_group")]
    pub commodity_group: String,
    pub token_timeout_seconds: Option<u64>,
    pub info_timeout_seconds: Option<u64>,
    pub document_timeout_seconds: Option<u64>,
    pub probe_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_table")]
    pub table: String,
    pub archive_table: Option<String>,
    #[serde(default = "default_commodity_group")]
    pub prod_group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default)]
    pub write_files: bool,
}

fn default_info_url() -> String {
    DEFAULT_INFO_URL.to_string()
}

fn default_document_url() -> String {
    DEFAULT_DOCUMENT_URL.to_string()
}

fn default_commodity_group() -> String {
    "pharma".to_string()
}

fn default_ledger_table() -> String {
    "docflow_go.marks_go".to_string()
}

fn default_output_path() -> String {
    "./output".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            token_url: None,
            info_url: default_info_url(),
            document_url: default_document_url(),
            username: None,
            password: None,
            document_auth: None,
            commodity_group: default_commodity_group(),
            token_timeout_seconds: None,
            info_timeout_seconds: None,
            document_timeout_seconds: None,
            probe_timeout_seconds: None,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            table: default_ledger_table(),
            archive_table: None,
            prod_group: default_commodity_group(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            write_files: false,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarkError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarkError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REGISTRY_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarkError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(token_url) = &self.registry.token_url {
            validate_url("registry.token_url", token_url)?;
        }
        validate_url("registry.info_url", &self.registry.info_url)?;
        validate_url("registry.document_url", &self.registry.document_url)?;
        validate_non_empty_string("registry.commodity_group", &self.registry.commodity_group)?;

        for (field, value) in [
            ("registry.token_timeout_seconds", self.token_timeout_seconds()),
            ("registry.info_timeout_seconds", self.info_timeout_seconds()),
            ("registry.document_timeout_seconds", self.document_timeout_seconds()),
            ("registry.probe_timeout_seconds", self.probe_timeout_seconds()),
        ] {
            validate_range(field, value, 1, 300)?;
        }

        validate_non_empty_string("ledger.table", &self.ledger.table)?;
        if let Some(archive) = &self.ledger.archive_table {
            validate_non_empty_string("ledger.archive_table", archive)?;
        }
        validate_path("output.output_path", &self.output.output_path)?;

        Ok(())
    }

    pub fn token_timeout_seconds(&self) -> u64 {
        self.registry.token_timeout_seconds.unwrap_or(10)
    }

    pub fn info_timeout_seconds(&self) -> u64 {
        self.registry.info_timeout_seconds.unwrap_or(30)
    }

    pub fn document_timeout_seconds(&self) -> u64 {
        self.registry.document_timeout_seconds.unwrap_or(10)
    }

    pub fn probe_timeout_seconds(&self) -> u64 {
        self.registry.probe_timeout_seconds.unwrap_or(10)
    }

    /// Registry login, required once a registry lookup is asked for.
    pub fn require_credentials(&self) -> Result<RegistryCredentials> {
        let username = validate_required_field("registry.username", &self.registry.username)?;
        let password = validate_required_field("registry.password", &self.registry.password)?;
        Ok(RegistryCredentials {
            username: username.clone(),
            password: password.clone(),
        })
    }
}

impl ConfigProvider for TomlConfig {
    fn registry(&self) -> RegistrySettings {
        RegistrySettings {
            token_url: self.registry.token_url.clone(),
            info_url: self.registry.info_url.clone(),
            document_url: self.registry.document_url.clone(),
            document_auth: self.registry.document_auth.clone(),
            commodity_group: self.registry.commodity_group.clone(),
            token_timeout_seconds: self.token_timeout_seconds(),
            info_timeout_seconds: self.info_timeout_seconds(),
            document_timeout_seconds: self.document_timeout_seconds(),
            probe_timeout_seconds: self.probe_timeout_seconds(),
        }
    }

    fn ledger(&self) -> LedgerSettings {
        let mut ledger = LedgerSettings::new(self.ledger.table.clone());
        if let Some(archive) = &self.ledger.archive_table {
            ledger.archive_table = archive.clone();
        }
        ledger.prod_group = self.ledger.prod_group.clone();
        ledger
    }

    fn credentials(&self) -> Option<RegistryCredentials> {
        self.require_credentials().ok()
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
