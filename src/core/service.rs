use crate::core::classifier::classify_value;
use crate::core::curl;
use crate::core::input::{parse_code_list, parse_products};
use crate::core::reconcile::{extract_marks, reconcile};
use crate::core::sql::{generate, SqlParams, Transition};
use crate::domain::model::{
    CodeBatchOutcome, CurlExtraction, LookupStage, ReconciliationResult, RegistryCredentials,
    RegistryLookup, RegistryToken, SqlBatchResult,
};
use crate::domain::ports::{LedgerSettings, RegistryClient};
use crate::utils::error::{MarkError, Result};

/// Optional registry lookup riding along with a code batch.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub bin: String,
    pub credentials: RegistryCredentials,
}

#[derive(Debug, Clone)]
pub struct CodeBatchRequest {
    pub codes_json: String,
    pub transition: Transition,
    pub params: SqlParams,
    pub lookup: Option<LookupRequest>,
}

pub struct MarkService<R: RegistryClient> {
    registry: R,
    ledger: LedgerSettings,
}

impl<R: RegistryClient> MarkService<R> {
    pub fn new(registry: R, ledger: LedgerSettings) -> Self {
        Self { registry, ledger }
    }

    pub fn ledger(&self) -> &LedgerSettings {
        &self.ledger
    }

    /// Statement generation only; never touches the registry.
    pub fn generate_sql(
        &self,
        codes_json: &str,
        transition: Transition,
        params: &SqlParams,
    ) -> Result<SqlBatchResult> {
        params.validate(transition)?;
        let candidates = parse_code_list(codes_json)?;
        self.generate_from(&candidates, transition, params)
    }

    fn generate_from(
        &self,
        candidates: &[serde_json::Value],
        transition: Transition,
        params: &SqlParams,
    ) -> Result<SqlBatchResult> {
        let result = generate(candidates, transition, params, &self.ledger)?;
        tracing::info!(
            "Generated {} {} statements ({} of {} codes skipped)",
            result.processed,
            transition,
            result.skipped,
            result.total_input
        );
        Ok(result)
    }

    /// Generates statements and, when asked, looks the valid codes up in the registry.
    ///
    /// The lookup is advisory: a failed token exchange or info call is reported in
    /// `registry` and the statements are returned regardless.
    pub async fn process_codes(&self, request: &CodeBatchRequest) -> Result<CodeBatchOutcome> {
        request.params.validate(request.transition)?;
        let candidates = parse_code_list(&request.codes_json)?;
        let sql = self.generate_from(&candidates, request.transition, &request.params)?;

        let registry = match &request.lookup {
            None => RegistryLookup::NotRequested,
            Some(lookup) => {
                let family = request.transition.family(&request.params);
                let valid_codes: Vec<String> = candidates
                    .iter()
                    .map(|candidate| classify_value(candidate, family))
                    .filter(|mark| mark.valid)
                    .map(|mark| mark.raw)
                    .collect();

                if valid_codes.is_empty() {
                    tracing::info!("No valid codes to look up, skipping registry call");
                    RegistryLookup::NotRequested
                } else {
                    self.lookup_codes(lookup, &valid_codes).await
                }
            }
        };

        Ok(CodeBatchOutcome { sql, registry })
    }

    async fn lookup_codes(&self, lookup: &LookupRequest, codes: &[String]) -> RegistryLookup {
        let token = match self.registry.acquire_token(&lookup.credentials).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("⚠️ Token exchange failed, continuing without registry data: {}", e);
                return RegistryLookup::Unavailable {
                    stage: LookupStage::Token,
                    reason: e.to_string(),
                };
            }
        };

        match self
            .registry
            .fetch_code_info(&token, &lookup.bin, codes)
            .await
        {
            Ok(payload) => {
                tracing::info!("Fetched registry info for {} codes", codes.len());
                RegistryLookup::Fetched { payload }
            }
            Err(e) => {
                tracing::warn!("⚠️ Code info lookup failed, continuing without registry data: {}", e);
                RegistryLookup::Unavailable {
                    stage: LookupStage::CodeInfo,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Reconciles products against the marks attached to a registry document.
    ///
    /// Products are parsed before any outbound call. A registry failure aborts the batch.
    pub async fn reconcile_document(
        &self,
        products_json: &str,
        document_id: &str,
        innbin: &str,
    ) -> Result<ReconciliationResult> {
        let products = parse_products(products_json)?;
        if document_id.trim().is_empty() {
            return Err(MarkError::validation("document id cannot be empty"));
        }
        if innbin.trim().is_empty() {
            return Err(MarkError::validation("INN/BIN cannot be empty"));
        }

        let payload = self
            .registry
            .fetch_document_codes(document_id, innbin)
            .await?;
        let marks = extract_marks(&payload);
        tracing::info!(
            "Document {} returned {} marks for {} products",
            document_id,
            marks.len(),
            products.len()
        );

        Ok(reconcile(products, &marks))
    }

    /// Reconciles products against codes the caller already holds.
    pub fn reconcile_codes(&self, products_json: &str, codes: &[String]) -> Result<ReconciliationResult> {
        let products = parse_products(products_json)?;
        Ok(reconcile(products, codes))
    }

    /// Re-issues the code-info call captured in a `curl` command.
    pub async fn replay_curl(&self, raw_command: &str) -> Result<(CurlExtraction, serde_json::Value)> {
        let extraction = curl::extract(raw_command);

        let token = extraction
            .token
            .as_deref()
            .ok_or_else(|| MarkError::validation("no bearer token found in curl command"))?;
        let bin = extraction
            .bin
            .as_deref()
            .ok_or_else(|| MarkError::validation("no BIN found in curl command"))?;
        if extraction.codes.is_empty() {
            return Err(MarkError::validation("no mark codes found in curl command"));
        }

        tracing::info!("Replaying code info request for {} codes", extraction.codes.len());
        let payload = self
            .registry
            .fetch_code_info(&RegistryToken::new(token), bin, &extraction.codes)
            .await?;

        Ok((extraction, payload))
    }

    pub async fn check_token(&self, token: &str) -> bool {
        self.registry.validate_token(&RegistryToken::new(token)).await
    }
}
