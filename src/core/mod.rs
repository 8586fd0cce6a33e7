pub mod classifier;
pub mod curl;
pub mod input;
pub mod reconcile;
pub mod report;
pub mod service;
pub mod sql;

pub use crate::domain::model::{
    CodeBatchOutcome, CodeFamily, CodeKind, CurlExtraction, MarkCode, Product,
    ReconciliationResult, SqlBatchResult,
};
pub use crate::domain::ports::{ConfigProvider, LedgerSettings, RegistryClient, Storage};
pub use crate::utils::error::Result;
