use crate::core::classifier::classify_value;
use crate::domain::model::{CodeFamily, MarkCode, SkipCounts, SqlBatchResult};
use crate::domain::ports::LedgerSettings;
use crate::utils::error::{MarkError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    ActivateUnit,
    ActivateAggregate,
    ArchiveUnit,
    ArchiveAggregate,
    DeleteUnit,
    Deactivate,
}

impl Transition {
    pub const ALL: [Transition; 6] = [
        Transition::ActivateUnit,
        Transition::ActivateAggregate,
        Transition::ArchiveUnit,
        Transition::ArchiveAggregate,
        Transition::DeleteUnit,
        Transition::Deactivate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::ActivateUnit => "activate-unit",
            Transition::ActivateAggregate => "activate-aggregate",
            Transition::ArchiveUnit => "archive-unit",
            Transition::ArchiveAggregate => "archive-aggregate",
            Transition::DeleteUnit => "delete-unit",
            Transition::Deactivate => "deactivate",
        }
    }

    /// Family codes must belong to. Deactivate follows the `"Type"` it targets.
    pub fn family(self, params: &SqlParams) -> CodeFamily {
        match self {
            Transition::ActivateUnit | Transition::ArchiveUnit | Transition::DeleteUnit => {
                CodeFamily::Unit
            }
            Transition::ActivateAggregate | Transition::ArchiveAggregate => CodeFamily::Aggregate,
            Transition::Deactivate => {
                if params.type_value == CodeFamily::Unit.ledger_type() {
                    CodeFamily::Unit
                } else {
                    CodeFamily::Aggregate
                }
            }
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transition {
    type Err = MarkError;

    fn from_str(s: &str) -> Result<Self> {
        Transition::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Transition::ALL.iter().map(|t| t.as_str()).collect();
                MarkError::validation(format!(
                    "unknown transition '{}', expected one of: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlParams {
    pub prod_group: String,
    pub type_value: i64,
}

impl SqlParams {
    pub fn new(prod_group: impl Into<String>, type_value: i64) -> Self {
        Self {
            prod_group: prod_group.into(),
            type_value,
        }
    }

    pub fn validate(&self, transition: Transition) -> Result<()> {
        if self.prod_group.trim().is_empty() {
            return Err(MarkError::validation("prod_group cannot be empty"));
        }
        if transition == Transition::Deactivate && !matches!(self.type_value, 1 | 2) {
            return Err(MarkError::validation(format!(
                "deactivate needs type value 1 (unit) or 2 (aggregate), got {}",
                self.type_value
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
}

impl SqlValue {
    fn write_literal(&self, out: &mut String) {
        match self {
            SqlValue::Text(text) => {
                out.push('\'');
                out.push_str(&text.replace('\'', "''"));
                out.push('\'');
            }
            SqlValue::Int(value) => out.push_str(&value.to_string()),
        }
    }
}

/// A statement with `$n` placeholders and the values bound to them.
///
/// The target table is held apart from the clause so that only the clause is scanned
/// for placeholders. Table names may contain `$`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundStatement {
    pub verb: &'static str,
    pub table: String,
    pub clause: &'static str,
    pub params: Vec<SqlValue>,
}

impl BoundStatement {
    /// Statement text with placeholders left in place.
    pub fn template(&self) -> String {
        format!("{} {} {}", self.verb, self.table, self.clause)
    }

    /// Inlines the bound values as SQL literals, for scripts run by hand.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.table.len() + self.clause.len() + 64);
        out.push_str(self.verb);
        out.push(' ');
        out.push_str(&self.table);
        out.push(' ');

        let mut chars = self.clause.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(d);
                chars.next();
            }
            let slot = digits
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.params.get(i));
            match slot {
                Some(value) => value.write_literal(&mut out),
                None => {
                    out.push('$');
                    out.push_str(&digits);
                }
            }
        }
        out
    }
}

/// Builds the statement for one classified code, or `None` when the code is invalid.
pub fn build_statement(
    mark: &MarkCode,
    transition: Transition,
    params: &SqlParams,
    ledger: &LedgerSettings,
) -> Option<BoundStatement> {
    if !mark.valid {
        return None;
    }
    let code = SqlValue::Text(mark.raw.clone());
    let prod_group = SqlValue::Text(params.prod_group.clone());
    let gtin = || SqlValue::Text(mark.gtin.clone().unwrap_or_default());

    let (verb, table, clause, values) = match transition {
        Transition::ActivateUnit => (
            "UPDATE",
            &ledger.table,
            "SET temp_doc_id = 0 WHERE id = $1 and gtin = $2 AND \"Type\"=1 AND prod_group = $3;",
            vec![code, gtin(), prod_group],
        ),
        Transition::ActivateAggregate => (
            "UPDATE",
            &ledger.table,
            "SET temp_doc_id = 0 WHERE id = $1 AND \"Type\"=2 AND prod_group = $2;",
            vec![code, prod_group],
        ),
        Transition::ArchiveUnit | Transition::ArchiveAggregate => (
            "UPDATE",
            &ledger.archive_table,
            "SET origin_category = 'STATIONARY' WHERE id = $1 AND prod_group = $2;",
            vec![code, prod_group],
        ),
        Transition::DeleteUnit => (
            "DELETE FROM",
            &ledger.table,
            "WHERE id = $1 AND gtin = $2 AND \"Type\" = 1 AND prod_group = $3;",
            vec![code, gtin(), prod_group],
        ),
        Transition::Deactivate => (
            "UPDATE",
            &ledger.table,
            "SET in_circulation = false WHERE id = $1 AND \"Type\" = $2 AND gtin = '' AND prod_group = $3;",
            vec![code, SqlValue::Int(params.type_value), prod_group],
        ),
    };

    Some(BoundStatement {
        verb,
        table: table.clone(),
        clause,
        params: values,
    })
}

/// Classifies every candidate and renders one statement per valid code, in input order.
///
/// Repeated codes are not collapsed. Rejected codes only show up in the counters.
/// Fails with a `ValidationError` when `params` don't fit the transition.
pub fn generate(
    candidates: &[serde_json::Value],
    transition: Transition,
    params: &SqlParams,
    ledger: &LedgerSettings,
) -> Result<SqlBatchResult> {
    params.validate(transition)?;
    let family = transition.family(params);
    let mut skip_counts = SkipCounts::default();
    let mut statements = Vec::new();

    for candidate in candidates {
        let mark = classify_value(candidate, family);
        match build_statement(&mark, transition, params, ledger) {
            Some(statement) => statements.push(statement.render()),
            None => {
                if let Some(reason) = mark.rejection {
                    skip_counts.record(reason);
                }
            }
        }
    }

    Ok(SqlBatchResult {
        total_input: candidates.len(),
        processed: statements.len(),
        skipped: skip_counts.total(),
        skip_counts,
        statements,
    })
}
