use crate::domain::model::{CodeFamily, CodeKind, MarkCode, SkipReason};

pub const MIN_CODE_LENGTH: usize = 16;
const GTIN_OFFSET: usize = 2;
const GTIN_LENGTH: usize = 14;

/// Classifies a raw code against the family the caller expects.
///
/// `kind` is read from the code itself (length and prefix); `valid` is true only when
/// it matches `expected`. For unit codes the GTIN is the 14 characters starting at
/// index 2, taken positionally with no checksum.
pub fn classify(code: &str, expected: CodeFamily) -> MarkCode {
    let kind = detect_kind(code);
    let gtin = (kind == CodeKind::Unit).then(|| extract_gtin(code));

    let rejection = if code.chars().count() < MIN_CODE_LENGTH {
        Some(SkipReason::TooShort)
    } else if !code.starts_with(expected.prefix()) {
        Some(SkipReason::WrongPrefix)
    } else {
        None
    };

    MarkCode {
        raw: code.to_string(),
        kind,
        valid: rejection.is_none(),
        gtin,
        rejection,
    }
}

/// Same as [`classify`] for a raw JSON element; anything but a string is rejected.
pub fn classify_value(value: &serde_json::Value, expected: CodeFamily) -> MarkCode {
    match value.as_str() {
        Some(code) => classify(code, expected),
        None => MarkCode {
            raw: value.to_string(),
            kind: CodeKind::Unknown,
            valid: false,
            gtin: None,
            rejection: Some(SkipReason::NotAString),
        },
    }
}

fn detect_kind(code: &str) -> CodeKind {
    if code.chars().count() < MIN_CODE_LENGTH {
        CodeKind::Unknown
    } else if code.starts_with(CodeFamily::Unit.prefix()) {
        CodeKind::Unit
    } else if code.starts_with(CodeFamily::Aggregate.prefix()) {
        CodeKind::Aggregate
    } else {
        CodeKind::Unknown
    }
}

fn extract_gtin(code: &str) -> String {
    code.chars().skip(GTIN_OFFSET).take(GTIN_LENGTH).collect()
}
