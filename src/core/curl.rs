use crate::domain::model::CurlExtraction;

const AUTH_MARKER: &str = "Authorization: Bearer";
const BEARER: &str = "Bearer ";
const DATA_MARKER: &str = "--data";

/// Pulls token, BIN and codes out of a pasted `curl` command.
///
/// Never fails: every field is recovered independently, and a field that can't be
/// found is left empty.
pub fn extract(raw_command: &str) -> CurlExtraction {
    let token = extract_token(raw_command);
    let (bin, codes) = extract_body(raw_command).unwrap_or_default();

    CurlExtraction { token, bin, codes }
}

pub fn extract_token(raw_command: &str) -> Option<String> {
    let line = raw_command.lines().find(|line| line.contains(AUTH_MARKER))?;
    let start = line.find(BEARER)? + BEARER.len();
    let rest = &line[start..];
    let end = rest.find(|c: char| c == '\'' || c == '"').unwrap_or(rest.len());

    let token = rest[..end].trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn extract_body(raw_command: &str) -> Option<(Option<String>, Vec<String>)> {
    let section = &raw_command[raw_command.find(DATA_MARKER)?..];
    let start = section.find('{')?;
    let end = section.rfind('}')?;
    if end < start {
        return None;
    }

    let body: serde_json::Value = match serde_json::from_str(&section[start..=end]) {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("curl --data body is not valid JSON: {}", e);
            return None;
        }
    };

    let bin = match body.get("bin") {
        Some(serde_json::Value::String(bin)) => Some(bin.clone()),
        Some(serde_json::Value::Number(bin)) => Some(bin.to_string()),
        _ => None,
    };
    let codes = body
        .get("codes")
        .and_then(|codes| codes.as_array())
        .map(|codes| {
            codes
                .iter()
                .filter_map(|code| code.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Some((bin, codes))
}
