use anyhow::Result;
use httpmock::prelude::*;
use markcheck::core::service::{CodeBatchRequest, LookupRequest};
use markcheck::core::sql::SqlParams;
use markcheck::core::ConfigProvider;
use markcheck::domain::model::{LookupStage, RegistryCredentials, RegistryLookup};
use markcheck::{HttpRegistryClient, MarkError, MarkService, TomlConfig, Transition};
use serde_json::json;

const UNIT: &str = "0104870050000413215915270434233";

fn config_for(server: &MockServer) -> Result<TomlConfig> {
    let toml_content = format!(
        r#"
[registry]
token_url = "{}"
info_url = "{}"
document_url = "{}"
username = "operator"
password = "secret"
document_auth = "b3BlcmF0b3I6c2VjcmV0"
info_timeout_seconds = 5

[ledger]
prod_group = "pharma"
"#,
        server.url("/auth/token"),
        server.url("/info-km"),
        server.url("/codesList")
    );
    Ok(TomlConfig::from_toml_str(&toml_content)?)
}

fn service_for(config: &TomlConfig) -> MarkService<HttpRegistryClient> {
    MarkService::new(HttpRegistryClient::new(config.registry()), config.ledger())
}

fn lookup_request(config: &TomlConfig, codes_json: &str) -> CodeBatchRequest {
    CodeBatchRequest {
        codes_json: codes_json.to_string(),
        transition: Transition::ActivateUnit,
        params: SqlParams::new("pharma", 1),
        lookup: Some(LookupRequest {
            bin: "850702450693".to_string(),
            credentials: config.credentials().expect("credentials configured"),
        }),
    }
}

/// token → code info → SQL, all in one batch
#[tokio::test]
async fn test_code_batch_with_registry_lookup() -> Result<()> {
    let server = MockServer::start();
    let token_mock = server.mock(|when, then| {
        when.method(POST).path("/auth/token").body_contains("username=operator");
        then.status(200).json_body(json!({"access_token": "tok-1"}));
    });
    let info_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/info-km")
            .header("Authorization", "Bearer tok-1")
            .json_body(json!({"bin": "850702450693", "codes": [UNIT]}));
        then.status(200)
            .json_body(json!({"marks": [{"code": UNIT, "status": "INTRODUCED"}]}));
    });

    let config = config_for(&server)?;
    let service = service_for(&config);
    let codes = format!(r#"["{}", "015", "00348700051500007798"]"#, UNIT);

    let outcome = service.process_codes(&lookup_request(&config, &codes)).await?;

    token_mock.assert();
    info_mock.assert();
    assert_eq!(outcome.sql.total_input, 3);
    assert_eq!(outcome.sql.processed, 1);
    assert_eq!(outcome.sql.skipped, 2);
    assert_eq!(
        outcome.registry.payload().unwrap()["marks"][0]["status"],
        "INTRODUCED"
    );
    Ok(())
}

#[tokio::test]
async fn test_code_batch_survives_token_rejection() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/auth/token");
        then.status(401);
    });
    let info_mock = server.mock(|when, then| {
        when.method(POST).path("/info-km");
        then.status(200).json_body(json!({}));
    });

    let config = config_for(&server)?;
    let service = service_for(&config);
    let codes = format!(r#"["{}"]"#, UNIT);

    let outcome = service.process_codes(&lookup_request(&config, &codes)).await?;

    assert_eq!(info_mock.hits(), 0);
    assert_eq!(outcome.sql.statements.len(), 1);
    match outcome.registry {
        RegistryLookup::Unavailable { stage, reason } => {
            assert_eq!(stage, LookupStage::Token);
            assert!(reason.contains("401"));
        }
        other => panic!("expected unavailable lookup, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_code_batch_survives_info_failure() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/auth/token");
        then.status(200).json_body(json!({"access_token": "tok-1"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/info-km");
        then.status(500);
    });

    let config = config_for(&server)?;
    let service = service_for(&config);
    let codes = format!(r#"["{}"]"#, UNIT);

    let outcome = service.process_codes(&lookup_request(&config, &codes)).await?;

    assert_eq!(outcome.sql.processed, 1);
    assert!(outcome.registry.payload().is_none());
    let json = serde_json::to_value(&outcome)?;
    assert_eq!(json["registry"]["status"], "unavailable");
    assert_eq!(json["registry"]["stage"], "code_info");
    Ok(())
}

#[tokio::test]
async fn test_reconcile_registry_document() -> Result<()> {
    let server = MockServer::start();
    let doc_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/codesList/DOC-7")
            .header("Innbin", "850702450693")
            .header("Commoditygroup", "pharma");
        then.status(200).json_body(json!({
            "marks": [
                "010487000500004121aaa",
                "010487000500004121aaa",
                "010487000500004121bbb",
                "010487000500005821ccc",
                "0299999999999"
            ]
        }));
    });

    let config = config_for(&server)?;
    let service = service_for(&config);
    let products = r#"[
        {"gtin": "4870005000041", "price": 10, "total": 0, "productName": "Aspirin", "totalAmount": 0},
        {"gtin": "4870005000058", "price": 2.5, "total": 0, "productName": "Ibuprofen", "totalAmount": 0},
        {"gtin": "4870005000065", "price": 7, "total": 5, "productName": "Paracetamol", "totalAmount": 35}
    ]"#;

    let result = service
        .reconcile_document(products, "DOC-7", "850702450693")
        .await?;

    doc_mock.assert();
    assert_eq!(result.total_distinct_codes, 4);
    let counts: Vec<(String, usize)> = result
        .per_gtin_counts
        .iter()
        .map(|c| (c.gtin.clone(), c.count))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("4870005000041".to_string(), 2),
            ("4870005000058".to_string(), 1),
            ("4870005000065".to_string(), 0),
        ]
    );
    assert_eq!(result.updated_products[0].total_amount, 20.0);
    assert_eq!(result.updated_products[1].total_amount, 2.5);
    assert_eq!(result.updated_products[2].total, 0);

    let json = serde_json::to_value(&result)?;
    assert_eq!(json["updatedProducts"][0]["productName"], "Aspirin");
    assert_eq!(json["perGtinCounts"][1]["count"], 1);
    Ok(())
}

#[tokio::test]
async fn test_reconcile_aborts_on_bad_products_before_calling_registry() -> Result<()> {
    let server = MockServer::start();
    let doc_mock = server.mock(|when, then| {
        when.method(GET).path("/codesList/DOC-7");
        then.status(200).json_body(json!({"marks": []}));
    });

    let config = config_for(&server)?;
    let service = service_for(&config);

    let err = service
        .reconcile_document(r#"{"gtin": "1"}"#, "DOC-7", "850702450693")
        .await
        .unwrap_err();

    assert!(matches!(err, MarkError::ValidationError { .. }));
    assert_eq!(doc_mock.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_reconcile_registry_failure_is_reported() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/codesList/DOC-7");
        then.status(403);
    });

    let config = config_for(&server)?;
    let service = service_for(&config);

    let err = service
        .reconcile_document(r#"[{"gtin": "1", "price": 1}]"#, "DOC-7", "850702450693")
        .await
        .unwrap_err();

    assert!(err.is_registry_failure());
    assert!(err.user_friendly_message().contains("403"));
    Ok(())
}

#[tokio::test]
async fn test_replay_captured_curl() -> Result<()> {
    let server = MockServer::start();
    let info_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/info-km")
            .header("Authorization", "Bearer ABC123")
            .json_body(json!({"bin": "850702450693", "codes": ["010463000218039221ucbQbWrD3sJc7"]}));
        then.status(200).json_body(json!({"marks": []}));
    });

    let config = config_for(&server)?;
    let service = service_for(&config);
    let captured = format!(
        r#"curl --request POST \
  --url {} \
  --header 'Authorization: Bearer ABC123' \
  --header 'Content-Type: application/json' \
  --data '{{
  "bin": "850702450693",
  "codes": [
"010463000218039221ucbQbWrD3sJc7"
  ]
}}'"#,
        server.url("/info-km")
    );

    let (extraction, payload) = service.replay_curl(&captured).await?;

    info_mock.assert();
    assert_eq!(extraction.token.as_deref(), Some("ABC123"));
    assert_eq!(payload, json!({"marks": []}));
    Ok(())
}

#[tokio::test]
async fn test_check_token_against_registry() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/info-km")
            .header("Authorization", "Bearer good");
        then.status(400);
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/info-km")
            .header("Authorization", "Bearer expired");
        then.status(401);
    });

    let config = config_for(&server)?;
    let service = service_for(&config);

    assert!(service.check_token("good").await);
    assert!(!service.check_token("expired").await);
    Ok(())
}

#[test]
fn test_credentials_require_both_fields() -> Result<()> {
    let config = TomlConfig::from_toml_str("[registry]\nusername = \"operator\"\n")?;
    assert!(config.credentials().is_none());

    let creds = RegistryCredentials {
        username: "operator".to_string(),
        password: "secret".to_string(),
    };
    assert!(!format!("{:?}", creds).contains("secret"));
    Ok(())
}
