use chrono::Utc;
use clap::Parser;
use markcheck::config::Command;
use markcheck::core::report;
use markcheck::core::service::{CodeBatchRequest, LookupRequest};
use markcheck::core::sql::SqlParams;
use markcheck::core::{ConfigProvider, Storage};
use markcheck::utils::error::ErrorSeverity;
use markcheck::utils::{logger, validation::Validate};
use markcheck::{
    CliConfig, HttpRegistryClient, LocalStorage, MarkError, MarkService, Result, TomlConfig,
};
use std::io::Read;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting markcheck");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ markcheck failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: CliConfig) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            TomlConfig::from_file(path)?
        }
        None => TomlConfig::default(),
    };
    if let Some(output_path) = &cli.output_path {
        config.output.output_path = output_path.clone();
    }
    if cli.write_files {
        config.output.write_files = true;
    }
    config.validate()?;

    let storage = LocalStorage::new(config.output_path().to_string());
    let service = MarkService::new(HttpRegistryClient::new(config.registry()), config.ledger());
    let now = Utc::now();

    match cli.command {
        Command::Reconcile {
            products,
            document_id,
            innbin,
            codes,
        } => {
            let products_json = read_input(&products)?;
            let result = match (document_id, innbin, codes) {
                (Some(document_id), Some(innbin), None) => {
                    service
                        .reconcile_document(&products_json, &document_id, &innbin)
                        .await?
                }
                (None, _, Some(codes)) => {
                    let codes: Vec<String> = serde_json::from_str(&read_input(&codes)?)
                        .map_err(|e| MarkError::parse(format!("codes file: {}", e)))?;
                    service.reconcile_codes(&products_json, &codes)?
                }
                _ => {
                    return Err(MarkError::validation(
                        "reconcile needs either --document-id with --innbin, or --codes",
                    ))
                }
            };

            println!("{}", serde_json::to_string_pretty(&result)?);

            if config.output.write_files {
                let stamp = report::file_stamp(now);
                let products_name = format!("updated_products_{}.json", stamp);
                let counts_name = format!("gtin_counts_{}.csv", stamp);
                storage
                    .write_file(
                        &products_name,
                        serde_json::to_string_pretty(&result.updated_products)?.as_bytes(),
                    )
                    .await?;
                storage
                    .write_file(
                        &counts_name,
                        report::gtin_counts_csv(&result.per_gtin_counts)?.as_bytes(),
                    )
                    .await?;
                tracing::info!("📁 Output saved to: {}", storage.full_path(&products_name));
                tracing::info!("📁 Output saved to: {}", storage.full_path(&counts_name));
            }
        }

        Command::Sql {
            codes,
            transition,
            prod_group,
            type_value,
            bin,
            lookup,
        } => {
            let prod_group = prod_group.unwrap_or_else(|| service.ledger().prod_group.clone());
            let lookup = match (lookup, bin) {
                (true, Some(bin)) => Some(LookupRequest {
                    bin,
                    credentials: config.require_credentials()?,
                }),
                _ => None,
            };
            let request = CodeBatchRequest {
                codes_json: read_input(&codes)?,
                transition,
                params: SqlParams::new(prod_group, type_value),
                lookup,
            };

            let outcome = service.process_codes(&request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if config.output.write_files {
                let name = report::sql_file_name(transition, now);
                storage
                    .write_file(
                        &name,
                        report::sql_script(&outcome.sql, transition, now).as_bytes(),
                    )
                    .await?;
                tracing::info!("📁 Output saved to: {}", storage.full_path(&name));
            }
        }

        Command::Curl { input, replay } => {
            let raw = read_input(&input)?;
            if replay {
                let (extraction, payload) = service.replay_curl(&raw).await?;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "bin": extraction.bin,
                        "codes": extraction.codes,
                        "tokenFound": extraction.token.is_some(),
                        "response": payload,
                    }))?
                );
            } else {
                let extraction = markcheck::core::curl::extract(&raw);
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            }
        }

        Command::CheckToken { token } => {
            let valid = service.check_token(&token).await;
            println!("{}", serde_json::json!({ "valid": valid }));
        }
    }

    Ok(())
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(std::fs::read_to_string(path)?)
}
