//! `lightrelay validate` — check settings without starting the server.
//!
//! Reads the same flags and `LR_*` environment variables as `run`,
//! validates them, and reports in human-readable text or JSON.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::{validation, Settings};
use crate::error::RelayError;

pub fn execute(args: &ValidateArgs) -> Result<(), RelayError> {
    if let Err(errors) = validation::validate(&args.relay) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} settings have {} errors\n", errors.len());
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            ValidateFormat::Json => {
                let json_errors: Vec<serde_json::Value> = errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "field": e.field,
                            "message": e.message,
                            "suggestion": e.suggestion,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": false,
                        "errors": json_errors,
                    })
                );
            }
        }
        return Err(RelayError::ConfigValidation { errors });
    }

    let settings = Settings::from_args(&args.relay)?;

    match args.format {
        ValidateFormat::Text => {
            println!("\u{2713} {}", validation::format_validation_report(&settings));
        }
        ValidateFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "connect_timeout_secs": settings.connect_timeout.as_secs_f64(),
                    "read_timeout_secs": settings.read_timeout.as_secs_f64(),
                    "pool_connections": settings.pool.max_connections,
                    "pool_maxsize": settings.pool.max_per_route,
                    "static_proxy": settings.static_proxy.as_ref().map(|p| p.masked()),
                    "forward_auth": settings.forward_auth,
                    "log_requests": settings.log_requests,
                    "redirect_allowlist_only": settings.redirect_allowlist_only,
                })
            );
        }
    }

    Ok(())
}
