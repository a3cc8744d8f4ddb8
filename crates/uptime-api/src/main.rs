//! Uptime operator CLI
//!
//! Dispatches single requests against the on-disk record store and manages
//! the log archive, including the periodic rotation worker.
//!
//! User-facing output uses writeln! to stdout; logs go to stderr.

mod logs_cmd;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use uptime_api::server::{Request, Router};
use uptime_core::config::{Config, load_config};
use uptime_core::logs::LogArchive;

use crate::logs_cmd::LogsAction;

#[derive(Parser, Debug)]
#[command(name = "uptime")]
#[command(version, about = "Uptime record store and log archive")]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Entity store directory (overrides config and UPTIME_DATA_DIR).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log archive directory (overrides config and UPTIME_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch one request and print the response
    Request {
        /// get, post, put or delete
        method: String,
        /// e.g. api/users
        path: String,
        /// Caller token, bare or as "Bearer <id>"
        #[arg(long)]
        token: Option<String>,
        /// Query parameter, repeatable
        #[arg(long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
    /// Inspect and maintain the log archive
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
    /// Compress and truncate every active log
    Rotate {
        /// Keep running, rotating every logs.rotation_interval_secs
        #[arg(long)]
        watch: bool,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir.clone_from(dir);
    }
    if let Some(dir) = &cli.log_dir {
        config.logs.dir.clone_from(dir);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    uptime_core::tracing_init::init_tracing("uptime_api=info,uptime_core=info", cli.log_json);

    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Request {
            method,
            path,
            token,
            query,
            body,
        } => {
            let body = match body {
                Some(raw) => serde_json::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("--body is not valid JSON: {e}"))?,
                None => serde_json::Value::Null,
            };
            let mut req = Request::new(method, path)
                .with_token(token.as_deref())
                .with_body(body);
            for (key, value) in query {
                req = req.with_query(key, value);
            }

            let router = Router::from_config(&config).await?;
            let resp = router.dispatch(&req).await;
            writeln!(io::stdout(), "{}", serde_json::to_string_pretty(&resp)?)?;

            Ok(if resp.status_code < 400 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Logs { action } => {
            let archive = LogArchive::open(config.logs.dir.clone()).await?;
            logs_cmd::run(&archive, action).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Rotate { watch } => {
            let archive = LogArchive::open(config.logs.dir.clone()).await?;
            if watch {
                watch_rotation(&archive, Duration::from_secs(config.logs.rotation_interval_secs))
                    .await;
                Ok(ExitCode::SUCCESS)
            } else {
                let report = archive.rotate().await?;
                logs_cmd::print_report(&report)?;
                Ok(if report.is_clean() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                })
            }
        }
    }
}

/// Rotate on a fixed interval until interrupted.
async fn watch_rotation(archive: &LogArchive, every: Duration) {
    info!(
        dir = %archive.dir().display(),
        interval_secs = every.as_secs(),
        "Rotation worker started"
    );

    let mut interval = tokio::time::interval(every);
    interval.tick().await; // Skip first immediate tick
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match archive.rotate().await {
                    Ok(report) if report.is_clean() => {
                        info!(
                            rotated = report.rotated.len(),
                            skipped = report.skipped_empty.len(),
                            "Rotation pass completed"
                        );
                    }
                    Ok(report) => {
                        warn!(
                            rotated = report.rotated.len(),
                            failed = report.failed.len(),
                            "Rotation pass completed with failures"
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, "Rotation pass failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    info!("Rotation worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("id=a=b"),
            Ok(("id".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_val("phone").is_err());
    }

    #[test]
    fn cli_parses_request_with_queries() {
        let cli = Cli::try_parse_from([
            "uptime",
            "--data-dir",
            "/tmp/data",
            "request",
            "get",
            "api/users",
            "--token",
            "abc",
            "--query",
            "phone=5551234567",
        ])
        .ok();
        let Some(cli) = cli else {
            unreachable!("request arguments should parse");
        };
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        match cli.command {
            Command::Request { query, token, .. } => {
                assert_eq!(query, vec![("phone".into(), "5551234567".into())]);
                assert_eq!(token.as_deref(), Some("abc"));
            }
            other => unreachable!("unexpected command {other:?}"),
        }
    }
}
