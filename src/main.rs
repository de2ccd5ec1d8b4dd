//! `fetch-adapter`: dispatch one request from the command line.
//!
//! The request comes from a TOML file (`--config`), flags, or both; flags
//! win, and the merged request is validated once. The settled outcome is
//! printed as JSON on stdout and logs go to stderr. Exits 1 when the
//! dispatch rejects and 2 when the request is invalid.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::{json, Value};

use fetch_adapter::config::loader::{read_config, RequestFile};
use fetch_adapter::config::validation::validate_config;
use fetch_adapter::config::RequestConfig;
use fetch_adapter::observability::logging::init_logging;
use fetch_adapter::security::{BasicAuth, DocumentEnvironment};
use fetch_adapter::{
    Adapter, CancelSource, Rejection, RequestBody, ReqwestTransport, StandardizedResponse,
};

#[derive(Parser)]
#[command(name = "fetch-adapter")]
#[command(about = "Dispatch a single HTTP request and print the settled outcome", long_about = None)]
struct Cli {
    /// Target URL (overrides the file's `url`)
    url: Option<String>,

    /// Request file with `[adapter]` and `[request]` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short = 'X', long)]
    method: Option<String>,

    /// Header as `name:value`; repeatable
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body, sent as text
    #[arg(short, long)]
    data: Option<String>,

    /// Send `--data` as JSON
    #[arg(long, requires = "data")]
    json: bool,

    /// Basic auth as `user:password`
    #[arg(short, long)]
    user: Option<String>,

    /// Timeout in milliseconds (0 = none)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Cancel the dispatch after this many milliseconds
    #[arg(long)]
    cancel_after: Option<u64>,

    /// Document origin; enables same-origin anti-forgery handling
    #[arg(long)]
    origin: Option<String>,

    /// Document cookies (`a=b; c=d`), read for the anti-forgery token
    #[arg(long, requires = "origin")]
    cookie: Option<String>,

    /// Log level (overrides the file's `[adapter] log_level`)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut file = match &cli.config {
        Some(path) => match read_config(path) {
            Ok(file) => file,
            Err(e) => {
                init_logging(cli.log_level.as_deref().unwrap_or("info"));
                tracing::error!(path = %path.display(), error = %e, "Invalid configuration");
                return Ok(ExitCode::from(2));
            }
        },
        None => RequestFile::default(),
    };
    init_logging(cli.log_level.as_deref().unwrap_or(&file.adapter.log_level));

    if let Err(error) = apply_flags(&cli, &mut file.request) {
        tracing::error!(%error, "Invalid flag");
        return Ok(ExitCode::from(2));
    }
    if let Err(errors) = validate_config(&file.request) {
        for error in &errors {
            tracing::error!(%error, "Invalid request");
        }
        return Ok(ExitCode::from(2));
    }
    let config = &mut file.request;

    let mut adapter = Adapter::new(ReqwestTransport::with_settings(&file.adapter)?);
    if let Some(origin) = &cli.origin {
        let environment = DocumentEnvironment::new(origin.parse()?)
            .with_cookies(cli.cookie.clone().unwrap_or_default());
        adapter = adapter.with_environment(Arc::new(environment));
    }

    let canceller = cli.cancel_after.map(|after| {
        let source = CancelSource::new();
        config.cancel_token = Some(source.token());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(after)).await;
            source.cancel(format!("cancelled after {}ms", after));
        })
    });

    tracing::info!(url = %config.full_url(), method = %config.method, "Dispatching");
    let outcome = adapter.dispatch(file.request).await;
    if let Some(canceller) = canceller {
        canceller.abort();
    }

    let (report, code) = match &outcome {
        Ok(response) => (resolved(response), ExitCode::SUCCESS),
        Err(rejection) => (rejected(rejection), ExitCode::from(1)),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(code)
}

/// Overlay command-line flags on the file's request.
fn apply_flags(cli: &Cli, config: &mut RequestConfig) -> Result<(), String> {
    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(method) = &cli.method {
        config.method = method.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }
    for header in &cli.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("header {:?} is not name:value", header))?;
        config.headers.set(name.trim(), value.trim());
    }
    if let Some(data) = &cli.data {
        config.data = Some(if cli.json {
            RequestBody::Json(serde_json::from_str(data).map_err(|e| format!("--data is not JSON: {}", e))?)
        } else {
            RequestBody::Text(data.clone())
        });
    }
    if let Some(user) = &cli.user {
        let (username, password) = user.split_once(':').unwrap_or((user.as_str(), ""));
        config.auth = Some(BasicAuth::new(username, password));
    }
    Ok(())
}

fn resolved(response: &StandardizedResponse) -> Value {
    json!({
        "status": response.status,
        "statusText": response.status_text,
        "headers": response.headers,
        "data": response.data,
        "request": {
            "id": response.request.id.to_string(),
            "method": response.request.method,
            "url": response.request.url.as_str(),
        },
    })
}

fn rejected(rejection: &Rejection) -> Value {
    match rejection {
        Rejection::Cancelled(reason) => json!({
            "cancelled": true,
            "message": reason.message,
        }),
        Rejection::Failed(error) => json!({
            "kind": format!("{:?}", error.kind),
            "message": error.message,
            "code": error.code.map(|code| code.to_string()),
            "response": error.response,
            "cause": error.cause.as_ref().map(|cause| cause.to_string()),
            "request": error.request.as_ref().map(|request| json!({
                "id": request.id.to_string(),
                "method": request.method,
                "url": request.url.as_str(),
            })),
        }),
    }
}
