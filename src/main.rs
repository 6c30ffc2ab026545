//! `scgi-request`: send one request to an SCGI backend and print the reply.
//!
//! ```text
//! scgi-request scgi://127.0.0.1:9000 -H 'REQUEST_URI: /status'
//! scgi-request scgi:///run/app.sock -X POST -d 'name=value' --json
//! ```

use std::path::PathBuf;

use bytes::Bytes;
use clap::Parser;
use serde_json::{json, Map, Value};

use scgi_client::config::{load_config, ClientConfig};
use scgi_client::http::reason_phrase;
use scgi_client::observability::logging::init_logging;
use scgi_client::{Client, Request, RoundTrip};

#[derive(Parser)]
#[command(name = "scgi-request")]
#[command(about = "Send a single request to an SCGI backend", long_about = None)]
struct Cli {
    /// Backend address, e.g. scgi://127.0.0.1:9000 or scgi:///run/app.sock
    address: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Extra header as `KEY: VALUE`, may be repeated
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short = 'd', long)]
    data: Option<String>,

    /// Protocol string sent as SERVER_PROTOCOL
    #[arg(long, default_value = "HTTP/1.1")]
    protocol: String,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the reply as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    init_logging(&config.logging)?;

    tracing::debug!(
        address = %cli.address,
        default_port = config.default_port,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    let mut request = Request::new(&cli.method).with_protocol(&cli.protocol);
    for header in &cli.headers {
        let (key, value) = header
            .split_once(':')
            .ok_or_else(|| format!("invalid header {:?}, expected `KEY: VALUE`", header))?;
        request.headers.append(key.trim(), value.trim());
    }
    if let Some(data) = cli.data {
        request.body = Bytes::from(data);
    }

    let client = Client::with_config(config);
    let response = client.round_trip(request, &cli.address).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response_json(&response))?);
    } else {
        print_response(&response);
    }
    Ok(())
}

fn print_response(response: &http::Response<Bytes>) {
    println!(
        "{:?} {} {}",
        response.version(),
        response.status().as_u16(),
        reason_phrase(response).unwrap_or_default()
    );
    for (name, value) in response.headers() {
        println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    println!();
    println!("{}", String::from_utf8_lossy(response.body()));
}

fn response_json(response: &http::Response<Bytes>) -> Value {
    let mut headers = Map::new();
    for name in response.headers().keys() {
        let values: Vec<Value> = response
            .headers()
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        headers.insert(name.to_string(), Value::Array(values));
    }

    json!({
        "status": response.status().as_u16(),
        "reason": reason_phrase(response),
        "headers": headers,
        "body": String::from_utf8_lossy(response.body()),
    })
}
