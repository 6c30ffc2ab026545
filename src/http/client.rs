//! SCGI round-trip client.
//!
//! # Responsibilities
//! - Resolve the target address
//! - Dial one connection per round trip
//! - Send the netstring-framed header block followed by the raw body
//! - Read the reply through the response adapter
//! - Log each stage and record round-trip metrics
//!
//! # Design Decisions
//! - `Client` holds only immutable configuration; it is `Clone + Send + Sync`
//!   and concurrent round trips share nothing
//! - The connection is owned by the call and closed on every exit path
//! - No retries and no timeouts; wrap calls in `tokio::time::timeout` for a
//!   deadline

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};

use crate::codec::{write_netstring, HeaderBlock};
use crate::config::ClientConfig;
use crate::error::{ScgiError, ScgiResult};
use crate::http::request::Request;
use crate::http::response::read_response;
use crate::net::{Connection, Target};
use crate::observability::metrics;

/// One request/response exchange with an SCGI backend.
#[async_trait]
pub trait RoundTrip: Send + Sync {
    /// Send `request` to the backend named by `address` and return its reply.
    async fn round_trip(&self, request: Request, address: &str) -> ScgiResult<http::Response<Bytes>>;
}

/// Stateless SCGI client.
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: Arc<ClientConfig>,
}

impl Client {
    /// Create a client with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with the given configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn exchange(&self, request: &Request, address: &str) -> ScgiResult<http::Response<Bytes>> {
        let target = Target::resolve(address, self.config.default_port)?;
        let mut conn = Connection::connect(&target).await?;
        let connection_id = conn.id();

        let block = HeaderBlock::from_request(request);
        tracing::debug!(
            connection_id = %connection_id,
            method = %request.method,
            headers = request.headers.len(),
            content_length = block.content_length(),
            "Sending SCGI request"
        );

        {
            let mut writer = BufWriter::new(&mut conn);
            write_netstring(&mut writer, &block.to_bytes()).await?;
            writer
                .write_all(&request.body)
                .await
                .map_err(|e| ScgiError::io("request body write", e))?;
            writer
                .flush()
                .await
                .map_err(|e| ScgiError::io("request flush", e))?;
        }

        let mut reader = BufReader::new(&mut conn);
        let response = read_response(
            &mut reader,
            &request.protocol,
            request.is_head(),
            &self.config.limits,
        )
        .await?;

        tracing::debug!(
            connection_id = %connection_id,
            status = response.status().as_u16(),
            body_len = response.body().len(),
            "SCGI response received"
        );
        Ok(response)
    }
}

#[async_trait]
impl RoundTrip for Client {
    async fn round_trip(&self, request: Request, address: &str) -> ScgiResult<http::Response<Bytes>> {
        let start = Instant::now();
        let result = self.exchange(&request, address).await;

        metrics::record_round_trip(metrics::outcome_label(&result), start);
        match &result {
            Ok(response) => tracing::info!(
                address = %address,
                method = %request.method,
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "SCGI round trip complete"
            ),
            Err(e) => tracing::warn!(
                address = %address,
                method = %request.method,
                kind = %e.kind(),
                error = %e,
                "SCGI round trip failed"
            ),
        }
        result
    }
}
