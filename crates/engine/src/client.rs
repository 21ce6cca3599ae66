//! HTTP JSON-RPC client for the rewrite engine

use crate::protocol::{
    GetModelParams, ImpliesParams, ImpliesResult, ModelResult, RpcRequest, RpcResponse,
    SimplifyParams, SimplifyResult, StepLimits, StepParams, StepResult,
};
use crate::{Engine, EngineError, Result};
use async_trait::async_trait;
use athanor_core::CTerm;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Connection settings for one engine endpoint.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the engine's RPC server.
    pub endpoint: String,
    /// Transport timeout per request. Step requests may legitimately run
    /// long; this is the only cancellation bound the transport applies.
    pub timeout: Duration,
}

impl EngineConfig {
    /// Settings for an endpoint with the default five-minute timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// A connection to one engine server.
#[derive(Debug)]
pub struct RpcEngine {
    http: reqwest::Client,
    config: EngineConfig,
    next_id: AtomicU64,
}

impl RpcEngine {
    /// Builds a client for the configured endpoint.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| EngineError::Transport {
                endpoint: config.endpoint.clone(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<R> {
        let transport_err = |reason: String| EngineError::Transport {
            endpoint: self.config.endpoint.clone(),
            reason,
        };

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::debug!(method, id = request.id, "engine request");

        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| transport_err(err.to_string()))?;
        let response: RpcResponse<R> = response
            .json()
            .await
            .map_err(|err| transport_err(err.to_string()))?;

        if let Some(error) = response.error {
            let message = match error.data {
                Some(data) => format!("{} ({data})", error.message),
                None => error.message,
            };
            return Err(EngineError::Rpc {
                method: method.to_string(),
                code: error.code,
                message,
            });
        }
        response.result.ok_or_else(|| {
            EngineError::InvalidResponse(format!("`{method}` returned neither result nor error"))
        })
    }
}

#[async_trait]
impl Engine for RpcEngine {
    async fn step(&self, state: &CTerm, limits: &StepLimits) -> Result<StepResult> {
        self.call("execute", StepParams { state, limits }).await
    }

    async fn simplify(&self, state: &CTerm) -> Result<CTerm> {
        let result: SimplifyResult = self.call("simplify", SimplifyParams { state }).await?;
        Ok(result.state)
    }

    async fn implies(&self, antecedent: &CTerm, consequent: &CTerm) -> Result<ImpliesResult> {
        self.call(
            "implies",
            ImpliesParams {
                antecedent,
                consequent,
            },
        )
        .await
    }

    async fn get_model(&self, state: &CTerm) -> Result<ModelResult> {
        self.call("get-model", GetModelParams { state }).await
    }
}
