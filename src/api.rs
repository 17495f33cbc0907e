use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::BridgeError;
use crate::relayer::BridgeRelayer;
use crate::tokens::{parse_amount, TokenRegistry};
use crate::types::{BridgeDirection, DepositRequest};

#[derive(Debug, Deserialize)]
pub struct BridgeRequest {
    pub direction: i64,
    pub token: String,
    /// Decimal amount in whole tokens, as a JSON number or string.
    pub amount: Value,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub code: u8,
    pub data: Value,
}

impl ApiResponse {
    fn ok(data: impl Serialize) -> Json<Self> {
        match serde_json::to_value(data) {
            Ok(data) => Json(Self { code: 0, data }),
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self::error("error")
            }
        }
    }

    fn error(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            code: 1,
            data: Value::String(message.into()),
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub direction: BridgeDirection,
    pub token: String,
    pub amount: U256,
    pub recipient: Option<Address>,
}

/// Checks direction, token, amount and recipient, in that order, returning
/// the message the client sees for the first problem found.
pub fn validate_bridge_request(
    tokens: &TokenRegistry,
    request: &BridgeRequest,
) -> std::result::Result<ValidatedRequest, &'static str> {
    let direction = BridgeDirection::from_code(request.direction).ok_or("invalid direction")?;

    if !tokens.is_supported(&request.token, direction) {
        return Err("invalid token");
    }

    let raw_amount = match &request.amount {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Err("invalid amount"),
    };
    let amount = parse_amount(&raw_amount).map_err(|_| "invalid amount")?;
    if amount.is_zero() {
        return Err("invalid amount");
    }

    let recipient = request
        .to
        .as_deref()
        .map(Address::from_str)
        .transpose()
        .map_err(|_| "invalid recipient")?;

    Ok(ValidatedRequest {
        direction,
        token: request.token.to_uppercase(),
        amount,
        recipient,
    })
}

pub struct Server {
    relayer: Arc<BridgeRelayer>,
    bind_address: String,
}

impl Server {
    pub fn new(relayer: Arc<BridgeRelayer>, bind_address: impl Into<String>) -> Self {
        Server {
            relayer,
            bind_address: bind_address.into(),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/bridge", post(bridge))
            .route("/transactions/:tx_hash", get(transaction_status))
            .with_state(self.relayer.clone())
    }

    pub async fn start(&self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
        info!("[server]: Server is running at http://{}", self.bind_address);

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "bridge-relayer"
    }))
}

async fn bridge(
    State(relayer): State<Arc<BridgeRelayer>>,
    Json(request): Json<BridgeRequest>,
) -> Json<ApiResponse> {
    let validated = match validate_bridge_request(relayer.tokens(), &request) {
        Ok(validated) => validated,
        Err(message) => {
            warn!("Rejected bridge request: {}", message);
            return ApiResponse::error(message);
        }
    };

    if validated.direction != BridgeDirection::OriginToDestination {
        let e = BridgeError::UnsupportedDirection(validated.direction);
        warn!("Rejected bridge request: {}", e);
        return ApiResponse::error(client_message(&e));
    }

    let deposit = DepositRequest {
        token: validated.token,
        amount: validated.amount,
        recipient: validated.recipient,
    };

    match relayer.deposit(deposit).await {
        Ok((submitted, _watch)) => ApiResponse::ok(submitted),
        Err(e) => {
            error!("Deposit failed: {}", e);
            ApiResponse::error(client_message(&e))
        }
    }
}

async fn transaction_status(
    State(relayer): State<Arc<BridgeRelayer>>,
    Path(tx_hash): Path<String>,
) -> Json<ApiResponse> {
    let Ok(tx_hash) = B256::from_str(&tx_hash) else {
        return ApiResponse::error("invalid transaction hash");
    };

    match relayer.resolve_status(tx_hash).await {
        Ok(receipt) => ApiResponse::ok(receipt),
        Err(e) => {
            error!("Status lookup for {} failed: {}", tx_hash, e);
            ApiResponse::error(client_message(&e))
        }
    }
}

fn client_message(e: &BridgeError) -> String {
    match e {
        BridgeError::InsufficientBalance { .. }
        | BridgeError::GasLimitTooLow { .. }
        | BridgeError::ReceiptTimeout { .. }
        | BridgeError::TransactionNotFound(_) => e.to_string(),
        BridgeError::UnsupportedDirection(_) => "unsupported".to_string(),
        _ => "error".to_string(),
    }
}
