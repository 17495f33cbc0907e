use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::GasSettings;
use crate::connector::ChainConnector;
use crate::contracts::standard_bridge::{deposit_call, DepositParams};
use crate::error::{BridgeError, BridgeResult};
use crate::store::TransactionStore;
use crate::tokens::{DepositRoute, TokenRegistry};
use crate::types::{BridgeDirection, LifecycleStatus, SubmittedDeposit};

/// Builds, prices and sends origin-chain deposits, and records each one as
/// `Submitted`. Never waits for mining.
pub struct DepositSubmitter {
    origin: Arc<dyn ChainConnector>,
    store: TransactionStore,
    tokens: Arc<TokenRegistry>,
    bridge: Address,
    gas: GasSettings,
}

impl DepositSubmitter {
    pub fn new(
        origin: Arc<dyn ChainConnector>,
        store: TransactionStore,
        tokens: Arc<TokenRegistry>,
        bridge: Address,
        gas: GasSettings,
    ) -> Self {
        Self {
            origin,
            store,
            tokens,
            bridge,
            gas,
        }
    }

    pub async fn submit_deposit(
        &self,
        token: Address,
        amount: U256,
        to: Option<Address>,
    ) -> BridgeResult<SubmittedDeposit> {
        if amount.is_zero() {
            return Err(BridgeError::InvalidAmount("amount must be positive".to_string()));
        }
        if !self.tokens.is_deposit_token(token) {
            return Err(BridgeError::UnknownToken {
                symbol: token.to_string(),
                direction: BridgeDirection::OriginToDestination,
            });
        }

        let route = self.tokens.classify(token)?;
        let destination_token = match route {
            DepositRoute::Erc20 { destination_token } => destination_token,
            DepositRoute::Native | DepositRoute::Governance => self
                .tokens
                .destination_token(token)
                .ok_or_else(|| BridgeError::UnmappedToken(token.to_string()))?,
        };

        let operator = self.origin.operator();
        let balance_token = (route != DepositRoute::Native).then_some(token);
        let balance = self.origin.get_balance(operator, balance_token).await?;
        info!(
            "💰 Deposit {} of {}, balance: {}",
            amount,
            self.symbol(token),
            balance
        );
        if balance < amount {
            return Err(BridgeError::InsufficientBalance {
                balance,
                requested: amount,
            });
        }

        let recipient = to.filter(|to| *to != operator);
        let min_gas_limit = if recipient.is_some() {
            self.gas.min_gas_limit_to
        } else {
            self.gas.min_gas_limit
        };

        let call = deposit_call(
            self.bridge,
            &DepositParams {
                route,
                origin_token: token,
                amount,
                recipient,
                min_gas_limit,
            },
        );

        let estimate = self.origin.estimate_gas(&call).await?;
        let gas_limit = estimate.max(u64::from(min_gas_limit));
        info!("⛽ {} gas estimate: {}, gas limit: {}", call.method, estimate, gas_limit);

        let tx_hash = self.origin.send(&call.with_gas_limit(gas_limit)).await?;
        info!("✅ Deposit submitted: {}", tx_hash);

        if let Err(e) = self
            .store
            .insert(tx_hash, BridgeDirection::OriginToDestination, LifecycleStatus::Submitted)
            .await
        {
            error!(%tx_hash, error = %e, "Failed to record submitted deposit");
        }

        Ok(SubmittedDeposit {
            tx_hash,
            gas_limit,
            origin_token: token,
            destination_token,
            from: operator,
            to: recipient.unwrap_or(operator),
            amount,
        })
    }

    fn symbol(&self, token: Address) -> String {
        self.tokens
            .symbol_of(token, BridgeDirection::OriginToDestination)
            .map(str::to_string)
            .unwrap_or_else(|| token.to_string())
    }
}
