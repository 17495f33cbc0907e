use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::Result;
use std::sync::Arc;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

#[derive(Clone)]
pub struct ERC20Contract {
    address: Address,
    provider: Arc<dyn Provider<Ethereum>>,
}

impl ERC20Contract {
    pub fn new(address: Address, provider: Arc<dyn Provider<Ethereum>>) -> Self {
        Self { address, provider }
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        let call = IERC20::balanceOfCall { account };
        let data: Vec<u8> = call.abi_encode();

        let result = self
            .provider
            .call(TransactionRequest {
                to: Some(TxKind::Call(self.address)),
                input: TransactionInput::new(Bytes::from(data)),
                ..Default::default()
            })
            .await?;

        let balance = IERC20::balanceOfCall::abi_decode_returns(&result)?;
        Ok(balance)
    }
}
