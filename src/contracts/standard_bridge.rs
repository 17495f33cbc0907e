//! Standard bridge bindings: the origin-chain deposit entry points and the
//! destination-chain `DepositFinalized` event.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::connector::ContractCall;
use crate::tokens::DepositRoute;

sol! {
    #[sol(rpc)]
    interface IL1StandardBridge {
        function depositETH(uint32 minGasLimit, bytes extraData) external payable;
        function depositETHTo(address to, uint32 minGasLimit, bytes extraData) external payable;
        function depositMNT(uint256 amount, uint32 minGasLimit, bytes extraData) external;
        function depositMNTTo(address to, uint256 amount, uint32 minGasLimit, bytes extraData) external;
        function depositERC20(address l1Token, address l2Token, uint256 amount, uint32 minGasLimit, bytes extraData) external;
        function depositERC20To(address l1Token, address l2Token, address to, uint256 amount, uint32 minGasLimit, bytes extraData) external;
    }

    interface IL2StandardBridge {
        event DepositFinalized(
            address indexed l1Token,
            address indexed l2Token,
            address indexed from,
            address to,
            uint256 amount,
            bytes extraData
        );
    }
}

pub use IL2StandardBridge::DepositFinalized;

/// Parameters of a single origin-chain deposit.
#[derive(Debug, Clone)]
pub struct DepositParams {
    pub route: DepositRoute,
    pub origin_token: Address,
    pub amount: U256,
    /// `Some` selects the `...To` variant of the call.
    pub recipient: Option<Address>,
    pub min_gas_limit: u32,
}

/// Encodes the deposit call for `params.route` against the origin bridge.
pub fn deposit_call(bridge: Address, params: &DepositParams) -> ContractCall {
    let extra_data = Bytes::new();
    let min_gas_limit = params.min_gas_limit;
    let amount = params.amount;

    let (method, input, value) = match (params.route, params.recipient) {
        (DepositRoute::Native, None) => (
            "depositETH",
            IL1StandardBridge::depositETHCall {
                minGasLimit: min_gas_limit,
                extraData: extra_data,
            }
            .abi_encode(),
            amount,
        ),
        (DepositRoute::Native, Some(to)) => (
            "depositETHTo",
            IL1StandardBridge::depositETHToCall {
                to,
                minGasLimit: min_gas_limit,
                extraData: extra_data,
            }
            .abi_encode(),
            amount,
        ),
        (DepositRoute::Governance, None) => (
            "depositMNT",
            IL1StandardBridge::depositMNTCall {
                amount,
                minGasLimit: min_gas_limit,
                extraData: extra_data,
            }
            .abi_encode(),
            U256::ZERO,
        ),
        (DepositRoute::Governance, Some(to)) => (
            "depositMNTTo",
            IL1StandardBridge::depositMNTToCall {
                to,
                amount,
                minGasLimit: min_gas_limit,
                extraData: extra_data,
            }
            .abi_encode(),
            U256::ZERO,
        ),
        (DepositRoute::Erc20 { destination_token }, None) => (
            "depositERC20",
            IL1StandardBridge::depositERC20Call {
                l1Token: params.origin_token,
                l2Token: destination_token,
                amount,
                minGasLimit: min_gas_limit,
                extraData: extra_data,
            }
            .abi_encode(),
            U256::ZERO,
        ),
        (DepositRoute::Erc20 { destination_token }, Some(to)) => (
            "depositERC20To",
            IL1StandardBridge::depositERC20ToCall {
                l1Token: params.origin_token,
                l2Token: destination_token,
                to,
                amount,
                minGasLimit: min_gas_limit,
                extraData: extra_data,
            }
            .abi_encode(),
            U256::ZERO,
        ),
    };

    ContractCall {
        contract: bridge,
        method,
        input: input.into(),
        value,
        gas_limit: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const BRIDGE: Address = address!("21f308067241b2028503c07bd7cb3751ffab0fb2");

    fn params(route: DepositRoute, recipient: Option<Address>) -> DepositParams {
        DepositParams {
            route,
            origin_token: address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
            amount: U256::from(5u64),
            recipient,
            min_gas_limit: 200_000,
        }
    }

    #[test]
    fn native_deposit_carries_value() {
        let call = deposit_call(BRIDGE, &params(DepositRoute::Native, None));
        assert_eq!(call.method, "depositETH");
        assert_eq!(call.value, U256::from(5u64));
        assert_eq!(&call.input[..4], &IL1StandardBridge::depositETHCall::SELECTOR[..]);
        assert_eq!(call.contract, BRIDGE);
    }

    #[test]
    fn token_deposits_carry_no_value() {
        let governance = deposit_call(BRIDGE, &params(DepositRoute::Governance, None));
        assert_eq!(governance.method, "depositMNT");
        assert_eq!(governance.value, U256::ZERO);

        let erc20 = deposit_call(
            BRIDGE,
            &params(
                DepositRoute::Erc20 {
                    destination_token: address!("09Bc4E0D864854c6aFB6eB9A9cdF58aC190D0dF9"),
                },
                None,
            ),
        );
        assert_eq!(erc20.method, "depositERC20");
        assert_eq!(erc20.value, U256::ZERO);
        assert_eq!(&erc20.input[..4], &IL1StandardBridge::depositERC20Call::SELECTOR[..]);
    }

    #[test]
    fn recipient_selects_to_variant() {
        let to = address!("00000000000000000000000000000000000000ab");
        let call = deposit_call(BRIDGE, &params(DepositRoute::Native, Some(to)));
        assert_eq!(call.method, "depositETHTo");
        let decoded = IL1StandardBridge::depositETHToCall::abi_decode(&call.input).unwrap();
        assert_eq!(decoded.to, to);
        assert_eq!(decoded.minGasLimit, 200_000);
    }
}
