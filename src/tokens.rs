use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::config::TokenSettings;
use crate::error::{BridgeError, BridgeResult};
use crate::types::BridgeDirection;

/// Which origin-bridge deposit call a token goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositRoute {
    /// The chain's native coin, sent as call value.
    Native,
    /// The governance token, which has its own bridge entry point.
    Governance,
    /// Any other token, bridged to its mapped destination-chain address.
    Erc20 { destination_token: Address },
}

/// Symbol tables for one network, one per direction, plus the
/// origin -> destination address mapping derived from them.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    native_token: Address,
    governance_token: Address,
    deposit: BTreeMap<String, Address>,
    withdraw: BTreeMap<String, Address>,
    origin_to_destination: HashMap<Address, Address>,
}

impl TokenRegistry {
    pub fn new(
        native_token: Address,
        governance_token: Address,
        deposit: impl IntoIterator<Item = (String, Address)>,
        withdraw: impl IntoIterator<Item = (String, Address)>,
    ) -> Self {
        let deposit: BTreeMap<String, Address> = deposit
            .into_iter()
            .map(|(symbol, address)| (symbol.to_uppercase(), address))
            .collect();
        let withdraw: BTreeMap<String, Address> = withdraw
            .into_iter()
            .map(|(symbol, address)| (symbol.to_uppercase(), address))
            .collect();

        let origin_to_destination = deposit
            .iter()
            .filter_map(|(symbol, origin)| withdraw.get(symbol).map(|dest| (*origin, *dest)))
            .collect();

        Self {
            native_token,
            governance_token,
            deposit,
            withdraw,
            origin_to_destination,
        }
    }

    pub fn from_settings(settings: &TokenSettings) -> Result<Self> {
        let parse = |table: &BTreeMap<String, String>| -> Result<Vec<(String, Address)>> {
            table
                .iter()
                .map(|(symbol, address)| Ok((symbol.clone(), parse_address(address)?)))
                .collect()
        };

        Ok(Self::new(
            parse_address(&settings.native_token)?,
            parse_address(&settings.governance_token)?,
            parse(&settings.deposit)?,
            parse(&settings.withdraw)?,
        ))
    }

    fn table(&self, direction: BridgeDirection) -> &BTreeMap<String, Address> {
        match direction {
            BridgeDirection::OriginToDestination => &self.deposit,
            BridgeDirection::DestinationToOrigin => &self.withdraw,
        }
    }

    pub fn is_supported(&self, symbol: &str, direction: BridgeDirection) -> bool {
        self.table(direction).contains_key(&symbol.to_uppercase())
    }

    /// Looks a symbol up case-insensitively in the table for `direction`.
    pub fn resolve(&self, symbol: &str, direction: BridgeDirection) -> BridgeResult<Address> {
        self.table(direction)
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| BridgeError::UnknownToken {
                symbol: symbol.to_string(),
                direction,
            })
    }

    pub fn symbol_of(&self, address: Address, direction: BridgeDirection) -> Option<&str> {
        self.table(direction)
            .iter()
            .find(|(_, candidate)| **candidate == address)
            .map(|(symbol, _)| symbol.as_str())
    }

    pub fn is_deposit_token(&self, address: Address) -> bool {
        self.deposit.values().any(|candidate| *candidate == address)
    }

    pub fn destination_token(&self, origin_token: Address) -> Option<Address> {
        self.origin_to_destination.get(&origin_token).copied()
    }

    pub fn native_token(&self) -> Address {
        self.native_token
    }

    pub fn governance_token(&self) -> Address {
        self.governance_token
    }

    /// Native first, then governance, then the generic ERC20 path. Exactly
    /// one route is ever returned.
    pub fn classify(&self, origin_token: Address) -> BridgeResult<DepositRoute> {
        if origin_token == self.native_token {
            return Ok(DepositRoute::Native);
        }
        if origin_token == self.governance_token {
            return Ok(DepositRoute::Governance);
        }
        self.destination_token(origin_token)
            .map(|destination_token| DepositRoute::Erc20 { destination_token })
            .ok_or_else(|| BridgeError::UnmappedToken(origin_token.to_string()))
    }
}

pub fn parse_address(addr: &str) -> Result<Address> {
    Address::from_str(addr.trim()).map_err(|e| anyhow::anyhow!("Invalid address {}: {}", addr, e))
}

/// Parses a decimal amount into 18-decimal minor units.
pub fn parse_amount(amount: &str) -> BridgeResult<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(BridgeError::InvalidAmount(amount.to_string()));
    }
    parse_ether(trimmed).map_err(|e| BridgeError::InvalidAmount(format!("{amount}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const ETH_L1: Address = Address::ZERO;
    const MNT_L1: Address = address!("65e37B558F64E2Be5768DB46DF22F93d85741A9E");
    const USDC_L1: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");
    const ETH_L2: Address = address!("dEAddEaDdeadDEadDEADDEAddEADDEAddead1111");
    const MNT_L2: Address = address!("DeadDeAddeAddEAddeadDEaDDEAdDeaDDeAD0000");
    const USDC_L2: Address = address!("09Bc4E0D864854c6aFB6eB9A9cdF58aC190D0dF9");

    fn registry() -> TokenRegistry {
        TokenRegistry::new(
            ETH_L1,
            MNT_L1,
            [
                ("eth".to_string(), ETH_L1),
                ("MNT".to_string(), MNT_L1),
                ("USDC".to_string(), USDC_L1),
            ],
            [
                ("ETH".to_string(), ETH_L2),
                ("MNT".to_string(), MNT_L2),
                ("USDC".to_string(), USDC_L2),
            ],
        )
    }

    #[test]
    fn symbols_resolve_case_insensitively_per_direction() {
        let tokens = registry();
        assert_eq!(tokens.resolve("Eth", BridgeDirection::OriginToDestination).unwrap(), ETH_L1);
        assert_eq!(tokens.resolve("mnt", BridgeDirection::DestinationToOrigin).unwrap(), MNT_L2);
        assert!(tokens.is_supported("usdc", BridgeDirection::OriginToDestination));
        assert!(matches!(
            tokens.resolve("DOGE", BridgeDirection::OriginToDestination),
            Err(BridgeError::UnknownToken { .. })
        ));
        assert_eq!(tokens.symbol_of(MNT_L1, BridgeDirection::OriginToDestination), Some("MNT"));
    }

    #[test]
    fn classification_is_exclusive() {
        let tokens = registry();
        assert_eq!(tokens.classify(ETH_L1).unwrap(), DepositRoute::Native);
        assert_eq!(tokens.classify(MNT_L1).unwrap(), DepositRoute::Governance);
        assert_eq!(
            tokens.classify(USDC_L1).unwrap(),
            DepositRoute::Erc20 { destination_token: USDC_L2 }
        );
        assert!(matches!(
            tokens.classify(address!("00000000000000000000000000000000000000aa")),
            Err(BridgeError::UnmappedToken(_))
        ));
    }

    #[test]
    fn destination_mapping_pairs_symbols() {
        let tokens = registry();
        assert_eq!(tokens.destination_token(ETH_L1), Some(ETH_L2));
        assert_eq!(tokens.destination_token(MNT_L1), Some(MNT_L2));
        assert!(tokens.is_deposit_token(USDC_L1));
        assert!(!tokens.is_deposit_token(USDC_L2));
    }

    #[test]
    fn amounts_parse_as_ether_units() {
        assert_eq!(parse_amount("1").unwrap(), U256::from(1_000_000_000_000_000_000u128));
        assert_eq!(parse_amount("0.001").unwrap(), U256::from(1_000_000_000_000_000u128));
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
    }
}
