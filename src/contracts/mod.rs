pub mod erc20;
pub mod standard_bridge;
