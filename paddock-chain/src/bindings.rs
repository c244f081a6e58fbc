//! Contract bindings
//!
//! Generated from human-readable ABIs covering only the functions and events
//! Paddock calls. Each contract lives in its own module so the generated call
//! types (`NameCall`, `SymbolCall`, ...) do not collide.

pub mod registry {
    ethers::contract::abigen!(
        Registry,
        r#"[
            function marketCount() external view returns (uint256)
            function markets(uint256 index) external view returns (address)
            function vaultCount() external view returns (uint256)
            function vaults(uint256 index) external view returns (address)
        ]"#
    );
}

pub mod market {
    ethers::contract::abigen!(
        Market,
        r#"[
            function getVaultAddress() external view returns (address)
            function getMargin() external view returns (uint256)
            function getTotalInPlay() external view returns (uint256)
            function getInPlayCount() external view returns (uint256)
            function getTotalExposure() external view returns (uint256)
            function getCount() external view returns (uint256)
            event Placed(uint256 index, bytes32 propositionId, bytes16 marketId, uint256 amount, uint256 payout, address indexed owner)
        ]"#
    );
}

pub mod vault {
    ethers::contract::abigen!(
        Vault,
        r#"[
            function name() external view returns (string)
            function symbol() external view returns (string)
            function decimals() external view returns (uint8)
            function asset() external view returns (address)
            function totalAssets() external view returns (uint256)
            function totalSupply() external view returns (uint256)
            function getPerformance() external view returns (uint256)
        ]"#
    );
}

pub mod erc20 {
    ethers::contract::abigen!(
        Erc20,
        r#"[
            function name() external view returns (string)
            function symbol() external view returns (string)
            function decimals() external view returns (uint8)
            function balanceOf(address owner) external view returns (uint256)
            function transfer(address to, uint256 amount) external returns (bool)
        ]"#
    );
}

pub use erc20::Erc20;
pub use market::{Market, PlacedFilter};
pub use registry::Registry;
pub use vault::Vault;
