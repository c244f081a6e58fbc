//! Paddock Chain - protocol contract access
//!
//! Reads the registry, market and vault contracts over JSON-RPC, combines
//! those reads into the listings and aggregates the API serves, signs
//! response payloads and runs the test-token faucet.

pub mod bindings;
pub mod faucet;
pub mod reader;
pub mod signer;
pub mod util;
pub mod walker;

pub use ethers::types::{Address, U256};
pub use faucet::{scaled_amount, EthersFaucet, TokenFaucet};
pub use reader::{EthersProtocol, ProtocolReader};
pub use signer::{verify, PayloadSigner};
pub use util::{checksum, decode_padded_bytes, parse_address};
pub use walker::{bet_history, list_addresses, liquidity, vault_performance_all};
