//! Shared types and pure-logic utilities for the Crypto Devs dApp.
//! No network or runtime dependency, usable from the service and from tests.

mod abi;
mod error;
mod metadata;
mod phase;

pub use abi::{
    decode_address, decode_bool, decode_u64, parse_ether, parse_quantity, to_quantity,
    ContractCall, MintKind,
};
pub use error::AbiError;
pub use metadata::{coerce_token_number, format_js_number, MetadataTemplate, TokenMetadata};
pub use phase::{ConsoleAction, ConsoleFlags, Phase};
