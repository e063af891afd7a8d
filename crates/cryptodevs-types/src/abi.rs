//! Minimal ABI codec for the Crypto Devs contract.
//!
//! Every method takes no arguments and returns at most one static word, so
//! calldata is just the selector and results are a single 32-byte word.

use crate::error::AbiError;
use sha3::{Digest, Keccak256};

const WORD_LEN: usize = 32;
const WEI_DECIMALS: usize = 18;

/// Contract methods the console reads or sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractCall {
    TokenIds,
    PresaleStarted,
    PresaleEnded,
    Owner,
    Mint,
    PresaleMint,
    StartPresale,
}

impl ContractCall {
    pub fn signature(self) -> &'static str {
        match self {
            Self::TokenIds => "tokenIds()",
            Self::PresaleStarted => "presaleStarted()",
            Self::PresaleEnded => "presaleEnded()",
            Self::Owner => "owner()",
            Self::Mint => "mint()",
            Self::PresaleMint => "presaleMint()",
            Self::StartPresale => "startPresale()",
        }
    }

    /// First four bytes of keccak-256 over the signature.
    pub fn selector(self) -> [u8; 4] {
        let digest = Keccak256::digest(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    /// `0x`-prefixed calldata for `eth_call` / `eth_sendTransaction`.
    pub fn calldata(self) -> String {
        format!("0x{}", hex::encode(self.selector()))
    }

    pub fn is_payable(self) -> bool {
        matches!(self, Self::Mint | Self::PresaleMint)
    }
}

/// Which payable mint path to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MintKind {
    Presale,
    Public,
}

impl MintKind {
    pub fn call(self) -> ContractCall {
        match self {
            Self::Presale => ContractCall::PresaleMint,
            Self::Public => ContractCall::Mint,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Presale => "presale",
            Self::Public => "public",
        }
    }
}

impl std::str::FromStr for MintKind {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "presale" => Ok(Self::Presale),
            "public" => Ok(Self::Public),
            other => Err(AbiError::UnknownMintKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for MintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode_word(data: &str) -> Result<[u8; WORD_LEN], AbiError> {
    let raw = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(raw).map_err(|e| AbiError::InvalidHex(e.to_string()))?;
    if bytes.len() < WORD_LEN {
        return Err(AbiError::ShortWord(bytes.len()));
    }
    let mut word = [0u8; WORD_LEN];
    word.copy_from_slice(&bytes[..WORD_LEN]);
    Ok(word)
}

/// Decode a `uint256` return value that must fit in 64 bits.
pub fn decode_u64(data: &str) -> Result<u64, AbiError> {
    let word = decode_word(data)?;
    if word[..WORD_LEN - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD_LEN - 8..]);
    Ok(u64::from_be_bytes(low))
}

pub fn decode_bool(data: &str) -> Result<bool, AbiError> {
    let word = decode_word(data)?;
    if word[..WORD_LEN - 1].iter().any(|b| *b != 0) {
        return Err(AbiError::InvalidBool);
    }
    match word[WORD_LEN - 1] {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(AbiError::InvalidBool),
    }
}

/// Decode an `address` word into lowercase `0x` hex.
pub fn decode_address(data: &str) -> Result<String, AbiError> {
    let word = decode_word(data)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AbiError::InvalidAddress);
    }
    Ok(format!("0x{}", hex::encode(&word[12..])))
}

/// Parse a decimal ether amount (`"0.01"`) into wei.
pub fn parse_ether(amount: &str) -> Result<u128, AbiError> {
    let amount = amount.trim();
    let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(AbiError::InvalidAmount(amount.to_string()));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(AbiError::InvalidAmount(amount.to_string()));
    }
    if frac.len() > WEI_DECIMALS {
        return Err(AbiError::InvalidAmount(format!(
            "{amount} has more than {WEI_DECIMALS} decimals"
        )));
    }

    let overflow = || AbiError::InvalidAmount(format!("{amount} overflows u128 wei"));
    let mut wei: u128 = 0;
    for c in whole.chars().chain(frac.chars()) {
        let digit = u128::from(c.to_digit(10).unwrap_or_default());
        wei = wei
            .checked_mul(10)
            .and_then(|w| w.checked_add(digit))
            .ok_or_else(overflow)?;
    }
    for _ in frac.len()..WEI_DECIMALS {
        wei = wei.checked_mul(10).ok_or_else(overflow)?;
    }
    Ok(wei)
}

/// JSON-RPC quantity encoding: `0x`-prefixed, no leading zeros.
pub fn to_quantity(value: u128) -> String {
    format!("0x{value:x}")
}

/// Parse a JSON-RPC quantity such as an `eth_chainId` result.
pub fn parse_quantity(quantity: &str) -> Result<u64, AbiError> {
    let raw = quantity
        .strip_prefix("0x")
        .ok_or_else(|| AbiError::InvalidHex(format!("missing 0x prefix: {quantity}")))?;
    u64::from_str_radix(raw, 16).map_err(|e| AbiError::InvalidHex(format!("{quantity}: {e}")))
}
