/// Failure while encoding a contract call or decoding its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    InvalidHex(String),
    ShortWord(usize),
    Overflow,
    InvalidBool,
    InvalidAddress,
    InvalidAmount(String),
    UnknownMintKind(String),
}

impl std::fmt::Display for AbiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHex(msg) => write!(f, "invalid hex: {msg}"),
            Self::ShortWord(len) => write!(f, "expected a 32-byte word, got {len} bytes"),
            Self::Overflow => write!(f, "uint256 value does not fit in 64 bits"),
            Self::InvalidBool => write!(f, "word is not a bool"),
            Self::InvalidAddress => write!(f, "word is not an address"),
            Self::InvalidAmount(msg) => write!(f, "invalid amount: {msg}"),
            Self::UnknownMintKind(kind) => write!(f, "unknown mint kind: {kind}"),
        }
    }
}

impl std::error::Error for AbiError {}
