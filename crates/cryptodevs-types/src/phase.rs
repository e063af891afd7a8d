//! Console phase selection.

use serde::{Deserialize, Serialize};

/// Flags derived from the latest contract reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleFlags {
    pub wallet_connected: bool,
    pub presale_started: bool,
    pub presale_ended: bool,
    pub is_owner: bool,
    pub loading: bool,
}

/// Mutually exclusive console views, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    Disconnected,
    OwnerSetup,
    PresaleNotStarted,
    PresaleActive,
    PresaleEnded,
}

/// The single button a phase offers, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleAction {
    Connect,
    StartPresale,
    PresaleMint,
    PublicMint,
}

impl Phase {
    pub fn select(flags: &ConsoleFlags) -> Self {
        if flags.loading {
            Self::Loading
        } else if !flags.wallet_connected {
            Self::Disconnected
        } else if flags.is_owner && !flags.presale_started {
            Self::OwnerSetup
        } else if !flags.presale_started {
            Self::PresaleNotStarted
        } else if !flags.presale_ended {
            Self::PresaleActive
        } else {
            Self::PresaleEnded
        }
    }

    pub fn action(self) -> Option<ConsoleAction> {
        match self {
            Self::Loading | Self::PresaleNotStarted => None,
            Self::Disconnected => Some(ConsoleAction::Connect),
            Self::OwnerSetup => Some(ConsoleAction::StartPresale),
            Self::PresaleActive => Some(ConsoleAction::PresaleMint),
            Self::PresaleEnded => Some(ConsoleAction::PublicMint),
        }
    }

    /// Explanatory text shown above (or instead of) the button.
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Loading => Some("Loading..."),
            Self::Disconnected | Self::OwnerSetup => None,
            Self::PresaleNotStarted => Some("Presale has not started yet."),
            Self::PresaleActive => Some(
                "Presale has started! If your address is whitelisted, you can mint a CryptoDev!",
            ),
            Self::PresaleEnded => {
                Some("Presale has ended! You can mint a CryptoDev in public sale, if any remain.")
            }
        }
    }
}

impl ConsoleAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connect => "Connect Wallet",
            Self::StartPresale => "Start presale",
            Self::PresaleMint => "Presale Mint",
            Self::PublicMint => "Public Mint",
        }
    }
}
