//! Enumerations shared by the value model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! case_insensitive_enum {
    ($name:ident { $($variant:ident => $repr:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $repr),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(if s.eq_ignore_ascii_case($repr) { return Ok(Self::$variant); })+
                Err(())
            }
        }
    };
}

case_insensitive_enum!(Side {
    Buy => "BUY",
    Sell => "SELL",
});

case_insensitive_enum!(OrderType {
    Market => "MARKET",
    Limit => "LIMIT",
    Stop => "STOP",
    StopLimit => "STOP_LIMIT",
});

case_insensitive_enum!(TimeInForce {
    Day => "DAY",
    Gtc => "GTC",
    Ioc => "IOC",
    Fok => "FOK",
    Gtd => "GTD",
});

case_insensitive_enum!(OptionType {
    Call => "CALL",
    Put => "PUT",
});

/// Lifecycle status of a [`crate::model::ProcessedOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PendingNew,
    PartiallyFilled,
    Filled,
    PendingCancel,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Terminal statuses accept no further mutation (spec.md §3 ProcessedOrder invariant).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PendingNew => "PENDING_NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::PendingCancel => "PENDING_CANCEL",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
        };
        write!(f, "{}", s)
    }
}
