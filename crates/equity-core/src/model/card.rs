use crate::model::encoding::EncodingError;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A playing card identified by its id, e.g. `"AS"` or `"TD"`.
///
/// Equality and hashing only look at the id. The id is not validated on
/// construction; rank and suit are parsed lazily when a request is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    id: String,
}

impl Card {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn from_parts(rank: Rank, suit: Suit) -> Self {
        Self {
            id: format!("{}{}", rank.symbol(), suit.symbol()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rank(&self) -> Result<Rank, EncodingError> {
        let symbol = self.id.chars().next();
        symbol
            .and_then(Rank::from_symbol)
            .ok_or_else(|| EncodingError::UnknownRank {
                id: self.id.clone(),
                symbol,
            })
    }

    pub fn suit(&self) -> Result<Suit, EncodingError> {
        let symbol = self.id.chars().nth(1);
        symbol
            .and_then(Suit::from_symbol)
            .ok_or_else(|| EncodingError::UnknownSuit {
                id: self.id.clone(),
                symbol,
            })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
