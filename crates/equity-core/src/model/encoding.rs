//! Wire encoding of cards as `{Rank, Suit}` integer pairs.

use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireCard {
    #[serde(rename = "Rank")]
    pub rank: u8,
    #[serde(rename = "Suit")]
    pub suit: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("card {id:?} has unrecognized rank {symbol:?}")]
    UnknownRank { id: String, symbol: Option<char> },
    #[error("card {id:?} has unrecognized suit {symbol:?}")]
    UnknownSuit { id: String, symbol: Option<char> },
    #[error("rank value {0} is outside 2..=14")]
    RankOutOfRange(u8),
    #[error("suit value {0} is outside 0..=3")]
    SuitOutOfRange(u8),
}

pub fn encode(card: &Card) -> Result<WireCard, EncodingError> {
    Ok(WireCard {
        rank: card.rank()?.value(),
        suit: card.suit()?.index(),
    })
}

pub fn encode_all<'a>(
    cards: impl IntoIterator<Item = &'a Card>,
) -> Result<Vec<WireCard>, EncodingError> {
    cards.into_iter().map(encode).collect()
}

pub fn decode(wire: WireCard) -> Result<Card, EncodingError> {
    let rank = Rank::from_value(wire.rank).ok_or(EncodingError::RankOutOfRange(wire.rank))?;
    let suit = Suit::from_index(wire.suit as usize).ok_or(EncodingError::SuitOutOfRange(wire.suit))?;
    Ok(Card::from_parts(rank, suit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ace_of_spades_encodes_to_fourteen_three() {
        let wire = encode(&Card::new("AS")).unwrap();
        assert_eq!(wire, WireCard { rank: 14, suit: 3 });
    }

    #[test]
    fn every_table_entry_round_trips() {
        for rank in Rank::ORDERED {
            for suit in Suit::ALL {
                let card = Card::from_parts(rank, suit);
                let decoded = decode(encode(&card).unwrap()).unwrap();
                assert_eq!(decoded.id(), card.id());
            }
        }
    }

    #[test]
    fn encode_all_fails_closed_on_first_bad_card() {
        let cards = [Card::new("KD"), Card::new("ZZ"), Card::new("2C")];
        let err = encode_all(cards.iter()).unwrap_err();
        assert!(matches!(err, EncodingError::UnknownRank { ref id, .. } if id == "ZZ"));
    }

    #[test]
    fn decode_rejects_out_of_range_values() {
        assert_eq!(
            decode(WireCard { rank: 1, suit: 0 }),
            Err(EncodingError::RankOutOfRange(1))
        );
        assert_eq!(
            decode(WireCard { rank: 10, suit: 4 }),
            Err(EncodingError::SuitOutOfRange(4))
        );
    }

    #[test]
    fn wire_card_uses_capitalized_field_names() {
        let json = serde_json::to_string(&WireCard { rank: 13, suit: 1 }).unwrap();
        assert_eq!(json, r#"{"Rank":13,"Suit":1}"#);
    }
}
