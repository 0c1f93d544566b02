//! Spanish 40 card deck.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const DECK_SIZE: u32 = 40;

/// Rank table indexed by `num - 1`: (trick value, points).
const RANKS: [(u8, u8); 12] = [
    (12, 11),
    (1, 0),
    (11, 10),
    (2, 0),
    (3, 0),
    (4, 0),
    (5, 0),
    (6, 0),
    (7, 0),
    (8, 2),
    (9, 3),
    (10, 4),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Suit {
    Oro,
    Copa,
    Basto,
    Espada,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Oro, Suit::Copa, Suit::Basto, Suit::Espada];

    pub fn wire_name(self) -> &'static str {
        match self {
            Suit::Oro => "ORO",
            Suit::Copa => "COPA",
            Suit::Basto => "BASTO",
            Suit::Espada => "ESPADA",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Suit::Oro => "🪙",
            Suit::Copa => "🏆",
            Suit::Basto => "🪵",
            Suit::Espada => "⚔️",
        }
    }

    pub fn letter(self) -> char {
        match self {
            Suit::Oro => 'O',
            Suit::Copa => 'C',
            Suit::Basto => 'B',
            Suit::Espada => 'E',
        }
    }
}

impl FromStr for Suit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Suit::ALL
            .into_iter()
            .find(|suit| suit.wire_name() == s)
            .ok_or_else(|| CoreError::InvalidCard(format!("unknown suit {s:?}")))
    }
}

/// A card as the authority names it, e.g. `BASTO:3`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Card {
    suit: Suit,
    num: u8,
}

impl Card {
    pub fn new(suit: Suit, num: u8) -> Result<Self, CoreError> {
        if !(1..=12).contains(&num) {
            return Err(CoreError::InvalidCard(format!("number {num} outside 1..=12")));
        }
        Ok(Self { suit, num })
    }

    pub fn suit(&self) -> Suit { self.suit }
    pub fn num(&self) -> u8 { self.num }

    /// Strength of the card inside a trick.
    pub fn value(&self) -> u8 { RANKS[usize::from(self.num - 1)].0 }

    /// Points the card is worth in a score pile.
    pub fn points(&self) -> u32 { u32::from(RANKS[usize::from(self.num - 1)].1) }

    /// The rank 2 of the same suit: the only card allowed to take the life card.
    pub fn swap_counterpart(&self) -> Card {
        Card { suit: self.suit, num: 2 }
    }

    pub fn render(&self, emoji: bool) -> String {
        if emoji {
            format!("[{}:{:2}]", self.suit.emoji(), self.num)
        } else {
            format!("[{}:{:2}]", self.suit.letter(), self.num)
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.suit.wire_name(), self.num)
    }
}

impl FromStr for Card {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (suit, num) = s
            .split_once(':')
            .ok_or_else(|| CoreError::InvalidCard(format!("expected SUIT:NUM, got {s:?}")))?;
        let num: u8 = num
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidCard(format!("bad number in {s:?}")))?;
        Card::new(suit.trim().parse()?, num)
    }
}

impl TryFrom<String> for Card {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<Card> for String {
    fn from(card: Card) -> Self { card.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_form_and_ranks() {
        let ace: Card = "ORO:1".parse().unwrap();
        assert_eq!(ace.suit(), Suit::Oro);
        assert_eq!(ace.value(), 12);
        assert_eq!(ace.points(), 11);

        let three: Card = "ESPADA:3".parse().unwrap();
        assert_eq!(three.points(), 10);
        assert!(three.value() < ace.value());

        let king: Card = "COPA:12".parse().unwrap();
        assert_eq!(king.points(), 4);
        assert_eq!(king.to_string(), "COPA:12");
    }

    #[test]
    fn rejects_malformed_cards() {
        assert!("ORO".parse::<Card>().is_err());
        assert!("ORO:0".parse::<Card>().is_err());
        assert!("ORO:13".parse::<Card>().is_err());
        assert!("SPADES:3".parse::<Card>().is_err());
        assert!("BASTO:x".parse::<Card>().is_err());
    }

    #[test]
    fn swap_counterpart_is_the_two_of_the_same_suit() {
        let life: Card = "BASTO:7".parse().unwrap();
        let two = life.swap_counterpart();
        assert_eq!(two.suit(), Suit::Basto);
        assert_eq!(two.num(), 2);
        assert_eq!(two.points(), 0);
    }

    #[test]
    fn serde_uses_the_wire_string() {
        let card: Card = serde_json::from_str("\"COPA:10\"").unwrap();
        assert_eq!(serde_json::to_string(&card).unwrap(), "\"COPA:10\"");
        assert!(serde_json::from_str::<Card>("\"COPA:99\"").is_err());
    }

    #[test]
    fn renders_letters_or_emoji() {
        let card: Card = "ORO:5".parse().unwrap();
        assert_eq!(card.render(false), "[O: 5]");
        assert!(card.render(true).starts_with("[🪙"));
    }
}
