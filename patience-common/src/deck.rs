use crate::card::{Card, NUM_CARDS, NUM_RANKS, NUM_SUITS};

use anyhow::{Result, bail};

/// An ordered deck of 52 cards. Index 0 is the bottom of the stock when
/// dealt; the deck is caller-supplied and uniqueness is not verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck(pub [Card; NUM_CARDS]);

impl Deck {
    /// A deck in suit-major order: A♠..K♠, A♥..K♥, A♦..K♦, A♣..K♣.
    pub fn sorted() -> Self {
        let mut cards = [Card::new(0, 0); NUM_CARDS];
        for suit in 0..NUM_SUITS {
            for rank in 0..NUM_RANKS {
                cards[suit * NUM_RANKS + rank] = Card::new(suit as u8, rank as u8);
            }
        }
        Self(cards)
    }

    /// Parses a deck from 52 two-character cards (e.g. `AS2S...KC`).
    /// Whitespace between cards is tolerated.
    pub fn parse(content: &str) -> Result<Self> {
        let mut cards = Vec::with_capacity(NUM_CARDS);
        let mut chars = content.chars().filter(|c| !c.is_whitespace());
        while let Some(rank) = chars.next() {
            let Some(suit) = chars.next() else {
                bail!("Trailing rank character {rank} without a suit");
            };
            cards.push(Card::parse(rank, suit)?);
        }
        if cards.len() != NUM_CARDS {
            bail!("Expected {NUM_CARDS} cards, got {}", cards.len());
        }
        let mut deck = [Card::new(0, 0); NUM_CARDS];
        deck.copy_from_slice(&cards);
        Ok(Self(deck))
    }

    #[inline]
    pub fn cards(&self) -> &[Card; NUM_CARDS] {
        &self.0
    }
}

impl std::fmt::Display for Deck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for card in &self.0 {
            write!(f, "{card}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_roundtrip() {
        let deck = Deck::sorted();
        let text = deck.to_string();
        assert_eq!(text.len(), NUM_CARDS * 2);
        assert!(text.starts_with("AS2S3S"));
        assert!(text.ends_with("QCKC"));
        assert_eq!(Deck::parse(&text).unwrap(), deck);
    }

    #[test]
    fn test_parse_whitespace_and_errors() {
        let spaced = Deck::sorted()
            .cards()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(Deck::parse(&spaced).unwrap(), Deck::sorted());

        assert!(Deck::parse("AS2S").is_err());
        assert!(Deck::parse(&"ZZ".repeat(52)).is_err());
    }
}
