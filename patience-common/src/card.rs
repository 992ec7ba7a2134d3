use anyhow::{Context, Result};

pub type Suit = u8;
pub type Rank = u8;

pub const SPADES: Suit = 0;
pub const HEARTS: Suit = 1;
pub const DIAMONDS: Suit = 2;
pub const CLUBS: Suit = 3;

pub const NUM_SUITS: usize = 4;
pub const NUM_RANKS: usize = 13;
pub const NUM_CARDS: usize = NUM_SUITS * NUM_RANKS;

pub const RANK_CHARS: [char; NUM_RANKS] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];
pub const SUIT_CHARS: [char; NUM_SUITS] = ['S', 'H', 'D', 'C'];
pub const SUIT_SYMBOLS: [char; NUM_SUITS] = ['♠', '♥', '♦', '♣'];

/// A playing card packed into one byte as `(suit << 4) | rank`.
///
/// The derived ordering is suit-major then rank-ascending, which is the
/// canonical card order used by the solver's state fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(u8);

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        assert!((suit as usize) < NUM_SUITS, "Suit must be less than 4");
        assert!((rank as usize) < NUM_RANKS, "Rank must be less than 13");
        Self((suit << 4) | rank)
    }

    pub fn parse(rank: char, suit: char) -> Result<Self> {
        let rank_idx = RANK_CHARS
            .iter()
            .position(|&r| r == rank)
            .with_context(|| format!("Invalid rank of card {rank}{suit}"))?;
        let suit_idx = SUIT_CHARS
            .iter()
            .position(|&s| s == suit)
            .or_else(|| SUIT_SYMBOLS.iter().position(|&s| s == suit))
            .with_context(|| format!("Invalid suit of card {rank}{suit}"))?;
        Ok(Card::new(suit_idx as Suit, rank_idx as Rank))
    }

    #[inline]
    pub fn suit(&self) -> Suit {
        self.0 >> 4
    }

    #[inline]
    pub fn rank(&self) -> Rank {
        self.0 & 0x0F
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        matches!(self.suit(), HEARTS | DIAMONDS)
    }

    #[inline]
    pub fn is_ace(&self) -> bool {
        self.rank() == 0
    }

    #[inline]
    pub fn is_king(&self) -> bool {
        self.rank() as usize == NUM_RANKS - 1
    }

    #[inline]
    pub fn rank_char(&self) -> char {
        RANK_CHARS[self.rank() as usize]
    }

    #[inline]
    pub fn suit_char(&self) -> char {
        SUIT_CHARS[self.suit() as usize]
    }

    pub fn to_pretty_string(&self) -> String {
        format!("{}{}", self.rank_char(), SUIT_SYMBOLS[self.suit() as usize])
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank_char(), self.suit_char())
    }
}

/// True when the two cards have opposite colors.
#[inline]
pub fn different_colors(c1: Card, c2: Card) -> bool {
    c1.is_red() != c2.is_red()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let card = Card::parse('T', 'H').unwrap();
        assert_eq!(card.suit(), HEARTS);
        assert_eq!(card.rank(), 9);
        assert_eq!(card.to_string(), "TH");
        assert_eq!(card.to_pretty_string(), "T♥");

        // Unicode suits parse too
        assert_eq!(Card::parse('T', '♥').unwrap(), card);

        assert!(Card::parse('X', 'H').is_err());
        assert!(Card::parse('T', 'Z').is_err());
    }

    #[test]
    fn test_colors() {
        assert!(!Card::new(SPADES, 0).is_red());
        assert!(!Card::new(CLUBS, 12).is_red());
        assert!(Card::new(HEARTS, 5).is_red());
        assert!(Card::new(DIAMONDS, 5).is_red());
        assert!(different_colors(Card::new(SPADES, 3), Card::new(HEARTS, 4)));
        assert!(!different_colors(Card::new(SPADES, 3), Card::new(CLUBS, 4)));
    }

    #[test]
    fn test_ordering_is_suit_major() {
        let ks = Card::new(SPADES, 12);
        let ah = Card::new(HEARTS, 0);
        let two_s = Card::new(SPADES, 1);
        assert!(ks < ah);
        assert!(two_s < ks);
    }
}
