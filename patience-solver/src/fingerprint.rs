use patience_common::card::{NUM_SUITS, RANK_CHARS, Suit};
use patience_common::game::{Column, Game, TOTAL_COLUMNS};

use ahash::AHasher;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::hash::Hasher;

const SEPARATOR: u8 = b'|';
const EMPTY_FOUNDATION: u8 = b'0';

type KeyBuffer = SmallVec<[u8; 0x100]>;

/// Equivalence-class key for a game state.
///
/// Two distinct states may share a key, but only when they are mutually
/// solvable: the key ignores permutations of tableau columns that carry no
/// face-down cards (such columns are fungible) while columns with hidden
/// cards keep their identity. The talon is encoded verbatim together with
/// the waste cursor, and the deck-flip permission is part of the key.
pub(crate) fn state_key(game: &Game, can_flip_deck: bool) -> u64 {
    let mut bytes = KeyBuffer::new();

    bytes.push(can_flip_deck as u8);
    bytes.push(game.waste_size() as u8);
    for card in game.talon() {
        bytes.push(card.rank_char() as u8);
        bytes.push(card.suit_char() as u8);
    }
    bytes.push(SEPARATOR);

    for suit in 0..NUM_SUITS {
        match game.foundation_top(suit as Suit) {
            Some(rank) => bytes.push(RANK_CHARS[rank as usize] as u8),
            None => bytes.push(EMPTY_FOUNDATION),
        }
    }
    bytes.push(SEPARATOR);

    let tableau = game.tableau();
    let mut order: [usize; TOTAL_COLUMNS] = std::array::from_fn(|i| i);
    order.sort_by(|&a, &b| compare_columns(a, &tableau[a], b, &tableau[b]));
    for &index in &order {
        let column = &tableau[index];
        if !column.face_down.is_empty() {
            bytes.push(index as u8);
            bytes.push(column.face_down.len() as u8);
        }
        for card in &column.face_up {
            bytes.push(card.rank_char() as u8);
            bytes.push(card.suit_char() as u8);
        }
        bytes.push(SEPARATOR);
    }

    hash_bytes(&bytes)
}

/// Key for the tableau-move cache: the tableau layout alone, every column in
/// index order. Unlike the state key this keeps all column identities, since
/// the cached move lists name concrete column indices.
pub(crate) fn tableau_key(game: &Game) -> u64 {
    let mut bytes = KeyBuffer::new();
    for (index, column) in game.tableau().iter().enumerate() {
        bytes.push(index as u8);
        bytes.push(column.face_down.len() as u8);
        for card in &column.face_up {
            bytes.push(card.rank_char() as u8);
            bytes.push(card.suit_char() as u8);
        }
        bytes.push(SEPARATOR);
    }
    hash_bytes(&bytes)
}

/// Canonical column order: columns bearing face-down cards first (by their
/// current index), then all-face-up columns (by first face-up card), then
/// empty columns, which compare equal.
fn compare_columns(a_index: usize, a: &Column, b_index: usize, b: &Column) -> Ordering {
    column_class(a).cmp(&column_class(b)).then_with(|| {
        match column_class(a) {
            0 => a_index.cmp(&b_index),
            1 => a.face_up[0].cmp(&b.face_up[0]),
            _ => Ordering::Equal,
        }
    })
}

fn column_class(column: &Column) -> u8 {
    if !column.face_down.is_empty() {
        0
    } else if !column.face_up.is_empty() {
        1
    } else {
        2
    }
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = AHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use patience_common::deck::Deck;

    #[test]
    fn test_key_is_deterministic() {
        let game = Game::new(&Deck::sorted(), 3);
        assert_eq!(state_key(&game, false), state_key(&game, false));
        assert_eq!(tableau_key(&game), tableau_key(&game));
    }

    #[test]
    fn test_flip_permission_is_part_of_the_key() {
        let game = Game::new(&Deck::sorted(), 3);
        assert_ne!(state_key(&game, false), state_key(&game, true));
    }

    #[test]
    fn test_waste_cursor_is_part_of_the_key() {
        let a = Game::parse("Talon: AS2S3S\nDrawCount: 3").unwrap();
        let b = Game::parse("Talon: |AS2S3S\nDrawCount: 3").unwrap();
        assert_ne!(state_key(&a, false), state_key(&b, false));
    }

    #[test]
    fn test_face_up_columns_are_fungible() {
        let a = Game::parse("Tableau0: |K♠Q♥\nTableau1: |K♦Q♣\nDrawCount: 3").unwrap();
        let b = Game::parse("Tableau0: |K♦Q♣\nTableau1: |K♠Q♥\nDrawCount: 3").unwrap();
        assert_eq!(state_key(&a, false), state_key(&b, false));
        // The move cache keeps column identities apart.
        assert_ne!(tableau_key(&a), tableau_key(&b));
    }

    #[test]
    fn test_face_down_columns_keep_their_identity() {
        let a = Game::parse("Tableau0: 2♥|K♠\nDrawCount: 3").unwrap();
        let b = Game::parse("Tableau1: 2♥|K♠\nDrawCount: 3").unwrap();
        assert_ne!(state_key(&a, false), state_key(&b, false));
    }

    #[test]
    fn test_stack_contents_change_the_key() {
        let a = Game::parse("Tableau0: |K♠Q♥\nDrawCount: 3").unwrap();
        let b = Game::parse("Tableau0: |K♠Q♦\nDrawCount: 3").unwrap();
        assert_ne!(state_key(&a, false), state_key(&b, false));
    }
}
