use patience_common::game::{Game, TOTAL_COLUMNS};
use patience_common::moves::Move;

use quick_cache::unsync::Cache;
use smallvec::SmallVec;

use crate::fingerprint::tableau_key;

pub(crate) const MAX_VALID_MOVES: usize = 25;
pub(crate) const MAX_TABLEAU_MOVES: usize = 14;

pub(crate) type MoveList = SmallVec<[Move; MAX_VALID_MOVES]>;
pub(crate) type TableauMoveList = SmallVec<[Move; MAX_TABLEAU_MOVES]>;
pub(crate) type TableauMoveCache = Cache<u64, TableauMoveList>;

/// Candidate moves for a state, in the priority order the search explores:
/// aces to the foundation, other foundation moves, card-revealing tableau
/// moves, waste plays, a draw, and finally the cached non-revealing
/// tableau-to-tableau moves.
pub(crate) fn valid_moves(game: &Game, move_cache: &mut TableauMoveCache) -> MoveList {
    let mut moves = MoveList::new();
    push_ace_moves(game, &mut moves);
    push_foundation_moves(game, &mut moves);
    push_revealing_moves(game, &mut moves);
    push_waste_to_tableau_moves(game, &mut moves);
    push_draw_move(game, &mut moves);
    push_tableau_moves(game, move_cache, &mut moves);
    moves
}

/// An accessible Ace always has an empty foundation slot waiting for it.
fn push_ace_moves(game: &Game, moves: &mut MoveList) {
    if let Some(card) = game.waste_top()
        && card.is_ace()
    {
        moves.push(Move::WasteToFoundation);
    }
    for (index, column) in game.tableau().iter().enumerate() {
        if let Some(card) = column.face_up.last()
            && card.is_ace()
        {
            moves.push(Move::TableauToFoundation(index as u8));
        }
    }
}

fn push_foundation_moves(game: &Game, moves: &mut MoveList) {
    if let Some(card) = game.waste_top()
        && !card.is_ace()
        && game.is_valid(Move::WasteToFoundation)
    {
        moves.push(Move::WasteToFoundation);
    }
    for (index, column) in game.tableau().iter().enumerate() {
        let mov = Move::TableauToFoundation(index as u8);
        if let Some(card) = column.face_up.last()
            && !card.is_ace()
            && game.is_valid(mov)
        {
            moves.push(mov);
        }
    }
}

/// Whole-stack moves out of columns that still hide cards. When a king
/// space already exists the deepest pile is exposed first; otherwise the
/// shallowest pile goes first to create a space sooner.
fn push_revealing_moves(game: &Game, moves: &mut MoveList) {
    let tableau = game.tableau();
    let mut revealing: SmallVec<[Move; 16]> = SmallVec::new();
    let mut king_space_available = false;

    for (src, column) in tableau.iter().enumerate() {
        if column.face_up.is_empty() {
            king_space_available = true;
        } else if !column.face_down.is_empty() {
            for dst in 0..TOTAL_COLUMNS {
                if src == dst {
                    continue;
                }
                let mov = Move::TableauToTableau(src as u8, 0, dst as u8);
                if game.is_valid(mov) {
                    revealing.push(mov);
                }
            }
        }
    }

    let down_count = |mov: &Move| match mov {
        Move::TableauToTableau(src, _, _) => tableau[*src as usize].face_down.len(),
        _ => 0,
    };
    let src_col = |mov: &Move| match mov {
        Move::TableauToTableau(src, _, _) => *src,
        _ => 0,
    };
    revealing.sort_by(|a, b| {
        let (a_count, b_count) = (down_count(a), down_count(b));
        let by_depth = if king_space_available {
            b_count.cmp(&a_count)
        } else {
            a_count.cmp(&b_count)
        };
        by_depth.then_with(|| src_col(a).cmp(&src_col(b)))
    });

    moves.extend_from_slice(&revealing);
}

fn push_waste_to_tableau_moves(game: &Game, moves: &mut MoveList) {
    for dst in 0..TOTAL_COLUMNS {
        let mov = Move::WasteToTableau(dst as u8);
        if game.is_valid(mov) {
            moves.push(mov);
        }
    }
}

fn push_draw_move(game: &Game, moves: &mut MoveList) {
    if game.is_valid(Move::Draw) {
        moves.push(Move::Draw);
    }
}

/// Non-revealing tableau-to-tableau moves, cached per tableau layout; their
/// validity depends on nothing outside the tableau. Row 0 is skipped: it is
/// either a revealing move emitted above or a pointless king shuffle
/// between empty spaces.
fn push_tableau_moves(game: &Game, move_cache: &mut TableauMoveCache, moves: &mut MoveList) {
    let key = tableau_key(game);
    if let Some(cached) = move_cache.get(&key) {
        moves.extend_from_slice(cached.as_slice());
        return;
    }

    let mut new_moves = TableauMoveList::new();
    for (src, column) in game.tableau().iter().enumerate() {
        for row in 1..column.face_up.len() {
            for dst in 0..TOTAL_COLUMNS {
                if src == dst {
                    continue;
                }
                let mov = Move::TableauToTableau(src as u8, row as u8, dst as u8);
                if game.is_valid(mov) {
                    new_moves.push(mov);
                }
            }
        }
    }

    moves.extend_from_slice(&new_moves);
    move_cache.insert(key, new_moves);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves_for(text: &str) -> (MoveList, TableauMoveCache) {
        let game = Game::parse(text).unwrap();
        let mut cache = TableauMoveCache::new(100);
        let moves = valid_moves(&game, &mut cache);
        (moves, cache)
    }

    #[test]
    fn test_priority_order() {
        let text = "Talon: 3♦|A♥4♦\nFoundation: A♠\nTableau0: 2♥|A♣\nTableau1: |2♠\nDrawCount: 3";
        let (moves, _) = moves_for(text);
        assert_eq!(
            moves.as_slice(),
            &[
                Move::WasteToFoundation,
                Move::TableauToFoundation(0),
                Move::TableauToFoundation(1),
                Move::WasteToTableau(1),
                Move::Draw,
            ]
        );
    }

    #[test]
    fn test_revealing_sort_without_king_space() {
        let text = "Tableau0: |2♦\nTableau1: 5♥|8♠\nTableau2: |2♥\nTableau3: 3♣4♣5♣|8♥\nTableau4: |2♠\nTableau5: |9♦\nTableau6: |9♠\nDrawCount: 3";
        let (moves, _) = moves_for(text);
        // Shallowest hidden pile first: it is closest to opening a space.
        assert_eq!(
            moves.as_slice(),
            &[
                Move::TableauToTableau(1, 0, 5),
                Move::TableauToTableau(3, 0, 6),
            ]
        );
    }

    #[test]
    fn test_revealing_sort_with_king_space() {
        let text = "Tableau1: 5♥|8♠\nTableau3: 3♣4♣5♣|8♥\nTableau5: |9♦\nTableau6: |9♠\nDrawCount: 3";
        let (moves, _) = moves_for(text);
        // A space already exists, so expose the deepest pile first.
        assert_eq!(
            moves.as_slice(),
            &[
                Move::TableauToTableau(3, 0, 6),
                Move::TableauToTableau(1, 0, 5),
            ]
        );
    }

    #[test]
    fn test_non_revealing_moves_are_cached() {
        let text = "Tableau0: |Q♠J♥T♣\nTableau2: |J♦\nDrawCount: 3";
        let game = Game::parse(text).unwrap();
        let mut cache = TableauMoveCache::new(100);

        let first = valid_moves(&game, &mut cache);
        assert_eq!(first.as_slice(), &[Move::TableauToTableau(0, 2, 2)]);
        assert_eq!(cache.len(), 1);

        let second = valid_moves(&game, &mut cache);
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_generator_is_deterministic() {
        let text = "Talon: 3♦|A♥4♦\nTableau1: 5♥|8♠\nTableau5: |9♦\nDrawCount: 3";
        let (a, _) = moves_for(text);
        let (b, _) = moves_for(text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_moves_from_dead_state() {
        let (moves, _) = moves_for("Tableau0: |5♠\nDrawCount: 3");
        assert!(moves.is_empty());
    }
}
