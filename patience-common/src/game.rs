use crate::card::{Card, NUM_RANKS, NUM_SUITS, Rank, Suit, different_colors};
use crate::deck::Deck;
use crate::moves::Move;

use anyhow::{Context, Result, bail};
use smallvec::SmallVec;

pub const TOTAL_COLUMNS: usize = 7;
pub const TALON_SIZE: usize = 24;
pub const MAX_FACE_DOWN: usize = TOTAL_COLUMNS - 1;

/// A face-up run of cards, bottom to top. The top (last) card is the only
/// accessible one; below it ranks descend by one with alternating colors.
pub type CardStack = SmallVec<[Card; NUM_RANKS]>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    pub face_down: SmallVec<[Card; MAX_FACE_DOWN]>,
    pub face_up: CardStack,
}

impl Column {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.face_down.is_empty() && self.face_up.is_empty()
    }
}

/// The full state of a Klondike game.
///
/// The hand and waste share one ordered sequence: the last `waste_size`
/// cards are the flipped region and the accessible waste top sits at index
/// `len - waste_size` (flipping reverses the draw order in place). A `Game`
/// is mutated only through [`Game::apply`]; applying a move that fails
/// [`Game::is_valid`] is a contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    draw_size: usize,
    foundation: [Option<Rank>; NUM_SUITS],
    talon: SmallVec<[Card; TALON_SIZE]>,
    waste_size: usize,
    tableau: [Column; TOTAL_COLUMNS],
}

impl Default for Game {
    fn default() -> Self {
        Self {
            draw_size: 3,
            foundation: [None; NUM_SUITS],
            talon: SmallVec::new(),
            waste_size: 0,
            tableau: std::array::from_fn(|_| Column::default()),
        }
    }
}

impl Game {
    /// Deals a deck: the first 24 cards become the talon (index 0 at the
    /// bottom, index 23 on top), the remaining 28 fill the tableau column by
    /// column with `c` face-down cards plus one face-up card in column `c`.
    pub fn new(deck: &Deck, draw_size: usize) -> Self {
        assert!(draw_size > 0, "Draw size must be at least 1");
        let cards = deck.cards();
        let mut game = Self {
            draw_size,
            talon: SmallVec::from_slice(&cards[..TALON_SIZE]),
            ..Default::default()
        };
        let mut rest = cards[TALON_SIZE..].iter().copied();
        for (i, column) in game.tableau.iter_mut().enumerate() {
            for _ in 0..i {
                if let Some(card) = rest.next() {
                    column.face_down.push(card);
                }
            }
            if let Some(card) = rest.next() {
                column.face_up.push(card);
            }
        }
        game
    }

    #[inline]
    pub fn draw_size(&self) -> usize {
        self.draw_size
    }

    #[inline]
    pub fn foundation_top(&self, suit: Suit) -> Option<Rank> {
        self.foundation[suit as usize]
    }

    /// The hand/waste sequence in its current order.
    #[inline]
    pub fn talon(&self) -> &[Card] {
        &self.talon
    }

    #[inline]
    pub fn waste_size(&self) -> usize {
        self.waste_size
    }

    #[inline]
    pub fn waste_top(&self) -> Option<Card> {
        if self.waste_size == 0 {
            None
        } else {
            Some(self.talon[self.talon.len() - self.waste_size])
        }
    }

    /// True when every talon card is already flipped, so the next draw
    /// would recycle the waste back into the hand.
    #[inline]
    pub fn hand_is_empty(&self) -> bool {
        self.waste_size == self.talon.len()
    }

    #[inline]
    pub fn tableau(&self) -> &[Column; TOTAL_COLUMNS] {
        &self.tableau
    }

    /// The rank the next card on `suit`'s foundation pile must have.
    #[inline]
    fn next_foundation_rank(&self, suit: Suit) -> Rank {
        match self.foundation[suit as usize] {
            Some(rank) => rank + 1,
            None => 0,
        }
    }

    fn fits_on_foundation(&self, card: Card) -> bool {
        card.rank() == self.next_foundation_rank(card.suit())
    }

    /// Whether `card` may be placed on top of `column`: any King on an empty
    /// column, otherwise one rank below the top with the opposite color.
    fn fits_on_column(column: &Column, card: Card) -> bool {
        match column.face_up.last() {
            None => card.is_king(),
            Some(&top) => different_colors(card, top) && card.rank() + 1 == top.rank(),
        }
    }

    /// Pure legality check. Malformed extras (out-of-range columns or rows)
    /// yield `false` rather than an error.
    pub fn is_valid(&self, mov: Move) -> bool {
        match mov {
            Move::Draw => !self.talon.is_empty(),
            Move::WasteToFoundation => match self.waste_top() {
                Some(card) => self.fits_on_foundation(card),
                None => false,
            },
            Move::WasteToTableau(dst) => {
                let Some(card) = self.waste_top() else {
                    return false;
                };
                let Some(column) = self.tableau.get(dst as usize) else {
                    return false;
                };
                Self::fits_on_column(column, card)
            }
            Move::TableauToFoundation(src) => {
                let Some(column) = self.tableau.get(src as usize) else {
                    return false;
                };
                match column.face_up.last() {
                    Some(&card) => self.fits_on_foundation(card),
                    None => false,
                }
            }
            Move::TableauToTableau(src, row, dst) => {
                if src == dst {
                    return false;
                }
                let Some(src_column) = self.tableau.get(src as usize) else {
                    return false;
                };
                let Some(dst_column) = self.tableau.get(dst as usize) else {
                    return false;
                };
                let Some(&card) = src_column.face_up.get(row as usize) else {
                    return false;
                };
                Self::fits_on_column(dst_column, card)
            }
        }
    }

    /// Applies a move that must already satisfy [`Game::is_valid`], then
    /// flips any card exposed by an emptied face-up stack.
    pub fn apply(&mut self, mov: Move) {
        debug_assert!(self.is_valid(mov));
        match mov {
            Move::Draw => {
                if self.waste_size == self.talon.len() {
                    self.waste_size = 0;
                }
                self.waste_size = (self.waste_size + self.draw_size).min(self.talon.len());
            }
            Move::WasteToFoundation => {
                let card = self.take_waste_top();
                self.foundation[card.suit() as usize] = Some(card.rank());
            }
            Move::WasteToTableau(dst) => {
                let card = self.take_waste_top();
                self.tableau[dst as usize].face_up.push(card);
            }
            Move::TableauToFoundation(src) => {
                if let Some(card) = self.tableau[src as usize].face_up.pop() {
                    self.foundation[card.suit() as usize] = Some(card.rank());
                }
            }
            Move::TableauToTableau(src, row, dst) => {
                let (src_column, dst_column) = self.columns_mut(src as usize, dst as usize);
                dst_column
                    .face_up
                    .extend(src_column.face_up.drain(row as usize..));
            }
        }
        self.expose();
    }

    /// The game is won once no talon cards and no face-down cards remain;
    /// from there greedy foundation filling always finishes.
    pub fn is_won(&self) -> bool {
        self.talon.is_empty() && self.tableau.iter().all(|c| c.face_down.is_empty())
    }

    fn take_waste_top(&mut self) -> Card {
        let index = self.talon.len() - self.waste_size;
        self.waste_size -= 1;
        self.talon.remove(index)
    }

    /// Flips the top face-down card of any column whose face-up stack has
    /// emptied. Idempotent.
    fn expose(&mut self) {
        for column in &mut self.tableau {
            if column.face_up.is_empty()
                && let Some(card) = column.face_down.pop()
            {
                column.face_up.push(card);
            }
        }
    }

    fn columns_mut(&mut self, a: usize, b: usize) -> (&mut Column, &mut Column) {
        debug_assert!(a != b);
        if a < b {
            let (left, right) = self.tableau.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.tableau.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    /// Parses the line-oriented text form produced by
    /// [`Game::to_pretty_string`]. Missing sections stay empty.
    pub fn parse(content: &str) -> Result<Self> {
        let mut game = Self::default();

        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty())
        {
            let line_context = || format!("Invalid line {line}");
            if let Some(rest) = line.strip_prefix("Talon:") {
                let (hand, waste) = split_bar(rest.trim());
                let hand_cards = parse_cards(hand).with_context(line_context)?;
                let waste_cards = parse_cards(waste).with_context(line_context)?;
                game.waste_size = waste_cards.len();
                for card in hand_cards.into_iter().chain(waste_cards) {
                    game.talon.push(card);
                }
            } else if let Some(rest) = line.strip_prefix("Foundation:") {
                for card in parse_cards(rest.trim()).with_context(line_context)? {
                    game.foundation[card.suit() as usize] = Some(card.rank());
                }
            } else if let Some(rest) = line.strip_prefix("Tableau") {
                let mut parts = rest.splitn(2, ':');
                let index = parts
                    .next()
                    .unwrap_or("")
                    .trim()
                    .parse::<usize>()
                    .context("Invalid tableau index")
                    .with_context(line_context)?;
                if index >= TOTAL_COLUMNS {
                    bail!("Tableau index {index} out of range");
                }
                let (down, up) = split_bar(parts.next().unwrap_or("").trim());
                let column = &mut game.tableau[index];
                for card in parse_cards(down).with_context(line_context)? {
                    column.face_down.push(card);
                }
                for card in parse_cards(up).with_context(line_context)? {
                    column.face_up.push(card);
                }
            } else if let Some(rest) = line.strip_prefix("DrawCount:") {
                game.draw_size = rest
                    .trim()
                    .parse::<usize>()
                    .context("Invalid DrawCount")
                    .with_context(line_context)?;
            }
        }

        Ok(game)
    }

    pub fn to_pretty_string(&self) -> String {
        let mut output = String::new();

        if !self.talon.is_empty() {
            output.push_str("Talon: ");
            let sep = self.talon.len() - self.waste_size;
            for (i, card) in self.talon.iter().enumerate() {
                if i == sep && self.waste_size > 0 {
                    output.push('|');
                }
                output.push_str(&card.to_pretty_string());
            }
            output.push('\n');
        }

        let foundation: Vec<String> = (0..NUM_SUITS)
            .filter_map(|suit| {
                self.foundation[suit].map(|rank| Card::new(suit as Suit, rank).to_pretty_string())
            })
            .collect();
        if !foundation.is_empty() {
            output.push_str(&format!("Foundation: {}\n", foundation.join(" ")));
        }

        for (i, column) in self.tableau.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            output.push_str(&format!("Tableau{i}: "));
            for card in &column.face_down {
                output.push_str(&card.to_pretty_string());
            }
            if !column.face_up.is_empty() {
                output.push('|');
                for card in &column.face_up {
                    output.push_str(&card.to_pretty_string());
                }
            }
            output.push('\n');
        }

        output.push_str(&format!("DrawCount: {}\n", self.draw_size));

        output
    }
}

fn split_bar(s: &str) -> (&str, &str) {
    match s.find('|') {
        Some(index) => {
            let (before, after) = s.split_at(index);
            (before, &after[1..])
        }
        None => (s, ""),
    }
}

fn parse_cards(s: &str) -> Result<Vec<Card>> {
    let mut cards = Vec::new();
    let mut chars = s.chars().filter(|c| !c.is_whitespace());
    while let Some(rank) = chars.next() {
        let suit = match chars.next() {
            Some(c) => c,
            None => break,
        };
        cards.push(Card::parse(rank, suit)?);
    }
    Ok(cards)
}
