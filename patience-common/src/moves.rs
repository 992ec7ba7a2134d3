/// A single Klondike move. Column and row extras are indices into the
/// tableau (0..=6) and into a column's face-up stack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    /// Flip up to `draw_size` cards from the hand onto the waste, recycling
    /// the waste back into the hand first when the hand is exhausted.
    Draw,
    WasteToFoundation,
    WasteToTableau(u8),         // dst_col
    TableauToFoundation(u8),    // src_col
    TableauToTableau(u8, u8, u8), // (src_col, src_row, dst_col)
}

pub const NUM_MOVE_EXTRAS: usize = 3;
const NO_EXTRA: i8 = -1;

impl Move {
    /// Stable wire tag: 0 Draw, 1 WasteToFoundation, 2 WasteToTableau,
    /// 3 TableauToFoundation, 4 TableauToTableau.
    pub fn type_tag(&self) -> u8 {
        match self {
            Move::Draw => 0,
            Move::WasteToFoundation => 1,
            Move::WasteToTableau(_) => 2,
            Move::TableauToFoundation(_) => 3,
            Move::TableauToTableau(..) => 4,
        }
    }

    /// The move's extras padded with `-1` sentinels in unused slots.
    pub fn extras(&self) -> [i8; NUM_MOVE_EXTRAS] {
        match *self {
            Move::Draw | Move::WasteToFoundation => [NO_EXTRA; NUM_MOVE_EXTRAS],
            Move::WasteToTableau(dst) => [dst as i8, NO_EXTRA, NO_EXTRA],
            Move::TableauToFoundation(src) => [src as i8, NO_EXTRA, NO_EXTRA],
            Move::TableauToTableau(src, row, dst) => [src as i8, row as i8, dst as i8],
        }
    }
}

/// Renders a move list in compact columns, compressing runs of draws.
pub fn format_moves(moves: &[Move]) -> String {
    let mut list = vec![];
    let mut i = 0;
    while i < moves.len() {
        match moves[i] {
            Move::Draw => {
                let mut count = 1;
                while i + count < moves.len() && matches!(moves[i + count], Move::Draw) {
                    count += 1;
                }
                let str = if count == 1 {
                    "D".into()
                } else {
                    format!("{count}D")
                };
                list.push(str);
                i += count;
                continue;
            }
            Move::WasteToFoundation => {
                list.push("W:F".into());
            }
            Move::WasteToTableau(dst) => {
                list.push(format!("W:T{}", dst + 1));
            }
            Move::TableauToFoundation(src) => {
                list.push(format!("T{}:F", src + 1));
            }
            Move::TableauToTableau(src, row, dst) => {
                let mut str = format!("T{}:T{}", src + 1, dst + 1);
                if row > 0 {
                    str.push_str(&format!("@{row}"));
                }
                list.push(str);
            }
        }
        i += 1;
    }

    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for cmd in chunk {
            output.push_str(&format!("{cmd:<width$}", width = max_width));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_and_extras() {
        assert_eq!(Move::Draw.type_tag(), 0);
        assert_eq!(Move::Draw.extras(), [-1, -1, -1]);
        assert_eq!(Move::WasteToFoundation.type_tag(), 1);
        assert_eq!(Move::WasteToTableau(4).extras(), [4, -1, -1]);
        assert_eq!(Move::TableauToFoundation(6).extras(), [6, -1, -1]);
        let mv = Move::TableauToTableau(2, 1, 5);
        assert_eq!(mv.type_tag(), 4);
        assert_eq!(mv.extras(), [2, 1, 5]);
    }

    #[test]
    fn test_format_moves() {
        let moves = [
            Move::Draw,
            Move::Draw,
            Move::Draw,
            Move::WasteToFoundation,
            Move::WasteToTableau(0),
            Move::TableauToTableau(1, 0, 3),
            Move::TableauToTableau(4, 2, 6),
            Move::TableauToFoundation(2),
        ];
        let text = format_moves(&moves);
        let rendered: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rendered, ["3D", "W:F", "W:T1", "T2:T4", "T5:T7@2", "T3:F"]);
    }
}
