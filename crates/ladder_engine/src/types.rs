//! Core domain types for the ladder.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Player in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Player {
    /// Player X (the human, always moves first).
    X,
    /// Player O (the computer opponent).
    O,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// The mark this player writes on a normal move.
    pub fn mark(self) -> Mark {
        Mark::Occupied(self)
    }
}

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Empty cell.
    #[default]
    Empty,
    /// Cell owned by a player.
    Occupied(Player),
    /// Wildcard left behind by an overlay move. Counts toward either player's
    /// line, owned by neither.
    Neutral,
}

impl Mark {
    /// True for [`Mark::Empty`].
    pub fn is_empty(self) -> bool {
        matches!(self, Mark::Empty)
    }

    /// True if this mark satisfies a winning line for `player`.
    pub fn counts_for(self, player: Player) -> bool {
        match self {
            Mark::Occupied(p) => p == player,
            Mark::Neutral => true,
            Mark::Empty => false,
        }
    }

    /// Single-character symbol used by the text renderers.
    pub fn symbol(self) -> char {
        match self {
            Mark::Empty => '.',
            Mark::Occupied(Player::X) => 'X',
            Mark::Occupied(Player::O) => 'O',
            Mark::Neutral => 'N',
        }
    }
}

/// Square board of side 3 or 4, stored row-major.
///
/// Index `i` maps to row `i / side` and column `i % side`. The length is
/// always `side * side`; nothing in the crate resizes a board in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    side: usize,
    cells: Vec<Mark>,
}

impl Board {
    /// Creates an empty board with the given side length.
    #[instrument]
    pub fn new(side: usize) -> Self {
        Self {
            side,
            cells: vec![Mark::Empty; side * side],
        }
    }

    /// Builds a board from explicit cells.
    ///
    /// Returns `None` unless `cells.len()` is `side * side`.
    pub fn from_cells(side: usize, cells: Vec<Mark>) -> Option<Self> {
        (cells.len() == side * side).then_some(Self { side, cells })
    }

    /// Side length.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Gets the mark at `index`, or `None` when out of bounds.
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied()
    }

    /// Writes `mark` at `index`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, index: usize, mark: Mark) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = mark;
        }
    }

    /// Checks if the cell at `index` exists and is empty.
    pub fn is_empty_at(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Mark::Empty))
    }

    /// Checks if every cell is non-empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|m| !m.is_empty())
    }

    /// Returns all cells in row-major order.
    pub fn cells(&self) -> &[Mark] {
        &self.cells
    }

    /// Row and column of a flat index.
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.side, index % self.side)
    }

    /// Flat index of a row and column.
    pub fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.side + col
    }

    /// Indices of empty cells.
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.is_empty_at(i)).collect()
    }

    /// Formats the board as a human-readable grid.
    ///
    /// Empty cells show their 1-based index so a player can type it back.
    pub fn display(&self) -> String {
        let width = self.len().to_string().len();
        let mut result = String::new();
        for row in 0..self.side {
            for col in 0..self.side {
                let pos = self.index_of(row, col);
                let symbol = match self.cells[pos] {
                    Mark::Empty => (pos + 1).to_string(),
                    other => other.symbol().to_string(),
                };
                result.push_str(&format!("{:>width$}", symbol));
                if col + 1 < self.side {
                    result.push('|');
                }
            }
            if row + 1 < self.side {
                result.push('\n');
                let rule = vec!["-".repeat(width); self.side].join("+");
                result.push_str(&rule);
                result.push('\n');
            }
        }
        result
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Outcome of a decided game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Player won the game.
    Winner(Player),
    /// Game ended in a draw.
    Draw,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Winner(player) => Some(*player),
            Outcome::Draw => None,
        }
    }
}

/// Status of the game on the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Game is ongoing.
    InProgress,
    /// Game reached a terminal state.
    Decided(Outcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(4);
        assert_eq!(board.len(), 16);
        assert!(board.cells().iter().all(|m| m.is_empty()));
        assert!(!board.is_full());
    }

    #[test]
    fn test_from_cells_rejects_wrong_length() {
        assert!(Board::from_cells(3, vec![Mark::Empty; 8]).is_none());
        assert!(Board::from_cells(3, vec![Mark::Empty; 9]).is_some());
    }

    #[test]
    fn test_out_of_bounds_write_is_ignored() {
        let mut board = Board::new(3);
        board.set(9, Mark::Neutral);
        assert_eq!(board.len(), 9);
        assert_eq!(board.get(9), None);
    }

    #[test]
    fn test_neutral_counts_for_both() {
        assert!(Mark::Neutral.counts_for(Player::X));
        assert!(Mark::Neutral.counts_for(Player::O));
        assert!(!Mark::Occupied(Player::O).counts_for(Player::X));
        assert!(!Mark::Empty.counts_for(Player::X));
    }

    #[test]
    fn test_display_shows_indices_for_empty() {
        let mut board = Board::new(3);
        board.set(0, Mark::Occupied(Player::X));
        board.set(4, Mark::Neutral);
        let text = board.display();
        assert!(text.starts_with("X|2|3"));
        assert!(text.contains("4|N|6"));
    }
}
