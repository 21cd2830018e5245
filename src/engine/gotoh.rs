//! Incremental global Gotoh matrix shared by the reference engines.
//!
//! Rows correspond to pattern positions and columns to text positions. A horizontal move consumes
//! a text symbol (deletion) and a vertical move consumes a pattern symbol (insertion). Scores are
//! maximized: matches add the match reward, mismatches and gaps subtract their cost. Both
//! dimensions can grow after construction, which is what banded fill steps need.
use crate::aligner::scoring::AlignmentCosts;
use crate::aligner::Operation;
use crate::errors::{AlignStage, BenchAlignError};
use crate::sequence::Symbol;

const NEG_INF: i64 = i64::MIN / 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Cell {
    h: i64,
    del: i64,
    ins: i64,
    del2: i64,
    ins2: i64,
}

impl Cell {
    fn origin() -> Self {
        Self { h: 0, del: NEG_INF, ins: NEG_INF, del2: NEG_INF, ins2: NEG_INF }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Layer {
    Best,
    Deletion,
    Insertion,
    Deletion2,
    Insertion2,
}

pub struct AffineMatrix<C> {
    costs: C,
    substitution: [[i32; 5]; 5],
    pattern: Vec<Symbol>,
    text: Vec<Symbol>,
    rows: Vec<Vec<Cell>>,
}

impl<C> AffineMatrix<C>
where
    C: AlignmentCosts,
{
    pub fn new(costs: C) -> Self {
        Self {
            costs,
            substitution: costs.substitution_matrix(),
            pattern: Vec::new(),
            text: Vec::new(),
            rows: vec![vec![Cell::origin()]],
        }
    }

    #[inline]
    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    #[inline]
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// Append text symbols, adding columns to every existing row.
    pub fn extend_text(&mut self, symbols: &[Symbol]) {
        if symbols.is_empty() {
            return;
        }

        let start = self.text.len() + 1;
        self.text.extend_from_slice(symbols);

        for i in 0..self.rows.len() {
            for j in start..=self.text.len() {
                let cell = self.compute(i, j);
                self.rows[i].push(cell);
            }
        }
    }

    /// Append pattern symbols, adding one full row per symbol.
    pub fn extend_pattern(&mut self, symbols: &[Symbol]) {
        for &symbol in symbols {
            self.pattern.push(symbol);
            self.rows.push(Vec::with_capacity(self.text.len() + 1));

            let i = self.pattern.len();
            for j in 0..=self.text.len() {
                let cell = self.compute(i, j);
                self.rows[i].push(cell);
            }
        }
    }

    /// Global alignment score of `pattern[..i]` against `text[..j]`.
    #[inline]
    pub fn score(&self, i: usize, j: usize) -> Option<i64> {
        self.rows.get(i).and_then(|row| row.get(j)).map(|cell| cell.h)
    }

    /// Score of aligning the full pattern and text received so far.
    #[inline]
    pub fn corner_score(&self) -> i64 {
        self.rows[self.pattern.len()][self.text.len()].h
    }

    #[inline(always)]
    fn substitution(&self, i: usize, j: usize) -> i64 {
        self.substitution[self.pattern[i].index()][self.text[j].index()] as i64
    }

    fn compute(&self, i: usize, j: usize) -> Cell {
        if i == 0 && j == 0 {
            return Cell::origin();
        }

        let open1 = (self.costs.gap_open() + self.costs.gap_extend()) as i64;
        let ext1 = self.costs.gap_extend() as i64;
        let open2 = (self.costs.gap_open2() + self.costs.gap_extend2()) as i64;
        let ext2 = self.costs.gap_extend2() as i64;
        let two_piece = self.costs.is_two_piece();

        let mut cell = Cell { h: NEG_INF, del: NEG_INF, ins: NEG_INF, del2: NEG_INF, ins2: NEG_INF };

        if j > 0 {
            let left = &self.rows[i][j - 1];
            cell.del = (left.h - open1).max(left.del - ext1);
            if two_piece {
                cell.del2 = (left.h - open2).max(left.del2 - ext2);
            }
        }

        if i > 0 {
            let up = &self.rows[i - 1][j];
            cell.ins = (up.h - open1).max(up.ins - ext1);
            if two_piece {
                cell.ins2 = (up.h - open2).max(up.ins2 - ext2);
            }
        }

        cell.h = cell.del.max(cell.ins).max(cell.del2).max(cell.ins2);

        if i > 0 && j > 0 {
            let diag = self.rows[i - 1][j - 1].h + self.substitution(i - 1, j - 1);
            cell.h = cell.h.max(diag);
        }

        cell
    }

    /// Trace back the optimal global alignment of `pattern[..i]` against `text[..j]`. Aligned
    /// pairs are all reported as [`Operation::Match`].
    pub fn traceback(&self, i: usize, j: usize) -> Result<Vec<Operation>, BenchAlignError> {
        if i > self.pattern.len() || j > self.text.len() {
            return Err(BenchAlignError::EngineFailure {
                stage: AlignStage::Trace,
                reason: format!("traceback start ({i}, {j}) is outside the filled matrix"),
            });
        }

        let open1 = (self.costs.gap_open() + self.costs.gap_extend()) as i64;
        let open2 = (self.costs.gap_open2() + self.costs.gap_extend2()) as i64;

        let mut ops = Vec::with_capacity(i + j);
        let (mut i, mut j) = (i, j);
        let mut layer = Layer::Best;

        while i > 0 || j > 0 {
            let cell = &self.rows[i][j];

            match layer {
                Layer::Best => {
                    if i > 0 && j > 0 && cell.h == self.rows[i - 1][j - 1].h + self.substitution(i - 1, j - 1) {
                        ops.push(Operation::Match);
                        i -= 1;
                        j -= 1;
                    } else if j > 0 && cell.h == cell.del {
                        layer = Layer::Deletion;
                    } else if i > 0 && cell.h == cell.ins {
                        layer = Layer::Insertion;
                    } else if j > 0 && cell.h == cell.del2 {
                        layer = Layer::Deletion2;
                    } else if i > 0 && cell.h == cell.ins2 {
                        layer = Layer::Insertion2;
                    } else {
                        return Err(BenchAlignError::EngineFailure {
                            stage: AlignStage::Trace,
                            reason: format!("inconsistent DP cell at ({i}, {j})"),
                        });
                    }
                },
                Layer::Deletion | Layer::Deletion2 => {
                    let (value, open) = if layer == Layer::Deletion { (cell.del, open1) } else { (cell.del2, open2) };
                    if value == self.rows[i][j - 1].h - open {
                        layer = Layer::Best;
                    }

                    ops.push(Operation::Delete);
                    j -= 1;
                },
                Layer::Insertion | Layer::Insertion2 => {
                    let (value, open) = if layer == Layer::Insertion { (cell.ins, open1) } else { (cell.ins2, open2) };
                    if value == self.rows[i - 1][j].h - open {
                        layer = Layer::Best;
                    }

                    ops.push(Operation::Insert);
                    i -= 1;
                },
            }
        }

        ops.reverse();
        Ok(ops)
    }
}
