//! Item-to-item cosine similarity over historical purchase vectors
//!
//! Every item gets a sparse row of summed quantities, one column per
//! [`SimilarityAxis`] key. Pairwise cosine similarity of those rows forms a
//! dense, symmetric matrix that is rebuilt wholesale on each refresh.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{Basket, ItemId, TransactionRecord};
use crate::errors::EngineError;

/// Column key for the item-by-context quantity matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityAxis {
    /// One column per transaction id.
    #[default]
    Transaction,
    /// One column per calendar date. Merges every shopper of that day into a
    /// single pseudo-user, so only use it when no real basket id exists.
    Date,
}

impl SimilarityAxis {
    fn column_key(self, record: &TransactionRecord) -> String {
        match self {
            Self::Transaction => record.transaction_id.0.clone(),
            Self::Date => record.date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl std::str::FromStr for SimilarityAxis {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "transaction" => Ok(Self::Transaction),
            "date" => Ok(Self::Date),
            other => Err(EngineError::InvalidParameter(format!(
                "unsupported similarity axis `{other}` (expected transaction|date)"
            ))),
        }
    }
}

/// An item with its accumulated similarity to the basket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub score: f64,
}

/// Square item-by-item cosine similarity, scores in `[0, 1]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimilarityMatrix {
    items: Vec<ItemId>,
    index: HashMap<ItemId, usize>,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Items with a row in the matrix, ascending by id.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.index.contains_key(item)
    }

    /// Zero when either item has no row.
    pub fn similarity(&self, a: &ItemId, b: &ItemId) -> f64 {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&row), Some(&column)) => self.scores[row * self.items.len() + column],
            _ => 0.0,
        }
    }

    fn row(&self, row: usize) -> &[f64] {
        let width = self.items.len();
        &self.scores[row * width..(row + 1) * width]
    }
}

pub fn build_similarity(transactions: &[TransactionRecord]) -> SimilarityMatrix {
    build_similarity_with_axis(transactions, SimilarityAxis::Transaction)
}

pub fn build_similarity_with_axis(
    transactions: &[TransactionRecord],
    axis: SimilarityAxis,
) -> SimilarityMatrix {
    let mut columns: BTreeMap<String, usize> = BTreeMap::new();
    let mut cells: BTreeMap<ItemId, BTreeMap<usize, u64>> = BTreeMap::new();

    for record in transactions {
        let next_column = columns.len();
        let column = *columns.entry(axis.column_key(record)).or_insert(next_column);
        *cells.entry(record.item_id.clone()).or_default().entry(column).or_insert(0) +=
            u64::from(record.quantity);
    }

    let items: Vec<ItemId> = cells.keys().cloned().collect();
    let rows: Vec<Vec<(usize, f64)>> = cells
        .into_values()
        .map(|row| row.into_iter().map(|(column, quantity)| (column, quantity as f64)).collect())
        .collect();
    let squared_norms: Vec<f64> =
        rows.iter().map(|row| row.iter().map(|(_, value)| value * value).sum()).collect();

    let width = items.len();
    let mut scores = vec![0.0; width * width];
    for i in 0..width {
        if squared_norms[i] > 0.0 {
            scores[i * width + i] = 1.0;
        }
        for j in (i + 1)..width {
            let score = cosine(&rows[i], &rows[j], squared_norms[i], squared_norms[j]);
            scores[i * width + j] = score;
            scores[j * width + i] = score;
        }
    }

    let index = items.iter().enumerate().map(|(position, item)| (item.clone(), position)).collect();
    SimilarityMatrix { items, index, scores }
}

/// Both rows are sorted by column. A zero-norm row is dissimilar to everything.
fn cosine(left: &[(usize, f64)], right: &[(usize, f64)], left_sq: f64, right_sq: f64) -> f64 {
    if left_sq == 0.0 || right_sq == 0.0 {
        return 0.0;
    }

    let mut dot = 0.0;
    let (mut l, mut r) = (0, 0);
    while l < left.len() && r < right.len() {
        match left[l].0.cmp(&right[r].0) {
            std::cmp::Ordering::Less => l += 1,
            std::cmp::Ordering::Greater => r += 1,
            std::cmp::Ordering::Equal => {
                dot += left[l].1 * right[r].1;
                l += 1;
                r += 1;
            }
        }
    }

    (dot / (left_sq * right_sq).sqrt()).clamp(0.0, 1.0)
}

/// Ranks every matrix item outside the basket by summed similarity to the
/// basket contents. Ties go to the smaller item id.
pub fn recommend_scored(matrix: &SimilarityMatrix, basket: &Basket, top_n: usize) -> Vec<ScoredItem> {
    if top_n == 0 {
        return Vec::new();
    }

    let width = matrix.len();
    let mut totals = vec![0.0; width];
    for item in basket {
        let Some(&row) = matrix.index.get(item) else {
            continue;
        };
        for (total, score) in totals.iter_mut().zip(matrix.row(row)) {
            *total += score;
        }
    }

    let mut candidates: Vec<ScoredItem> = matrix
        .items
        .iter()
        .zip(totals)
        .filter(|(item, _)| !basket.contains(item))
        .map(|(item, score)| ScoredItem { item_id: item.clone(), score })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.item_id.cmp(&b.item_id)));
    candidates.truncate(top_n);
    candidates
}

pub fn recommend(matrix: &SimilarityMatrix, basket: &Basket, top_n: usize) -> Vec<ItemId> {
    recommend_scored(matrix, basket, top_n).into_iter().map(|scored| scored.item_id).collect()
}
