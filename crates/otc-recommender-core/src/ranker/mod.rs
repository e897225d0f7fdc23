//! Top-K ranking of class probabilities.
//!
//! Order: descending probability. Probabilities are compared on a grid of
//! [`TIE_TOLERANCE`]; entries that land on the same grid point are ordered by
//! ascending classifier class index, so the lowest index wins a tie.

use std::cmp::Ordering;

use thiserror::Error;

use crate::models::ClassProbability;

/// Number of recommendations shown to the user.
pub const DEFAULT_TOP_K: usize = 3;

/// Probabilities closer than this are treated as tied.
pub const TIE_TOLERANCE: f64 = 1e-9;

/// Ranker errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type RankResult<T> = Result<T, RankError>;

/// Select the `k` most probable classes.
///
/// Returns `min(k, probabilities.len())` entries. Fails if `k < 1`.
pub fn top_k(probabilities: &[ClassProbability], k: usize) -> RankResult<Vec<ClassProbability>> {
    if k < 1 {
        return Err(RankError::InvalidArgument(format!(
            "k must be at least 1, got {}",
            k
        )));
    }

    let mut ranked = probabilities.to_vec();
    ranked.sort_by(compare);
    ranked.truncate(k);
    Ok(ranked)
}

/// Total order used by [`top_k`].
pub fn compare(a: &ClassProbability, b: &ClassProbability) -> Ordering {
    tie_key(b.probability)
        .cmp(&tie_key(a.probability))
        .then_with(|| a.class_index.cmp(&b.class_index))
}

fn tie_key(probability: f64) -> i64 {
    // NaN maps to 0 through the saturating cast
    (probability / TIE_TOLERANCE).round() as i64
}
