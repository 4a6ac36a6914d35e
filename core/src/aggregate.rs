//! Rating aggregate computation.
//!
//! The aggregate is a pure function of the approved ratings of a product.
//! It is always rebuilt from the full rating set and written wholesale; there
//! is no increment/decrement path.

use crate::types::Rating;
use serde::{Deserialize, Serialize};

/// Count of approved reviews per star value.
///
/// Serialized as `{"1": n, "2": n, "3": n, "4": n, "5": n}` with every star
/// present, zeros included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBreakdown {
    /// One-star reviews
    #[serde(rename = "1", default)]
    pub one: u64,
    /// Two-star reviews
    #[serde(rename = "2", default)]
    pub two: u64,
    /// Three-star reviews
    #[serde(rename = "3", default)]
    pub three: u64,
    /// Four-star reviews
    #[serde(rename = "4", default)]
    pub four: u64,
    /// Five-star reviews
    #[serde(rename = "5", default)]
    pub five: u64,
}

impl RatingBreakdown {
    /// Count for a star value; zero for anything outside `1..=5`.
    #[must_use]
    pub const fn get(&self, star: u8) -> u64 {
        match star {
            1 => self.one,
            2 => self.two,
            3 => self.three,
            4 => self.four,
            5 => self.five,
            _ => 0,
        }
    }

    fn slot_mut(&mut self, rating: Rating) -> &mut u64 {
        match rating.value() {
            1 => &mut self.one,
            2 => &mut self.two,
            3 => &mut self.three,
            4 => &mut self.four,
            _ => &mut self.five,
        }
    }

    /// Sum over all stars
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.one + self.two + self.three + self.four + self.five
    }

    /// Σ star × count
    #[must_use]
    pub const fn weighted_sum(&self) -> u64 {
        self.one + 2 * self.two + 3 * self.three + 4 * self.four + 5 * self.five
    }
}

/// Denormalized rating summary stored on a product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    /// Mean rating rounded half-up to one decimal; `0` when there are no reviews
    pub average: f64,
    /// Number of approved reviews
    pub count: u64,
    /// Per-star counts
    pub breakdown: RatingBreakdown,
}

impl RatingAggregate {
    /// The aggregate of a product with no approved reviews.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute the aggregate from the ratings of all approved reviews.
    #[must_use]
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut breakdown = RatingBreakdown::default();
        for rating in ratings {
            *breakdown.slot_mut(*rating) += 1;
        }
        Self::from_breakdown(breakdown)
    }

    /// Compute count and average from a breakdown.
    #[must_use]
    pub fn from_breakdown(breakdown: RatingBreakdown) -> Self {
        let count = breakdown.total();
        Self {
            average: rounded_average(breakdown.weighted_sum(), count),
            count,
            breakdown,
        }
    }

    /// Whether count, breakdown and average agree with each other.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let expected = rounded_average(self.breakdown.weighted_sum(), self.count);
        self.breakdown.total() == self.count && self.average.to_bits() == expected.to_bits()
    }
}

/// `round(sum / count, 1)` with half-up rounding, done in integer tenths so
/// the result is the same on every platform.
#[allow(clippy::cast_precision_loss)] // tenths stay far below 2^52
fn rounded_average(sum: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let tenths = (sum * 20 + count) / (2 * count);
    tenths as f64 / 10.0
}

/// Comparison of the stored aggregate with a fresh computation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateAudit {
    /// What the product currently carries
    pub stored: RatingAggregate,
    /// What the approved reviews say it should carry
    pub computed: RatingAggregate,
    /// `stored == computed`
    pub consistent: bool,
}

impl AggregateAudit {
    /// Compare a stored aggregate with a recomputed one.
    #[must_use]
    pub fn new(stored: RatingAggregate, computed: RatingAggregate) -> Self {
        Self {
            stored,
            computed,
            consistent: stored == computed,
        }
    }
}
