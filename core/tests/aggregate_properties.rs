//! Property tests for rating aggregate invariants.

#![allow(clippy::unwrap_used)] // Tests can unwrap

use product_reviews_core::{Rating, RatingAggregate};
use proptest::prelude::*;

fn ratings_strategy() -> impl Strategy<Value = Vec<Rating>> {
    prop::collection::vec(1u8..=5, 0..200)
        .prop_map(|values| values.into_iter().map(|v| Rating::new(v).unwrap()).collect())
}

proptest! {
    #[test]
    fn breakdown_sums_to_count(ratings in ratings_strategy()) {
        let aggregate = RatingAggregate::from_ratings(&ratings);
        prop_assert_eq!(aggregate.breakdown.total(), aggregate.count);
        prop_assert_eq!(aggregate.count, ratings.len() as u64);
    }

    #[test]
    fn average_is_rounded_mean(ratings in ratings_strategy()) {
        let aggregate = RatingAggregate::from_ratings(&ratings);
        if ratings.is_empty() {
            prop_assert!(aggregate.average.abs() < f64::EPSILON);
        } else {
            let sum: u64 = ratings.iter().map(|r| u64::from(r.value())).sum();
            let mean = sum as f64 / ratings.len() as f64;
            prop_assert!((aggregate.average - mean).abs() <= 0.05 + 1e-9);
            prop_assert!(aggregate.average >= 1.0 && aggregate.average <= 5.0);
            // exactly one decimal place
            let tenths = aggregate.average * 10.0;
            prop_assert!((tenths - tenths.round()).abs() < 1e-9);
        }
        prop_assert!(aggregate.is_consistent());
    }

    #[test]
    fn recomputation_is_idempotent(ratings in ratings_strategy()) {
        let first = RatingAggregate::from_ratings(&ratings);
        let second = RatingAggregate::from_ratings(&ratings);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn order_of_reviews_does_not_matter(mut ratings in ratings_strategy()) {
        let forward = RatingAggregate::from_ratings(&ratings);
        ratings.reverse();
        prop_assert_eq!(forward, RatingAggregate::from_ratings(&ratings));
    }
}
