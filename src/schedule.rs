//! Turns a 1-5 recall rating into the next review date and an updated difficulty.
//!
//! Difficulty scales the interval: a card sitting at the initial difficulty of 2.5 gets the
//! base interval for its rating, a card at 5.0 gets twice that and a card at 1.25 or below gets
//! half. Every review stretches the interval by another 10%, up to 3x.

use crate::error::Error;
use time::Duration;
use time::OffsetDateTime;

pub const INITIAL_DIFFICULTY: f64 = 2.5;
pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 5.0;

const DIFFICULTY_STEP: f64 = 0.1;
const MIN_DIFFICULTY_MULTIPLIER: f64 = 0.5;
const MAX_DIFFICULTY_MULTIPLIER: f64 = 2.0;
const REVIEW_STEP: f64 = 0.1;
const MAX_REVIEW_MULTIPLIER: f64 = 3.0;

/// How well a card was recalled. 1 means it wasn't recalled at all, 5 means it was recalled
/// perfectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    pub const ALL: [Rating; 5] = [Rating(1), Rating(2), Rating(3), Rating(4), Rating(5)];

    pub fn value(self) -> u8 {
        self.0
    }

    fn base_interval_days(self) -> u32 {
        match self.0 {
            1 => 1,
            2 => 2,
            3 => 4,
            4 => 7,
            _ => 14,
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(Error::InvalidRating(value))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Review {
    pub next_review_date: OffsetDateTime,
    pub new_difficulty: f64,
    pub interval_days: u32,
}

/// `review_count` includes the review being scheduled, so it's 1 the first time a card is rated.
pub fn compute_next_review(
    rating: Rating,
    review_count: u32,
    current_difficulty: f64,
    now: OffsetDateTime,
) -> Review {
    let interval_days = interval_days(rating, review_count, current_difficulty);

    Review {
        next_review_date: now + Duration::days(interval_days.into()),
        new_difficulty: next_difficulty(rating, current_difficulty),
        interval_days,
    }
}

pub fn interval_days(rating: Rating, review_count: u32, current_difficulty: f64) -> u32 {
    let difficulty_multiplier = (current_difficulty / INITIAL_DIFFICULTY)
        .clamp(MIN_DIFFICULTY_MULTIPLIER, MAX_DIFFICULTY_MULTIPLIER);
    let review_multiplier =
        (1.0 + f64::from(review_count) * REVIEW_STEP).min(MAX_REVIEW_MULTIPLIER);

    let days =
        (f64::from(rating.base_interval_days()) * difficulty_multiplier * review_multiplier).round();

    // Never schedule for the moment the card was rated
    std::cmp::max(1, days as u32)
}

fn next_difficulty(rating: Rating, current_difficulty: f64) -> f64 {
    let delta = (f64::from(rating.value()) - 3.0) * DIFFICULTY_STEP;

    (current_difficulty + delta).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// The interval each rating would give, indexed by `rating - 1`.
pub fn preview_intervals(review_count: u32, current_difficulty: f64) -> [u32; 5] {
    Rating::ALL.map(|rating| interval_days(rating, review_count, current_difficulty))
}

pub fn format_interval(days: u32) -> String {
    if days < 7 {
        format!("{days}d")
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(value: u8) -> Rating {
        Rating::try_from(value).unwrap()
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    const DIFFICULTIES: [f64; 9] = [1.0, 1.2, 1.25, 2.0, 2.5, 3.1, 4.0, 4.95, 5.0];

    #[test]
    fn forgotten_card_on_first_review() {
        let review = compute_next_review(rating(1), 1, 2.5, now());

        assert_eq!(review.interval_days, 1);
        assert_eq!(review.next_review_date, now() + Duration::days(1));
        assert_close(review.new_difficulty, 2.3);
    }

    #[test]
    fn middle_rating_on_first_review() {
        let review = compute_next_review(rating(3), 1, 2.5, now());

        assert_eq!(review.interval_days, 4);
        assert_eq!(review.new_difficulty, 2.5);
    }

    #[test]
    fn perfect_recall_on_first_review() {
        let review = compute_next_review(rating(5), 1, 2.5, now());

        assert_eq!(review.interval_days, 15);
        assert_eq!(review.next_review_date, now() + Duration::days(15));
        assert_close(review.new_difficulty, 2.7);
    }

    #[test]
    fn both_multipliers_at_two() {
        let review = compute_next_review(rating(4), 10, 5.0, now());

        assert_eq!(review.interval_days, 28);
        assert_eq!(review.new_difficulty, MAX_DIFFICULTY);
    }

    #[test]
    fn easiest_card_never_review_rounds_up_to_a_day() {
        let review = compute_next_review(rating(2), 0, 1.0, now());

        assert_eq!(review.interval_days, 1);
        assert_eq!(review.new_difficulty, MIN_DIFFICULTY);
    }

    #[test]
    fn no_reviews_means_no_stretch() {
        for r in Rating::ALL {
            assert_eq!(interval_days(r, 0, INITIAL_DIFFICULTY), r.base_interval_days());
        }
    }

    #[test]
    fn review_multiplier_caps_at_three() {
        assert_eq!(interval_days(rating(5), 20, INITIAL_DIFFICULTY), 42);
        assert_eq!(interval_days(rating(5), 500, INITIAL_DIFFICULTY), 42);
    }

    #[test]
    fn difficulty_stays_in_range() {
        for r in Rating::ALL {
            for difficulty in DIFFICULTIES {
                let review = compute_next_review(r, 3, difficulty, now());

                assert!(
                    (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&review.new_difficulty),
                    "rating {r:?} difficulty {difficulty} gave {}",
                    review.new_difficulty
                );
            }
        }
    }

    #[test]
    fn difficulty_follows_rating() {
        for difficulty in DIFFICULTIES {
            assert_eq!(next_difficulty(rating(3), difficulty), difficulty);

            for r in [rating(1), rating(2)] {
                assert!(next_difficulty(r, difficulty) <= difficulty);
            }

            for r in [rating(4), rating(5)] {
                assert!(next_difficulty(r, difficulty) >= difficulty);
            }
        }
    }

    #[test]
    fn always_at_least_a_day_ahead() {
        for r in Rating::ALL {
            for difficulty in DIFFICULTIES {
                for review_count in [0, 1, 2, 5, 19, 20, 100] {
                    let review = compute_next_review(r, review_count, difficulty, now());

                    assert!(review.interval_days >= 1);
                    assert!(review.next_review_date >= now() + Duration::days(1));
                }
            }
        }
    }

    #[test]
    fn more_reviews_never_shorten_interval() {
        for r in Rating::ALL {
            for difficulty in DIFFICULTIES {
                let mut previous = 0;

                for review_count in 0..30 {
                    let days = interval_days(r, review_count, difficulty);

                    assert!(days >= previous, "{r:?} {difficulty} {review_count}");
                    previous = days;
                }
            }
        }
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        assert_eq!(Rating::try_from(0), Err(Error::InvalidRating(0)));
        assert_eq!(Rating::try_from(6), Err(Error::InvalidRating(6)));
        assert_eq!(Rating::try_from(4).map(Rating::value), Ok(4));
    }

    #[test]
    fn preview_lists_every_rating() {
        assert_eq!(preview_intervals(0, INITIAL_DIFFICULTY), [1, 2, 4, 7, 14]);
        assert_eq!(preview_intervals(1, INITIAL_DIFFICULTY), [1, 2, 4, 8, 15]);
    }

    #[test]
    fn format() {
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(6), "6d");
        assert_eq!(format_interval(7), "1w");
        assert_eq!(format_interval(15), "2w");
        assert_eq!(format_interval(42), "1mo");
        assert_eq!(format_interval(400), "1y");
    }
}
