//! Reviewing cards: picking what's due and applying ratings.

use crate::clock::Clock;
use crate::schedule;
use crate::schedule::Rating;
use crate::store::Card;
use crate::store::Progress;
use crate::store::Store;
use anyhow::Result;
use log::info;

pub struct Learning<'a, C: Clock> {
    store: &'a mut Store,
    clock: C,
    rng: fastrand::Rng,
}

impl<'a, C: Clock> Learning<'a, C> {
    pub fn new(store: &'a mut Store, clock: C) -> Self {
        Self::with_rng(store, clock, fastrand::Rng::new())
    }

    pub fn with_rng(store: &'a mut Store, clock: C, rng: fastrand::Rng) -> Self {
        Self { store, clock, rng }
    }

    /// Due cards grouped by deck. Cards within a deck are shuffled so that they aren't always
    /// seen in the same order.
    pub fn due_cards(&mut self, deck_id: Option<u64>) -> Result<Vec<(String, Vec<Card>)>> {
        let cards = self.store.due_cards(self.clock.now(), deck_id)?;

        let mut cards_by_deck: Vec<(String, Vec<Card>)> = vec![];

        // Deck names aren't unique, so groups are split on the deck id
        for (deck_name, card) in cards {
            if let Some((_, current_cards)) = cards_by_deck.last_mut() {
                if current_cards[0].deck_id == card.deck_id {
                    current_cards.push(card);
                    continue;
                }
            }

            cards_by_deck.push((deck_name, vec![card]));
        }

        for (_, cards) in cards_by_deck.iter_mut() {
            self.rng.shuffle(cards);
        }

        Ok(cards_by_deck)
    }

    /// Applies a 1-5 rating to a card. Ratings outside that range are rejected before anything
    /// is scheduled.
    pub fn rate(&mut self, card_id: u64, rating: u8) -> Result<Progress> {
        let rating = Rating::try_from(rating)?;

        // Fails for cards that don't exist or belong to someone else
        self.store.get_card(card_id)?;

        let (review_count, current_difficulty) = self.current_state(card_id)?;
        let review_count = review_count + 1;

        let now = self.clock.now();
        let review = schedule::compute_next_review(rating, review_count, current_difficulty, now);

        info!(
            "rated card {card_id} {} (review #{review_count}), difficulty {current_difficulty:.2} -> {:.2}",
            rating.value(),
            review.new_difficulty
        );

        self.store
            .record_review(card_id, rating, review_count, &review, now)
    }

    /// Intervals in days that each rating would give the card right now, indexed by
    /// `rating - 1`.
    pub fn preview(&self, card_id: u64) -> Result<[u32; 5]> {
        self.store.get_card(card_id)?;

        let (review_count, current_difficulty) = self.current_state(card_id)?;

        Ok(schedule::preview_intervals(
            review_count + 1,
            current_difficulty,
        ))
    }

    fn current_state(&self, card_id: u64) -> Result<(u32, f64)> {
        Ok(match self.store.progress(card_id)? {
            Some(progress) => (progress.review_count, progress.difficulty_rating),
            None => (0, schedule::INITIAL_DIFFICULTY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::Error;
    use time::Duration;
    use time::OffsetDateTime;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn learning(store: &mut Store, now: OffsetDateTime) -> Learning<'_, FixedClock> {
        Learning::with_rng(store, FixedClock(now), fastrand::Rng::with_seed(7))
    }

    #[test]
    fn first_rating_starts_from_initial_difficulty() {
        let mut store = Store::open_in_memory("alice").unwrap();
        let deck = store.create_deck("Spanish", None).unwrap();
        let card = store.create_card(deck, "hola", "hello").unwrap();

        let progress = learning(&mut store, now()).rate(card, 5).unwrap();

        assert_eq!(progress.review_count, 1);
        assert_eq!(progress.next_review_date, now() + Duration::days(15));
        assert_eq!(progress.last_reviewed, now());
        assert!((progress.difficulty_rating - 2.7).abs() < 1e-9);
        assert_eq!(store.progress(card).unwrap(), Some(progress));
    }

    #[test]
    fn later_ratings_build_on_stored_progress() {
        let mut store = Store::open_in_memory("alice").unwrap();
        let deck = store.create_deck("Spanish", None).unwrap();
        let card = store.create_card(deck, "hola", "hello").unwrap();

        learning(&mut store, now()).rate(card, 5).unwrap();

        let later = now() + Duration::days(15);
        let progress = learning(&mut store, later).rate(card, 5).unwrap();

        // 14 days * (2.7 / 2.5) * 1.2
        assert_eq!(progress.review_count, 2);
        assert_eq!(progress.next_review_date, later + Duration::days(18));
        assert!((progress.difficulty_rating - 2.9).abs() < 1e-9);
    }

    #[test]
    fn invalid_rating_changes_nothing() {
        let mut store = Store::open_in_memory("alice").unwrap();
        let deck = store.create_deck("Spanish", None).unwrap();
        let card = store.create_card(deck, "hola", "hello").unwrap();

        for rating in [0, 6, 255] {
            let err = learning(&mut store, now()).rate(card, rating).unwrap_err();

            assert_eq!(err.downcast_ref::<Error>(), Some(&Error::InvalidRating(rating)));
        }

        assert_eq!(store.progress(card).unwrap(), None);
    }

    #[test]
    fn rating_unknown_card() {
        let mut store = Store::open_in_memory("alice").unwrap();

        let err = learning(&mut store, now()).rate(42, 3).unwrap_err();

        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::CardNotFound(42)));
    }

    #[test]
    fn rated_cards_stop_being_due() {
        let mut store = Store::open_in_memory("alice").unwrap();
        let spanish = store.create_deck("Spanish", None).unwrap();
        let french = store.create_deck("French", None).unwrap();
        let hola = store.create_card(spanish, "hola", "hello").unwrap();
        store.create_card(spanish, "gato", "cat").unwrap();
        store.create_card(french, "chat", "cat").unwrap();

        let mut learning = learning(&mut store, now());

        let due = learning.due_cards(None).unwrap();
        let decks: Vec<(&str, usize)> = due
            .iter()
            .map(|(name, cards)| (name.as_str(), cards.len()))
            .collect();
        assert_eq!(decks, vec![("Spanish", 2), ("French", 1)]);

        learning.rate(hola, 4).unwrap();

        let due = learning.due_cards(Some(spanish)).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1.len(), 1);
        assert_eq!(due[0].1[0].front, "gato");
    }

    #[test]
    fn decks_with_the_same_name_stay_apart() {
        let mut store = Store::open_in_memory("alice").unwrap();
        let first = store.create_deck("Spanish", None).unwrap();
        let second = store.create_deck("Spanish", Some("from the second course")).unwrap();
        store.create_card(first, "hola", "hello").unwrap();
        store.create_card(second, "adiós", "goodbye").unwrap();

        let due = learning(&mut store, now()).due_cards(None).unwrap();

        assert_eq!(due.len(), 2);
        assert_eq!(due[0].1.len(), 1);
        assert_eq!(due[0].1[0].deck_id, first);
        assert_eq!(due[1].1.len(), 1);
        assert_eq!(due[1].1[0].deck_id, second);
    }

    #[test]
    fn nothing_due() {
        let mut store = Store::open_in_memory("alice").unwrap();

        assert!(learning(&mut store, now()).due_cards(None).unwrap().is_empty());
    }

    #[test]
    fn preview_uses_next_review_count() {
        let mut store = Store::open_in_memory("alice").unwrap();
        let deck = store.create_deck("Spanish", None).unwrap();
        let card = store.create_card(deck, "hola", "hello").unwrap();

        let learning = learning(&mut store, now());

        assert_eq!(learning.preview(card).unwrap(), [1, 2, 4, 8, 15]);
    }

    #[test]
    fn preview_unknown_or_foreign_card() {
        let mut store = Store::open_in_memory("alice").unwrap();
        let deck = store.create_deck("Spanish", None).unwrap();
        let card = store.create_card(deck, "hola", "hello").unwrap();

        let err = learning(&mut store, now()).preview(42).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::CardNotFound(42)));

        let mut store = store.for_user("bob");
        let err = learning(&mut store, now()).preview(card).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::CardNotFound(card)));
    }
}
