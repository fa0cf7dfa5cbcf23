//! SQLite persistence for decks, cards and review progress.
//!
//! A [`Store`] belongs to a single user. Every query is filtered by that user's id, so decks,
//! cards and progress owned by someone else behave as if they didn't exist.

use crate::clock;
use crate::error::Error;
use crate::schedule::Rating;
use crate::schedule::Review;
use crate::stats::DeckStats;
use crate::stats::GlobalStats;
use anyhow::Result;
use log::debug;
use rusqlite::config::DbConfig;
use rusqlite::named_params;
use rusqlite::params;
use rusqlite::types::Type;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use std::path::Path;
use time::OffsetDateTime;

pub struct Store {
    conn: Connection,
    user: String,
}

#[derive(Debug)]
pub struct Deck {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub card_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: u64,
    pub deck_id: u64,
    pub front: String,
    pub back: String,
}

#[derive(Debug)]
pub struct CardPreview {
    pub id: u64,
    pub front: String,
    pub review_count: u32,
    pub next_review_date: Option<OffsetDateTime>,
}

impl CardPreview {
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        self.next_review_date.is_none_or(|next| next <= now)
    }
}

/// Where a user is with a card. Only exists once the card has been rated at least once.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub card_id: u64,
    pub difficulty_rating: f64,
    pub review_count: u32,
    pub next_review_date: OffsetDateTime,
    pub last_reviewed: OffsetDateTime,
}

impl Progress {
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        now >= self.next_review_date
    }
}

impl Store {
    pub fn open(db_path: &Path, user: impl Into<String>) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        Self::with_connection(conn, user)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory(user: impl Into<String>) -> Result<Self> {
        let store = Self::with_connection(Connection::open_in_memory()?, user)?;

        store.init()?;

        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn for_user(self, user: impl Into<String>) -> Self {
        Self {
            conn: self.conn,
            user: user.into(),
        }
    }

    fn with_connection(conn: Connection, user: impl Into<String>) -> Result<Self> {
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;

        Ok(Self {
            conn,
            user: user.into(),
        })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("schema.sql"))?;

        debug!("schema ready");

        Ok(())
    }

    pub fn decks(&self) -> Result<Vec<Deck>> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, description, (SELECT COUNT(*) FROM Card WHERE deckId = Deck.id)
            FROM Deck
            WHERE userId = ?
            ORDER BY name
            ",
        )?;

        let iter = stmt.query_map([&self.user], deck_from_row)?;

        let r: Result<_, rusqlite::Error> = iter.collect();

        Ok(r?)
    }

    pub fn get_deck(&self, id: u64) -> Result<Deck> {
        let deck = self
            .conn
            .query_row(
                "
                SELECT id, name, description, (SELECT COUNT(*) FROM Card WHERE deckId = Deck.id)
                FROM Deck
                WHERE id = ? AND userId = ?
                ",
                params![id, self.user],
                deck_from_row,
            )
            .optional()?;

        Ok(deck.ok_or(Error::DeckNotFound(id))?)
    }

    pub fn create_deck(&mut self, name: &str, description: Option<&str>) -> Result<u64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyDeckName.into());
        }

        let now = clock::to_millis(OffsetDateTime::now_utc());

        let id: u64 = self.conn.query_row(
            "
            INSERT INTO Deck(userId, name, description, creationTimestamp)
            VALUES (?, ?, ?, ?)
            RETURNING id
            ",
            params![self.user, name, description, now],
            |row| row.get(0),
        )?;

        debug!("created deck {id} for {}", self.user);

        Ok(id)
    }

    pub fn rename_deck(&mut self, id: u64, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyDeckName.into());
        }

        let updated = self.conn.execute(
            "UPDATE Deck SET name = ? WHERE id = ? AND userId = ?",
            params![name, id, self.user],
        )?;

        if updated == 0 {
            return Err(Error::DeckNotFound(id).into());
        }

        Ok(())
    }

    /// Cards in the deck, along with their progress, are deleted too.
    pub fn delete_deck(&mut self, id: u64) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM Deck WHERE id = ? AND userId = ?",
            params![id, self.user],
        )?;

        if deleted == 0 {
            return Err(Error::DeckNotFound(id).into());
        }

        debug!("deleted deck {id}");

        Ok(())
    }

    pub fn get_card(&self, id: u64) -> Result<Card> {
        let card = self
            .conn
            .query_row(
                "
                SELECT Card.id, Card.deckId, Card.front, Card.back
                FROM Card JOIN Deck ON Card.deckId = Deck.id
                WHERE Card.id = ? AND Deck.userId = ?
                ",
                params![id, self.user],
                card_from_row,
            )
            .optional()?;

        Ok(card.ok_or(Error::CardNotFound(id))?)
    }

    pub fn create_card(&mut self, deck_id: u64, front: &str, back: &str) -> Result<u64> {
        let front = front.trim();
        if front.is_empty() {
            return Err(Error::EmptyFront.into());
        }

        // Only the owner can add to a deck
        self.get_deck(deck_id)?;

        let now = clock::to_millis(OffsetDateTime::now_utc());

        let card_id: u64 = self.conn.query_row(
            "
            INSERT INTO Card(deckId, front, back, creationTimestamp)
            VALUES (?, ?, ?, ?)
            RETURNING id
            ",
            params![deck_id, front, back.trim(), now],
            |row| row.get(0),
        )?;

        debug!("created card {card_id} in deck {deck_id}");

        Ok(card_id)
    }

    pub fn update_card(&mut self, id: u64, front: &str, back: &str) -> Result<()> {
        let front = front.trim();
        if front.is_empty() {
            return Err(Error::EmptyFront.into());
        }

        let updated = self.conn.execute(
            "
            UPDATE Card SET front = ?, back = ?
            WHERE id = ? AND deckId IN (SELECT id FROM Deck WHERE userId = ?)
            ",
            params![front, back.trim(), id, self.user],
        )?;

        if updated == 0 {
            return Err(Error::CardNotFound(id).into());
        }

        Ok(())
    }

    pub fn delete_card(&mut self, id: u64) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM Card WHERE id = ? AND deckId IN (SELECT id FROM Deck WHERE userId = ?)",
            params![id, self.user],
        )?;

        if deleted == 0 {
            return Err(Error::CardNotFound(id).into());
        }

        debug!("deleted card {id}");

        Ok(())
    }

    pub fn switch_deck(&mut self, card_id: u64, deck_id: u64) -> Result<()> {
        self.get_deck(deck_id)?;

        let updated = self.conn.execute(
            "
            UPDATE Card SET deckId = ?
            WHERE id = ? AND deckId IN (SELECT id FROM Deck WHERE userId = ?)
            ",
            params![deck_id, card_id, self.user],
        )?;

        if updated == 0 {
            return Err(Error::CardNotFound(card_id).into());
        }

        Ok(())
    }

    /// Newest first. Limited to one deck when `deck_id` is given.
    pub fn card_previews(&self, deck_id: Option<u64>) -> Result<Vec<CardPreview>> {
        let mut stmt = self.conn.prepare(
            "
            SELECT Card.id, Card.front, Progress.reviewCount, Progress.nextReviewTimestamp
            FROM Card
            JOIN Deck ON Card.deckId = Deck.id
            LEFT JOIN Progress ON Progress.cardId = Card.id AND Progress.userId = Deck.userId
            WHERE Deck.userId = ?1 AND (?2 IS NULL OR Card.deckId = ?2)
            ORDER BY Card.creationTimestamp DESC, Card.id DESC
            ",
        )?;

        let iter = stmt.query_map(params![self.user, deck_id], |row| {
            Ok(CardPreview {
                id: row.get(0)?,
                front: row.get(1)?,
                review_count: row.get::<_, Option<u32>>(2)?.unwrap_or(0),
                next_review_date: optional_timestamp(row, 3)?,
            })
        })?;

        let r: Result<_, rusqlite::Error> = iter.collect();

        Ok(r?)
    }

    pub fn progress(&self, card_id: u64) -> Result<Option<Progress>> {
        Ok(self
            .conn
            .query_row(
                "
                SELECT difficultyRating, reviewCount, nextReviewTimestamp, lastReviewedTimestamp
                FROM Progress
                JOIN Card ON Progress.cardId = Card.id
                JOIN Deck ON Card.deckId = Deck.id
                WHERE Progress.userId = ?1 AND Deck.userId = ?1 AND Progress.cardId = ?2
                ",
                params![self.user, card_id],
                |row| progress_from_row(card_id, row),
            )
            .optional()?)
    }

    /// Stores the outcome of rating a card and appends the rating to the review history.
    /// Returns the progress as stored.
    ///
    /// Concurrent ratings of the same card overwrite each other, except that the review count
    /// never goes backwards.
    pub fn record_review(
        &mut self,
        card_id: u64,
        rating: Rating,
        review_count: u32,
        review: &Review,
        now: OffsetDateTime,
    ) -> Result<Progress> {
        let tx = self.conn.transaction()?;

        let now_ms = clock::to_millis(now);

        // Nothing is written unless the card is in one of the user's decks
        let progress = tx
            .query_row(
                "
                INSERT INTO Progress(
                    userId, cardId, difficultyRating, reviewCount, nextReviewTimestamp, lastReviewedTimestamp
                )
                SELECT ?1, ?2, ?3, ?4, ?5, ?6
                WHERE EXISTS (
                    SELECT 1
                    FROM Card JOIN Deck ON Card.deckId = Deck.id
                    WHERE Card.id = ?2 AND Deck.userId = ?1
                )
                ON CONFLICT(userId, cardId) DO UPDATE SET
                    difficultyRating = excluded.difficultyRating,
                    reviewCount = MAX(reviewCount, excluded.reviewCount),
                    nextReviewTimestamp = excluded.nextReviewTimestamp,
                    lastReviewedTimestamp = excluded.lastReviewedTimestamp
                RETURNING difficultyRating, reviewCount, nextReviewTimestamp, lastReviewedTimestamp
                ",
                params![
                    self.user,
                    card_id,
                    review.new_difficulty,
                    review_count,
                    clock::to_millis(review.next_review_date),
                    now_ms,
                ],
                |row| progress_from_row(card_id, row),
            )
            .optional()?
            .ok_or(Error::CardNotFound(card_id))?;

        tx.execute(
            "INSERT INTO Review(userId, cardId, rating, timestamp) VALUES (?, ?, ?, ?)",
            params![self.user, card_id, rating.value(), now_ms],
        )?;

        tx.commit()?;

        debug!(
            "card {card_id} rated {}, next review in {} days",
            rating.value(),
            review.interval_days
        );

        Ok(progress)
    }

    /// Cards without progress or whose next review has passed, paired with their deck's name.
    /// Ordered by deck, then never reviewed cards, then longest overdue.
    pub fn due_cards(&self, now: OffsetDateTime, deck_id: Option<u64>) -> Result<Vec<(String, Card)>> {
        let mut stmt = self.conn.prepare(
            "
            SELECT Deck.name, Card.id, Card.deckId, Card.front, Card.back
            FROM Card
            JOIN Deck ON Card.deckId = Deck.id
            LEFT JOIN Progress ON Progress.cardId = Card.id AND Progress.userId = Deck.userId
            WHERE Deck.userId = ?1
                AND (?2 IS NULL OR Card.deckId = ?2)
                AND (Progress.cardId IS NULL OR Progress.nextReviewTimestamp <= ?3)
            ORDER BY Card.deckId, Progress.nextReviewTimestamp, Card.id
            ",
        )?;

        let iter = stmt.query_map(
            params![self.user, deck_id, clock::to_millis(now)],
            |row| {
                Ok((
                    row.get(0)?,
                    Card {
                        id: row.get(1)?,
                        deck_id: row.get(2)?,
                        front: row.get(3)?,
                        back: row.get(4)?,
                    },
                ))
            },
        )?;

        let r: Result<_, rusqlite::Error> = iter.collect();

        Ok(r?)
    }

    pub fn stats(&self, now: OffsetDateTime) -> Result<(GlobalStats, Vec<DeckStats>)> {
        let global_stats = self.conn.query_row(
            "
            SELECT
                (SELECT COUNT(*)
                FROM Card JOIN Deck ON Card.deckId = Deck.id
                WHERE Deck.userId = :user) AS cards,

                (SELECT COUNT(*)
                FROM Card JOIN Deck ON Card.deckId = Deck.id
                LEFT JOIN Progress ON Progress.cardId = Card.id AND Progress.userId = Deck.userId
                WHERE Deck.userId = :user AND Progress.cardId IS NULL) AS new,

                (SELECT COUNT(*)
                FROM Progress
                JOIN Card ON Progress.cardId = Card.id
                JOIN Deck ON Card.deckId = Deck.id
                WHERE Progress.userId = :user AND Deck.userId = :user
                    AND Progress.nextReviewTimestamp <= :now) AS dueNow,

                (SELECT COUNT(*)
                FROM Progress
                JOIN Card ON Progress.cardId = Card.id
                JOIN Deck ON Card.deckId = Deck.id
                WHERE Progress.userId = :user AND Deck.userId = :user
                    AND Progress.nextReviewTimestamp <= :reviewSpanEnd) AS dueTomorrow
            ",
            named_params! {
                ":user": self.user,
                ":now": clock::to_millis(now),
                ":reviewSpanEnd": clock::to_millis(clock::end_of_tomorrow(now)),
            },
            |row| {
                Ok(GlobalStats {
                    cards: row.get(0)?,
                    new: row.get(1)?,
                    due_now: row.get(2)?,
                    due_tomorrow: row.get(3)?,
                })
            },
        )?;

        let mut stmt = self.conn.prepare(
            "
            SELECT
                name,

                (SELECT COUNT(*) FROM Card WHERE Card.deckId = d.id) AS cards,

                (SELECT COUNT(*)
                FROM Card LEFT JOIN Progress ON Progress.cardId = Card.id AND Progress.userId = d.userId
                WHERE Card.deckId = d.id AND Progress.cardId IS NULL) AS new,

                (SELECT COUNT(*)
                FROM Card JOIN Progress ON Progress.cardId = Card.id AND Progress.userId = d.userId
                WHERE Card.deckId = d.id AND nextReviewTimestamp <= :now) AS due,

                (SELECT AVG(difficultyRating)
                FROM Card JOIN Progress ON Progress.cardId = Card.id AND Progress.userId = d.userId
                WHERE Card.deckId = d.id) AS averageDifficulty,

                (SELECT COUNT(*)
                FROM Card JOIN Review ON Review.cardId = Card.id AND Review.userId = d.userId
                WHERE Card.deckId = d.id AND Review.timestamp > :accuracySinceTimestamp) AS reviews,

                (SELECT AVG(rating)
                FROM Card JOIN Review ON Review.cardId = Card.id AND Review.userId = d.userId
                WHERE Card.deckId = d.id AND Review.timestamp > :accuracySinceTimestamp) AS averageRating
            FROM Deck AS d
            WHERE d.userId = :user
            ORDER BY name
            ",
        )?;
        let iter = stmt.query_map(
            named_params! {
                ":user": self.user,
                ":now": clock::to_millis(now),
                ":accuracySinceTimestamp": clock::to_millis(clock::thirty_days_ago(now)),
            },
            |row| {
                Ok(DeckStats {
                    name: row.get(0)?,
                    cards: row.get(1)?,
                    new: row.get(2)?,
                    due: row.get(3)?,
                    average_difficulty: row.get(4)?,
                    reviews: row.get(5)?,
                    average_rating: row.get(6)?,
                })
            },
        )?;

        let deck_stats: Result<_, rusqlite::Error> = iter.collect();

        Ok((global_stats, deck_stats?))
    }
}

fn deck_from_row(row: &Row) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        card_count: row.get(3)?,
    })
}

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
    })
}

/// Reads difficultyRating, reviewCount, nextReviewTimestamp, lastReviewedTimestamp.
fn progress_from_row(card_id: u64, row: &Row) -> rusqlite::Result<Progress> {
    Ok(Progress {
        card_id,
        difficulty_rating: row.get(0)?,
        review_count: row.get(1)?,
        next_review_date: timestamp(row, 2)?,
        last_reviewed: timestamp(row, 3)?,
    })
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let millis: i64 = row.get(idx)?;

    clock::from_millis(millis)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn optional_timestamp(row: &Row, idx: usize) -> rusqlite::Result<Option<OffsetDateTime>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(_) => timestamp(row, idx).map(Some),
        None => Ok(None),
    }
}
