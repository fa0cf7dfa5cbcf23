use crate::editor;
use crate::prompt;
use anyhow::Result;
use flashcards::clock::Clock;
use flashcards::clock::LocalClock;
use flashcards::schedule;
use flashcards::store::Card;
use flashcards::Learning;
use flashcards::Store;

pub struct App {
    store: Store,
}

impl App {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn add(&mut self, deck_id: u64) -> Result<()> {
        let deck_name = self.store.get_deck(deck_id)?.name;

        let (front, back) = editor::edit("", "")?;

        let card_id = self.store.create_card(deck_id, &front, &back)?;

        println!("Added card {card_id} to {deck_name}");

        Ok(())
    }

    pub fn cards(&self, deck_id: Option<u64>) -> Result<()> {
        let now = LocalClock.now();

        for card in self.store.card_previews(deck_id)? {
            let front = card.front.replace('\n', " ");

            if card.review_count == 0 {
                println!("[new] {} {front}", card.id);
            } else if card.is_due(now) {
                println!("[due] {} {front}", card.id);
            } else {
                println!("{} {front}", card.id);
            }
        }

        Ok(())
    }

    pub fn create_deck(&mut self, name: &str, description: Option<&str>) -> Result<()> {
        let id = self.store.create_deck(name, description)?;

        println!("Created {} ({id})", name.trim());

        Ok(())
    }

    pub fn decks(&self) -> Result<()> {
        for deck in self.store.decks()? {
            match deck.description {
                Some(description) => println!(
                    "{} {} - {} cards ({description})",
                    deck.id, deck.name, deck.card_count
                ),
                None => println!("{} {} - {} cards", deck.id, deck.name, deck.card_count),
            }
        }

        Ok(())
    }

    pub fn delete(&mut self, card_id: u64) -> Result<()> {
        let front = self.store.get_card(card_id)?.front;

        if prompt::binary(format!(
            "Are you sure you want to delete '{}'?",
            front.replace('\n', " ")
        ))? {
            self.store.delete_card(card_id)?;
            println!("... deleted.");
        }

        Ok(())
    }

    pub fn delete_deck(&mut self, deck_id: u64) -> Result<()> {
        let deck = self.store.get_deck(deck_id)?;

        if prompt::binary(format!(
            "Are you sure you want to delete '{}' and its {} cards?",
            deck.name, deck.card_count
        ))? {
            self.store.delete_deck(deck_id)?;
            println!("... deleted.");
        }

        Ok(())
    }

    pub fn due(&mut self, deck_id: Option<u64>) -> Result<()> {
        let cards = Learning::new(&mut self.store, LocalClock).due_cards(deck_id)?;

        for (deck_name, cards) in cards {
            println!("{deck_name}");

            for card in cards {
                println!("  {} {}", card.id, card.front.replace('\n', " "));
            }
        }

        Ok(())
    }

    pub fn edit(&mut self, card_id: u64) -> Result<()> {
        let card = self.store.get_card(card_id)?;

        let (front, back) = editor::edit(&card.front, &card.back)?;

        self.store.update_card(card_id, &front, &back)
    }

    pub fn init(&mut self) -> Result<()> {
        self.store.init()
    }

    pub fn rate(&mut self, card_id: u64, rating: u8) -> Result<()> {
        let progress = Learning::new(&mut self.store, LocalClock).rate(card_id, rating)?;

        println!(
            "Next review on {} (difficulty {:.1})",
            progress.next_review_date.date(),
            progress.difficulty_rating
        );

        Ok(())
    }

    pub fn rename_deck(&mut self, deck_id: u64, name: &str) -> Result<()> {
        let old_name = self.store.get_deck(deck_id)?.name;

        self.store.rename_deck(deck_id, name)?;

        println!("Renamed {old_name} to {}", name.trim());

        Ok(())
    }

    pub fn review(&mut self, deck_id: Option<u64>) -> Result<()> {
        let mut learning = Learning::new(&mut self.store, LocalClock);

        let cards = learning.due_cards(deck_id)?;

        println!(
            "{} cards to review",
            cards.iter().flat_map(|(_, cc)| cc).count()
        );

        for (deck_name, cards) in cards {
            let num_cards = cards.len();

            println!("\n{num_cards} cards to review in {deck_name}\n");

            let mut total_rating = 0u32;

            for card in cards {
                let rating = review_card(&learning, &card)?;
                total_rating += u32::from(rating);

                let progress = learning.rate(card.id, rating)?;
                println!("Next review on {}", progress.next_review_date.date());

                println!();
            }

            println!(
                "Average rating {:.1} over {num_cards} cards",
                f64::from(total_rating) / num_cards as f64
            );
        }

        println!("Finished review");

        Ok(())
    }

    pub fn show(&self, card_id: u64) -> Result<()> {
        let card = self.store.get_card(card_id)?;
        let deck = self.store.get_deck(card.deck_id)?;

        println!("{} ({})\n", card.id, deck.name);
        println!("{}", card.front);
        println!("{}", "-".repeat(79));
        println!("{}\n", card.back);

        match self.store.progress(card_id)? {
            Some(progress) => {
                let due = if progress.is_due(LocalClock.now()) {
                    " (due)"
                } else {
                    ""
                };

                println!("Difficulty: {:.1}", progress.difficulty_rating);
                println!("Reviews: {}", progress.review_count);
                println!("Next review: {}{due}", progress.next_review_date.date());
                println!("Last reviewed: {}", progress.last_reviewed.date());
            }
            None => println!("Not reviewed yet"),
        }

        Ok(())
    }

    pub fn stats(&self) -> Result<()> {
        let (global_stats, deck_stats) = self.store.stats(LocalClock.now())?;

        println!("{global_stats}");

        for stats in deck_stats {
            println!("\n{stats}");
        }

        Ok(())
    }

    pub fn switch(&mut self, card_id: u64, deck_id: u64) -> Result<()> {
        let front = self.store.get_card(card_id)?.front;
        let deck_name = self.store.get_deck(deck_id)?.name;

        if prompt::binary(format!(
            "Are you sure you want to switch '{}' to {deck_name}?",
            front.replace('\n', " ")
        ))? {
            self.store.switch_deck(card_id, deck_id)?;
            println!("... switched.");
        }

        Ok(())
    }
}

fn review_card<C: Clock>(learning: &Learning<'_, C>, card: &Card) -> Result<u8> {
    println!("{}\n", &card.front);

    prompt::any("Press any key to show answer")?;

    println!("{}", "-".repeat(79));

    println!("{}\n", &card.back);

    let intervals = learning.preview(card.id)?;
    let choices: Vec<String> = intervals
        .iter()
        .zip(1..)
        .map(|(days, rating)| format!("{rating}: {}", schedule::format_interval(*days)))
        .collect();

    println!("{}", choices.join("  "));

    prompt::rating("How well did you remember? (1 forgot - 5 perfect)")
}
