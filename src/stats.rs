use std::fmt;

#[derive(Debug)]
pub struct GlobalStats {
    pub cards: u32,
    /// Cards that have never been rated.
    pub new: u32,
    pub due_now: u32,
    /// Rated cards due before the end of tomorrow, including those already due.
    pub due_tomorrow: u32,
}

#[derive(Debug)]
pub struct DeckStats {
    pub name: String,
    pub cards: u32,
    pub new: u32,
    pub due: u32,
    pub average_difficulty: Option<f64>,
    /// Ratings given in the past 30 days.
    pub reviews: u32,
    pub average_rating: Option<f64>,
}

impl fmt::Display for GlobalStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} cards, {} new", self.cards, self.new)?;
        writeln!(f, "Due now: {}", self.due_now)?;
        write!(f, "Review by tomorrow: {}", self.due_tomorrow)
    }
}

impl fmt::Display for DeckStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  {} cards, {} new, {} due", self.cards, self.new, self.due)?;

        if let Some(difficulty) = self.average_difficulty {
            writeln!(f, "  Average difficulty: {difficulty:.1}")?;
        }

        match self.average_rating {
            Some(rating) => write!(
                f,
                "  Past month: {} reviews, average rating {rating:.1}",
                self.reviews
            ),
            None => write!(f, "  Past month: no reviews"),
        }
    }
}
