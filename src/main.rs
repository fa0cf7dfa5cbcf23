mod app;
mod editor;
mod opt;
mod prompt;

use anyhow::Result;
use app::App;
use flashcards::Store;
use opt::Args;
use opt::Command;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::from_env()?;

    if args.command == Command::Help {
        print!("{}", opt::HELP);
        return Ok(());
    }

    log::debug!("using {} as {}", args.path.display(), args.user);

    let mut app = App::new(Store::open(&args.path, args.user)?);

    match args.command {
        Command::Add { deck_id } => app.add(deck_id),
        Command::Cards { deck_id } => app.cards(deck_id),
        Command::CreateDeck { name, description } => {
            app.create_deck(&name, description.as_deref())
        }
        Command::Decks => app.decks(),
        Command::Delete { card_id } => app.delete(card_id),
        Command::DeleteDeck { deck_id } => app.delete_deck(deck_id),
        Command::Due { deck_id } => app.due(deck_id),
        Command::Edit { card_id } => app.edit(card_id),
        Command::Help => Ok(()),
        Command::Init => app.init(),
        Command::Rate { card_id, rating } => app.rate(card_id, rating),
        Command::RenameDeck { deck_id, name } => app.rename_deck(deck_id, &name),
        Command::Review { deck_id } => app.review(deck_id),
        Command::Show { card_id } => app.show(card_id),
        Command::Stats => app.stats(),
        Command::Switch { card_id, deck_id } => app.switch(card_id, deck_id),
    }
}
