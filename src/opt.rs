use anyhow::bail;
use anyhow::Result;
use pico_args::Arguments;
use std::ffi::OsStr;
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "flashcards.db";
const DEFAULT_USER: &str = "default";

pub const HELP: &str = "\
flashcards - spaced repetition flashcards

USAGE:
  flashcards <COMMAND> [OPTIONS]

OPTIONS:
  -p, --path <FILE>     Database file [env: FLASHCARDS_DB] [default: flashcards.db]
  -u, --user <ID>       Whose cards to use [env: FLASHCARDS_USER, USER] [default: default]
  -h, --help            Print help

COMMANDS:
  init                          Create the database
  create-deck <NAME> [DESC]     Create a deck
  decks                         List decks
  rename-deck <DECK> <NAME>     Rename a deck
  delete-deck <DECK>            Delete a deck and its cards
  add <DECK>                    Write a new card in $EDITOR
  edit <CARD>                   Edit a card in $EDITOR
  delete <CARD>                 Delete a card
  switch <CARD> <DECK>          Move a card to another deck
  cards [DECK]                  List cards
  show <CARD>                   Show a card and its progress
  due [DECK]                    List cards due for review
  review [DECK]                 Review due cards
  rate <CARD> <RATING>          Rate a card from 1 (forgot) to 5 (perfect)
  stats                         Show statistics
";

#[derive(Debug, PartialEq)]
pub struct Args {
    pub command: Command,
    pub path: PathBuf,
    pub user: String,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Add { deck_id: u64 },
    Cards { deck_id: Option<u64> },
    CreateDeck { name: String, description: Option<String> },
    Decks,
    Delete { card_id: u64 },
    DeleteDeck { deck_id: u64 },
    Due { deck_id: Option<u64> },
    Edit { card_id: u64 },
    Help,
    Init,
    Rate { card_id: u64, rating: u8 },
    RenameDeck { deck_id: u64, name: String },
    Review { deck_id: Option<u64> },
    Show { card_id: u64 },
    Stats,
    Switch { card_id: u64, deck_id: u64 },
}

impl Args {
    pub fn from_env() -> Result<Self> {
        Self::parse(Arguments::from_env(), |key| std::env::var(key).ok())
    }

    /// Options given on the command line win over the environment, which wins over defaults.
    pub fn parse(mut pargs: Arguments, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let subcommand = pargs.subcommand()?;

        let help = pargs.contains(["-h", "--help"]);

        let path = match pargs.opt_value_from_os_str(["-p", "--path"], parse_path)? {
            Some(path) => path,
            None => env("FLASHCARDS_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
        };

        let user = match pargs.opt_value_from_str::<_, String>(["-u", "--user"])? {
            Some(user) => user,
            None => env("FLASHCARDS_USER")
                .or_else(|| env("USER"))
                .unwrap_or_else(|| DEFAULT_USER.to_string()),
        };

        let command = if help {
            Command::Help
        } else {
            match subcommand.as_deref() {
                None => Command::Help,
                Some("add") => Command::Add {
                    deck_id: pargs.free_from_str()?,
                },
                Some("cards") => Command::Cards {
                    deck_id: pargs.opt_free_from_str()?,
                },
                Some("create-deck") => Command::CreateDeck {
                    name: pargs.free_from_str()?,
                    description: pargs.opt_free_from_str()?,
                },
                Some("decks") => Command::Decks,
                Some("delete") => Command::Delete {
                    card_id: pargs.free_from_str()?,
                },
                Some("delete-deck") => Command::DeleteDeck {
                    deck_id: pargs.free_from_str()?,
                },
                Some("due") => Command::Due {
                    deck_id: pargs.opt_free_from_str()?,
                },
                Some("edit") => Command::Edit {
                    card_id: pargs.free_from_str()?,
                },
                Some("init") => Command::Init,
                Some("rate") => Command::Rate {
                    card_id: pargs.free_from_str()?,
                    rating: pargs.free_from_str()?,
                },
                Some("rename-deck") => Command::RenameDeck {
                    deck_id: pargs.free_from_str()?,
                    name: pargs.free_from_str()?,
                },
                Some("review") => Command::Review {
                    deck_id: pargs.opt_free_from_str()?,
                },
                Some("show") => Command::Show {
                    card_id: pargs.free_from_str()?,
                },
                Some("stats") => Command::Stats,
                Some("switch") => Command::Switch {
                    card_id: pargs.free_from_str()?,
                    deck_id: pargs.free_from_str()?,
                },
                Some(other) => bail!("unknown command '{other}'"),
            }
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            bail!("unexpected arguments: {remaining:?}");
        }

        Ok(Self {
            command,
            path,
            user,
        })
    }
}

fn parse_path(s: &OsStr) -> Result<PathBuf, &'static str> {
    Ok(s.into())
}
