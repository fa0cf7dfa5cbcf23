//! Prompts displayed to the user to gather input.

use anyhow::bail;
use anyhow::Result;
use std::io::{stdin, stdout, Stdout, Write};
use termion::clear;
use termion::event::{Event, Key};
use termion::input::TermRead;
use termion::raw::{IntoRawMode, RawTerminal};

#[derive(Debug, PartialEq)]
enum Choice<T> {
    Pick(T),
    Quit,
    Ignore,
}

/// Displays the given prompt and waits for a yes / no answer. Yes maps to true, and no maps to
/// false.
pub fn binary(prompt: impl AsRef<str>) -> Result<bool> {
    let (mut stdout, selection) = read_key(&format!("{} [y/n] ", prompt.as_ref()), yes_or_no)?;

    write!(stdout, "{}\r\n", if selection { "yes" } else { "no" })?;
    stdout.flush()?;

    Ok(selection)
}

/// Displays the given prompt and waits until a key is pressed.
pub fn any(prompt: impl AsRef<str>) -> Result<()> {
    let (mut stdout, ()) = read_key(prompt.as_ref(), |_| Choice::Pick(()))?;

    write!(stdout, "\r{}", clear::AfterCursor)?;
    stdout.flush()?;

    Ok(())
}

/// Displays the given prompt and waits for one of the keys 1 to 5.
pub fn rating(prompt: impl AsRef<str>) -> Result<u8> {
    let (mut stdout, rating) = read_key(&format!("{} ", prompt.as_ref()), one_to_five)?;

    write!(stdout, "{rating}\r\n")?;
    stdout.flush()?;

    Ok(rating)
}

/// Shows `prompt` in raw mode and reads keys until `choose` picks one. Ctrl-c always quits.
/// The terminal is handed back still in raw mode so the caller can echo the answer.
fn read_key<T>(
    prompt: &str,
    mut choose: impl FnMut(Key) -> Choice<T>,
) -> Result<(RawTerminal<Stdout>, T)> {
    let mut stdout = stdout().into_raw_mode()?;
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    for event in stdin().events() {
        let Event::Key(key) = event? else {
            continue;
        };

        let choice = match key {
            Key::Ctrl('c') => Choice::Quit,
            key => choose(key),
        };

        match choice {
            Choice::Pick(value) => return Ok((stdout, value)),
            Choice::Quit => {
                write!(stdout, "\r\n")?;
                stdout.flush()?;

                bail!("Exiting...")
            }
            Choice::Ignore => {}
        }
    }

    bail!("Input closed before answering")
}

fn yes_or_no(key: Key) -> Choice<bool> {
    match key {
        Key::Char('y') => Choice::Pick(true),
        Key::Char('n') => Choice::Pick(false),
        Key::Char('q') => Choice::Quit,
        _ => Choice::Ignore,
    }
}

fn one_to_five(key: Key) -> Choice<u8> {
    match key {
        Key::Char(c @ '1'..='5') => Choice::Pick(c as u8 - b'0'),
        Key::Char('q') => Choice::Quit,
        _ => Choice::Ignore,
    }
}
