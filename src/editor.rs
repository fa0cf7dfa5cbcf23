//! Writing card text in the user's editor.

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;

const DIVIDER: &str = "----------";

/// Opens the user's editor on the front and back of a card and returns what was saved.
pub fn edit(front: &str, back: &str) -> Result<(String, String)> {
    let output = scrawl::with(&template(front, back))?;

    parse(&output)
}

fn template(front: &str, back: &str) -> String {
    format!("{front}\n{DIVIDER}\n{back}\n")
}

fn parse(output: &str) -> Result<(String, String)> {
    let (front, back) = output
        .split_once(DIVIDER)
        .ok_or_else(|| anyhow!("Missing divider between front and back of card"))?;

    let (front, back) = (front.trim(), back.trim());
    if front.is_empty() {
        bail!("Front of card can't be empty");
    }

    Ok((front.to_string(), back.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_template() {
        let output = template("¿Qué hora es?", "What time is it?");

        let (front, back) = parse(&output).unwrap();

        assert_eq!(front, "¿Qué hora es?");
        assert_eq!(back, "What time is it?");
    }

    #[test]
    fn multiline_sides() {
        let (front, back) = parse("\nline one\nline two\n----------\n\na\nb\n\n").unwrap();

        assert_eq!(front, "line one\nline two");
        assert_eq!(back, "a\nb");
    }

    #[test]
    fn missing_divider() {
        assert!(parse("front\nback\n").is_err());
    }

    #[test]
    fn empty_front() {
        assert!(parse("  \n----------\nback\n").is_err());
    }
}
