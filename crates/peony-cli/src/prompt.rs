use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

/// Line-oriented questions on any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask until the answer is yes or no.
    pub fn yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.ask(&format!("{question} [y/n]: "))?;
            match answer.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer yes or no.")?,
            }
        }
    }

    /// Ask until the answer is one of `choices` (case-insensitive).
    pub fn choice<'a>(&mut self, question: &str, choices: &[&'a str]) -> Result<&'a str> {
        if choices.is_empty() {
            bail!("No choices provided");
        }
        loop {
            let answer = self.ask(&format!("{question} ({}): ", choices.join("/")))?;
            if let Some(choice) = choices.iter().copied().find(|c| c.eq_ignore_ascii_case(&answer)) {
                return Ok(choice);
            }
            writeln!(self.output, "Please choose one of: {}", choices.join(", "))?;
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        if read == 0 {
            bail!("No answer given (end of input)");
        }
        Ok(line.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_yes_no_retries_until_valid() {
        let mut p = prompter("maybe\nYES\n");
        assert!(p.yes_no("Save?").unwrap());
        let shown = String::from_utf8(p.output.clone()).unwrap();
        assert!(shown.contains("Save? [y/n]: "));
        assert!(shown.contains("Please answer yes or no."));

        let mut p = prompter(" n \n");
        assert!(!p.yes_no("Save?").unwrap());
    }

    #[test]
    fn test_eof_is_an_error() {
        let mut p = prompter("");
        assert!(p.yes_no("Save?").is_err());
        let mut p = prompter("what\n");
        assert!(p.choice("Next?", &["rest"]).is_err());
    }

    #[test]
    fn test_choice_is_case_insensitive() {
        let mut p = prompter("later\nEvolve\n");
        let picked = p
            .choice("What next?", &["rest", "evolve", "release", "archive"])
            .unwrap();
        assert_eq!(picked, "evolve");
        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("(rest/evolve/release/archive)"));
        assert!(shown.contains("Please choose one of: rest, evolve, release, archive"));
    }

    #[test]
    fn test_choice_requires_options() {
        let mut p = prompter("x\n");
        assert!(p.choice("Pick", &[]).is_err());
    }
}
