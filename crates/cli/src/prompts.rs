use anyhow::{Result, bail};
use std::io::{self, IsTerminal, Write};

use symconf_lib::prompt::Prompter;

pub fn confirm(message: &str, force: bool) -> Result<bool> {
  if force {
    return Ok(true);
  }

  if !is_interactive() {
    bail!("Cannot prompt for confirmation in non-interactive mode. Use --force to proceed.");
  }

  write!(io::stderr(), "{} [y/N] ", message)?;
  io::stderr().flush()?;

  let mut input = String::new();
  io::stdin().read_line(&mut input)?;

  Ok(matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn is_interactive() -> bool {
  io::stdin().is_terminal() && io::stderr().is_terminal()
}

fn ask(question: &str) -> Option<String> {
  write!(io::stderr(), "{} ", question).ok()?;
  io::stderr().flush().ok()?;
  let mut input = String::new();
  match io::stdin().read_line(&mut input) {
    Ok(0) | Err(_) => None,
    Ok(_) => Some(input.trim().to_string()),
  }
}

/// Asks on the terminal. Without a terminal, or on empty input, every
/// prompt counts as dismissed.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
  fn confirm(&self, question: &str) -> Option<bool> {
    if !is_interactive() {
      return None;
    }
    match ask(&format!("{question} [y/n]"))?.to_ascii_lowercase().as_str() {
      "y" | "yes" => Some(true),
      "n" | "no" => Some(false),
      _ => None,
    }
  }

  fn choose(&self, question: &str, options: &[&str]) -> Option<usize> {
    if !is_interactive() {
      return None;
    }
    eprintln!("{question}");
    for (i, option) in options.iter().enumerate() {
      eprintln!("  {}) {}", i + 1, option);
    }
    let answer: usize = ask(">")?.parse().ok()?;
    (1..=options.len()).contains(&answer).then(|| answer - 1)
  }
}
