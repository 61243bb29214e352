//! User interaction seam.
//!
//! The engine asks questions (include a dangerous link? apply now or emit
//! scripts?) through a [`Prompter`]. A dismissed prompt answers `None`,
//! which callers treat as "take no action".

/// Asks the user things.
pub trait Prompter: Send + Sync {
  /// Yes/no question. `None` when dismissed.
  fn confirm(&self, question: &str) -> Option<bool>;

  /// Pick one of `options`, by index. `None` when dismissed.
  fn choose(&self, question: &str, options: &[&str]) -> Option<usize>;
}

/// Never asks; every prompt is dismissed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPrompter;

impl Prompter for SilentPrompter {
  fn confirm(&self, _question: &str) -> Option<bool> {
    None
  }

  fn choose(&self, _question: &str, _options: &[&str]) -> Option<usize> {
    None
  }
}

/// Replays canned answers, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
  pub confirm: Option<bool>,
  pub choose: Option<usize>,
  pub asked: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
  fn confirm(&self, question: &str) -> Option<bool> {
    self.asked.lock().unwrap().push(question.to_string());
    self.confirm
  }

  fn choose(&self, question: &str, _options: &[&str]) -> Option<usize> {
    self.asked.lock().unwrap().push(question.to_string());
    self.choose
  }
}
