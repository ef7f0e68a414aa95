//! Colored terminal output utilities.

use console::{Style, Term};

/// Width of the progress bar in characters.
const PROGRESS_WIDTH: usize = 30;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a highlighted message (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    /// Print a progress line for the current page.
    pub(crate) fn progress(&self, current: usize, total: usize, label: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {label}", progress_bar(current, total)));
    }

    /// Print a separator line.
    pub(crate) fn separator(&self) {
        let _ = self.term.write_line(&"=".repeat(70));
    }
}

/// Render `[####------] (current / total)`.
fn progress_bar(current: usize, total: usize) -> String {
    let filled = if total == 0 {
        PROGRESS_WIDTH
    } else {
        current.min(total) * PROGRESS_WIDTH / total
    };
    format!(
        "[{}{}] ({current} / {total})",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}
