//! Markdown output for the step panels.
//!
//! Inline styling goes through termimad; fenced code is echoed line by line
//! so the generated Python keeps its layout. `--no-color` writes the
//! markdown unchanged.

use anyhow::Result;
use codeflow_core::{OperationStatus, WorkflowStep};
use termimad::{crossterm::style::Color, MadSkin};

const FENCE: &str = "```";

/// Prints panel markdown, status lines, and the step indicator.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.code_block.set_bg(Color::AnsiValue(238));
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Prints a markdown document.
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            if !markdown.ends_with('\n') {
                println!();
            }
            return Ok(());
        }

        // Headers keep their hashes; fenced code is printed verbatim so
        // indentation and underscores survive.
        let mut in_code = false;
        for line in markdown.lines() {
            if line.starts_with(FENCE) {
                in_code = !in_code;
                println!("\x1b[90m{line}\x1b[0m");
            } else if in_code {
                println!("\x1b[36m{line}\x1b[0m");
            } else if line.starts_with('#') {
                println!("\x1b[34m{line}\x1b[0m");
            } else {
                self.skin.print_inline(line);
                println!();
            }
        }
        Ok(())
    }

    /// Prints a one-line outcome message.
    pub fn status(&self, status: &OperationStatus) -> Result<()> {
        if self.rich_enabled {
            let color = if status.success { 32 } else { 31 };
            print!("\x1b[{color}m{status}\x1b[0m");
            Ok(())
        } else {
            self.render(&status.to_string())
        }
    }

    /// Prints the step indicator with the current step highlighted.
    pub fn steps(&self, current: WorkflowStep) -> Result<()> {
        println!("{}", step_indicator(current, self.rich_enabled));
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// `Request > [Plan] > Code > Follow-up` with completed steps ticked.
fn step_indicator(current: WorkflowStep, rich: bool) -> String {
    WorkflowStep::ALL
        .iter()
        .map(|step| {
            let label = step.label();
            if *step == current {
                if rich {
                    format!("\x1b[1;34m[{label}]\x1b[0m")
                } else {
                    format!("[{label}]")
                }
            } else if step.index() < current.index() {
                format!("✓ {label}")
            } else {
                label.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" > ")
}
