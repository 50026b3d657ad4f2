//! Styled terminal output: status lines, panels, rules, spinners and prompts

use console::{measure_text_width, style, Color, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result};
use std::time::Duration;

pub fn success(message: impl AsRef<str>) {
    println!("{} {}", style("✓").green(), message.as_ref());
}

pub fn warning(message: impl AsRef<str>) {
    println!("{} {}", style("⚠").yellow(), style(message.as_ref()).yellow());
}

pub fn info(message: impl AsRef<str>) {
    println!("{} {}", style("ℹ").cyan(), message.as_ref());
}

pub fn dim(message: impl AsRef<str>) {
    println!("{}", style(message.as_ref()).dim());
}

/// Horizontal rule with a centered title
pub fn rule(title: &str) {
    let width = Term::stdout().size().1.clamp(40, 100) as usize;
    let label = format!(" {} ", title);
    let side = width.saturating_sub(measure_text_width(&label)) / 2;
    println!(
        "{}{}{}",
        style("─".repeat(side)).dim(),
        style(label).bold(),
        style("─".repeat(side)).dim()
    );
}

fn render_panel(title: &str, lines: &[String], color: Color) -> String {
    let inner = lines
        .iter()
        .map(|l| measure_text_width(l))
        .chain(std::iter::once(measure_text_width(title) + 2))
        .max()
        .unwrap_or(0);
    let border = |s: String| style(s).fg(color).to_string();
    let title_width = measure_text_width(title);

    let mut out = String::new();
    out.push_str(&border("╭─ ".to_string()));
    out.push_str(&style(title).fg(color).bold().to_string());
    out.push_str(&border(format!(" {}╮", "─".repeat(inner.saturating_sub(title_width + 1)))));
    out.push('\n');
    for line in lines {
        let pad = inner - measure_text_width(line);
        out.push_str(&border("│ ".to_string()));
        out.push_str(line);
        out.push_str(&" ".repeat(pad));
        out.push_str(&border(" │".to_string()));
        out.push('\n');
    }
    out.push_str(&border(format!("╰{}╯", "─".repeat(inner + 2))));
    out
}

/// Error panel on stderr
pub fn error_panel(title: &str, message: &str, details: Option<&str>) {
    let mut lines = vec![message.to_string()];
    if let Some(details) = details {
        lines.extend(details.lines().map(|l| style(l).dim().to_string()));
    }
    eprintln!("{}", render_panel(&format!("✗ {}", title), &lines, Color::Red));
}

pub fn info_panel(title: &str, content: &str) {
    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    println!("{}", render_panel(title, &lines, Color::Cyan));
}

/// Green panel of `label: value` lines
pub fn result_panel(title: &str, pairs: &[(&str, String)]) {
    let lines: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{} {}", style(format!("{}:", k)).blue(), v))
        .collect();
    println!("{}", render_panel(title, &lines, Color::Green));
}

/// Spinner on stderr, cleared when dropped
pub struct Spinner(ProgressBar);

impl Spinner {
    pub fn start(message: impl Into<String>) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.into());
        pb.enable_steady_tick(Duration::from_millis(100));
        Spinner(pb)
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.0.set_message(message.into());
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

/// Yes/no prompt
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .into_diagnostic()
}

/// Free-text prompt with an optional default
pub fn prompt(prompt: &str, default: Option<&str>) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme).with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_string());
    }
    input.interact_text().into_diagnostic().map(|s| s.trim().to_string())
}

/// Free-text prompt that may be left empty
pub fn prompt_optional(prompt: &str) -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_lines_are_aligned() {
        console::set_colors_enabled(false);
        let panel = render_panel(
            "Budget Updated",
            &["Campaign: A".to_string(), "Daily Budget: 100.00 USD".to_string()],
            Color::Green,
        );
        let widths: Vec<usize> = panel.lines().map(measure_text_width).collect();
        assert_eq!(widths.len(), 4);
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(panel.starts_with("╭─ Budget Updated"));
    }
}
