use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::store::counter::{CounterState, parse_amount};

/// Text being typed into the custom amount prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountPrompt {
    input: String,
}

impl AmountPrompt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// The amount to add, or `None` if the text is not a valid amount.
    pub fn submit(&self) -> Option<i64> {
        match parse_amount(&self.input) {
            Ok(amount) => Some(amount),
            Err(error) => {
                tracing::debug!(%error, "custom amount rejected");
                None
            }
        }
    }
}

/// The counter panel.
#[derive(Debug, Clone, Copy)]
pub struct CounterView<'a> {
    state: &'a CounterState,
    prompt: Option<&'a AmountPrompt>,
}

impl<'a> CounterView<'a> {
    pub const fn new(state: &'a CounterState) -> Self {
        Self {
            state,
            prompt: None,
        }
    }

    /// Shows the custom amount prompt below the key hints.
    #[must_use]
    pub const fn prompt(mut self, prompt: Option<&'a AmountPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                self.state.value.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
            .centered(),
        ];

        if self.state.is_loading {
            lines.push(Line::from("Processing...".blue()).centered());
        }

        lines.push(Line::default());
        lines.push(
            Line::from(vec![
                "[+]".green().bold(),
                " Add 1  ".into(),
                "[-]".red().bold(),
                " Minus 1  ".into(),
                "[a]".blue().bold(),
                " Add Custom  ".into(),
                "[r]".gray().bold(),
                " Reset".into(),
            ])
            .centered(),
        );

        if let Some(prompt) = self.prompt {
            lines.push(Line::default());
            lines.push(Line::from(vec![
                "Enter amount to add: ".bold(),
                Span::raw(prompt.input().to_string()),
                "█".slow_blink(),
            ]));
            lines.push(Line::from("Enter to confirm, Esc to cancel".dark_gray()));
        }

        lines
    }
}

impl Widget for CounterView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Counter ")
            .title_style(Style::default().add_modifier(Modifier::BOLD));

        Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}
