//! NUCLEUS chat panel: transcript plus input box.

use atlas_chat::{ChatRole, Delivery};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::screen::ChatScreen;
use crate::theme::Theme;
use crate::widget::panel_block;

/// Greedy word wrap to `width` columns. Words longer than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for raw_line in text.split('\n') {
        let mut current = String::new();
        for word in raw_line.split(' ') {
            let mut word = word.to_string();
            loop {
                let current_len = current.chars().count();
                let word_len = word.chars().count();
                let sep = usize::from(current_len > 0);
                if current_len + sep + word_len <= width {
                    if sep == 1 {
                        current.push(' ');
                    }
                    current.push_str(&word);
                    break;
                }
                if current_len > 0 {
                    out.push(std::mem::take(&mut current));
                    continue;
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                out.push(head);
                if word.is_empty() {
                    break;
                }
            }
        }
        out.push(current);
    }
    out
}

/// Chat panel.
pub struct ChatPanel<'a> {
    screen: &'a ChatScreen,
    theme: &'a Theme,
}

impl<'a> ChatPanel<'a> {
    pub fn new(screen: &'a ChatScreen, theme: &'a Theme) -> Self {
        Self { screen, theme }
    }

    fn transcript_lines(&self, width: usize) -> Vec<Line<'static>> {
        let theme = self.theme;
        let mut lines = Vec::new();

        for entry in self.screen.session.entries() {
            let message = &entry.message;
            let color = match message.role {
                ChatRole::User => theme.chat_user,
                ChatRole::Assistant => theme.chat_assistant,
            };
            let mut header = vec![
                Span::styled(
                    message.role.label(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", message.time_label()), theme.dim_style()),
            ];
            if message.role == ChatRole::User && entry.delivery == Delivery::Failed {
                header.push(Span::styled("  (not delivered)", Style::default().fg(theme.status_error)));
            }
            lines.push(Line::from(header));

            let body_style = if message.role == ChatRole::Assistant && entry.delivery == Delivery::Failed {
                Style::default().fg(theme.status_error)
            } else {
                Style::default().fg(theme.text)
            };
            for row in wrap_text(&message.content, width.saturating_sub(2)) {
                lines.push(Line::from(Span::styled(format!("  {}", row), body_style)));
            }
            lines.push(Line::default());
        }

        if self.screen.session.is_pending() {
            lines.push(Line::from(Span::styled(
                "NUCLEUS is thinking...",
                theme.dim_style().add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let block = panel_block("NUCLEUS Orchestrator", theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let input_lines = self.screen.input.split('\n').count().clamp(1, 4) as u16;
        let [transcript_area, input_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(input_lines + 2)]).areas(inner);

        let lines = self.transcript_lines(transcript_area.width as usize);
        let height = transcript_area.height as usize;
        let max_scroll = lines.len().saturating_sub(height);
        let top = max_scroll.saturating_sub(self.screen.scroll as usize);
        Paragraph::new(lines)
            .scroll((top.min(u16::MAX as usize) as u16, 0))
            .render(transcript_area, buf);

        let (title, border) = if self.screen.session.is_pending() {
            (" Waiting for reply... ", theme.border_style(false))
        } else {
            (" Message (Enter send, Shift/Alt+Enter newline, Esc leave) ", theme.border_style(true))
        };
        let input_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(Span::styled(title, theme.dim_style()));

        let mut text: Vec<Line> = self
            .screen
            .input
            .split('\n')
            .map(|l| Line::from(l.to_string()))
            .collect();
        if let Some(last) = text.last_mut() {
            last.spans.push(Span::styled("▏", Style::default().fg(theme.hotkey)));
        }
        let skip = text.len().saturating_sub(input_lines as usize);
        Paragraph::new(text.split_off(skip))
            .block(input_block)
            .render(input_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_breaks_on_words() {
        assert_eq!(wrap_text("hello brave new world", 11), vec!["hello brave", "new world"]);
    }

    #[test]
    fn test_wrap_text_keeps_explicit_newlines() {
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_renders_greeting() {
        let screen = ChatScreen::default();
        let area = Rect::new(0, 0, 90, 16);
        let mut buf = Buffer::empty(area);
        ChatPanel::new(&screen, &Theme::default()).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("NUCLEUS"));
        assert!(text.contains("Hello! I am NUCLEUS"));
    }
}
