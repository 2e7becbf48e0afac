//! Small widgets shared by the screen panels.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// A bordered box with a label and one large number.
pub struct StatCard<'a> {
    label: &'a str,
    value: usize,
    color: Color,
    loading: bool,
}

impl<'a> StatCard<'a> {
    pub fn new(label: &'a str, value: usize, color: Color) -> Self {
        Self {
            label,
            value,
            color,
            loading: false,
        }
    }

    /// Show `...` instead of the value.
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

impl Widget for StatCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.color))
            .title(Span::styled(
                format!(" {} ", self.label),
                Style::default().fg(self.color),
            ));
        let inner = block.inner(area);
        block.render(area, buf);

        let text = if self.loading {
            "...".to_string()
        } else {
            self.value.to_string()
        };
        Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(self.color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(inner, buf);
    }
}

/// Render cards side by side in equal columns.
pub fn render_cards(cards: Vec<StatCard<'_>>, area: Rect, buf: &mut Buffer) {
    if cards.is_empty() {
        return;
    }
    let count = cards.len() as u32;
    let chunks = Layout::horizontal(vec![Constraint::Ratio(1, count); cards.len()]).split(area);
    for (card, chunk) in cards.into_iter().zip(chunks.iter()) {
        card.render(*chunk, buf);
    }
}

/// Tab strip line, e.g. ` DICOM | NIFTI ` with the active tab highlighted.
pub fn tab_line<'a>(titles: &[&'a str], active: usize, theme: &Theme) -> Line<'a> {
    let mut spans = Vec::with_capacity(titles.len() * 2 + 1);
    for (i, title) in titles.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", theme.dim_style()));
        }
        let style = if i == active {
            Style::default()
                .fg(theme.hotkey)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            theme.dim_style()
        };
        spans.push(Span::styled(*title, style));
    }
    spans.push(Span::styled("   [ ] switch", theme.dim_style()));
    Line::from(spans)
}

/// Standard panel block.
pub fn panel_block<'a>(title: impl Into<String>, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style(true))
        .title(Span::styled(format!(" {} ", title.into()), theme.header_style()))
}

/// A dim, centered message inside a panel.
pub fn notice<'a>(text: impl Into<String>, theme: &Theme) -> Paragraph<'a> {
    Paragraph::new(Line::from(Span::styled(text.into(), theme.dim_style())))
        .alignment(Alignment::Center)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_stat_card_renders_label_and_value() {
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        StatCard::new("Subjects", 42, Color::Cyan).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("Subjects"));
        assert!(text.contains("42"));
    }

    #[test]
    fn test_loading_card_hides_value() {
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        StatCard::new("Scans", 7, Color::Cyan).loading(true).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("..."));
        assert!(!text.contains('7'));
    }

    #[test]
    fn test_tab_line_lists_titles() {
        let line = tab_line(&["DTI", "fMRI"], 1, &Theme::default());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.starts_with("DTI | fMRI"));
    }
}
