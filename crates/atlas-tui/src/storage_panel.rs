//! Storage browser panel.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Widget},
};

use crate::browser::{BucketCursor, StorageBrowser};
use crate::format::{format_size, format_timestamp};
use crate::theme::Theme;
use crate::widget::{notice, panel_block, tab_line};

/// Storage browser panel.
pub struct StoragePanel<'a> {
    browser: &'a StorageBrowser,
    theme: &'a Theme,
}

impl<'a> StoragePanel<'a> {
    pub fn new(browser: &'a StorageBrowser, theme: &'a Theme) -> Self {
        Self { browser, theme }
    }

    fn breadcrumb(&self, cursor: &BucketCursor) -> Line<'static> {
        let theme = self.theme;
        let mut spans = vec![
            Span::styled("gs://", theme.dim_style()),
            Span::styled(cursor.location(), Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
        ];
        if cursor.is_loading() {
            spans.push(Span::styled("  loading...", Style::default().fg(theme.status_warning)));
        }
        Line::from(spans)
    }

    fn rows(&self, cursor: &BucketCursor, visible: usize) -> Vec<Row<'static>> {
        let theme = self.theme;
        let selected = cursor.selected_index();
        let offset = selected.saturating_sub(visible.saturating_sub(1));

        cursor
            .entries()
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, entry)| {
                let (icon, name_style) = if entry.is_directory {
                    ("▸ ", Style::default().fg(theme.header))
                } else {
                    ("  ", Style::default().fg(theme.text))
                };
                let size = if entry.is_directory {
                    "-".to_string()
                } else {
                    format_size(entry.size)
                };
                let row = Row::new(vec![
                    Cell::from(Line::from(vec![
                        Span::styled(icon, name_style),
                        Span::styled(entry.name.clone(), name_style),
                    ])),
                    Cell::from(size),
                    Cell::from(format_timestamp(entry.updated)),
                ]);
                if i == selected {
                    row.style(Style::default().bg(theme.selection).add_modifier(Modifier::BOLD))
                } else {
                    row
                }
            })
            .collect()
    }
}

impl Widget for StoragePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let block = panel_block("Storage", theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let [tabs_area, crumb_area, list_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);

        let titles: Vec<&str> = self.browser.buckets().iter().map(|b| b.label.as_str()).collect();
        Paragraph::new(tab_line(&titles, self.browser.active_index(), theme)).render(tabs_area, buf);

        let Some(cursor) = self.browser.active() else {
            notice("No buckets configured", theme).render(list_area, buf);
            return;
        };
        Paragraph::new(self.breadcrumb(cursor)).render(crumb_area, buf);

        if cursor.entries().is_empty() {
            let text = if cursor.is_loading() {
                "Loading..."
            } else if cursor.listing().last_error().is_some() {
                "Listing failed. Press r to retry."
            } else {
                "No files found"
            };
            notice(text, theme).render(list_area, buf);
        } else {
            let visible = list_area.height.saturating_sub(1) as usize;
            Table::new(
                self.rows(cursor, visible),
                [Constraint::Min(20), Constraint::Length(12), Constraint::Length(18)],
            )
            .header(
                Row::new(vec!["Name", "Size", "Updated"])
                    .style(theme.header_style().add_modifier(Modifier::UNDERLINED)),
            )
            .render(list_area, buf);
        }

        Paragraph::new(Line::from(Span::styled(
            "Enter open  Backspace up  r refresh  [ ] bucket",
            theme.dim_style(),
        )))
        .render(footer_area, buf);
    }
}
