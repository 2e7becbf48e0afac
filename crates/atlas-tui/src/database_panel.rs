//! Database screen: read-only tables.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Widget},
};

use crate::format::{format_date, format_timestamp, or_na, truncate};
use crate::screen::{DatabaseScreen, DatabaseTab};
use crate::theme::Theme;
use crate::widget::{notice, panel_block, tab_line};

/// Database panel.
pub struct DatabasePanel<'a> {
    screen: &'a DatabaseScreen,
    theme: &'a Theme,
}

impl<'a> DatabasePanel<'a> {
    pub fn new(screen: &'a DatabaseScreen, theme: &'a Theme) -> Self {
        Self { screen, theme }
    }

    fn header(&self, titles: &[&'static str]) -> Row<'static> {
        Row::new(titles.iter().map(|t| Cell::from(*t)))
            .style(self.theme.header_style().add_modifier(Modifier::UNDERLINED))
    }

    fn subject_rows(&self, visible: usize) -> Vec<Row<'static>> {
        let theme = self.theme;
        self.screen
            .subjects
            .value()
            .iter()
            .skip(self.screen.scroll)
            .take(visible)
            .map(|s| {
                Row::new(vec![
                    Cell::from(s.subject_id.clone()),
                    Cell::from(or_na(s.clinical_group.as_deref())),
                    Cell::from(s.age.map_or_else(|| "N/A".to_string(), |a| a.to_string())),
                    Cell::from(or_na(s.sex.as_deref())),
                    Cell::from(Span::styled(
                        s.processing_status.as_str(),
                        Style::default().fg(theme.status_color(s.processing_status)),
                    )),
                    Cell::from(format_timestamp(s.created_at)),
                ])
            })
            .collect()
    }

    fn scan_rows(&self, visible: usize, path_width: usize) -> Vec<Row<'static>> {
        let theme = self.theme;
        self.screen
            .scans
            .value()
            .iter()
            .skip(self.screen.scroll)
            .take(visible)
            .map(|s| {
                Row::new(vec![
                    Cell::from(s.subject_id.clone()),
                    Cell::from(s.modality.label().to_string()),
                    Cell::from(format_date(s.scan_date)),
                    Cell::from(Span::styled(
                        s.status_label().to_string(),
                        Style::default().fg(theme.phase_color(s.phase())),
                    )),
                    Cell::from(truncate(s.nifti_path.as_deref().unwrap_or("N/A"), path_width)),
                ])
            })
            .collect()
    }
}

impl Widget for DatabasePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let block = panel_block("Database", theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let [tabs_area, table_area, footer_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);

        let titles: Vec<&str> = DatabaseTab::ALL.iter().map(|t| t.title()).collect();
        let active = DatabaseTab::ALL
            .iter()
            .position(|t| *t == self.screen.tab)
            .unwrap_or(0);
        Paragraph::new(tab_line(&titles, active, theme)).render(tabs_area, buf);

        if let Some(placeholder) = self.screen.tab.placeholder() {
            notice(placeholder, theme).render(table_area, buf);
            return;
        }

        let (awaiting_first, total) = match self.screen.tab {
            DatabaseTab::Scans => (self.screen.scans.awaiting_first(), self.screen.scans.value().len()),
            _ => (
                self.screen.subjects.awaiting_first(),
                self.screen.subjects.value().len(),
            ),
        };
        if awaiting_first {
            notice("Loading...", theme).render(table_area, buf);
            return;
        }
        if total == 0 {
            notice(format!("No {} found", self.screen.tab.title().to_lowercase()), theme)
                .render(table_area, buf);
            return;
        }

        let visible = table_area.height.saturating_sub(1) as usize;
        let table = match self.screen.tab {
            DatabaseTab::Scans => {
                let path_width = (table_area.width as usize).saturating_sub(54).max(12);
                Table::new(
                    self.scan_rows(visible, path_width),
                    [
                        Constraint::Length(16),
                        Constraint::Length(12),
                        Constraint::Length(12),
                        Constraint::Length(20),
                        Constraint::Min(12),
                    ],
                )
                .header(self.header(&["Subject", "Modality", "Date", "Status", "NIFTI Path"]))
            }
            _ => Table::new(
                self.subject_rows(visible),
                [
                    Constraint::Length(16),
                    Constraint::Length(14),
                    Constraint::Length(5),
                    Constraint::Length(5),
                    Constraint::Length(12),
                    Constraint::Min(16),
                ],
            )
            .header(self.header(&["Subject ID", "Group", "Age", "Sex", "Status", "Created"])),
        };
        table.render(table_area, buf);

        let first = self.screen.scroll + 1;
        let last = (self.screen.scroll + visible).min(total);
        Paragraph::new(Line::from(Span::styled(
            format!("Rows {}-{} of {}   j/k scroll", first, last, total),
            theme.dim_style(),
        )))
        .render(footer_area, buf);
    }
}
