//! Home screen: headline pipeline numbers.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::format::format_timestamp;
use crate::screen::HomeScreen;
use crate::theme::Theme;
use crate::widget::{StatCard, panel_block, render_cards};

/// Home screen panel.
pub struct SummaryPanel<'a> {
    screen: &'a HomeScreen,
    theme: &'a Theme,
}

impl<'a> SummaryPanel<'a> {
    pub fn new(screen: &'a HomeScreen, theme: &'a Theme) -> Self {
        Self { screen, theme }
    }

    fn overview_lines(&self) -> Vec<Line<'static>> {
        let theme = self.theme;
        let updated = format_timestamp(self.screen.summary.updated_at());
        vec![
            Line::from(Span::styled(
                "Autonomous DICOM processing with DTI and fMRI analysis",
                theme.dim_style(),
            )),
            Line::default(),
            Line::from(vec![
                Span::styled("[1] ", theme.dim_style().fg(theme.hotkey)),
                Span::raw("Engine 1  DICOM to NIFTI conversion"),
            ]),
            Line::from(vec![
                Span::styled("[2] ", theme.dim_style().fg(theme.hotkey)),
                Span::raw("Engine 2  DTI and fMRI analysis"),
            ]),
            Line::from(vec![
                Span::styled("[g] ", theme.dim_style().fg(theme.hotkey)),
                Span::raw("Storage   DICOM and NIFTI buckets"),
            ]),
            Line::from(vec![
                Span::styled("[d] ", theme.dim_style().fg(theme.hotkey)),
                Span::raw("Database  subjects and scans"),
            ]),
            Line::from(vec![
                Span::styled("[:] ", theme.dim_style().fg(theme.hotkey)),
                Span::raw("NUCLEUS   orchestrator chat"),
            ]),
            Line::default(),
            Line::from(Span::styled(format!("Last updated: {}", updated), theme.dim_style())),
        ]
    }
}

impl Widget for SummaryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel_block("Nucleus Atlas", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let [cards_area, body_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(inner);

        let summary = self.screen.summary.value();
        let loading = self.screen.summary.awaiting_first();
        let theme = self.theme;
        render_cards(
            vec![
                StatCard::new("Total Subjects", summary.subjects, theme.header).loading(loading),
                StatCard::new("Total Scans", summary.scans, theme.chat_assistant).loading(loading),
                StatCard::new("Completed", summary.completed, theme.status_healthy).loading(loading),
                StatCard::new("Processing", summary.processing, theme.status_warning)
                    .loading(loading),
            ],
            cards_area,
            buf,
        );

        Paragraph::new(self.overview_lines())
            .wrap(Wrap { trim: false })
            .render(body_area, buf);
    }
}
