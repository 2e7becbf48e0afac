//! Engine 1 and Engine 2 monitor panels.

use atlas_core::{ModalityStats, SubjectStats};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Widget},
};

use crate::format::{format_date, format_timestamp, or_na, truncate};
use crate::screen::{Engine1Screen, Engine2Screen, ModalityTab};
use crate::theme::Theme;
use crate::widget::{StatCard, notice, panel_block, render_cards, tab_line};

/// Rows shown in the recent jobs tables.
pub const RECENT_JOBS: usize = 20;

fn header_row<'a>(titles: &[&'a str], theme: &Theme) -> Row<'a> {
    Row::new(titles.iter().map(|t| Cell::from(*t)))
        .style(theme.header_style().add_modifier(Modifier::UNDERLINED))
}

/// Engine 1 panel: conversion counts and recent subjects.
pub struct Engine1Panel<'a> {
    screen: &'a Engine1Screen,
    theme: &'a Theme,
}

impl<'a> Engine1Panel<'a> {
    pub fn new(screen: &'a Engine1Screen, theme: &'a Theme) -> Self {
        Self { screen, theme }
    }
}

impl Widget for Engine1Panel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let block = panel_block("Engine 1: DICOM to NIFTI", theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let [cards_area, table_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(inner);

        let subjects = self.screen.subjects.value();
        let stats = SubjectStats::from_subjects(subjects);
        let loading = self.screen.subjects.awaiting_first();
        render_cards(
            vec![
                StatCard::new("Total", stats.total, theme.header).loading(loading),
                StatCard::new("Completed", stats.completed, theme.status_healthy).loading(loading),
                StatCard::new("Processing", stats.processing, theme.status_warning).loading(loading),
                StatCard::new("Failed", stats.failed, theme.status_error).loading(loading),
            ],
            cards_area,
            buf,
        );

        if loading {
            notice("Loading...", theme).render(table_area, buf);
            return;
        }
        if subjects.is_empty() {
            notice("No subjects found", theme).render(table_area, buf);
            return;
        }

        let rows = subjects.iter().take(RECENT_JOBS).map(|subject| {
            Row::new(vec![
                Cell::from(subject.subject_id.clone()),
                Cell::from(or_na(subject.clinical_group.as_deref())),
                Cell::from(Span::styled(
                    subject.processing_status.as_str(),
                    Style::default().fg(theme.status_color(subject.processing_status)),
                )),
                Cell::from(format_timestamp(subject.created_at)),
            ])
        });

        Table::new(
            rows,
            [
                Constraint::Percentage(30),
                Constraint::Percentage(20),
                Constraint::Percentage(20),
                Constraint::Percentage(30),
            ],
        )
        .header(header_row(&["Subject ID", "Group", "Status", "Created"], theme))
        .render(table_area, buf);
    }
}

/// Engine 2 panel: DTI / fMRI analysis counts and recent scans.
pub struct Engine2Panel<'a> {
    screen: &'a Engine2Screen,
    theme: &'a Theme,
}

impl<'a> Engine2Panel<'a> {
    pub fn new(screen: &'a Engine2Screen, theme: &'a Theme) -> Self {
        Self { screen, theme }
    }
}

impl Widget for Engine2Panel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let block = panel_block("Engine 2: DTI / fMRI Analysis", theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let [tabs_area, cards_area, table_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(inner);

        let titles: Vec<&str> = ModalityTab::ALL.iter().map(|t| t.title()).collect();
        let active = ModalityTab::ALL
            .iter()
            .position(|t| *t == self.screen.tab)
            .unwrap_or(0);
        Paragraph::new(tab_line(&titles, active, theme)).render(tabs_area, buf);

        let label = self.screen.tab.modality().label().to_string();
        let stats = ModalityStats::for_modality(self.screen.scans.value(), &self.screen.tab.modality());
        let loading = self.screen.scans.awaiting_first();
        let total_label = format!("{} Scans", label);
        render_cards(
            vec![
                StatCard::new(&total_label, stats.total, theme.header).loading(loading),
                StatCard::new("Completed", stats.completed, theme.status_healthy).loading(loading),
            ],
            cards_area,
            buf,
        );

        if loading {
            notice("Loading...", theme).render(table_area, buf);
            return;
        }
        let scans = self.screen.tab_scans();
        if scans.is_empty() {
            notice(format!("No {} scans found", label), theme).render(table_area, buf);
            return;
        }

        let path_width = (table_area.width as usize).saturating_sub(50).max(12);
        let rows = scans.into_iter().take(RECENT_JOBS).map(|scan| {
            Row::new(vec![
                Cell::from(scan.subject_id.clone()),
                Cell::from(format_date(scan.scan_date)),
                Cell::from(Span::styled(
                    scan.status_label().to_string(),
                    Style::default().fg(theme.phase_color(scan.phase())),
                )),
                Cell::from(Line::from(Span::styled(
                    truncate(scan.nifti_path.as_deref().unwrap_or("N/A"), path_width),
                    theme.dim_style(),
                ))),
            ])
        });

        Table::new(
            rows,
            [
                Constraint::Length(16),
                Constraint::Length(12),
                Constraint::Length(20),
                Constraint::Min(12),
            ],
        )
        .header(header_row(&["Subject", "Scan Date", "Status", "NIFTI Path"], theme))
        .render(table_area, buf);
    }
}
