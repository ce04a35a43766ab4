use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::folders::manager::NoticeLevel;
use crate::theme::ThemeColors;

/// Top bar: the breadcrumb trail of the open folder, numbered for the
/// digit shortcuts.
pub struct BreadcrumbWidget<'a> {
    crumbs: &'a [String],
    theme: &'a ThemeColors,
}

impl<'a> BreadcrumbWidget<'a> {
    pub fn new(crumbs: &'a [String], theme: &'a ThemeColors) -> Self {
        Self { crumbs, theme }
    }
}

impl<'a> Widget for BreadcrumbWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let last = self.crumbs.len().saturating_sub(1);
        let mut spans = Vec::new();
        for (i, crumb) in self.crumbs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" › ", Style::default().fg(self.theme.dim_fg)));
            }
            if i < 10 {
                spans.push(Span::styled(
                    format!("{}:", i),
                    Style::default().fg(self.theme.dim_fg),
                ));
            }
            let style = if i == last {
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.folder_fg)
            };
            spans.push(Span::styled(crumb.clone(), style));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

/// Status bar widget: page and sort info with key hints, or a notice.
pub struct StatusBarWidget<'a> {
    page_info: &'a str,
    view_info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<(&'a str, NoticeLevel)>,
    selection_info: Option<&'a str>,
    busy: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(page_info: &'a str, view_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            page_info,
            view_info,
            theme,
            status_message: None,
            selection_info: None,
            busy: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, level: NoticeLevel) -> Self {
        self.status_message = Some((msg, level));
        self
    }

    pub fn selection_info(mut self, info: &'a str) -> Self {
        self.selection_info = Some(info);
        self
    }

    pub fn busy(mut self, label: &'a str) -> Self {
        self.busy = Some(label);
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some((msg, level)) = self.status_message {
            let style = match level {
                NoticeLevel::Error => Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg),
                NoticeLevel::Warning => Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
                NoticeLevel::Success => Style::default().fg(self.theme.success_fg),
            };
            let display: String = msg.chars().take(width).collect();
            let display = format!("{:<width$}", display, width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        let key_hints = " n:new r:ren d:del m:move ?:help ";
        let mut spans = vec![
            Span::styled(
                self.page_info.to_string(),
                Style::default().fg(self.theme.status_fg),
            ),
            Span::raw(" "),
            Span::styled(
                self.view_info.to_string(),
                Style::default().fg(self.theme.info_fg),
            ),
        ];

        if let Some(info) = self.selection_info {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                info.to_string(),
                Style::default()
                    .fg(self.theme.marked_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        if let Some(label) = self.busy {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                label.to_string(),
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let used: usize = spans.iter().map(|s| s.width()).sum();
        let hints_len = key_hints.chars().count();
        if used + hints_len <= width {
            spans.push(Span::raw(" ".repeat(width - used - hints_len)));
            spans.push(Span::styled(
                key_hints,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
        }

        let line = Line::from(spans).style(Style::default().bg(self.theme.status_bg));
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
