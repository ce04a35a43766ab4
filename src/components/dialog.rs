use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState, MoveTarget};
use crate::theme::ThemeColors;

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width.min(area.width), height.min(area.height))
    }

    fn frame(&self, title: &str, rect: Rect, border: Style, buf: &mut Buffer) -> Rect {
        Clear.render(rect, buf);
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(border)
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &str, inner: Rect, buf: &mut Buffer) {
        if inner.height > 1 {
            let line = Line::from(Span::styled(
                text.to_string(),
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
            buf.set_line(inner.x, inner.y + inner.height - 1, &line, inner.width);
        }
    }

    fn render_input(&self, title: &str, area: Rect, buf: &mut Buffer) {
        let width = 50.min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(width, 5, area);
        let inner = self.frame(
            title,
            rect,
            Style::default().fg(self.theme.dialog_border_fg),
            buf,
        );
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let input = &self.dialog_state.input;
        let cursor = self.dialog_state.cursor_position.min(input.len());
        let before = &input[..cursor];
        let (cursor_char, after) = match input[cursor..].chars().next() {
            Some(c) => (
                &input[cursor..cursor + c.len_utf8()],
                &input[cursor + c.len_utf8()..],
            ),
            None => (" ", ""),
        };

        // Keep the cursor visible by dropping characters from the left.
        let max_before = (inner.width as usize).saturating_sub(2);
        let before_len = before.chars().count();
        let before_display: String = before
            .chars()
            .skip(before_len.saturating_sub(max_before))
            .collect();

        let input_style = Style::default().fg(self.theme.selected_fg);
        let cursor_style = Style::default()
            .bg(self.theme.selected_fg)
            .fg(self.theme.dialog_bg)
            .add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(before_display, input_style),
            Span::styled(cursor_char.to_string(), cursor_style),
            Span::styled(after.to_string(), input_style),
        ]);
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

        self.hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
    }

    fn render_confirm(&self, title: &str, lines: &[String], area: Rect, buf: &mut Buffer) {
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(10) as u16;
        let width = (longest + 8).max(40).min(area.width.saturating_sub(4));
        let height = (lines.len() as u16 + 4).min(area.height.saturating_sub(2));
        let rect = Self::centered_rect(width, height, area);
        let inner = self.frame(title, rect, Style::default().fg(self.theme.error_fg), buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        for (i, text) in lines
            .iter()
            .take(inner.height.saturating_sub(1) as usize)
            .enumerate()
        {
            let style = if i == 0 {
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.selected_fg)
            };
            let line = Line::from(Span::styled(text.clone(), style));
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }

        self.hint("[y] Yes  [n/Esc] Cancel", inner, buf);
    }

    fn render_move(&self, targets: &[MoveTarget], selected: usize, area: Rect, buf: &mut Buffer) {
        let width = 60.min(area.width.saturating_sub(4));
        let height = (targets.len() as u16 + 4).clamp(6, 20).min(area.height);
        let rect = Self::centered_rect(width, height, area);
        let inner = self.frame(
            "Move selection to",
            rect,
            Style::default().fg(self.theme.dialog_border_fg),
            buf,
        );
        if inner.height < 2 || inner.width == 0 {
            return;
        }

        let visible = (inner.height - 1) as usize;
        let scroll = selected.saturating_sub(visible.saturating_sub(1));
        for (i, target) in targets.iter().enumerate().skip(scroll).take(visible) {
            let style = if i == selected {
                Style::default()
                    .bg(self.theme.selected_bg)
                    .fg(self.theme.selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.folder_fg)
            };
            let line = Line::from(Span::styled(target.path.clone(), style));
            buf.set_line(inner.x, inner.y + (i - scroll) as u16, &line, inner.width);
        }

        self.hint("[Enter] Move  [Esc] Cancel", inner, buf);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = (message.chars().count() as u16 + 6)
            .max(30)
            .min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(width, 5, area);
        let inner = self.frame("Error", rect, Style::default().fg(self.theme.error_fg), buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }
        let line = Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(self.theme.error_fg),
        ));
        buf.set_line(inner.x, inner.y, &line, inner.width);
        self.hint("Press any key to close", inner, buf);
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::CreateFolder => self.render_input("New Folder", area, buf),
            DialogKind::RenameFolder { .. } => self.render_input("Rename Folder", area, buf),
            DialogKind::DeleteFolder { path, .. } => self.render_confirm(
                "Delete Folder",
                &[
                    "Delete this folder and everything in it?".to_string(),
                    format!("  • {}", path),
                ],
                area,
                buf,
            ),
            DialogKind::DeleteFile { name, .. } => self.render_confirm(
                "Delete File",
                &["Delete this file?".to_string(), format!("  • {}", name)],
                area,
                buf,
            ),
            DialogKind::DeleteSelected { count } => self.render_confirm(
                "Delete Selection",
                &[format!("Delete {} selected item(s)?", count)],
                area,
                buf,
            ),
            DialogKind::MoveSelected { targets, selected } => {
                self.render_move(targets, *selected, area, buf)
            }
            DialogKind::Error { message } => self.render_error(message, area, buf),
        }
    }
}
