use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::theme::ThemeColors;

/// A single keybinding entry for display.
struct KeyEntry {
    key: &'static str,
    description: &'static str,
}

/// A category of keybindings.
struct KeyCategory {
    name: &'static str,
    entries: &'static [KeyEntry],
}

const NAVIGATION_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "j / ↓",
        description: "Move down",
    },
    KeyEntry {
        key: "k / ↑",
        description: "Move up",
    },
    KeyEntry {
        key: "g / Home",
        description: "Jump to first item",
    },
    KeyEntry {
        key: "G / End",
        description: "Jump to last item",
    },
    KeyEntry {
        key: "Tab",
        description: "Switch between folders and contents",
    },
    KeyEntry {
        key: "Enter",
        description: "Open folder",
    },
    KeyEntry {
        key: "l / →",
        description: "Expand folder (sidebar) / open (contents)",
    },
    KeyEntry {
        key: "h / ←",
        description: "Collapse or go to parent",
    },
    KeyEntry {
        key: "Backspace",
        description: "Back to parent folder",
    },
    KeyEntry {
        key: "0-9",
        description: "Jump to breadcrumb",
    },
];

const FOLDER_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "n",
        description: "Create folder here",
    },
    KeyEntry {
        key: "r",
        description: "Rename folder",
    },
    KeyEntry {
        key: "d",
        description: "Delete folder or file",
    },
    KeyEntry {
        key: "v",
        description: "Toggle list / grid view",
    },
    KeyEntry {
        key: "s",
        description: "Cycle sort (name → created → size)",
    },
    KeyEntry {
        key: "S",
        description: "Toggle sort direction",
    },
    KeyEntry {
        key: "R / F5",
        description: "Reload from server",
    },
];

const SELECTION_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "Space",
        description: "Mark / unmark item",
    },
    KeyEntry {
        key: "Esc",
        description: "Clear marks",
    },
    KeyEntry {
        key: "D",
        description: "Delete marked items",
    },
    KeyEntry {
        key: "m",
        description: "Move marked items",
    },
];

const GENERAL_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "?",
        description: "Toggle this help overlay",
    },
    KeyEntry {
        key: "q / Ctrl+C",
        description: "Quit",
    },
];

const CATEGORIES: &[KeyCategory] = &[
    KeyCategory {
        name: "Navigation",
        entries: NAVIGATION_KEYS,
    },
    KeyCategory {
        name: "Folders",
        entries: FOLDER_KEYS,
    },
    KeyCategory {
        name: "Selection",
        entries: SELECTION_KEYS,
    },
    KeyCategory {
        name: "General",
        entries: GENERAL_KEYS,
    },
];

/// Help overlay widget showing all keybindings.
pub struct HelpOverlay<'a> {
    theme: &'a ThemeColors,
    scroll_offset: usize,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a ThemeColors, scroll_offset: usize) -> Self {
        Self {
            theme,
            scroll_offset,
        }
    }

    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();

        lines.push(Line::from(vec![Span::styled(
            " Keybinding Reference ",
            Style::default()
                .fg(self.theme.accent_fg)
                .add_modifier(Modifier::BOLD),
        )]));
        lines.push(Line::from(""));

        for category in CATEGORIES {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("── {} ", category.name),
                    Style::default()
                        .fg(self.theme.accent_fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("─".repeat(40), Style::default().fg(self.theme.dim_fg)),
            ]));

            for entry in category.entries {
                let key_padded = format!("  {:<16}", entry.key);
                lines.push(Line::from(vec![
                    Span::styled(
                        key_padded,
                        Style::default()
                            .fg(self.theme.warning_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        entry.description.to_string(),
                        Style::default().fg(self.theme.file_fg),
                    ),
                ]));
            }

            lines.push(Line::from(""));
        }

        lines.push(Line::from(vec![Span::styled(
            " Press any other key to close ",
            Style::default().fg(self.theme.dim_fg),
        )]));

        lines
    }

    /// Total number of content lines, for scroll bounds.
    pub fn total_lines() -> usize {
        // title, blank and footer, plus header and blank per category
        3 + CATEGORIES
            .iter()
            .map(|c| c.entries.len() + 2)
            .sum::<usize>()
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let overlay_width = (area.width as f32 * 0.70).min(72.0) as u16;
        let overlay_height = (area.height as f32 * 0.80).min(40.0) as u16;

        let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
        let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
        let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

        Clear.render(overlay_area, buf);

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused_fg))
            .style(Style::default().bg(self.theme.dialog_bg));

        let inner = block.inner(overlay_area);
        block.render(overlay_area, buf);

        let content_lines = self.build_content_lines();
        let visible_height = inner.height as usize;
        let scroll = self.scroll_offset;

        for (i, line) in content_lines
            .iter()
            .skip(scroll)
            .take(visible_height)
            .enumerate()
        {
            buf.set_line(
                inner.x + 1,
                inner.y + i as u16,
                line,
                inner.width.saturating_sub(2),
            );
        }

        if content_lines.len() > visible_height && overlay_area.height > 0 {
            let total = content_lines.len();
            let indicator = format!(" {}/{} ", (scroll + 1).min(total), total);
            let ind_span = Span::styled(indicator, Style::default().fg(self.theme.dim_fg));
            let ind_x = overlay_area.x
                + overlay_area
                    .width
                    .saturating_sub(ind_span.width() as u16 + 1);
            let ind_y = overlay_area.y + overlay_area.height - 1;
            buf.set_span(ind_x, ind_y, &ind_span, ind_span.width() as u16);
        }
    }
}
