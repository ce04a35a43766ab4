use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::folders::tree::FlatFolder;
use crate::theme::ThemeColors;

/// Sidebar widget that renders the folder tree with box-drawing characters.
pub struct TreeWidget<'a> {
    rows: &'a [FlatFolder],
    selected: usize,
    scroll: usize,
    /// Path of the open folder, drawn in the accent color.
    open_path: &'a str,
    focused: bool,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(rows: &'a [FlatFolder], theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            rows,
            selected: 0,
            scroll: 0,
            open_path: "",
            focused: true,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn selected(mut self, selected: usize, scroll: usize) -> Self {
        self.selected = selected;
        self.scroll = scroll;
        self
    }

    pub fn open_path(mut self, path: &'a str) -> Self {
        self.open_path = path;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Indentation for `rows[index]`: a continuation bar for every ancestor
    /// that still has siblings below, then the row's own connector.
    fn build_prefix(rows: &[FlatFolder], index: usize) -> String {
        let row = &rows[index];
        if row.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();
        for d in 1..row.depth {
            let ancestor_is_last = rows[..index]
                .iter()
                .rev()
                .take_while(|r| r.depth >= d)
                .find(|r| r.depth == d)
                .is_some_and(|r| r.is_last_sibling);
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }
        parts.push(if row.is_last_sibling { "└──" } else { "├──" });
        parts.join("")
    }

    fn indicator(&self, row: &FlatFolder) -> &'static str {
        let open = row.is_expanded && row.has_children;
        match (self.use_icons, open) {
            (true, true) => "\u{f07c} ",
            (true, false) => "\u{f07b} ",
            (false, true) => "[-] ",
            (false, false) if row.has_children => "[+] ",
            (false, false) => "[ ] ",
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if visible_height == 0 {
            return;
        }
        if self.rows.is_empty() {
            let line = Line::from(Span::styled(
                "No folders",
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::ITALIC),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let visible = self
            .rows
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible_height);

        for (i, (idx, row)) in visible.enumerate() {
            let y = inner_area.y + i as u16;

            let style = if idx == self.selected && self.focused {
                Style::default()
                    .bg(self.theme.selected_bg)
                    .fg(self.theme.selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else if row.path == self.open_path {
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD)
            } else if idx == self.selected {
                Style::default()
                    .fg(self.theme.folder_fg)
                    .add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(self.theme.folder_fg)
            };

            let highlighted = idx == self.selected && self.focused;
            let prefix_style = if highlighted {
                style
            } else {
                Style::default().fg(self.theme.sidebar_fg)
            };
            let line = Line::from(vec![
                Span::styled(Self::build_prefix(self.rows, idx), prefix_style),
                Span::styled(format!("{}{}", self.indicator(row), row.name), style),
            ]);
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
