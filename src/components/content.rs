use std::collections::BTreeSet;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::ContentEntry;
use crate::folders::manager::ViewMode;
use crate::theme::ThemeColors;

/// Width of one cell in grid view, including the gap.
pub const GRID_CELL_WIDTH: u16 = 24;

/// Content pane: the open folder's subfolders and files as a list or a grid.
pub struct ContentWidget<'a> {
    entries: &'a [ContentEntry],
    view_mode: ViewMode,
    selected: usize,
    scroll: usize,
    focused: bool,
    marked_files: &'a BTreeSet<String>,
    marked_folders: &'a BTreeSet<String>,
    loading: bool,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> ContentWidget<'a> {
    pub fn new(
        entries: &'a [ContentEntry],
        marked_files: &'a BTreeSet<String>,
        marked_folders: &'a BTreeSet<String>,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            entries,
            view_mode: ViewMode::List,
            selected: 0,
            scroll: 0,
            focused: false,
            marked_files,
            marked_folders,
            loading: false,
            theme,
            use_icons: true,
            block: None,
        }
    }

    pub fn view_mode(mut self, mode: ViewMode) -> Self {
        self.view_mode = mode;
        self
    }

    /// `scroll` counts rows, which in grid view hold several entries.
    pub fn selected(mut self, selected: usize, scroll: usize) -> Self {
        self.selected = selected;
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn use_icons(mut self, use_icons: bool) -> Self {
        self.use_icons = use_icons;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Number of grid columns that fit in `width`.
    pub fn grid_columns(width: u16) -> usize {
        (width / GRID_CELL_WIDTH).max(1) as usize
    }

    fn is_marked(&self, entry: &ContentEntry) -> bool {
        match entry {
            ContentEntry::Folder(f) => self.marked_folders.contains(&f.id),
            ContentEntry::File(f) => self.marked_files.contains(&f.id),
        }
    }

    fn icon(&self, entry: &ContentEntry) -> &'static str {
        match (entry, self.use_icons) {
            (ContentEntry::Folder(_), true) => "\u{f07b} ",
            (ContentEntry::File(f), true) => file_icon(f.label()),
            (ContentEntry::Folder(_), false) => "[D] ",
            (ContentEntry::File(_), false) => "[F] ",
        }
    }

    fn entry_style(&self, index: usize, entry: &ContentEntry) -> Style {
        if index == self.selected && self.focused {
            Style::default()
                .bg(self.theme.selected_bg)
                .fg(self.theme.selected_fg)
                .add_modifier(Modifier::BOLD)
        } else if self.is_marked(entry) {
            Style::default()
                .fg(self.theme.marked_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            match entry {
                ContentEntry::Folder(_) => Style::default()
                    .fg(self.theme.folder_fg)
                    .add_modifier(Modifier::BOLD),
                ContentEntry::File(_) => Style::default().fg(self.theme.file_fg),
            }
        }
    }

    fn render_list(&self, area: Rect, buf: &mut Buffer) {
        let name_width = (area.width as usize).saturating_sub(32).max(8);
        let visible = self
            .entries
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(area.height as usize);

        for (i, (idx, entry)) in visible.enumerate() {
            let marker = if self.is_marked(entry) { "● " } else { "  " };
            let name = truncate(entry.label(), name_width);
            let (size, created, access) = match entry {
                ContentEntry::Folder(f) => (
                    format!("{} item(s)", f.subfolders.len() + f.files.len()),
                    f.created_at,
                    f.access_level,
                ),
                ContentEntry::File(f) => (
                    f.size.map(format_size).unwrap_or_else(|| "-".to_string()),
                    f.created_at,
                    f.access_level,
                ),
            };
            let created = created
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let access = access.map(|a| a.label()).unwrap_or("");

            let text = format!(
                "{}{}{:<name_width$} {:>10} {:>10} {}",
                marker,
                self.icon(entry),
                name,
                size,
                created,
                access,
                name_width = name_width
            );
            let line = Line::from(Span::styled(text, self.entry_style(idx, entry)));
            buf.set_line(area.x, area.y + i as u16, &line, area.width);
        }
    }

    fn render_grid(&self, area: Rect, buf: &mut Buffer) {
        let columns = Self::grid_columns(area.width);
        let label_width = GRID_CELL_WIDTH as usize - 4;

        for (row, chunk) in self
            .entries
            .chunks(columns)
            .enumerate()
            .skip(self.scroll)
            .take(area.height as usize)
        {
            let y = area.y + (row - self.scroll) as u16;
            for (col, entry) in chunk.iter().enumerate() {
                let idx = row * columns + col;
                let x = area.x + col as u16 * GRID_CELL_WIDTH;
                let marker = if self.is_marked(entry) { "●" } else { " " };
                let text = format!(
                    "{}{}{}",
                    marker,
                    self.icon(entry),
                    truncate(entry.label(), label_width)
                );
                let span = Span::styled(text, self.entry_style(idx, entry));
                let width = GRID_CELL_WIDTH.saturating_sub(1).min(area.right().saturating_sub(x));
                buf.set_span(x, y, &span, width);
            }
        }
    }
}

impl<'a> Widget for ContentWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        if self.entries.is_empty() {
            let text = if self.loading { "Loading…" } else { "This folder is empty" };
            let line = Line::from(Span::styled(
                text,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::ITALIC),
            ));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        match self.view_mode {
            ViewMode::List => self.render_list(inner, buf),
            ViewMode::Grid => self.render_grid(inner, buf),
        }
    }
}

/// Nerd Font icon for a file based on its extension.
fn file_icon(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "pdf" => "\u{f1c1} ",
        "doc" | "docx" | "odt" | "rtf" => "\u{f1c2} ",
        "xls" | "xlsx" | "ods" | "csv" => "\u{f1c3} ",
        "ppt" | "pptx" | "odp" => "\u{f1c4} ",
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "webp" => "\u{f1c5} ",
        "zip" | "tar" | "gz" | "rar" | "7z" => "\u{f1c6} ",
        "mp3" | "wav" | "ogg" | "flac" => "\u{f1c7} ",
        "mp4" | "mkv" | "avi" | "mov" | "webm" => "\u{f1c8} ",
        "txt" | "md" => "\u{f15c} ",
        _ => "\u{f15b} ",
    }
}

/// Format bytes into a human-readable size string.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
