use std::time::Instant;

use crate::folders::manager::{FolderManager, NoticeLevel};
use crate::folders::tree::{child_path, flatten, FlatFolder};
use crate::remote::model::{FileEntry, Folder};
use crate::theme::ThemeColors;

/// A destination offered by the move dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTarget {
    pub id: String,
    pub path: String,
}

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    CreateFolder,
    RenameFolder { id: String, original: String },
    DeleteFolder { id: String, path: String },
    DeleteFile { id: String, name: String },
    DeleteSelected { count: usize },
    MoveSelected { targets: Vec<MoveTarget>, selected: usize },
    Error { message: String },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
    Help,
}

/// Which panel receives navigation keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Sidebar,
    Content,
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

/// A row of the content pane: subfolders first, then files.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEntry {
    Folder(Folder),
    File(FileEntry),
}

impl ContentEntry {
    pub fn label(&self) -> &str {
        match self {
            ContentEntry::Folder(f) => &f.name,
            ContentEntry::File(f) => f.label(),
        }
    }
}

/// Main application state.
pub struct App {
    pub manager: FolderManager,
    pub theme: ThemeColors,
    pub use_icons: bool,
    pub should_quit: bool,
    /// Printed after the terminal is restored.
    pub exit_message: Option<String>,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<(String, NoticeLevel, Instant)>,
    pub focus: Focus,
    pub sidebar_index: usize,
    pub sidebar_scroll: usize,
    pub content_index: usize,
    pub content_scroll: usize,
    pub help_scroll: usize,
}

impl App {
    pub fn new(manager: FolderManager, theme: ThemeColors, use_icons: bool) -> Self {
        Self {
            manager,
            theme,
            use_icons,
            should_quit: false,
            exit_message: None,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            focus: Focus::Sidebar,
            sidebar_index: 0,
            sidebar_scroll: 0,
            content_index: 0,
            content_scroll: 0,
            help_scroll: 0,
        }
    }

    // ── Derived views ────────────────────────────────────────────────────────

    /// Visible sidebar rows, honoring expansion.
    pub fn sidebar_rows(&self) -> Vec<FlatFolder> {
        flatten(&self.manager.folders, Some(&self.manager.expanded_folders))
    }

    /// Entries of the open folder in display order.
    pub fn content_entries(&self) -> Vec<ContentEntry> {
        self.manager
            .sorted_folders()
            .into_iter()
            .map(ContentEntry::Folder)
            .chain(self.manager.sorted_files().into_iter().map(ContentEntry::File))
            .collect()
    }

    pub fn selected_sidebar_row(&self) -> Option<FlatFolder> {
        self.sidebar_rows().into_iter().nth(self.sidebar_index)
    }

    pub fn selected_content_entry(&self) -> Option<ContentEntry> {
        self.content_entries().into_iter().nth(self.content_index)
    }

    /// Name path of a content-pane folder.
    pub fn content_path(&self, name: &str) -> String {
        child_path(&self.manager.selected_folder, name)
    }

    /// Folders the current selection may be moved into.
    pub fn move_targets(&self) -> Vec<MoveTarget> {
        let excluded = &self.manager.selected_folder_ids;
        flatten(&self.manager.folders, None)
            .into_iter()
            .filter(|row| !excluded.contains(&row.id))
            .map(|row| MoveTarget {
                id: row.id,
                path: row.path,
            })
            .collect()
    }

    // ── Selection movement ───────────────────────────────────────────────────

    fn focused_len(&self) -> usize {
        match self.focus {
            Focus::Sidebar => self.sidebar_rows().len(),
            Focus::Content => self.content_entries().len(),
        }
    }

    fn focused_index_mut(&mut self) -> &mut usize {
        match self.focus {
            Focus::Sidebar => &mut self.sidebar_index,
            Focus::Content => &mut self.content_index,
        }
    }

    pub fn select_next(&mut self) {
        let len = self.focused_len();
        let index = self.focused_index_mut();
        if len > 0 && *index < len - 1 {
            *index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        let index = self.focused_index_mut();
        *index = index.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        *self.focused_index_mut() = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.focused_len();
        *self.focused_index_mut() = len.saturating_sub(1);
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sidebar => Focus::Content,
            Focus::Content => Focus::Sidebar,
        };
    }

    /// Keep both cursors inside their lists after the data changed.
    pub fn clamp_selection(&mut self) {
        let rows = self.sidebar_rows().len();
        self.sidebar_index = self.sidebar_index.min(rows.saturating_sub(1));
        let entries = self.content_entries().len();
        self.content_index = self.content_index.min(entries.saturating_sub(1));
    }

    /// Adjust a scroll offset so `index` stays within `visible_height` rows.
    pub fn scroll_into_view(scroll: usize, index: usize, visible_height: usize) -> usize {
        if visible_height == 0 {
            return 0;
        }
        if index < scroll {
            index
        } else if index >= scroll + visible_height {
            index + 1 - visible_height
        } else {
            scroll
        }
    }

    // ── Dialogs ──────────────────────────────────────────────────────────────

    /// Open a dialog of the given kind.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        if let DialogKind::RenameFolder { ref original, .. } = kind {
            self.dialog_state.input = original.clone();
            self.dialog_state.cursor_position = original.len();
        }
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    /// Move the highlighted destination in the move dialog.
    pub fn move_picker_step(&mut self, down: bool) {
        if let AppMode::Dialog(DialogKind::MoveSelected { targets, selected }) = &mut self.mode {
            if down {
                if *selected + 1 < targets.len() {
                    *selected += 1;
                }
            } else {
                *selected = selected.saturating_sub(1);
            }
        }
    }

    // ── Status ───────────────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, msg: String, level: NoticeLevel) {
        self.status_message = Some((msg, level, Instant::now()));
    }

    /// Clear the status message once it has been shown for a few seconds.
    /// Errors stay twice as long.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, level, created)) = &self.status_message {
            let ttl = if *level == NoticeLevel::Error { 6 } else { 3 };
            if created.elapsed().as_secs() > ttl {
                self.status_message = None;
            }
        }
    }

    /// Pull pending notices from the manager into the status bar and react to
    /// an expired session. An error raised outside a dialog also opens the
    /// error popup.
    pub fn absorb_notices(&mut self) {
        // Latest of the most severe, so a failed reload is not hidden behind
        // the success notice that follows it.
        let worst = self
            .manager
            .drain_notices()
            .into_iter()
            .max_by_key(|n| n.level);
        if let Some(notice) = worst {
            if notice.level == NoticeLevel::Error && self.mode == AppMode::Normal {
                self.mode = AppMode::Dialog(DialogKind::Error {
                    message: notice.message.clone(),
                });
            }
            self.set_status_message(notice.message, notice.level);
        }
        if self.manager.session_expired() {
            self.exit_message = Some("Session expired, sign in again.".to_string());
            self.should_quit = true;
        }
        self.clamp_selection();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
