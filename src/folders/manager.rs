//! Folder-tree state manager for one page (one organization).
//!
//! The manager owns the in-memory tree and the view state derived from it.
//! Every mutation is confirmed by the backend before the local tree is
//! patched, so a failed call leaves state exactly as it was. Outcomes are
//! reported as [`Notice`]s which the front end drains and displays.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{AppError, Result};
use crate::folders::session::{read_json, write_json, PageKeys, SessionStore};
use crate::folders::sort::{sort_files, sort_folders, SortConfig};
use crate::folders::tree::{
    append_files_at, child_path, find_by_id, find_folder, is_root, is_same_or_descendant,
    join_path, path_of, remove_file_at, remove_folder, rename_folder, rewrite_path, siblings_of,
    split_path, ROOT_PATH,
};
use crate::folders::validate::validate_folder_name;
use crate::remote::api::FolderApi;
use crate::remote::model::{
    CreateFolderRequest, CurrentUser, FileEntry, Folder, MoveFileRequest, MoveFolderRequest,
    UpdateFolderRequest,
};

/// How the content pane lays out its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Grid,
}

impl ViewMode {
    pub fn toggled(&self) -> Self {
        match self {
            ViewMode::List => ViewMode::Grid,
            ViewMode::Grid => ViewMode::List,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Grid => "grid",
        }
    }
}

/// Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// One entry of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkItem {
    File(String),
    Folder(String),
}

/// Per-item outcome of a bulk delete or move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: Vec<(BulkItem, String)>,
}

impl BulkReport {
    fn collect(items: Vec<BulkItem>, results: Vec<Result<()>>) -> (Self, bool) {
        let mut report = BulkReport::default();
        let mut unauthorized = false;
        for (item, result) in items.into_iter().zip(results) {
            match result {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    unauthorized |= matches!(e, AppError::Unauthorized);
                    report.failed.push((item, e.user_message("request failed")));
                }
            }
        }
        (report, unauthorized)
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    fn notice(&self, verb: &str) -> Notice {
        let total = self.total();
        if self.failed.is_empty() {
            return Notice {
                level: NoticeLevel::Success,
                message: format!("{} item(s) {}", total, verb),
            };
        }
        let first = &self.failed[0].1;
        if self.succeeded == 0 {
            Notice {
                level: NoticeLevel::Error,
                message: format!("No item {} ({} failed): {}", verb, total, first),
            }
        } else {
            Notice {
                level: NoticeLevel::Warning,
                message: format!(
                    "{} of {} item(s) {}; {} failed: {}",
                    self.succeeded,
                    total,
                    verb,
                    self.failed.len(),
                    first
                ),
            }
        }
    }
}

/// State of the folder browser for one page id.
pub struct FolderManager {
    api: Arc<dyn FolderApi>,
    session: Box<dyn SessionStore>,
    keys: PageKeys,
    page_id: String,
    user: CurrentUser,

    /// Top-level folders with their nested subfolders.
    pub folders: Vec<Folder>,
    /// Content of the folder at `selected_folder`; `None` at the root or while loading.
    pub current_folder: Option<Folder>,
    /// Folders listed in the content pane.
    pub displayed_folders: Vec<Folder>,
    /// Name path of the open folder, or [`ROOT_PATH`].
    pub selected_folder: String,
    /// Ids of folders expanded in the sidebar tree.
    pub expanded_folders: Vec<String>,
    pub view_mode: ViewMode,
    pub sort_config: SortConfig,
    pub selected_file_ids: BTreeSet<String>,
    pub selected_folder_ids: BTreeSet<String>,

    pub is_loading: bool,
    pub is_folder_loading: bool,
    pub deleting_selected: bool,
    pub moving_selected: bool,

    session_expired: bool,
    notices: VecDeque<Notice>,
}

impl FolderManager {
    /// Build a manager for `page_id`, restoring view state from `session`.
    pub fn new(
        api: Arc<dyn FolderApi>,
        session: Box<dyn SessionStore>,
        page_id: &str,
        user: CurrentUser,
    ) -> Self {
        let keys = PageKeys::new(page_id);
        let store = &*session;
        let view_mode: ViewMode = read_json(store, &keys.view_mode).unwrap_or_default();
        let expanded_folders: Vec<String> = read_json(store, &keys.expanded).unwrap_or_default();
        let current_folder: Option<Folder> =
            read_json::<Option<Folder>>(store, &keys.current_folder).flatten();
        let selected_folder: String =
            read_json(store, &keys.selected_folder).unwrap_or_else(|| ROOT_PATH.to_string());
        let sort_config: SortConfig = read_json(store, &keys.sort_config).unwrap_or_default();

        let displayed_folders = current_folder
            .as_ref()
            .map(|f| f.subfolders.clone())
            .unwrap_or_default();

        debug!(page_id, selected = %selected_folder, "restored folder view state");

        Self {
            api,
            session,
            keys,
            page_id: page_id.to_string(),
            user,
            folders: Vec::new(),
            current_folder,
            displayed_folders,
            selected_folder,
            expanded_folders,
            view_mode,
            sort_config,
            selected_file_ids: BTreeSet::new(),
            selected_folder_ids: BTreeSet::new(),
            is_loading: false,
            is_folder_loading: false,
            deleting_selected: false,
            moving_selected: false,
            session_expired: false,
            notices: VecDeque::new(),
        }
    }

    /// Use `mode` unless the session already had a view stored.
    pub fn with_default_view(mut self, mode: ViewMode) -> Self {
        if self.session.get(&self.keys.view_mode).is_none() {
            self.view_mode = mode;
        }
        self
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Whether the backend rejected the session; the front end should exit.
    pub fn session_expired(&self) -> bool {
        self.session_expired
    }

    pub fn is_at_root(&self) -> bool {
        is_root(&self.selected_folder)
    }

    // ── Notices ──────────────────────────────────────────────────────────────

    fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push_back(Notice {
            level,
            message: message.into(),
        });
    }

    /// Take all pending notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn report_failure(&mut self, err: AppError, fallback: &str) {
        error!(error = %err, "{}", fallback);
        if matches!(err, AppError::Unauthorized) {
            self.expire_session();
        }
        self.push_notice(NoticeLevel::Error, err.user_message(fallback));
    }

    /// Refuse a request before it reaches the backend.
    fn reject(&mut self, err: AppError) {
        let level = match err {
            AppError::Permission(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        warn!(error = %err, "request rejected locally");
        self.push_notice(level, err.user_message("Request rejected"));
    }

    fn require_admin(&self) -> Result<()> {
        if self.user.is_admin {
            Ok(())
        } else {
            Err(AppError::Permission(
                "Only administrators can delete folders".to_string(),
            ))
        }
    }

    fn expire_session(&mut self) {
        warn!(page_id = %self.page_id, "session rejected by backend, clearing stored state");
        self.session.clear();
        self.session_expired = true;
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    fn persist_view_mode(&mut self) {
        write_json(&mut *self.session, &self.keys.view_mode, &self.view_mode);
    }

    fn persist_expanded(&mut self) {
        write_json(
            &mut *self.session,
            &self.keys.expanded,
            &self.expanded_folders,
        );
    }

    fn persist_current(&mut self) {
        write_json(
            &mut *self.session,
            &self.keys.current_folder,
            &self.current_folder,
        );
    }

    fn persist_selected(&mut self) {
        write_json(
            &mut *self.session,
            &self.keys.selected_folder,
            &self.selected_folder,
        );
    }

    fn persist_sort(&mut self) {
        write_json(&mut *self.session, &self.keys.sort_config, &self.sort_config);
    }

    // ── Loading ──────────────────────────────────────────────────────────────

    /// Load the tree, then open the restored folder.
    pub async fn init(&mut self) {
        self.get_folders().await;
        self.load_selected_folder().await;
    }

    /// Replace the whole tree with the backend's. State is untouched on failure.
    pub async fn get_folders(&mut self) {
        self.is_loading = true;
        let result = self.api.organization_folders(&self.page_id).await;
        self.is_loading = false;
        match result {
            Ok(folders) => {
                debug!(count = folders.len(), "loaded folder tree");
                self.folders = folders;
                if self.is_at_root() {
                    self.displayed_folders = self.folders.clone();
                }
            }
            Err(e) => self.report_failure(e, "Failed to load folders"),
        }
    }

    /// Show whatever `selected_folder` points at. Non-root folders are always
    /// fetched from the backend.
    pub async fn load_selected_folder(&mut self) {
        if self.is_at_root() {
            self.current_folder = None;
            self.displayed_folders = self.folders.clone();
            self.persist_current();
            return;
        }

        let segments = split_path(&self.selected_folder);
        let folder_id = find_folder(&self.folders, &segments).map(|f| f.id.clone());
        let Some(folder_id) = folder_id else {
            if !self.folders.is_empty() {
                warn!(path = %self.selected_folder, "selected folder not in tree, returning to root");
                self.selected_folder = ROOT_PATH.to_string();
                self.persist_selected();
                self.current_folder = None;
                self.displayed_folders = self.folders.clone();
                self.persist_current();
            }
            return;
        };

        self.is_folder_loading = true;
        let result = self.api.folder_content(&folder_id).await;
        self.is_folder_loading = false;
        match result {
            Ok(content) => {
                debug!(folder_id = %content.id, children = content.subfolders.len(), "opened folder");
                self.displayed_folders = content.subfolders.clone();
                self.current_folder = Some(content);
                self.persist_current();
            }
            Err(e) => self.report_failure(e, "Failed to open folder"),
        }
    }

    /// Reload the tree and the open folder.
    pub async fn refresh(&mut self) {
        self.get_folders().await;
        if !self.is_at_root() {
            self.load_selected_folder().await;
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────────

    /// Open the folder at `path`. Re-clicking the open folder does nothing.
    pub async fn handle_folder_click(&mut self, path: &str) {
        let path = if is_root(path) { ROOT_PATH } else { path };
        if path == self.selected_folder {
            return;
        }
        self.current_folder = None;
        self.selected_folder = path.to_string();
        self.clear_selection();
        self.persist_selected();
        self.persist_current();
        self.load_selected_folder().await;
    }

    /// Open a direct child of the open folder.
    pub async fn open_child(&mut self, name: &str) {
        let path = child_path(&self.selected_folder, name);
        self.handle_folder_click(&path).await;
    }

    /// Root label followed by each segment of the selected path.
    pub fn breadcrumbs(&self) -> Vec<String> {
        let mut crumbs = vec![ROOT_PATH.to_string()];
        crumbs.extend(split_path(&self.selected_folder).into_iter().map(String::from));
        crumbs
    }

    /// Jump to breadcrumb `index`; 0 is the root.
    pub async fn handle_breadcrumb_click(&mut self, index: usize) {
        let segments = split_path(&self.selected_folder);
        let keep = index.min(segments.len());
        let path = join_path(&segments[..keep]);
        self.handle_folder_click(&path).await;
    }

    /// Go up one level.
    pub async fn handle_navigate_back(&mut self) {
        let segments = split_path(&self.selected_folder);
        let keep = segments.len().saturating_sub(1);
        let path = join_path(&segments[..keep]);
        self.handle_folder_click(&path).await;
    }

    // ── Sidebar expansion ────────────────────────────────────────────────────

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded_folders.iter().any(|e| e == id)
    }

    pub fn toggle_expanded(&mut self, id: &str) {
        if self.is_expanded(id) {
            self.expanded_folders.retain(|e| e != id);
        } else {
            self.expanded_folders.push(id.to_string());
        }
        self.persist_expanded();
    }

    // ── View settings ────────────────────────────────────────────────────────

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        self.persist_view_mode();
    }

    pub fn toggle_view_mode(&mut self) {
        self.set_view_mode(self.view_mode.toggled());
    }

    pub fn set_sort_config(&mut self, config: SortConfig) {
        self.sort_config = config;
        self.persist_sort();
    }

    pub fn cycle_sort_key(&mut self) {
        let mut config = self.sort_config;
        config.key = config.key.next();
        self.set_sort_config(config);
    }

    pub fn toggle_sort_direction(&mut self) {
        let mut config = self.sort_config;
        config.direction = config.direction.toggled();
        self.set_sort_config(config);
    }

    /// Displayed folders ordered by name.
    pub fn sorted_folders(&self) -> Vec<Folder> {
        sort_folders(&self.displayed_folders, self.sort_config.direction)
    }

    /// Files of the open folder in the configured order. Empty at the root.
    pub fn sorted_files(&self) -> Vec<FileEntry> {
        self.current_folder
            .as_ref()
            .map(|f| sort_files(&f.files, &self.sort_config))
            .unwrap_or_default()
    }

    // ── Selection ────────────────────────────────────────────────────────────

    pub fn toggle_file_selected(&mut self, id: &str) {
        if !self.selected_file_ids.remove(id) {
            self.selected_file_ids.insert(id.to_string());
        }
    }

    pub fn toggle_folder_selected(&mut self, id: &str) {
        if !self.selected_folder_ids.remove(id) {
            self.selected_folder_ids.insert(id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_file_ids.clear();
        self.selected_folder_ids.clear();
    }

    pub fn selection_len(&self) -> usize {
        self.selected_file_ids.len() + self.selected_folder_ids.len()
    }

    fn selection_items(&self) -> Vec<BulkItem> {
        self.selected_file_ids
            .iter()
            .map(|id| BulkItem::File(id.clone()))
            .chain(
                self.selected_folder_ids
                    .iter()
                    .map(|id| BulkItem::Folder(id.clone())),
            )
            .collect()
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    /// Create a folder inside the open folder. Returns whether it was created.
    pub async fn handle_create_folder(&mut self, name: &str) -> bool {
        let siblings = self.displayed_folders.iter().map(|f| f.name.as_str());
        if let Err(e) = validate_folder_name(name, siblings) {
            self.reject(e);
            return false;
        }
        if !self.is_at_root() && self.current_folder.is_none() {
            self.push_notice(NoticeLevel::Warning, "Folder is still loading, try again");
            return false;
        }

        let request = CreateFolderRequest {
            name: name.to_string(),
            parent_folder_id: self.current_folder.as_ref().map(|f| f.id.clone()),
            created_by: self.user.id.clone(),
        };
        match self.api.create_folder(&request).await {
            Ok(()) => {
                info!(name, parent = ?request.parent_folder_id, "folder created");
                self.push_notice(NoticeLevel::Success, format!("Folder '{}' created", name));
                self.refresh().await;
                true
            }
            Err(e) => {
                self.report_failure(e, "Failed to create folder");
                false
            }
        }
    }

    /// Rename folder `id`. `current_id` is the id of the open folder, if any.
    pub async fn handle_folder_rename(
        &mut self,
        id: &str,
        new_name: &str,
        current_id: Option<&str>,
    ) -> bool {
        let old_path = path_of(&self.folders, id);
        let old_name = find_by_id(&self.folders, id)
            .or_else(|| find_by_id(&self.displayed_folders, id))
            .map(|f| f.name.clone());
        if old_name.as_deref() == Some(new_name) {
            return true;
        }

        let siblings: Vec<String> = siblings_of(&self.folders, id)
            .unwrap_or(&self.displayed_folders)
            .iter()
            .filter(|f| f.id != id)
            .map(|f| f.name.clone())
            .collect();
        if let Err(e) = validate_folder_name(new_name, siblings.iter().map(String::as_str)) {
            self.reject(e);
            return false;
        }

        let request = UpdateFolderRequest {
            id: id.to_string(),
            name: new_name.to_string(),
        };
        if let Err(e) = self.api.update_folder(&request).await {
            self.report_failure(e, "Failed to rename folder");
            return false;
        }
        info!(id, new_name, "folder renamed");

        rename_folder(&mut self.folders, id, new_name);
        rename_folder(&mut self.displayed_folders, id, new_name);
        if let Some(current) = self.current_folder.as_mut() {
            rename_folder(&mut current.subfolders, id, new_name);
            if current_id == Some(id) || current.id == id {
                current.name = new_name.to_string();
            }
        }
        if let Some(old_path) = old_path {
            if let Some(rewritten) = rewrite_path(&self.selected_folder, &old_path, new_name) {
                self.selected_folder = rewritten;
                self.persist_selected();
            }
        }
        self.persist_current();
        self.push_notice(NoticeLevel::Success, format!("Folder renamed to '{}'", new_name));
        true
    }

    /// Delete folder `id` found at `path`. Admins only.
    pub async fn handle_delete_folder(&mut self, path: &str, id: &str) -> bool {
        if let Err(e) = self.require_admin() {
            self.reject(e);
            return false;
        }
        if let Err(e) = self.api.delete_folder(id).await {
            self.report_failure(e, "Failed to delete folder");
            return false;
        }
        info!(id, path, "folder deleted");

        remove_folder(&mut self.folders, id);
        self.displayed_folders.retain(|f| f.id != id);
        if let Some(current) = self.current_folder.as_mut() {
            current.subfolders.retain(|f| f.id != id);
        }
        self.expanded_folders.retain(|e| e != id);
        self.selected_folder_ids.remove(id);
        self.persist_expanded();
        self.persist_current();

        if path == self.selected_folder || is_same_or_descendant(&self.selected_folder, path) {
            self.handle_folder_click(ROOT_PATH).await;
        }
        self.push_notice(NoticeLevel::Success, "Folder deleted");
        true
    }

    /// Delete file `id` from the open folder.
    pub async fn handle_delete_file(&mut self, id: &str) -> bool {
        if let Err(e) = self.api.delete_file(id).await {
            self.report_failure(e, "Failed to delete file");
            return false;
        }
        info!(id, "file deleted");

        let segments = split_path(&self.selected_folder);
        remove_file_at(&mut self.folders, &segments, id);
        if let Some(current) = self.current_folder.as_mut() {
            current.files.retain(|f| f.id != id);
        }
        self.selected_file_ids.remove(id);
        self.persist_current();
        self.push_notice(NoticeLevel::Success, "File deleted");
        true
    }

    /// Merge freshly uploaded files into the open folder.
    pub fn handle_upload_complete(&mut self, files: Vec<FileEntry>) {
        if files.is_empty() {
            return;
        }
        if self.is_at_root() {
            warn!(count = files.len(), "upload finished with no folder open, ignoring");
            return;
        }
        let segments = split_path(&self.selected_folder);
        append_files_at(&mut self.folders, &segments, &files);
        let count = files.len();
        if let Some(current) = self.current_folder.as_mut() {
            current.files.extend(files);
        }
        self.persist_current();
        self.push_notice(NoticeLevel::Success, format!("{} file(s) uploaded", count));
    }

    /// Delete every selected file and folder concurrently.
    pub async fn handle_delete_selected(&mut self) -> Option<BulkReport> {
        if self.selection_len() == 0 {
            return None;
        }
        if !self.selected_folder_ids.is_empty() {
            if let Err(e) = self.require_admin() {
                self.reject(e);
                return None;
            }
        }

        self.deleting_selected = true;
        let items = self.selection_items();
        let api = Arc::clone(&self.api);
        let results = join_all(items.iter().map(|item| {
            let api = &api;
            async move {
                match item {
                    BulkItem::File(id) => api.delete_file(id).await,
                    BulkItem::Folder(id) => api.delete_folder(id).await,
                }
            }
        }))
        .await;

        let report = self.finish_bulk(items, results, "deleted", None).await;
        self.deleting_selected = false;
        Some(report)
    }

    /// Move every selected file and folder into `destination_id` concurrently.
    pub async fn handle_move_selected(&mut self, destination_id: &str) -> Option<BulkReport> {
        if self.selection_len() == 0 {
            return None;
        }
        if self.selected_folder_ids.contains(destination_id) {
            self.push_notice(NoticeLevel::Error, "A folder cannot be moved into itself");
            return None;
        }

        self.moving_selected = true;
        let items = self.selection_items();
        let api = Arc::clone(&self.api);
        let moved_by = self.user.id.clone();
        let results = join_all(items.iter().map(|item| {
            let api = &api;
            let moved_by = moved_by.clone();
            async move {
                match item {
                    BulkItem::File(id) => {
                        api.move_file(&MoveFileRequest {
                            file_id: id.clone(),
                            destination_folder_id: destination_id.to_string(),
                            moved_by,
                        })
                        .await
                    }
                    BulkItem::Folder(id) => {
                        api.move_folder(&MoveFolderRequest {
                            folder_id: id.clone(),
                            destination_folder_id: destination_id.to_string(),
                            moved_by,
                        })
                        .await
                    }
                }
            }
        }))
        .await;

        let report = self
            .finish_bulk(items, results, "moved", Some(destination_id))
            .await;
        self.moving_selected = false;
        Some(report)
    }

    async fn finish_bulk(
        &mut self,
        items: Vec<BulkItem>,
        results: Vec<Result<()>>,
        verb: &str,
        destination_id: Option<&str>,
    ) -> BulkReport {
        let done: Vec<BulkItem> = items
            .iter()
            .zip(&results)
            .filter(|(_, r)| r.is_ok())
            .map(|(item, _)| item.clone())
            .collect();
        let (report, unauthorized) = BulkReport::collect(items, results);
        info!(
            verb,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "bulk operation finished"
        );
        for (item, message) in &report.failed {
            warn!(?item, %message, "bulk item failed");
        }

        self.clear_selection();
        let stays_here = destination_id.is_some()
            && destination_id == self.current_folder.as_ref().map(|f| f.id.as_str());
        if !stays_here {
            self.prune_items(&done, destination_id.is_none());
        }
        if unauthorized {
            self.expire_session();
        } else {
            self.refresh().await;
        }
        let notice = report.notice(verb);
        self.notices.push_back(notice);
        report
    }

    /// Drop items that left the open folder, so the listing is right even
    /// when the following reload fails. Deleted items also leave the tree.
    fn prune_items(&mut self, items: &[BulkItem], deleted: bool) {
        let segments = split_path(&self.selected_folder);
        for item in items {
            match item {
                BulkItem::File(id) => {
                    if deleted {
                        remove_file_at(&mut self.folders, &segments, id);
                    }
                    if let Some(current) = self.current_folder.as_mut() {
                        current.files.retain(|f| &f.id != id);
                    }
                }
                BulkItem::Folder(id) => {
                    if deleted {
                        remove_folder(&mut self.folders, id);
                        self.expanded_folders.retain(|e| e != id);
                    }
                    self.displayed_folders.retain(|f| &f.id != id);
                    if let Some(current) = self.current_folder.as_mut() {
                        current.subfolders.retain(|f| &f.id != id);
                    }
                }
            }
        }
        if deleted {
            self.persist_expanded();
        }
        self.persist_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use tokio::sync::Barrier;

    use crate::folders::session::MemorySession;
    use crate::folders::sort::{SortDirection, SortKey};
    use crate::folders::testing::{admin, file, folder, member, Call, MockApi};

    fn docs_tree() -> Vec<Folder> {
        vec![
            folder("1", "Docs", vec![folder("2", "2024", vec![])]),
            folder("3", "Reports", vec![]),
        ]
    }

    fn manager_with(api: &Arc<MockApi>, user: CurrentUser) -> FolderManager {
        FolderManager::new(api.clone(), Box::new(MemorySession::new()), "org1", user)
    }

    async fn loaded(tree: Vec<Folder>, user: CurrentUser) -> (Arc<MockApi>, FolderManager) {
        let api = MockApi::with_tree(tree);
        let mut mgr = manager_with(&api, user);
        mgr.init().await;
        api.clear_calls();
        (api, mgr)
    }

    fn levels(mgr: &mut FolderManager) -> Vec<NoticeLevel> {
        mgr.drain_notices().into_iter().map(|n| n.level).collect()
    }

    #[tokio::test]
    async fn init_loads_tree_and_shows_top_level() {
        let (_api, mgr) = loaded(docs_tree(), admin()).await;
        assert_eq!(mgr.folders.len(), 2);
        assert_eq!(mgr.displayed_folders.len(), 2);
        assert!(mgr.current_folder.is_none());
        assert_eq!(mgr.selected_folder, ROOT_PATH);
    }

    #[tokio::test]
    async fn get_folders_failure_keeps_state() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        api.fail_all.store(true, Ordering::SeqCst);
        mgr.get_folders().await;
        assert_eq!(mgr.folders.len(), 2);
        assert!(!mgr.is_loading);
        assert_eq!(levels(&mut mgr), vec![NoticeLevel::Error]);
    }

    #[tokio::test]
    async fn folder_click_fetches_nested_content() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs/2024").await;
        assert_eq!(api.calls(), vec![Call::FolderContent("2".into())]);
        assert_eq!(mgr.current_folder.as_ref().unwrap().id, "2");
        assert!(mgr.displayed_folders.is_empty());
        assert!(!mgr.is_folder_loading);
    }

    #[tokio::test]
    async fn folder_click_shows_fetched_subfolders() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        let mut content = folder("2", "2024", vec![folder("20", "Q1", vec![])]);
        content.files.push(file("f1", "ata.pdf", Some(10)));
        api.contents.lock().unwrap().insert("2".into(), content);

        mgr.handle_folder_click("Docs/2024").await;
        assert_eq!(mgr.displayed_folders.len(), 1);
        assert_eq!(mgr.displayed_folders[0].name, "Q1");
        assert_eq!(mgr.sorted_files().len(), 1);
    }

    #[tokio::test]
    async fn folder_click_same_path_is_noop() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs").await;
        api.clear_calls();
        mgr.handle_folder_click("Docs").await;
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn folder_click_revisit_fetches_again() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs").await;
        mgr.handle_folder_click(ROOT_PATH).await;
        mgr.handle_folder_click("Docs").await;
        let fetches = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::FolderContent(_)))
            .count();
        assert_eq!(fetches, 2);
    }

    #[tokio::test]
    async fn folder_click_clears_selection() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.toggle_folder_selected("3");
        mgr.toggle_file_selected("f9");
        mgr.handle_folder_click("Docs").await;
        assert_eq!(mgr.selection_len(), 0);
    }

    #[tokio::test]
    async fn folder_click_failure_reports_error() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        api.fail_id("1");
        mgr.handle_folder_click("Docs").await;
        assert!(mgr.current_folder.is_none());
        assert!(!mgr.is_folder_loading);
        let notices = mgr.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "backend exploded");
    }

    #[tokio::test]
    async fn breadcrumbs_and_back_navigation() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs/2024").await;
        assert_eq!(mgr.breadcrumbs(), vec![ROOT_PATH, "Docs", "2024"]);

        mgr.handle_navigate_back().await;
        assert_eq!(mgr.selected_folder, "Docs");
        mgr.handle_navigate_back().await;
        assert_eq!(mgr.selected_folder, ROOT_PATH);
        assert!(mgr.current_folder.is_none());
        assert_eq!(mgr.displayed_folders.len(), 2);
    }

    #[tokio::test]
    async fn breadcrumb_click_truncates_path() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs/2024").await;
        mgr.handle_breadcrumb_click(1).await;
        assert_eq!(mgr.selected_folder, "Docs");
        mgr.handle_breadcrumb_click(0).await;
        assert_eq!(mgr.selected_folder, ROOT_PATH);
    }

    #[tokio::test]
    async fn invalid_names_never_reach_backend() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        for name in ["a\\b", "a/b", "a:b", "a*b", "a?b", "a\"b", "a<b", "a>b", "a|b", "end ", "end."] {
            assert!(!mgr.handle_create_folder(name).await);
        }
        assert!(api.calls().is_empty());
        let notices = mgr.drain_notices();
        assert_eq!(notices.len(), 11);
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
    }

    #[tokio::test]
    async fn duplicate_sibling_name_rejected() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        assert!(!mgr.handle_create_folder("Docs").await);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn create_folder_in_open_folder_reloads() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs").await;
        api.clear_calls();

        assert!(mgr.handle_create_folder("Atas").await);
        let calls = api.calls();
        assert_eq!(
            calls[0],
            Call::CreateFolder(CreateFolderRequest {
                name: "Atas".into(),
                parent_folder_id: Some("1".into()),
                created_by: "u1".into(),
            })
        );
        assert_eq!(calls[1], Call::OrganizationFolders("org1".into()));
        assert_eq!(calls[2], Call::FolderContent("1".into()));
        assert_eq!(levels(&mut mgr), vec![NoticeLevel::Success]);
    }

    #[tokio::test]
    async fn create_folder_at_root_has_no_parent() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        assert!(mgr.handle_create_folder("Novos").await);
        match &api.calls()[0] {
            Call::CreateFolder(req) => assert_eq!(req.parent_folder_id, None),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn rename_current_folder_updates_name_and_path() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs/2024").await;
        assert!(mgr.handle_folder_rename("2", "NewName", Some("2")).await);
        assert_eq!(mgr.current_folder.as_ref().unwrap().name, "NewName");
        assert_eq!(mgr.selected_folder, "Docs/NewName");
        assert!(find_folder(&mgr.folders, &["Docs", "NewName"]).is_some());
    }

    #[tokio::test]
    async fn rename_ancestor_rewrites_selected_path() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs/2024").await;
        assert!(mgr.handle_folder_rename("1", "Documentos", Some("2")).await);
        assert_eq!(mgr.selected_folder, "Documentos/2024");
        assert_eq!(mgr.current_folder.as_ref().unwrap().name, "2024");
    }

    #[tokio::test]
    async fn rename_unrelated_folder_keeps_path() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs").await;
        assert!(mgr.handle_folder_rename("3", "Relatórios", Some("1")).await);
        assert_eq!(mgr.selected_folder, "Docs");
        assert_eq!(mgr.folders[1].name, "Relatórios");
    }

    #[tokio::test]
    async fn rename_failure_leaves_tree_alone() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        api.fail_id("3");
        assert!(!mgr.handle_folder_rename("3", "X", None).await);
        assert_eq!(mgr.folders[1].name, "Reports");
        assert_eq!(levels(&mut mgr), vec![NoticeLevel::Error]);
    }

    #[tokio::test]
    async fn rename_to_sibling_name_rejected() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        assert!(!mgr.handle_folder_rename("3", "Docs", None).await);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_current_folder_returns_to_root() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs/2024").await;
        assert!(mgr.handle_delete_folder("Docs/2024", "2").await);
        assert_eq!(mgr.selected_folder, ROOT_PATH);
        assert!(find_by_id(&mgr.folders, "2").is_none());
    }

    #[tokio::test]
    async fn delete_ancestor_of_current_returns_to_root() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs/2024").await;
        assert!(mgr.handle_delete_folder("Docs", "1").await);
        assert_eq!(mgr.selected_folder, ROOT_PATH);
        assert_eq!(mgr.displayed_folders.len(), 1);
    }

    #[tokio::test]
    async fn delete_child_keeps_position() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs").await;
        mgr.toggle_expanded("2");
        assert!(mgr.handle_delete_folder("Docs/2024", "2").await);
        assert_eq!(mgr.selected_folder, "Docs");
        assert!(mgr.displayed_folders.is_empty());
        assert!(!mgr.is_expanded("2"));
    }

    #[tokio::test]
    async fn delete_folder_requires_admin() {
        let (api, mut mgr) = loaded(docs_tree(), member()).await;
        assert!(!mgr.handle_delete_folder("Reports", "3").await);
        assert!(api.calls().is_empty());
        assert_eq!(levels(&mut mgr), vec![NoticeLevel::Warning]);
        assert_eq!(mgr.folders.len(), 2);
    }

    #[tokio::test]
    async fn delete_file_patches_current_and_tree() {
        let mut tree = docs_tree();
        tree[0].subfolders[0].files = vec![file("f1", "a.pdf", None), file("f2", "b.pdf", None)];
        let (_api, mut mgr) = loaded(tree, member()).await;
        mgr.handle_folder_click("Docs/2024").await;
        assert!(mgr.handle_delete_file("f1").await);
        let names: Vec<String> = mgr.sorted_files().into_iter().map(|f| f.id).collect();
        assert_eq!(names, vec!["f2"]);
        assert_eq!(find_folder(&mgr.folders, &["Docs", "2024"]).unwrap().files.len(), 1);
    }

    #[tokio::test]
    async fn upload_complete_appends_at_depth() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs/2024").await;
        mgr.handle_upload_complete(vec![file("n1", "novo.pdf", Some(5))]);
        assert_eq!(mgr.current_folder.as_ref().unwrap().files.len(), 1);
        assert_eq!(find_folder(&mgr.folders, &["Docs", "2024"]).unwrap().files[0].id, "n1");
    }

    #[tokio::test]
    async fn upload_complete_at_root_is_ignored() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_upload_complete(vec![file("n1", "novo.pdf", Some(5))]);
        assert!(mgr.drain_notices().is_empty());
    }

    #[tokio::test]
    async fn bulk_delete_issues_concurrent_calls() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        *api.delete_barrier.lock().unwrap() = Some(Arc::new(Barrier::new(3)));
        mgr.toggle_file_selected("f1");
        mgr.toggle_file_selected("f2");
        mgr.toggle_folder_selected("3");

        let report = tokio::time::timeout(Duration::from_secs(5), mgr.handle_delete_selected())
            .await
            .expect("deletes must run concurrently")
            .unwrap();

        let deletes = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DeleteFile(_) | Call::DeleteFolder(_)))
            .count();
        assert_eq!(deletes, 3);
        assert_eq!(report.succeeded, 3);
        assert!(!mgr.deleting_selected);
        assert_eq!(mgr.selection_len(), 0);
        assert_eq!(levels(&mut mgr), vec![NoticeLevel::Success]);
    }

    #[tokio::test]
    async fn bulk_delete_partial_failure_is_reported_per_item() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        api.fail_id("f2");
        mgr.toggle_file_selected("f1");
        mgr.toggle_file_selected("f2");
        mgr.toggle_folder_selected("3");

        let report = mgr.handle_delete_selected().await.unwrap();
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, BulkItem::File("f2".into()));
        assert!(!mgr.deleting_selected);
        assert_eq!(mgr.selection_len(), 0);
        assert_eq!(levels(&mut mgr), vec![NoticeLevel::Warning]);
        assert!(api.calls().contains(&Call::OrganizationFolders("org1".into())));
    }

    #[tokio::test]
    async fn bulk_delete_total_failure_resets_flag() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        api.fail_all.store(true, Ordering::SeqCst);
        mgr.toggle_file_selected("f1");
        let report = mgr.handle_delete_selected().await.unwrap();
        assert_eq!(report.succeeded, 0);
        assert!(!mgr.deleting_selected);
        assert!(levels(&mut mgr).contains(&NoticeLevel::Error));
    }

    #[tokio::test]
    async fn bulk_delete_inside_folder_refetches_it() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.handle_folder_click("Docs").await;
        api.clear_calls();
        mgr.toggle_file_selected("f1");
        mgr.handle_delete_selected().await;
        let calls = api.calls();
        assert_eq!(calls.last(), Some(&Call::FolderContent("1".into())));
    }

    #[tokio::test]
    async fn bulk_delete_with_nothing_selected_does_nothing() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        assert!(mgr.handle_delete_selected().await.is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn bulk_delete_folders_requires_admin() {
        let (api, mut mgr) = loaded(docs_tree(), member()).await;
        mgr.toggle_folder_selected("3");
        assert!(mgr.handle_delete_selected().await.is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn bulk_move_sends_requests_with_mover() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.toggle_file_selected("f1");
        mgr.toggle_folder_selected("3");
        let report = mgr.handle_move_selected("1").await.unwrap();
        assert_eq!(report.succeeded, 2);
        assert!(!mgr.moving_selected);
        let calls = api.calls();
        assert!(calls.contains(&Call::MoveFile(MoveFileRequest {
            file_id: "f1".into(),
            destination_folder_id: "1".into(),
            moved_by: "u1".into(),
        })));
        assert!(calls.contains(&Call::MoveFolder(MoveFolderRequest {
            folder_id: "3".into(),
            destination_folder_id: "1".into(),
            moved_by: "u1".into(),
        })));
    }

    #[tokio::test]
    async fn bulk_move_into_selected_folder_rejected() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.toggle_folder_selected("3");
        assert!(mgr.handle_move_selected("3").await.is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn bulk_delete_prunes_listing_when_reload_fails() {
        let mut tree = docs_tree();
        tree[0].files = vec![file("f1", "a.pdf", None), file("f2", "b.pdf", None)];
        let (api, mut mgr) = loaded(tree, admin()).await;
        mgr.handle_folder_click("Docs").await;
        api.fail_id("1");
        mgr.toggle_file_selected("f1");

        let report = mgr.handle_delete_selected().await.unwrap();
        assert_eq!(report.succeeded, 1);
        let ids: Vec<String> = mgr.sorted_files().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["f2"]);
        assert_eq!(
            levels(&mut mgr),
            vec![NoticeLevel::Error, NoticeLevel::Success]
        );
    }

    #[tokio::test]
    async fn bulk_move_into_open_folder_keeps_listing() {
        let mut tree = docs_tree();
        tree[0].files = vec![file("f1", "a.pdf", None)];
        let (api, mut mgr) = loaded(tree, admin()).await;
        mgr.handle_folder_click("Docs").await;
        api.fail_id("1");
        mgr.toggle_file_selected("f1");

        mgr.handle_move_selected("1").await.unwrap();
        assert_eq!(mgr.sorted_files().len(), 1);
    }

    #[tokio::test]
    async fn bulk_delete_folder_permission_message() {
        let (_api, mut mgr) = loaded(docs_tree(), member()).await;
        mgr.toggle_folder_selected("3");
        mgr.handle_delete_selected().await;
        let notices = mgr.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[0].message, "Only administrators can delete folders");
    }

    #[tokio::test]
    async fn invalid_name_notice_carries_rule() {
        let (api, mut mgr) = loaded(docs_tree(), admin()).await;
        assert!(!mgr.handle_create_folder("a/b").await);
        assert!(api.calls().is_empty());
        let notices = mgr.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("cannot contain '/'"));
    }

    #[test]
    fn notice_levels_order_by_severity() {
        assert!(NoticeLevel::Error > NoticeLevel::Warning);
        assert!(NoticeLevel::Warning > NoticeLevel::Success);
    }

    #[tokio::test]
    async fn unauthorized_clears_session() {
        let api = MockApi::with_tree(docs_tree());
        api.unauthorized.store(true, Ordering::SeqCst);
        let session = MemorySession::new().with("selectedFolder-org1", "\"Docs\"");
        let mut mgr = FolderManager::new(api.clone(), Box::new(session), "org1", admin());
        mgr.init().await;
        assert!(mgr.session_expired());
        assert!(mgr.session.get("selectedFolder-org1").is_none());
    }

    #[tokio::test]
    async fn restores_sort_config_from_session() {
        let api = MockApi::with_tree(docs_tree());
        let session =
            MemorySession::new().with("sortConfig-org1", r#"{"key":"size","direction":"desc"}"#);
        let mgr = FolderManager::new(api, Box::new(session), "org1", admin());
        assert_eq!(
            mgr.sort_config,
            SortConfig {
                key: SortKey::Size,
                direction: SortDirection::Desc
            }
        );
    }

    #[tokio::test]
    async fn default_sort_config_without_session() {
        let api = MockApi::with_tree(docs_tree());
        let mgr = manager_with(&api, admin());
        assert_eq!(mgr.sort_config, SortConfig::default());
        assert_eq!(mgr.view_mode, ViewMode::List);
        assert_eq!(mgr.selected_folder, ROOT_PATH);
    }

    #[tokio::test]
    async fn default_view_only_applies_without_stored_view() {
        let api = MockApi::with_tree(docs_tree());
        let fresh = manager_with(&api, admin()).with_default_view(ViewMode::Grid);
        assert_eq!(fresh.view_mode, ViewMode::Grid);

        let session = MemorySession::new().with("folderView-org1", "\"list\"");
        let restored = FolderManager::new(api, Box::new(session), "org1", admin())
            .with_default_view(ViewMode::Grid);
        assert_eq!(restored.view_mode, ViewMode::List);
    }

    #[tokio::test]
    async fn view_state_is_written_to_session() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.toggle_view_mode();
        mgr.toggle_expanded("1");
        mgr.cycle_sort_key();
        mgr.handle_folder_click("Docs").await;

        assert_eq!(mgr.session.get("folderView-org1").as_deref(), Some("\"grid\""));
        assert_eq!(mgr.session.get("expandedFolders-org1").as_deref(), Some("[\"1\"]"));
        assert_eq!(
            mgr.session.get("sortConfig-org1").as_deref(),
            Some(r#"{"key":"created_at","direction":"asc"}"#)
        );
        assert_eq!(mgr.session.get("selectedFolder-org1").as_deref(), Some("\"Docs\""));
        assert!(mgr
            .session
            .get("currentFolder-org1")
            .is_some_and(|v| v.contains("\"Docs\"")));
    }

    #[tokio::test]
    async fn restored_path_is_reopened_on_init() {
        let api = MockApi::with_tree(docs_tree());
        let session = MemorySession::new()
            .with("selectedFolder-org1", "\"Docs/2024\"")
            .with("folderView-org1", "\"grid\"");
        let mut mgr = FolderManager::new(api.clone(), Box::new(session), "org1", admin());
        mgr.init().await;
        assert_eq!(mgr.view_mode, ViewMode::Grid);
        assert_eq!(mgr.current_folder.as_ref().unwrap().id, "2");
        assert!(api.calls().contains(&Call::FolderContent("2".into())));
    }

    #[tokio::test]
    async fn stale_restored_path_falls_back_to_root() {
        let api = MockApi::with_tree(docs_tree());
        let session = MemorySession::new().with("selectedFolder-org1", "\"Gone/Away\"");
        let mut mgr = FolderManager::new(api, Box::new(session), "org1", admin());
        mgr.init().await;
        assert_eq!(mgr.selected_folder, ROOT_PATH);
        assert_eq!(mgr.displayed_folders.len(), 2);
    }

    #[tokio::test]
    async fn sorted_folders_follow_direction() {
        let (_api, mut mgr) = loaded(docs_tree(), admin()).await;
        mgr.toggle_sort_direction();
        let names: Vec<String> = mgr.sorted_folders().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Reports", "Docs"]);
    }

    #[test]
    fn bulk_report_notice_levels() {
        let ok = BulkReport {
            succeeded: 2,
            failed: vec![],
        };
        assert_eq!(ok.notice("deleted").level, NoticeLevel::Success);
        let partial = BulkReport {
            succeeded: 1,
            failed: vec![(BulkItem::File("x".into()), "boom".into())],
        };
        let notice = partial.notice("moved");
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("1 of 2"));
        let none = BulkReport {
            succeeded: 0,
            failed: vec![(BulkItem::Folder("y".into()), "boom".into())],
        };
        assert_eq!(none.notice("moved").level, NoticeLevel::Error);
    }
}
