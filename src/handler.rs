use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::app::{App, AppMode, ContentEntry, DialogKind, Focus};
use crate::components::help::HelpOverlay;
use crate::folders::manager::NoticeLevel;

/// Handle a key event. Backend calls triggered by the key are awaited here.
pub async fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode.clone() {
        AppMode::Normal => handle_normal_mode(app, key).await,
        AppMode::Dialog(kind) => handle_dialog_mode(app, kind, key).await,
        AppMode::Help => handle_help_mode(app, key),
    }
    app.absorb_notices();
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('?') => {
            app.help_scroll = 0;
            app.mode = AppMode::Help;
        }
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Enter => open_selected(app).await,
        KeyCode::Char('l') | KeyCode::Right => match app.focus {
            Focus::Sidebar => set_sidebar_expanded(app, true),
            Focus::Content => open_selected(app).await,
        },
        KeyCode::Char('h') | KeyCode::Left => match app.focus {
            Focus::Sidebar => set_sidebar_expanded(app, false),
            Focus::Content => go_back(app).await,
        },
        KeyCode::Backspace => go_back(app).await,
        KeyCode::Char(c @ '0'..='9') => {
            let index = c as usize - '0' as usize;
            app.manager.handle_breadcrumb_click(index).await;
            app.content_index = 0;
        }
        KeyCode::Char(' ') => toggle_mark(app),
        KeyCode::Esc => app.manager.clear_selection(),
        KeyCode::Char('v') => app.manager.toggle_view_mode(),
        KeyCode::Char('s') => app.manager.cycle_sort_key(),
        KeyCode::Char('S') => app.manager.toggle_sort_direction(),
        KeyCode::Char('R') | KeyCode::F(5) => app.manager.refresh().await,
        KeyCode::Char('n') => app.open_dialog(DialogKind::CreateFolder),
        KeyCode::Char('r') => start_rename(app),
        KeyCode::Char('d') => start_delete(app),
        KeyCode::Char('D') => {
            let count = app.manager.selection_len();
            if count > 0 {
                app.open_dialog(DialogKind::DeleteSelected { count });
            } else {
                app.set_status_message("Nothing selected".to_string(), NoticeLevel::Warning);
            }
        }
        KeyCode::Char('m') => start_move(app),
        _ => {}
    }
}

async fn open_selected(app: &mut App) {
    match app.focus {
        Focus::Sidebar => {
            if let Some(row) = app.selected_sidebar_row() {
                app.manager.handle_folder_click(&row.path).await;
                app.content_index = 0;
            }
        }
        Focus::Content => {
            if let Some(ContentEntry::Folder(folder)) = app.selected_content_entry() {
                app.manager.open_child(&folder.name).await;
                app.content_index = 0;
            }
        }
    }
}

async fn go_back(app: &mut App) {
    app.manager.handle_navigate_back().await;
    app.content_index = 0;
}

fn set_sidebar_expanded(app: &mut App, expand: bool) {
    let Some(row) = app.selected_sidebar_row() else {
        return;
    };
    if row.is_expanded != expand && (row.has_children || !expand) {
        app.manager.toggle_expanded(&row.id);
    } else if !expand && row.depth > 0 {
        // Jump to the parent row.
        let rows = app.sidebar_rows();
        if let Some(parent) = rows[..app.sidebar_index]
            .iter()
            .rposition(|r| r.depth + 1 == row.depth)
        {
            app.sidebar_index = parent;
        }
    }
}

fn toggle_mark(app: &mut App) {
    if app.focus != Focus::Content {
        return;
    }
    match app.selected_content_entry() {
        Some(ContentEntry::Folder(f)) => app.manager.toggle_folder_selected(&f.id),
        Some(ContentEntry::File(f)) => app.manager.toggle_file_selected(&f.id),
        None => return,
    }
    app.select_next();
}

/// The folder under the cursor as `(id, name, path)`.
fn focused_folder(app: &App) -> Option<(String, String, String)> {
    match app.focus {
        Focus::Sidebar => app
            .selected_sidebar_row()
            .map(|row| (row.id, row.name, row.path)),
        Focus::Content => match app.selected_content_entry() {
            Some(ContentEntry::Folder(f)) => {
                let path = app.content_path(&f.name);
                Some((f.id, f.name, path))
            }
            _ => None,
        },
    }
}

fn start_rename(app: &mut App) {
    if let Some((id, name, _)) = focused_folder(app) {
        app.open_dialog(DialogKind::RenameFolder { id, original: name });
    }
}

fn start_delete(app: &mut App) {
    if app.focus == Focus::Content {
        if let Some(ContentEntry::File(f)) = app.selected_content_entry() {
            let name = f.label().to_string();
            app.open_dialog(DialogKind::DeleteFile { id: f.id, name });
            return;
        }
    }
    if let Some((id, _, path)) = focused_folder(app) {
        app.open_dialog(DialogKind::DeleteFolder { id, path });
    }
}

fn start_move(app: &mut App) {
    if app.manager.selection_len() == 0 {
        app.set_status_message("Nothing selected".to_string(), NoticeLevel::Warning);
        return;
    }
    let targets = app.move_targets();
    if targets.is_empty() {
        app.set_status_message("No destination folders".to_string(), NoticeLevel::Warning);
        return;
    }
    app.open_dialog(DialogKind::MoveSelected {
        targets,
        selected: 0,
    });
}

async fn handle_dialog_mode(app: &mut App, kind: DialogKind, key: KeyEvent) {
    match kind {
        DialogKind::CreateFolder | DialogKind::RenameFolder { .. } => {
            handle_input_dialog(app, kind, key).await
        }
        DialogKind::DeleteFolder { .. }
        | DialogKind::DeleteFile { .. }
        | DialogKind::DeleteSelected { .. } => handle_confirm_dialog(app, kind, key).await,
        DialogKind::MoveSelected { targets, selected } => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.move_picker_step(true),
            KeyCode::Char('k') | KeyCode::Up => app.move_picker_step(false),
            KeyCode::Enter => {
                app.close_dialog();
                if let Some(target) = targets.get(selected) {
                    debug!(destination = %target.path, "moving selection");
                    app.manager.handle_move_selected(&target.id).await;
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => app.close_dialog(),
            _ => {}
        },
        DialogKind::Error { .. } => app.close_dialog(),
    }
}

async fn handle_input_dialog(app: &mut App, kind: DialogKind, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let input = std::mem::take(&mut app.dialog_state.input);
            let done = match &kind {
                DialogKind::CreateFolder => app.manager.handle_create_folder(&input).await,
                DialogKind::RenameFolder { id, .. } => {
                    let current_id = app.manager.current_folder.as_ref().map(|f| f.id.clone());
                    app.manager
                        .handle_folder_rename(id, &input, current_id.as_deref())
                        .await
                }
                _ => true,
            };
            if done {
                app.close_dialog();
            } else {
                // Keep the dialog open so the name can be corrected.
                app.dialog_state.input = input;
            }
        }
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) => app.dialog_input_char(c),
        _ => {}
    }
}

async fn handle_confirm_dialog(app: &mut App, kind: DialogKind, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.close_dialog();
            match kind {
                DialogKind::DeleteFolder { id, path } => {
                    app.manager.handle_delete_folder(&path, &id).await;
                }
                DialogKind::DeleteFile { id, .. } => {
                    app.manager.handle_delete_file(&id).await;
                }
                DialogKind::DeleteSelected { .. } => {
                    app.manager.handle_delete_selected().await;
                }
                _ => {}
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
        _ => {}
    }
}

fn handle_help_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll = (app.help_scroll + 1).min(HelpOverlay::total_lines().saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => app.help_scroll = app.help_scroll.saturating_sub(1),
        _ => app.mode = AppMode::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::folders::manager::FolderManager;
    use crate::folders::session::MemorySession;
    use crate::folders::testing::{admin, file, folder, Call, MockApi};
    use crate::folders::tree::ROOT_PATH;
    use crate::theme::dark_theme;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, key(code)).await;
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c)).await;
        }
    }

    async fn setup() -> (Arc<MockApi>, App) {
        let mut docs = folder("1", "Docs", vec![folder("2", "2024", vec![])]);
        docs.files.push(file("f1", "ata.pdf", Some(10)));
        let api = MockApi::with_tree(vec![docs, folder("3", "Reports", vec![])]);
        let mut manager =
            FolderManager::new(api.clone(), Box::new(MemorySession::new()), "org1", admin());
        manager.init().await;
        api.clear_calls();
        (api, App::new(manager, dark_theme(), false))
    }

    #[tokio::test]
    async fn q_quits() {
        let (_api, mut app) = setup().await;
        press(&mut app, KeyCode::Char('q')).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_c_quits_from_dialog() {
        let (_api, mut app) = setup().await;
        app.open_dialog(DialogKind::CreateFolder);
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        )
        .await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn enter_opens_sidebar_folder() {
        let (api, mut app) = setup().await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.manager.selected_folder, "Docs");
        assert_eq!(api.calls(), vec![Call::FolderContent("1".into())]);
    }

    #[tokio::test]
    async fn content_navigation_and_back() {
        let (_api, mut app) = setup().await;
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Tab).await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.manager.selected_folder, "Docs/2024");
        press(&mut app, KeyCode::Backspace).await;
        assert_eq!(app.manager.selected_folder, "Docs");
        press(&mut app, KeyCode::Char('0')).await;
        assert_eq!(app.manager.selected_folder, ROOT_PATH);
    }

    #[tokio::test]
    async fn right_expands_and_left_collapses() {
        let (_api, mut app) = setup().await;
        press(&mut app, KeyCode::Right).await;
        assert!(app.manager.is_expanded("1"));
        assert_eq!(app.sidebar_rows().len(), 3);
        press(&mut app, KeyCode::Down).await;
        press(&mut app, KeyCode::Left).await;
        assert_eq!(app.sidebar_index, 0);
        press(&mut app, KeyCode::Left).await;
        assert!(!app.manager.is_expanded("1"));
    }

    #[tokio::test]
    async fn create_dialog_submits_name() {
        let (api, mut app) = setup().await;
        press(&mut app, KeyCode::Char('n')).await;
        type_text(&mut app, "Atas").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.mode, AppMode::Normal);
        assert!(matches!(api.calls()[0], Call::CreateFolder(_)));
    }

    #[tokio::test]
    async fn invalid_name_keeps_dialog_open() {
        let (api, mut app) = setup().await;
        press(&mut app, KeyCode::Char('n')).await;
        type_text(&mut app, "a:b").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.mode, AppMode::Dialog(DialogKind::CreateFolder));
        assert_eq!(app.dialog_state.input, "a:b");
        assert!(api.calls().is_empty());
        let (_, level, _) = app.status_message.as_ref().unwrap();
        assert_eq!(*level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn rename_from_sidebar() {
        let (_api, mut app) = setup().await;
        press(&mut app, KeyCode::Down).await;
        press(&mut app, KeyCode::Char('r')).await;
        for _ in 0.."Reports".len() {
            press(&mut app, KeyCode::Backspace).await;
        }
        type_text(&mut app, "Relatórios").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.manager.folders[1].name, "Relatórios");
    }

    #[tokio::test]
    async fn delete_folder_needs_confirmation() {
        let (api, mut app) = setup().await;
        press(&mut app, KeyCode::Down).await;
        press(&mut app, KeyCode::Char('d')).await;
        assert!(matches!(
            app.mode,
            AppMode::Dialog(DialogKind::DeleteFolder { .. })
        ));
        press(&mut app, KeyCode::Char('n')).await;
        assert!(api.calls().is_empty());

        press(&mut app, KeyCode::Char('d')).await;
        press(&mut app, KeyCode::Char('y')).await;
        assert_eq!(api.calls(), vec![Call::DeleteFolder("3".into())]);
        assert_eq!(app.manager.folders.len(), 1);
        assert_eq!(app.sidebar_index, 0);
    }

    #[tokio::test]
    async fn delete_file_from_content() {
        let (api, mut app) = setup().await;
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Tab).await;
        press(&mut app, KeyCode::Char('G')).await;
        press(&mut app, KeyCode::Char('d')).await;
        press(&mut app, KeyCode::Char('y')).await;
        assert!(api.calls().contains(&Call::DeleteFile("f1".into())));
        assert!(app.manager.sorted_files().is_empty());
    }

    #[tokio::test]
    async fn mark_and_bulk_move() {
        let (api, mut app) = setup().await;
        press(&mut app, KeyCode::Enter).await;
        press(&mut app, KeyCode::Tab).await;
        press(&mut app, KeyCode::Down).await;
        press(&mut app, KeyCode::Char(' ')).await;
        assert!(app.manager.selected_file_ids.contains("f1"));

        press(&mut app, KeyCode::Char('m')).await;
        press(&mut app, KeyCode::Down).await;
        press(&mut app, KeyCode::Enter).await;
        assert!(api.calls().iter().any(|c| matches!(
            c,
            Call::MoveFile(req) if req.file_id == "f1" && req.destination_folder_id == "2"
        )));
        assert_eq!(app.manager.selection_len(), 0);
    }

    #[tokio::test]
    async fn bulk_delete_without_selection_warns() {
        let (api, mut app) = setup().await;
        press(&mut app, KeyCode::Char('D')).await;
        assert_eq!(app.mode, AppMode::Normal);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn view_and_sort_keys_persist() {
        let (_api, mut app) = setup().await;
        press(&mut app, KeyCode::Char('v')).await;
        press(&mut app, KeyCode::Char('s')).await;
        press(&mut app, KeyCode::Char('S')).await;
        assert_eq!(app.manager.view_mode.label(), "grid");
        assert_eq!(app.manager.sort_config.key.label(), "Created");
        assert_eq!(app.manager.sort_config.direction.arrow(), "↓");
    }

    #[tokio::test]
    async fn help_opens_and_closes() {
        let (_api, mut app) = setup().await;
        press(&mut app, KeyCode::Char('?')).await;
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::Down).await;
        assert_eq!(app.help_scroll, 1);
        press(&mut app, KeyCode::Esc).await;
        assert_eq!(app.mode, AppMode::Normal);
    }
}
