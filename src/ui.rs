use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode, Focus};
use crate::components::content::ContentWidget;
use crate::components::dialog::DialogWidget;
use crate::components::help::HelpOverlay;
use crate::components::status_bar::{BreadcrumbWidget, StatusBarWidget};
use crate::components::tree::TreeWidget;
use crate::folders::manager::ViewMode;
use crate::folders::tree::ROOT_PATH;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[1]);

    let crumbs = app.manager.breadcrumbs();
    frame.render_widget(BreadcrumbWidget::new(&crumbs, &app.theme), rows[0]);

    render_sidebar(app, frame, panes[0]);
    render_content(app, frame, panes[1]);
    render_status(app, frame, rows[2]);

    match app.mode {
        AppMode::Dialog(_) => {
            frame.render_widget(
                DialogWidget::new(&app.mode, &app.dialog_state, &app.theme),
                area,
            );
        }
        AppMode::Help => {
            frame.render_widget(HelpOverlay::new(&app.theme, app.help_scroll), area);
        }
        AppMode::Normal => {}
    }
}

fn pane_block(app: &App, title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        app.theme.border_focused_fg
    } else {
        app.theme.border_fg
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Sidebar;
    let block = pane_block(app, " Folders ".to_string(), focused);
    let visible_height = block.inner(area).height as usize;
    app.sidebar_scroll = App::scroll_into_view(app.sidebar_scroll, app.sidebar_index, visible_height);

    let rows = app.sidebar_rows();
    let widget = TreeWidget::new(&rows, &app.theme, app.use_icons)
        .selected(app.sidebar_index, app.sidebar_scroll)
        .open_path(&app.manager.selected_folder)
        .focused(focused)
        .block(block);
    frame.render_widget(widget, area);
}

fn render_content(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Content;
    let title = match &app.manager.current_folder {
        Some(folder) if !app.manager.is_at_root() => format!(" {} ", folder.name),
        _ => format!(" {} ", ROOT_PATH),
    };
    let block = pane_block(app, title, focused);
    let inner = block.inner(area);

    // Grid scroll counts rows of cells.
    let row = match app.manager.view_mode {
        ViewMode::List => app.content_index,
        ViewMode::Grid => app.content_index / ContentWidget::grid_columns(inner.width),
    };
    app.content_scroll = App::scroll_into_view(app.content_scroll, row, inner.height as usize);

    let entries = app.content_entries();
    let widget = ContentWidget::new(
        &entries,
        &app.manager.selected_file_ids,
        &app.manager.selected_folder_ids,
        &app.theme,
    )
    .view_mode(app.manager.view_mode)
    .selected(app.content_index, app.content_scroll)
    .focused(focused)
    .loading(app.manager.is_folder_loading)
    .use_icons(app.use_icons)
    .block(block);
    frame.render_widget(widget, area);
}

fn busy_label(app: &App) -> Option<&'static str> {
    let m = &app.manager;
    if m.deleting_selected {
        Some("deleting…")
    } else if m.moving_selected {
        Some("moving…")
    } else if m.is_loading || m.is_folder_loading {
        Some("loading…")
    } else {
        None
    }
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let user = app.manager.user();
    let page_info = if user.name.is_empty() {
        format!(" {}", app.manager.page_id())
    } else {
        format!(" {} · {}", app.manager.page_id(), user.name)
    };
    let sort = app.manager.sort_config;
    let view_info = format!(
        "{} {} · {}",
        sort.key.label(),
        sort.direction.arrow(),
        app.manager.view_mode.label()
    );
    let selection = match app.manager.selection_len() {
        0 => None,
        n => Some(format!("{} selected", n)),
    };

    let mut widget = StatusBarWidget::new(&page_info, &view_info, &app.theme);
    if let Some(info) = &selection {
        widget = widget.selection_info(info);
    }
    if let Some(label) = busy_label(app) {
        widget = widget.busy(label);
    }
    if let Some((msg, level, _)) = &app.status_message {
        widget = widget.status_message(msg, *level);
    }
    frame.render_widget(widget, area);
}
