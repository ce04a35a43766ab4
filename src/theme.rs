//! Theme data model: built-in palettes and resolution from config.
//!
//! Two built-in palettes (dark and light) plus custom hex overrides from the
//! config file.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Sidebar and listing
    pub sidebar_fg: Color,
    pub selected_bg: Color,
    pub selected_fg: Color,
    pub folder_fg: Color,
    pub file_fg: Color,
    /// Entries marked for a bulk operation.
    pub marked_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Dialogs
    pub dialog_bg: Color,
    pub dialog_border_fg: Color,

    // Semantic colors, not configurable
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

// ── Built-in palettes ────────────────────────────────────────────────────────

/// Dark theme using the Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        sidebar_fg: Color::Rgb(205, 214, 244),   // #cdd6f4 (text)
        selected_bg: Color::Rgb(69, 71, 90),     // #45475a (surface1)
        selected_fg: Color::Rgb(205, 214, 244),  // #cdd6f4
        folder_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        file_fg: Color::Rgb(205, 214, 244),      // #cdd6f4
        marked_fg: Color::Rgb(250, 179, 135),    // #fab387 (peach)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),           // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250), // #89b4fa

        dialog_bg: Color::Rgb(49, 50, 68), // #313244 (surface0)
        dialog_border_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        accent_fg: Color::Rgb(203, 166, 247),  // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086 (overlay0)
    }
}

/// Light theme using the Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        sidebar_fg: Color::Rgb(76, 79, 105),    // #4c4f69 (text)
        selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        selected_fg: Color::Rgb(76, 79, 105),
        folder_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        file_fg: Color::Rgb(76, 79, 105),
        marked_fg: Color::Rgb(254, 100, 11), // #fe640b (peach)

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),

        dialog_bg: Color::Rgb(230, 233, 239), // #e6e9ef (surface0)
        dialog_border_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        success_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),   // #9ca0b0 (overlay0)
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"`. Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// Resolve the final `ThemeColors` from config.
///
/// - `"dark"` (default): dark palette
/// - `"light"`: light palette
/// - `"custom"`: dark palette with custom hex values on top
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

/// Apply custom hex overrides; malformed values keep the palette color.
fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    let slots: [(&Option<String>, &mut Color); 11] = [
        (&custom.sidebar_fg, &mut theme.sidebar_fg),
        (&custom.selected_bg, &mut theme.selected_bg),
        (&custom.selected_fg, &mut theme.selected_fg),
        (&custom.folder_fg, &mut theme.folder_fg),
        (&custom.file_fg, &mut theme.file_fg),
        (&custom.marked_fg, &mut theme.marked_fg),
        (&custom.status_bg, &mut theme.status_bg),
        (&custom.status_fg, &mut theme.status_fg),
        (&custom.border_fg, &mut theme.border_fg),
        (&custom.dialog_bg, &mut theme.dialog_bg),
        (&custom.dialog_border_fg, &mut theme.dialog_border_fg),
    ];
    for (value, slot) in slots {
        if let Some(color) = value.as_deref().and_then(parse_hex_color) {
            *slot = color;
        }
    }
}
