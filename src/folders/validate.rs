use crate::error::{AppError, Result};

/// Characters that may not appear in a folder name.
pub const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Check a folder name before it is sent to the backend.
///
/// Names follow the Windows filename rules: none of [`FORBIDDEN_CHARS`],
/// no trailing space or dot. `siblings` are the names already present at the
/// target level; a duplicate would make the name path ambiguous.
pub fn validate_folder_name<'a, I>(name: &str, siblings: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    check_name(name, siblings).map_err(AppError::Validation)
}

fn check_name<'a, I>(name: &str, siblings: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = &'a str>,
{
    if name.trim().is_empty() {
        return Err("Folder name cannot be empty".to_string());
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!(
            "Folder name cannot contain '{}' (\\ / : * ? \" < > | are not allowed)",
            c
        ));
    }
    if name.ends_with(' ') || name.ends_with('.') {
        return Err("Folder name cannot end with a space or a dot".to_string());
    }
    if siblings.into_iter().any(|s| s == name) {
        return Err(format!("A folder named '{}' already exists here", name));
    }
    Ok(())
}
