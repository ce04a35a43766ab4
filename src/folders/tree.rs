//! Name-path addressing and surgical patches over an in-memory folder tree.
//!
//! Paths are slash-joined folder names starting at a top-level folder, e.g.
//! `"Reports/2024"`. The root of the page is the sentinel [`ROOT_PATH`].

use crate::remote::model::{FileEntry, Folder};

/// Sentinel path meaning "all folders" (the page root).
pub const ROOT_PATH: &str = "Todas as Pastas";

/// Whether `path` addresses the page root.
pub fn is_root(path: &str) -> bool {
    path.is_empty() || path == ROOT_PATH
}

/// Split a path into its name segments. The root has none.
pub fn split_path(path: &str) -> Vec<&str> {
    if is_root(path) {
        return Vec::new();
    }
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join segments into a path; no segments gives [`ROOT_PATH`].
pub fn join_path(segments: &[&str]) -> String {
    if segments.is_empty() {
        ROOT_PATH.to_string()
    } else {
        segments.join("/")
    }
}

/// Path of a direct child of `parent`.
pub fn child_path(parent: &str, name: &str) -> String {
    if is_root(parent) {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Resolve name segments to a folder: `["A", "B"]` is the child `B` of the
/// top-level folder `A`.
pub fn find_folder<'a>(folders: &'a [Folder], segments: &[&str]) -> Option<&'a Folder> {
    let (first, rest) = segments.split_first()?;
    let folder = folders.iter().find(|f| f.name == *first)?;
    if rest.is_empty() {
        Some(folder)
    } else {
        find_folder(&folder.subfolders, rest)
    }
}

/// Mutable variant of [`find_folder`].
pub fn find_folder_mut<'a>(folders: &'a mut [Folder], segments: &[&str]) -> Option<&'a mut Folder> {
    let (first, rest) = segments.split_first()?;
    let folder = folders.iter_mut().find(|f| f.name == *first)?;
    if rest.is_empty() {
        Some(folder)
    } else {
        find_folder_mut(&mut folder.subfolders, rest)
    }
}

/// Depth-first search by id.
pub fn find_by_id<'a>(folders: &'a [Folder], id: &str) -> Option<&'a Folder> {
    for folder in folders {
        if folder.id == id {
            return Some(folder);
        }
        if let Some(found) = find_by_id(&folder.subfolders, id) {
            return Some(found);
        }
    }
    None
}

/// The level (top level or a parent's `subfolders`) holding the folder with `id`.
pub fn siblings_of<'a>(folders: &'a [Folder], id: &str) -> Option<&'a [Folder]> {
    if folders.iter().any(|f| f.id == id) {
        return Some(folders);
    }
    folders
        .iter()
        .find_map(|folder| siblings_of(&folder.subfolders, id))
}

/// Name path of the folder with `id`, or `None` if it is not in the tree.
pub fn path_of(folders: &[Folder], id: &str) -> Option<String> {
    fn walk(folders: &[Folder], id: &str, trail: &mut Vec<String>) -> bool {
        for folder in folders {
            trail.push(folder.name.clone());
            if folder.id == id || walk(&folder.subfolders, id, trail) {
                return true;
            }
            trail.pop();
        }
        false
    }

    let mut trail = Vec::new();
    if walk(folders, id, &mut trail) {
        Some(trail.join("/"))
    } else {
        None
    }
}

/// Rename the folder with `id` wherever it appears. Returns whether a node changed.
pub fn rename_folder(folders: &mut [Folder], id: &str, new_name: &str) -> bool {
    for folder in folders.iter_mut() {
        if folder.id == id {
            folder.name = new_name.to_string();
            return true;
        }
        if rename_folder(&mut folder.subfolders, id, new_name) {
            return true;
        }
    }
    false
}

/// Remove the folder with `id` from the top level or from its parent's
/// `subfolders`. Returns the removed node.
pub fn remove_folder(folders: &mut Vec<Folder>, id: &str) -> Option<Folder> {
    if let Some(pos) = folders.iter().position(|f| f.id == id) {
        return Some(folders.remove(pos));
    }
    for folder in folders.iter_mut() {
        if let Some(removed) = remove_folder(&mut folder.subfolders, id) {
            return Some(removed);
        }
    }
    None
}

/// Remove a file from the folder at `segments`. Returns whether it was found.
pub fn remove_file_at(folders: &mut [Folder], segments: &[&str], file_id: &str) -> bool {
    match find_folder_mut(folders, segments) {
        Some(folder) => {
            let before = folder.files.len();
            folder.files.retain(|f| f.id != file_id);
            folder.files.len() != before
        }
        None => false,
    }
}

/// Append files to the folder at `segments`. Returns whether the folder exists.
pub fn append_files_at(folders: &mut [Folder], segments: &[&str], files: &[FileEntry]) -> bool {
    match find_folder_mut(folders, segments) {
        Some(folder) => {
            folder.files.extend(files.iter().cloned());
            true
        }
        None => false,
    }
}

/// Rewrite `selected` after the folder at `old_path` was renamed to `new_name`.
///
/// Only whole leading segments match: renaming `Docs` rewrites `Docs/2024`
/// but leaves `Docs2/2024` alone. Returns `None` when `selected` is unaffected.
pub fn rewrite_path(selected: &str, old_path: &str, new_name: &str) -> Option<String> {
    let selected_segs = split_path(selected);
    let old_segs = split_path(old_path);
    if old_segs.is_empty() || selected_segs.len() < old_segs.len() {
        return None;
    }
    if selected_segs[..old_segs.len()] != old_segs[..] {
        return None;
    }
    let mut rewritten: Vec<&str> = selected_segs.clone();
    rewritten[old_segs.len() - 1] = new_name;
    Some(join_path(&rewritten))
}

/// Whether `path` equals `ancestor` or lies below it.
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    let path_segs = split_path(path);
    let anc_segs = split_path(ancestor);
    !anc_segs.is_empty()
        && path_segs.len() >= anc_segs.len()
        && path_segs[..anc_segs.len()] == anc_segs[..]
}

/// One folder in display order, as listed by the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatFolder {
    pub id: String,
    pub name: String,
    pub path: String,
    pub depth: usize,
    pub has_children: bool,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
}

/// Flatten the tree depth-first. With `Some(expanded)` only the subfolders of
/// expanded ids are visited; `None` visits everything.
pub fn flatten(folders: &[Folder], expanded: Option<&[String]>) -> Vec<FlatFolder> {
    fn walk(
        folders: &[Folder],
        parent: &str,
        depth: usize,
        expanded: Option<&[String]>,
        out: &mut Vec<FlatFolder>,
    ) {
        for (i, folder) in folders.iter().enumerate() {
            let path = child_path(parent, &folder.name);
            let is_expanded = expanded.map_or(true, |ids| ids.iter().any(|e| *e == folder.id));
            out.push(FlatFolder {
                id: folder.id.clone(),
                name: folder.name.clone(),
                path: path.clone(),
                depth,
                has_children: !folder.subfolders.is_empty(),
                is_expanded,
                is_last_sibling: i + 1 == folders.len(),
            });
            if is_expanded {
                walk(&folder.subfolders, &path, depth + 1, expanded, out);
            }
        }
    }

    let mut out = Vec::new();
    walk(folders, ROOT_PATH, 0, expanded, &mut out);
    out
}
