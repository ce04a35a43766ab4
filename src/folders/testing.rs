//! Test fixtures: tree builders and an in-memory [`FolderApi`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::error::{AppError, Result};
use crate::folders::tree::find_by_id;
use crate::remote::api::FolderApi;
use crate::remote::model::{
    CreateFolderRequest, CurrentUser, FileEntry, Folder, MoveFileRequest, MoveFolderRequest,
    UpdateFolderRequest,
};

pub fn folder(id: &str, name: &str, subfolders: Vec<Folder>) -> Folder {
    Folder {
        id: id.to_string(),
        name: name.to_string(),
        parent_folder_id: None,
        organization_id: Some("org1".to_string()),
        subfolders,
        files: Vec::new(),
        access_level: None,
        created_at: None,
    }
}

pub fn file(id: &str, filename: &str, size: Option<u64>) -> FileEntry {
    FileEntry {
        id: id.to_string(),
        filename: filename.to_string(),
        display_name: None,
        size,
        file_type: None,
        folder_id: None,
        organization_id: Some("org1".to_string()),
        uploaded_by: None,
        created_at: None,
        access_level: None,
    }
}

pub fn admin() -> CurrentUser {
    CurrentUser {
        id: "u1".to_string(),
        name: "Ana".to_string(),
        is_admin: true,
    }
}

pub fn member() -> CurrentUser {
    CurrentUser {
        id: "u2".to_string(),
        name: "Bruno".to_string(),
        is_admin: false,
    }
}

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    OrganizationFolders(String),
    FolderContent(String),
    CreateFolder(CreateFolderRequest),
    UpdateFolder(UpdateFolderRequest),
    DeleteFolder(String),
    DeleteFile(String),
    MoveFile(MoveFileRequest),
    MoveFolder(MoveFolderRequest),
}

/// In-memory backend recording every call.
#[derive(Default)]
pub struct MockApi {
    pub tree: Mutex<Vec<Folder>>,
    pub contents: Mutex<HashMap<String, Folder>>,
    pub calls: Mutex<Vec<Call>>,
    /// Ids whose delete/move/update/content calls fail with a 500.
    pub failing_ids: Mutex<HashSet<String>>,
    /// Every call fails with a 500.
    pub fail_all: AtomicBool,
    /// Every call fails with a 401.
    pub unauthorized: AtomicBool,
    /// Delete calls wait here before answering.
    pub delete_barrier: Mutex<Option<Arc<Barrier>>>,
}

impl MockApi {
    pub fn with_tree(tree: Vec<Folder>) -> Arc<Self> {
        let api = Self::default();
        *api.tree.lock().unwrap() = tree;
        Arc::new(api)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_id(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, id: Option<&str>) -> Result<()> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(AppError::Unauthorized);
        }
        let failing = id.is_some_and(|id| self.failing_ids.lock().unwrap().contains(id));
        if self.fail_all.load(Ordering::SeqCst) || failing {
            return Err(AppError::Api {
                status: 500,
                message: "backend exploded".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FolderApi for MockApi {
    async fn organization_folders(&self, organization_id: &str) -> Result<Vec<Folder>> {
        self.record(Call::OrganizationFolders(organization_id.to_string()));
        self.check(None)?;
        Ok(self.tree.lock().unwrap().clone())
    }

    async fn folder_content(&self, folder_id: &str) -> Result<Folder> {
        self.record(Call::FolderContent(folder_id.to_string()));
        self.check(Some(folder_id))?;
        if let Some(content) = self.contents.lock().unwrap().get(folder_id) {
            return Ok(content.clone());
        }
        find_by_id(&self.tree.lock().unwrap(), folder_id)
            .cloned()
            .ok_or(AppError::Api {
                status: 404,
                message: "Folder not found".to_string(),
            })
    }

    async fn create_folder(&self, request: &CreateFolderRequest) -> Result<()> {
        self.record(Call::CreateFolder(request.clone()));
        self.check(None)
    }

    async fn update_folder(&self, request: &UpdateFolderRequest) -> Result<()> {
        self.record(Call::UpdateFolder(request.clone()));
        self.check(Some(&request.id))
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        self.record(Call::DeleteFolder(folder_id.to_string()));
        let barrier = self.delete_barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        self.check(Some(folder_id))
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.record(Call::DeleteFile(file_id.to_string()));
        let barrier = self.delete_barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        self.check(Some(file_id))
    }

    async fn move_file(&self, request: &MoveFileRequest) -> Result<()> {
        self.record(Call::MoveFile(request.clone()));
        self.check(Some(&request.file_id))
    }

    async fn move_folder(&self, request: &MoveFolderRequest) -> Result<()> {
        self.record(Call::MoveFolder(request.clone()));
        self.check(Some(&request.folder_id))
    }
}
