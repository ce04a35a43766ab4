use async_trait::async_trait;

use crate::error::Result;
use crate::remote::model::{
    CreateFolderRequest, Folder, MoveFileRequest, MoveFolderRequest, UpdateFolderRequest,
};

/// Backend operations the folder manager depends on.
///
/// Implementations return already-normalized folders.
#[async_trait]
pub trait FolderApi: Send + Sync {
    /// Full top-level folder tree of an organization.
    async fn organization_folders(&self, organization_id: &str) -> Result<Vec<Folder>>;

    /// One folder with its direct children and files.
    async fn folder_content(&self, folder_id: &str) -> Result<Folder>;

    async fn create_folder(&self, request: &CreateFolderRequest) -> Result<()>;

    async fn update_folder(&self, request: &UpdateFolderRequest) -> Result<()>;

    async fn delete_folder(&self, folder_id: &str) -> Result<()>;

    async fn delete_file(&self, file_id: &str) -> Result<()>;

    async fn move_file(&self, request: &MoveFileRequest) -> Result<()>;

    async fn move_folder(&self, request: &MoveFolderRequest) -> Result<()>;
}
