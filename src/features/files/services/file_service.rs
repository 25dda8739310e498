use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{UploadResponseDto, UserFileResponseDto};
use crate::features::files::validation::{storage_extension, FileMetadata};
use crate::modules::memstore::{MemStore, NewUserFile, UserFile};
use crate::modules::storage::LocalStorage;
use crate::shared::validation::STORED_NAME_REGEX;

/// An upload as received, before validation
#[derive(Debug)]
pub struct IncomingUpload {
    pub data: Vec<u8>,
    pub original_name: String,
    pub mime_type: String,
    pub user_id: Option<i64>,
    pub tool_usage_id: Option<i64>,
}

/// Service for storing, serving and expiring uploaded files
pub struct FileService {
    store: Arc<MemStore>,
    storage: LocalStorage,
    max_file_size: usize,
    file_ttl: chrono::Duration,
    cache_downloads: bool,
}

impl FileService {
    pub fn new(
        store: Arc<MemStore>,
        storage: LocalStorage,
        config: &StorageConfig,
    ) -> Result<Self> {
        let file_ttl = chrono::Duration::from_std(config.file_ttl)
            .map_err(|e| AppError::Internal(format!("Invalid file TTL: {}", e)))?;

        Ok(Self {
            store,
            storage,
            max_file_size: config.max_file_size,
            file_ttl,
            cache_downloads: config.cache_downloads,
        })
    }

    /// Current instant on the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.store.now()
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// `Cache-Control` value for downloads
    pub fn cache_control(&self) -> &'static str {
        if self.cache_downloads {
            "public, max-age=3600"
        } else {
            "no-store"
        }
    }

    /// Validate an upload, write it to disk and record it with an expiry
    pub async fn upload(&self, upload: IncomingUpload) -> Result<UploadResponseDto> {
        let metadata = FileMetadata {
            original_name: upload.original_name,
            mime_type: upload.mime_type,
            size: upload.data.len() as u64,
        };
        metadata.check(self.max_file_size as u64)?;

        if let Some(usage_id) = upload.tool_usage_id {
            if self.store.get_tool_usage(usage_id).await.is_none() {
                return Err(AppError::BadRequest(format!(
                    "Tool usage {} does not exist",
                    usage_id
                )));
            }
        }

        let expires_at = self
            .store
            .now()
            .checked_add_signed(self.file_ttl)
            .ok_or_else(|| AppError::Internal("File expiry out of range".to_string()))?;

        let stored_name = format!(
            "{}.{}",
            Uuid::now_v7().simple(),
            storage_extension(&metadata.mime_type)
        );
        let checksum = hex::encode(Sha256::digest(&upload.data));

        let path = self.storage.write(&stored_name, &upload.data).await?;

        let file = self
            .store
            .create_user_file(NewUserFile {
                user_id: upload.user_id,
                original_name: metadata.original_name,
                stored_name,
                file_path: path.to_string_lossy().into_owned(),
                file_size: metadata.size as i64,
                mime_type: metadata.mime_type,
                tool_usage_id: upload.tool_usage_id,
                checksum,
                expires_at,
            })
            .await;

        info!(
            "File uploaded: id={}, name={}, size={}, user={:?}",
            file.id, file.stored_name, file.file_size, file.user_id
        );

        Ok(file.into())
    }

    /// Record and bytes of a live file
    pub async fn download(&self, stored_name: &str) -> Result<(UserFile, Vec<u8>)> {
        if !STORED_NAME_REGEX.is_match(stored_name) {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        let file = self
            .store
            .get_user_file_by_stored_name(stored_name)
            .await
            .filter(|file| !file.is_expired_at(self.store.now()))
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let data = self.storage.read(&file.stored_name).await?;
        debug!("Serving {} ({} bytes)", file.stored_name, data.len());

        Ok((file, data))
    }

    /// Files owned by a user, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Vec<UserFileResponseDto> {
        self.store
            .get_user_files(user_id)
            .await
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Remove expired file records and their bytes. Returns the number of
    /// records removed.
    pub async fn sweep_expired(&self) -> usize {
        let expired = self.store.delete_expired_files().await;

        for file in &expired {
            if let Err(e) = self.storage.remove(Path::new(&file.file_path)).await {
                warn!("Failed to remove expired file {}: {}", file.file_path, e);
            }
        }

        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::memstore::{ManualClock, NewToolUsage};
    use chrono::TimeZone;
    use std::time::Duration;

    struct Fixture {
        service: FileService,
        store: Arc<MemStore>,
        clock: Arc<ManualClock>,
        _dir: tempfile::TempDir,
    }

    fn storage_config(dir: &std::path::Path, file_ttl: Duration) -> StorageConfig {
        StorageConfig {
            upload_dir: dir.to_path_buf(),
            max_file_size: 1024,
            file_ttl,
            sweep_interval: Duration::from_secs(60),
            cache_downloads: false,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with_ttl(Duration::from_secs(3600)).await
    }

    async fn fixture_with_ttl(file_ttl: Duration) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemStore::with_clock(clock.clone()));
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let config = storage_config(dir.path(), file_ttl);

        Fixture {
            service: FileService::new(store.clone(), storage, &config).unwrap(),
            store,
            clock,
            _dir: dir,
        }
    }

    fn upload(name: &str, mime: &str, data: &[u8]) -> IncomingUpload {
        IncomingUpload {
            data: data.to_vec(),
            original_name: name.to_string(),
            mime_type: mime.to_string(),
            user_id: Some(1),
            tool_usage_id: None,
        }
    }

    #[tokio::test]
    async fn test_upload_stores_bytes_with_checksum_and_expiry() {
        let f = fixture().await;

        let response = f
            .service
            .upload(upload("notes.txt", "text/plain", b"hello"))
            .await
            .unwrap();

        assert!(response.filename.ends_with(".txt"));
        assert_eq!(response.original_name, "notes.txt");
        assert_eq!(response.size, 5);
        assert_eq!(
            response.checksum,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            response.download_url,
            format!("/api/download/{}", response.filename)
        );
        assert_eq!(
            response.expires_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
        );

        let (file, data) = f.service.download(&response.filename).await.unwrap();
        assert_eq!(data, b"hello");
        assert_eq!(file.id, response.id);
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_tool_usage() {
        let f = fixture().await;
        let mut input = upload("a.txt", "text/plain", b"x");
        input.tool_usage_id = Some(99);

        let err = f.service.upload(input).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let usage = f
            .store
            .create_tool_usage(NewToolUsage {
                tool_name: "merge".to_string(),
                tool_category: "pdf".to_string(),
                success: true,
                ..Default::default()
            })
            .await;
        let mut input = upload("a.txt", "text/plain", b"x");
        input.tool_usage_id = Some(usage.id);
        assert!(f.service.upload(input).await.is_ok());
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected_before_writing() {
        let f = fixture().await;

        let err = f
            .service
            .upload(upload("big.txt", "text/plain", &[b'a'; 1025]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert!(f.store.get_user_files(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_download_rejects_unsafe_and_unknown_names() {
        let f = fixture().await;

        for name in ["../secret.txt", "missing.txt", ".env"] {
            let err = f.service.download(name).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_records_and_bytes() {
        let f = fixture().await;
        let kept = f
            .service
            .upload(upload("b.txt", "text/plain", b"b"))
            .await
            .unwrap();
        f.clock.advance(chrono::Duration::minutes(30));
        let fresh = f
            .service
            .upload(upload("c.txt", "text/plain", b"c"))
            .await
            .unwrap();

        f.clock.advance(chrono::Duration::minutes(31));

        // Expired but not yet swept
        assert!(f.service.download(&kept.filename).await.is_err());

        assert_eq!(f.service.sweep_expired().await, 1);
        assert!(f.store.get_user_file(kept.id).await.is_none());
        assert!(f.store.get_user_file(fresh.id).await.is_some());

        let old_path = f.service.storage.path_for(&kept.filename);
        assert!(!old_path.exists());
        assert_eq!(f.service.sweep_expired().await, 0);
    }

    #[tokio::test]
    async fn test_list_for_user_newest_first() {
        let f = fixture().await;
        let first = f
            .service
            .upload(upload("1.txt", "text/plain", b"1"))
            .await
            .unwrap();
        f.clock.advance(chrono::Duration::seconds(1));
        let second = f
            .service
            .upload(upload("2.txt", "text/plain", b"2"))
            .await
            .unwrap();

        let files = f.service.list_for_user(1).await;
        assert_eq!(
            files.iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        assert!(f.service.list_for_user(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_new_rejects_ttl_beyond_duration_range() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let config = storage_config(dir.path(), Duration::MAX);

        let result = FileService::new(Arc::new(MemStore::new()), storage, &config);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_expiry_overflow_leaves_nothing_on_disk() {
        // Fits a chrono duration but not a timestamp once added to now
        let f = fixture_with_ttl(Duration::from_secs(9_000_000_000_000)).await;

        let err = f
            .service
            .upload(upload("notes.txt", "text/plain", b"hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(std::fs::read_dir(f._dir.path()).unwrap().count(), 0);
        assert!(f.store.get_user_file(1).await.is_none());
    }
}
