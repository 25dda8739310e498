use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::models::{
    NewToolUsage, NewUser, NewUserFile, ToolUsage, ToolUsageStats, User, UserFile,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tool_usage: BTreeMap<i64, ToolUsage>,
    user_files: BTreeMap<i64, UserFile>,
    last_user_id: i64,
    last_usage_id: i64,
    last_file_id: i64,
}

fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

/// Newest first. `sort_by` is stable, so rows sharing a timestamp keep id order.
fn newest_first<T, F>(rows: &mut [T], created_at: F)
where
    F: Fn(&T) -> DateTime<Utc>,
{
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

/// Process-local store for users, tool usage and uploaded file records.
///
/// Constructed once at startup and shared as `Arc<MemStore>`. Ids are assigned
/// per entity from 1 and never reused; nothing survives a restart.
pub struct MemStore {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }

    /// Current instant according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // =========================================================================
    // USERS
    // =========================================================================

    fn insert_user(&self, tables: &mut Tables, input: NewUser) -> User {
        let user = User {
            id: next_id(&mut tables.last_user_id),
            email: input.email,
            password_hash: input.password_hash,
            name: input.name,
            created_at: self.clock.now(),
        };
        tables.users.insert(user.id, user.clone());
        debug!("Stored user id={}", user.id);
        user
    }

    /// Insert a user. Duplicate emails are not rejected here.
    pub async fn create_user(&self, input: NewUser) -> User {
        let mut tables = self.tables.write().await;
        self.insert_user(&mut tables, input)
    }

    /// Insert a user unless one with the same email exists. The lookup and
    /// the insert happen under one write lock.
    pub async fn create_user_unless_email_exists(&self, input: NewUser) -> Option<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|user| user.email == input.email) {
            return None;
        }
        Some(self.insert_user(&mut tables, input))
    }

    pub async fn get_user(&self, id: i64) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    /// Case-sensitive lookup; the lowest id wins when emails repeat
    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
    }

    // =========================================================================
    // TOOL USAGE
    // =========================================================================

    pub async fn create_tool_usage(&self, input: NewToolUsage) -> ToolUsage {
        let mut tables = self.tables.write().await;
        let usage = ToolUsage {
            id: next_id(&mut tables.last_usage_id),
            user_id: input.user_id,
            tool_name: input.tool_name,
            tool_category: input.tool_category,
            file_name: input.file_name,
            file_size: input.file_size,
            processing_time: input.processing_time,
            success: input.success,
            metadata: input.metadata,
            created_at: self.clock.now(),
        };
        tables.tool_usage.insert(usage.id, usage.clone());
        debug!("Stored tool usage id={} tool={}", usage.id, usage.tool_name);
        usage
    }

    pub async fn get_tool_usage(&self, id: i64) -> Option<ToolUsage> {
        self.tables.read().await.tool_usage.get(&id).cloned()
    }

    /// Most recent usage rows for a user, newest first, at most `limit`
    pub async fn get_user_tool_usage(&self, user_id: i64, limit: usize) -> Vec<ToolUsage> {
        let mut rows: Vec<ToolUsage> = self
            .tables
            .read()
            .await
            .tool_usage
            .values()
            .filter(|usage| usage.user_id == Some(user_id))
            .cloned()
            .collect();

        newest_first(&mut rows, |usage| usage.created_at);
        rows.truncate(limit);
        rows
    }

    /// Counts, distinct tools and summed processing time over successful rows.
    /// The time total saturates at `i64::MAX`.
    pub async fn get_tool_usage_stats(&self, user_id: i64) -> ToolUsageStats {
        let tables = self.tables.read().await;
        let successful: Vec<&ToolUsage> = tables
            .tool_usage
            .values()
            .filter(|usage| usage.user_id == Some(user_id) && usage.success)
            .collect();

        let distinct_tools: HashSet<&str> = successful
            .iter()
            .map(|usage| usage.tool_name.as_str())
            .collect();

        ToolUsageStats {
            files_processed: successful.len() as i64,
            tools_used: distinct_tools.len() as i64,
            total_time: successful
                .iter()
                .map(|usage| usage.processing_time.unwrap_or(0))
                .fold(0i64, |total, time| total.saturating_add(time)),
        }
    }

    // =========================================================================
    // USER FILES
    // =========================================================================

    pub async fn create_user_file(&self, input: NewUserFile) -> UserFile {
        let mut tables = self.tables.write().await;
        let file = UserFile {
            id: next_id(&mut tables.last_file_id),
            user_id: input.user_id,
            original_name: input.original_name,
            stored_name: input.stored_name,
            file_path: input.file_path,
            file_size: input.file_size,
            mime_type: input.mime_type,
            tool_usage_id: input.tool_usage_id,
            checksum: input.checksum,
            expires_at: input.expires_at,
            created_at: self.clock.now(),
        };
        tables.user_files.insert(file.id, file.clone());
        debug!("Stored file record id={} name={}", file.id, file.stored_name);
        file
    }

    pub async fn get_user_file(&self, id: i64) -> Option<UserFile> {
        self.tables.read().await.user_files.get(&id).cloned()
    }

    pub async fn get_user_file_by_stored_name(&self, stored_name: &str) -> Option<UserFile> {
        self.tables
            .read()
            .await
            .user_files
            .values()
            .find(|file| file.stored_name == stored_name)
            .cloned()
    }

    /// All files owned by a user, newest first
    pub async fn get_user_files(&self, user_id: i64) -> Vec<UserFile> {
        let mut rows: Vec<UserFile> = self
            .tables
            .read()
            .await
            .user_files
            .values()
            .filter(|file| file.user_id == Some(user_id))
            .cloned()
            .collect();

        newest_first(&mut rows, |file| file.created_at);
        rows
    }

    /// Remove every file record whose expiry is strictly before now
    pub async fn delete_expired_files(&self) -> Vec<UserFile> {
        let now = self.clock.now();
        self.delete_expired_files_at(now).await
    }

    /// Remove every file record whose expiry is strictly before `now` and
    /// return the removed rows
    pub async fn delete_expired_files_at(&self, now: DateTime<Utc>) -> Vec<UserFile> {
        let mut tables = self.tables.write().await;
        let expired: Vec<i64> = tables
            .user_files
            .values()
            .filter(|file| file.is_expired_at(now))
            .map(|file| file.id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| tables.user_files.remove(&id))
            .collect()
    }
}
