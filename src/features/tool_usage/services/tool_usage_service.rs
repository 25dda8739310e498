use std::sync::Arc;

use tracing::{debug, info};

use crate::features::tool_usage::dtos::{
    CreateToolUsageDto, ToolUsageResponseDto, ToolUsageStatsDto,
};
use crate::modules::memstore::MemStore;

/// Service for recording and reporting tool invocations
pub struct ToolUsageService {
    store: Arc<MemStore>,
}

impl ToolUsageService {
    pub fn new(store: Arc<MemStore>) -> Self {
        Self { store }
    }

    /// Record one invocation, attributed to `user_id` when the caller is known
    pub async fn record(
        &self,
        user_id: Option<i64>,
        dto: CreateToolUsageDto,
    ) -> ToolUsageResponseDto {
        let usage = self.store.create_tool_usage(dto.into_new(user_id)).await;

        info!(
            "Tool usage recorded: id={}, tool={}, user={:?}, success={}",
            usage.id, usage.tool_name, usage.user_id, usage.success
        );

        usage.into()
    }

    /// Most recent invocations for a user, newest first
    pub async fn recent(&self, user_id: i64, limit: usize) -> Vec<ToolUsageResponseDto> {
        let rows = self.store.get_user_tool_usage(user_id, limit).await;
        debug!(
            "Fetched {} tool usage rows for user {} (limit {})",
            rows.len(),
            user_id,
            limit
        );
        rows.into_iter().map(Into::into).collect()
    }

    pub async fn stats(&self, user_id: i64) -> ToolUsageStatsDto {
        self.store.get_tool_usage_stats(user_id).await.into()
    }
}
