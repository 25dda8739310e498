use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::features::csrf::CsrfService;
use crate::features::files::services::FileService;
use crate::features::rate_limits::RateLimitService;

/// What one sweep reclaimed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub files: usize,
    pub rate_windows: usize,
    pub csrf_sessions: usize,
}

impl SweepReport {
    fn is_empty(&self) -> bool {
        self.files == 0 && self.rate_windows == 0 && self.csrf_sessions == 0
    }
}

/// Background worker that deletes expired uploads on a fixed interval.
/// Also drops closed rate-limit windows and stale CSRF sessions.
pub struct FileSweeper {
    file_service: Arc<FileService>,
    rate_limit_service: Arc<RateLimitService>,
    csrf_service: Arc<CsrfService>,
    period: Duration,
}

impl FileSweeper {
    pub fn new(
        file_service: Arc<FileService>,
        rate_limit_service: Arc<RateLimitService>,
        csrf_service: Arc<CsrfService>,
        period: Duration,
    ) -> Self {
        Self {
            file_service,
            rate_limit_service,
            csrf_service,
            period,
        }
    }

    /// Run the sweeper in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting file sweeper worker (every {}s)",
            self.period.as_secs()
        );

        let mut interval = interval(self.period);

        loop {
            interval.tick().await;
            self.sweep_once().await;
        }
    }

    /// One unconditional scan-and-delete pass
    pub async fn sweep_once(&self) -> SweepReport {
        let report = SweepReport {
            files: self.file_service.sweep_expired().await,
            rate_windows: self.rate_limit_service.purge_expired().await,
            csrf_sessions: self.csrf_service.purge_expired().await,
        };

        if report.is_empty() {
            tracing::debug!("File sweep found nothing to reclaim");
        } else {
            tracing::info!(
                "File sweep reclaimed {} files, {} rate limit windows, {} CSRF sessions",
                report.files,
                report.rate_windows,
                report.csrf_sessions
            );
        }

        report
    }
}
