use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use umbra_dns_application::ports::AdlistRepositoryPort;
use umbra_dns_domain::DomainError;

/// Periodically reports subscribed lists whose last gravity run left them
/// unavailable, so stale blocking data does not go unnoticed.
pub struct AdlistHealthJob {
    adlists: Arc<dyn AdlistRepositoryPort>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl AdlistHealthJob {
    pub fn new(adlists: Arc<dyn AdlistRepositoryPort>) -> Self {
        Self {
            adlists,
            interval_secs: 3600,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// One health pass; returns how many lists are unavailable.
    pub async fn check_once(&self) -> Result<usize, DomainError> {
        let unavailable = self.adlists.get_unavailable().await?;
        for list in &unavailable {
            warn!(
                address = %list.address,
                status = ?list.status,
                last_update = ?list.date_updated,
                "Adlist was unavailable in the last gravity run"
            );
        }
        Ok(unavailable.len())
    }

    pub async fn start(self: Arc<Self>) {
        info!(interval_secs = self.interval_secs, "Starting adlist health job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("AdlistHealthJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match self.check_once().await {
                            Ok(0) => debug!("All adlists healthy"),
                            Ok(n) => warn!(unavailable = n, "Some adlists are stale"),
                            Err(e) => error!(error = %e, "Adlist health check failed"),
                        }
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use umbra_dns_domain::{Adlist, AdlistStatus};

    struct StubAdlists {
        unavailable: Vec<Adlist>,
    }

    #[async_trait]
    impl AdlistRepositoryPort for StubAdlists {
        async fn get_all(&self) -> Result<Vec<Adlist>, DomainError> {
            Ok(self.unavailable.clone())
        }

        async fn get_unavailable(&self) -> Result<Vec<Adlist>, DomainError> {
            Ok(self.unavailable.clone())
        }
    }

    struct FailingAdlists;

    #[async_trait]
    impl AdlistRepositoryPort for FailingAdlists {
        async fn get_all(&self) -> Result<Vec<Adlist>, DomainError> {
            Err(DomainError::StoreUnavailable)
        }

        async fn get_unavailable(&self) -> Result<Vec<Adlist>, DomainError> {
            Err(DomainError::StoreUnavailable)
        }
    }

    fn stale_list(address: &str) -> Adlist {
        let mut list = Adlist::new(address.to_string(), None);
        list.status = AdlistStatus::UnavailableNoCache;
        list
    }

    #[tokio::test]
    async fn test_check_once_counts_unavailable() {
        let job = AdlistHealthJob::new(Arc::new(StubAdlists {
            unavailable: vec![
                stale_list("https://a.example/hosts"),
                stale_list("https://b.example/hosts"),
            ],
        }));
        assert_eq!(job.check_once().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_check_once_propagates_store_errors() {
        let job = AdlistHealthJob::new(Arc::new(FailingAdlists));
        assert!(job.check_once().await.is_err());
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_loop() {
        let token = CancellationToken::new();
        let job = Arc::new(
            AdlistHealthJob::new(Arc::new(StubAdlists { unavailable: vec![] }))
                .with_interval(1)
                .with_cancellation(token.clone()),
        );
        job.start().await;
        token.cancel();
        // Cancellation must not hang the runtime
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
