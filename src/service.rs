use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::debug;

use crate::fetch::Fetcher;
use crate::job::InstitutionJob;
use crate::model::InstitutionJobResult;
use crate::publish::Publisher;

/// tower::Serviceとしてのジョブ実行
///
/// ジョブの失敗は結果（Failed）として返すためエラー型はInfallible。
/// 同時実行数の制限はtowerのレイヤーで外側から掛ける。
#[derive(Clone)]
pub struct JobService {
    fetcher: Arc<dyn Fetcher>,
    publisher: Publisher,
}

impl JobService {
    pub fn new(fetcher: Arc<dyn Fetcher>, publisher: Publisher) -> Self {
        Self { fetcher, publisher }
    }
}

impl Service<InstitutionJob> for JobService {
    type Response = InstitutionJobResult;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, job: InstitutionJob) -> Self::Future {
        debug!("Job accepted: {}", job.name());

        let fetcher = Arc::clone(&self.fetcher);
        let publisher = self.publisher.clone();
        Box::pin(async move { Ok(job.run(fetcher.as_ref(), &publisher).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tower::ServiceExt;

    use crate::error::{FailureKind, FetchError};
    use crate::fetch::{FetchTarget, RawDocument};
    use crate::institutions::find;
    use crate::store::MemoryStore;

    struct Offline;

    #[async_trait]
    impl Fetcher for Offline {
        async fn fetch(&self, target: FetchTarget<'_>) -> Result<RawDocument, FetchError> {
            Err(FetchError::Timeout(format!("{} unreachable", target.url)))
        }
    }

    #[tokio::test]
    async fn test_service_returns_failed_result_not_error() {
        let publisher = Publisher::new(Arc::new(MemoryStore::new()), "public-rates");
        let service = JobService::new(Arc::new(Offline), publisher);
        let job = InstitutionJob::new(find("PMF Finance").unwrap());

        let result = service.oneshot(job).await.unwrap();

        assert_eq!(result.institution_name, "PMF Finance");
        assert_eq!(result.failure_kind(), Some(FailureKind::Fetch));
    }
}
