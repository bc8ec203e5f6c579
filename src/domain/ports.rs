use crate::domain::model::{Batch, BatchResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 批次處理管道：讀取 → 轉換 → 寫出，三個階段依序執行
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Batch>;
    async fn transform(&self, batch: Batch) -> Result<BatchResult>;
    async fn load(&self, result: BatchResult) -> Result<String>;
}
