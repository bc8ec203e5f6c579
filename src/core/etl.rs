use crate::domain::model::RunSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// 單次執行的結果：輸出檔路徑與統計
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub summary: RunSummary,
}

/// 依序執行 extract → transform → load 的批次引擎
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("🚀 Starting ETL process...");

        tracing::info!("📥 Extracting input...");
        let batch = self.pipeline.extract().await?;
        tracing::info!("📋 Extracted {} input records", batch.len());
        self.monitor.log_stats("Extract");

        tracing::info!("🔄 Transforming records...");
        let result = self.pipeline.transform(batch).await?;
        let summary = result.summary;
        tracing::info!(
            "✅ Transformed {} rows ({})",
            result.sheet.rows.len(),
            summary
        );
        self.monitor.log_stats("Transform");

        tracing::info!("💾 Writing output...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("📁 Output saved to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(RunReport {
            output_path,
            summary,
        })
    }
}
