use crate::core::{Pipeline, RunSummary};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct McqEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> McqEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting MCQ generation...");

        // Extract
        let rows = self.pipeline.extract().await?;
        tracing::info!("📄 Read {} input rows", rows.len());
        self.monitor.log_stats("Extract");

        // Transform
        let batch = self.pipeline.transform(rows).await?;
        tracing::info!(
            "🧠 Generated {} records ({} failed, {} without reply markers)",
            batch.records.len(),
            batch.failures.len(),
            batch.unparsed
        );
        self.monitor.log_stats("Transform");

        let summary_counts = (
            batch.input_rows,
            batch.records.len(),
            batch.failures.len(),
            batch.unparsed,
        );

        // Load
        let output_path = self.pipeline.load(batch).await?;
        tracing::info!("Generated output saved to {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats(summary_counts.1);

        let (input_rows, written_rows, failed_rows, unparsed_rows) = summary_counts;
        Ok(RunSummary {
            output_path,
            input_rows,
            written_rows,
            failed_rows,
            unparsed_rows,
        })
    }
}
