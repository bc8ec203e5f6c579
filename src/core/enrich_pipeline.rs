use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;

use crate::core::openai::EnrichmentClient;
use crate::core::workbook;
use crate::domain::model::{Batch, BatchResult, RunSummary, Sheet};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{EtlError, Result};

/// enrich 工具的三種查詢模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnrichMode {
    /// Research website, stage, ticket size, sector focus and strategy
    Investors,
    /// Fetch revenue, CEO name, CEO bio and LinkedIn profile URL
    Company,
    /// Turn free-form Description cells into structured fields
    Descriptions,
}

impl EnrichMode {
    /// 各模式新增的輸出欄位
    pub fn result_columns(&self) -> &'static [&'static str] {
        match self {
            EnrichMode::Investors => &[
                "Website",
                "Investment_Stage",
                "Ticket_Size",
                "Sector_Focus",
                "Investment_Strategy",
            ],
            EnrichMode::Company => &[
                "AI_Revenue",
                "AI_CEO_Name",
                "AI_CEO_Bio",
                "AI_LinkedIn_URL",
                "AI_Error",
            ],
            EnrichMode::Descriptions => &[
                "AI_SectorFocus",
                "AI_Stage",
                "AI_TicketSize_Min",
                "AI_TicketSize_Max",
                "AI_Website",
                "AI_Error",
            ],
        }
    }

    fn output_prefix(&self) -> &'static str {
        match self {
            EnrichMode::Investors => "Investors_Enriched",
            EnrichMode::Company => "Company_Info",
            EnrichMode::Descriptions => "Description_Analysis",
        }
    }
}

/// enrich 工具的執行選項
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub input: String,
    pub output_dir: String,
    pub mode: EnrichMode,
    pub delay: f64,
    /// 1 起算的第一個要處理的資料列
    pub start_row: usize,
    pub max_rows: Option<usize>,
    pub verbose: bool,
}

/// 用 AI 服務補齊工作表欄位的管道。
///
/// 單列的服務錯誤不會中斷批次：該列的 enrichment 欄位留空、
/// 錯誤欄位記下原因，統計裡算一筆 failed。
pub struct EnrichPipeline<S: Storage> {
    storage: S,
    options: EnrichOptions,
    client: EnrichmentClient,
}

impl<S: Storage> EnrichPipeline<S> {
    pub fn new(storage: S, options: EnrichOptions, client: EnrichmentClient) -> Self {
        Self {
            storage,
            options,
            client,
        }
    }

    /// 要處理的資料列範圍（0 起算、不含 end）
    fn row_range(&self, total: usize) -> (usize, usize) {
        let start = self.options.start_row.saturating_sub(1).min(total);
        let end = match self.options.max_rows {
            Some(max) => (start + max).min(total),
            None => total,
        };
        (start, end)
    }

    fn print_verbose_result(row_number: usize, subject: &str, columns: &[&str], values: &[String]) {
        println!("\n{}", "=".repeat(80));
        println!("ROW {} RESULTS", row_number);
        println!("{}", "=".repeat(80));
        println!("Subject: {}", subject);
        println!("{}", "-".repeat(40));
        for (name, value) in columns.iter().zip(values.iter()) {
            println!("{}: {}", name, value);
        }
        println!("{}", "=".repeat(80));
    }

    /// 跑一列查詢，回傳結果欄位值（與 result_columns 對齊）與錯誤
    async fn enrich_row(
        &self,
        row: &[String],
        company_idx: usize,
        city_idx: Option<usize>,
        description_idx: Option<usize>,
        ticket_idx: Option<usize>,
    ) -> (Vec<String>, Option<String>) {
        match self.options.mode {
            EnrichMode::Investors => {
                let company = row[company_idx].trim();
                let city = city_idx.map(|i| row[i].trim()).unwrap_or("");
                let result = self.client.research_investor(company, city).await;
                let error = result.error.clone();
                (
                    vec![
                        result.website,
                        result.investment_stage,
                        result.ticket_size,
                        result.sector_focus,
                        result.investment_strategy,
                    ],
                    error,
                )
            }
            EnrichMode::Company => {
                let company = row[company_idx].trim();
                let result = self.client.company_info(company).await;
                let error = result.error.clone();
                (
                    vec![
                        result.revenue,
                        result.ceo_name,
                        result.ceo_bio,
                        result.linkedin_url,
                        result.error.unwrap_or_default(),
                    ],
                    error,
                )
            }
            EnrichMode::Descriptions => {
                let description = description_idx
                    .map(|i| row[i].trim())
                    .unwrap_or("");
                let existing_ticket = ticket_idx.map(|i| row[i].trim()).unwrap_or("");
                let result = self
                    .client
                    .analyze_description(description, existing_ticket)
                    .await;
                let error = result.error.clone();
                (
                    vec![
                        result.sector_focus,
                        result.stage,
                        result.ticket_min,
                        result.ticket_max,
                        result.website,
                        result.error.unwrap_or_default(),
                    ],
                    error,
                )
            }
        }
    }
}

#[async_trait]
impl<S: Storage> Pipeline for EnrichPipeline<S> {
    async fn extract(&self) -> Result<Batch> {
        let path = Path::new(&self.options.input);
        if !path.is_file() {
            return Err(EtlError::InputNotFoundError {
                path: path.display().to_string(),
            });
        }

        tracing::info!("📂 Reading workbook: {}", path.display());
        let bytes = std::fs::read(path)?;
        let sheet = workbook::read_sheet(&bytes)?;
        tracing::info!("📋 Found {} rows", sheet.rows.len());
        Ok(Batch::Rows(sheet))
    }

    async fn transform(&self, batch: Batch) -> Result<BatchResult> {
        let mut sheet = match batch {
            Batch::Rows(sheet) => sheet,
            Batch::Blocks(_) => {
                return Err(EtlError::ProcessingError {
                    message: "Enrich pipeline expects workbook rows".to_string(),
                })
            }
        };

        // 公司名稱欄：優先找名為 company_name 的欄位，否則用第一欄
        let company_idx = sheet
            .header
            .iter()
            .position(|h| h.eq_ignore_ascii_case("company_name"))
            .unwrap_or(0);
        // 原始資料的城市放在第四欄（D 欄）
        let city_idx = (sheet.header.len() > 3).then_some(3);
        let description_idx = sheet.column_index("Description");
        let ticket_idx = sheet.column_index("Ticket Size");

        if self.options.mode == EnrichMode::Descriptions && description_idx.is_none() {
            return Err(EtlError::InputDataError {
                message: "Could not find 'Description' column in the input workbook".to_string(),
            });
        }

        let columns = self.options.mode.result_columns();
        let column_indices: Vec<usize> =
            columns.iter().map(|c| sheet.ensure_column(c)).collect();
        let width = sheet.header.len();

        let total = sheet.rows.len();
        let (start, end) = self.row_range(total);
        tracing::info!(
            "🔍 Processing rows {} to {} ({} total)",
            start + 1,
            end,
            end - start
        );

        let mut summary = RunSummary::default();

        for i in start..end {
            let row_number = i + 1;
            Sheet::pad_row(&mut sheet.rows[i], width);

            let subject = match self.options.mode {
                EnrichMode::Descriptions => description_idx
                    .map(|idx| sheet.rows[i][idx].clone())
                    .unwrap_or_default(),
                _ => sheet.rows[i][company_idx].clone(),
            };
            let subject = subject.trim().to_string();

            if subject.is_empty() || subject.eq_ignore_ascii_case("nan") {
                summary.skipped += 1;
                tracing::info!("⏭️ Skipping row {}: nothing to research", row_number);
                continue;
            }

            tracing::info!("🔍 Processing row {}: {}", row_number, subject);
            let row = sheet.rows[i].clone();
            let (values, error) = self
                .enrich_row(&row, company_idx, city_idx, description_idx, ticket_idx)
                .await;

            for (idx, value) in column_indices.iter().zip(values.iter()) {
                sheet.rows[i][*idx] = value.clone();
            }

            match error {
                Some(error) => {
                    summary.failed += 1;
                    tracing::warn!("⚠️ Research error for '{}': {}", subject, error);
                }
                None => summary.processed += 1,
            }

            if self.options.verbose {
                Self::print_verbose_result(row_number, &subject, columns, &values);
            }

            // 呼叫間隔，避免觸發服務端限流；最後一列之後不用等
            if self.options.delay > 0.0 && i + 1 < end {
                tracing::debug!("⏳ Waiting {} seconds...", self.options.delay);
                tokio::time::sleep(Duration::from_secs_f64(self.options.delay)).await;
            }
        }

        Ok(BatchResult { sheet, summary })
    }

    async fn load(&self, result: BatchResult) -> Result<String> {
        let filename = workbook::timestamped_filename(self.options.mode.output_prefix());
        let bytes = workbook::write_sheet(&result.sheet)?;
        self.storage.write_file(&filename, &bytes).await?;
        Ok(Path::new(&self.options.output_dir)
            .join(filename)
            .display()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;

    fn pipeline(options: EnrichOptions) -> EnrichPipeline<LocalStorage> {
        EnrichPipeline::new(
            LocalStorage::new("/tmp".to_string()),
            options,
            EnrichmentClient::new("sk-test".to_string()),
        )
    }

    fn options(mode: EnrichMode) -> EnrichOptions {
        EnrichOptions {
            input: "input.xlsx".to_string(),
            output_dir: "./Results".to_string(),
            mode,
            delay: 0.0,
            start_row: 1,
            max_rows: None,
            verbose: false,
        }
    }

    #[test]
    fn row_range_respects_start_and_max() {
        let mut opts = options(EnrichMode::Investors);
        opts.start_row = 3;
        opts.max_rows = Some(2);
        let p = pipeline(opts);
        assert_eq!(p.row_range(10), (2, 4));
        // 範圍超出資料列數時收斂到尾端
        assert_eq!(p.row_range(3), (2, 3));
        assert_eq!(p.row_range(1), (1, 1));
    }

    #[test]
    fn mode_columns_are_distinct() {
        for mode in [
            EnrichMode::Investors,
            EnrichMode::Company,
            EnrichMode::Descriptions,
        ] {
            let columns = mode.result_columns();
            let mut deduped = columns.to_vec();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), columns.len());
        }
    }

    #[tokio::test]
    async fn descriptions_mode_requires_description_column() {
        let mut sheet = Sheet::new(vec!["Company Name".to_string()]);
        sheet.rows.push(vec!["Acme".to_string()]);

        let err = pipeline(options(EnrichMode::Descriptions))
            .transform(Batch::Rows(sheet))
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::InputDataError { .. }));
    }

    #[tokio::test]
    async fn empty_subjects_are_skipped_without_service_calls() {
        let mut sheet = Sheet::new(vec!["Company Name".to_string()]);
        sheet.rows.push(vec![String::new()]);
        sheet.rows.push(vec!["nan".to_string()]);

        let result = pipeline(options(EnrichMode::Investors))
            .transform(Batch::Rows(sheet))
            .await
            .unwrap();
        assert_eq!(result.summary.skipped, 2);
        assert_eq!(result.summary.failed, 0);
        assert_eq!(result.sheet.rows.len(), 2);
    }
}
