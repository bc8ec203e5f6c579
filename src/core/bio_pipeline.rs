use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::linkedin::ProfileFetcher;
use crate::core::openai::EnrichmentClient;
use crate::core::workbook;
use crate::domain::model::{Batch, BatchResult, RunSummary, Sheet};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{EtlError, Result};

pub const URL_COLUMN: &str = "LinkedIn Page";
pub const BIO_COLUMN: &str = "Bio";
pub const BACKGROUND_CHECK_COLUMN: &str = "Background Check";
pub const COMPANY_INFO_COLUMN: &str = "Company Info";

/// fetch-bios 工具的執行選項
#[derive(Debug, Clone)]
pub struct BioOptions {
    pub input: String,
    pub output_dir: String,
    pub delay: f64,
    pub background_check: bool,
    pub company_lookup: bool,
    pub verbose: bool,
}

/// 讀工作簿裡的 LinkedIn 網址、抓個人頁 bio、可選地做 AI 查核的管道。
///
/// 每一列獨立處理；抓取失敗只影響該列（Bio 欄填 ERROR 字串），
/// 批次照常跑完，輸出列數與順序和輸入一致。
pub struct BioPipeline<S: Storage> {
    storage: S,
    options: BioOptions,
    fetcher: ProfileFetcher,
    client: Option<EnrichmentClient>,
}

impl<S: Storage> BioPipeline<S> {
    pub fn new(storage: S, options: BioOptions, client: Option<EnrichmentClient>) -> Self {
        Self {
            storage,
            options,
            fetcher: ProfileFetcher::new(),
            client,
        }
    }

    fn print_verbose_result(
        row_number: usize,
        url: &str,
        bio: &str,
        bg_check: Option<&str>,
        company_info: Option<&str>,
    ) {
        println!("\n{}", "=".repeat(80));
        println!("ROW {} RESULTS", row_number);
        println!("{}", "=".repeat(80));
        println!("URL: {}", url);
        println!("\nBIO:");
        println!("{}", "-".repeat(40));
        println!("{}", if bio.is_empty() { "No bio found" } else { bio });

        if let Some(bg_check) = bg_check {
            println!("\nBACKGROUND CHECK:");
            println!("{}", "-".repeat(40));
            println!("{}", bg_check);
        }

        if let Some(company_info) = company_info {
            println!("\nCOMPANY INFORMATION:");
            println!("{}", "-".repeat(40));
            println!("{}", company_info);
        }

        println!("{}\n", "=".repeat(80));
    }
}

#[async_trait]
impl<S: Storage> Pipeline for BioPipeline<S> {
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
        Ok(Batch::Rows(sheet))
    }

    async fn transform(&self, batch: Batch) -> Result<BatchResult> {
        let mut sheet = match batch {
            Batch::Rows(sheet) => sheet,
            Batch::Blocks(_) => {
                return Err(EtlError::ProcessingError {
                    message: "Bio pipeline expects workbook rows".to_string(),
                })
            }
        };

        let url_idx = sheet
            .column_index(URL_COLUMN)
            .ok_or_else(|| EtlError::InputDataError {
                message: format!("Could not find '{}' column in the input workbook", URL_COLUMN),
            })?;

        let bio_idx = sheet.ensure_column(BIO_COLUMN);
        let bg_idx = self
            .options
            .background_check
            .then(|| sheet.ensure_column(BACKGROUND_CHECK_COLUMN));
        let company_idx = self
            .options
            .company_lookup
            .then(|| sheet.ensure_column(COMPANY_INFO_COLUMN));

        let width = sheet.header.len();
        let mut summary = RunSummary::default();
        let total = sheet.rows.len();

        for (i, row) in sheet.rows.iter_mut().enumerate() {
            Sheet::pad_row(row, width);
            // 輸入工作表第一列是標題，對使用者回報時用工作表列號
            let row_number = i + 2;
            let url = row[url_idx].trim().to_string();

            if url.is_empty() {
                summary.skipped += 1;
                if self.options.verbose {
                    println!("\nRow {}: No URL provided - skipping\n", row_number);
                }
                continue;
            }

            tracing::info!("🔍 Processing row {}/{}: {}", i + 1, total, url);

            let bio = self.fetcher.fetch_bio(&url).await;
            if bio.starts_with("ERROR") {
                summary.failed += 1;
                tracing::warn!("⚠️ Row {} fetch failed: {}", row_number, bio);
            } else {
                summary.processed += 1;
            }
            row[bio_idx] = bio.clone();

            let mut bg_result = None;
            if let Some(idx) = bg_idx {
                let value = match &self.client {
                    Some(client) => client.background_check(&url).await,
                    None => "Background check skipped: Missing API key".to_string(),
                };
                row[idx] = value.clone();
                bg_result = Some(value);
            }

            let mut company_result = None;
            if let Some(idx) = company_idx {
                let value = match &self.client {
                    Some(client) => client.employer_lookup(&url).await,
                    None => "Company lookup skipped: Missing API key".to_string(),
                };
                row[idx] = value.clone();
                company_result = Some(value);
            }

            if self.options.verbose {
                Self::print_verbose_result(
                    row_number,
                    &url,
                    &bio,
                    bg_result.as_deref(),
                    company_result.as_deref(),
                );
            }

            // 對外部站台保持禮貌的抓取間隔
            if self.options.delay > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(self.options.delay)).await;
            }
        }

        Ok(BatchResult { sheet, summary })
    }

    async fn load(&self, result: BatchResult) -> Result<String> {
        let filename = workbook::timestamped_filename("LinkedIn_Bios");
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

    fn pipeline(options: BioOptions) -> BioPipeline<LocalStorage> {
        BioPipeline::new(LocalStorage::new("/tmp".to_string()), options, None)
    }

    fn options() -> BioOptions {
        BioOptions {
            input: "LinkedIN.xlsx".to_string(),
            output_dir: "/tmp".to_string(),
            delay: 0.0,
            background_check: false,
            company_lookup: false,
            verbose: false,
        }
    }

    #[tokio::test]
    async fn transform_requires_url_column() {
        let mut sheet = Sheet::new(vec!["Name".to_string()]);
        sheet.rows.push(vec!["Acme".to_string()]);

        let err = pipeline(options())
            .transform(Batch::Rows(sheet))
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::InputDataError { .. }));
    }

    #[tokio::test]
    async fn rows_without_urls_are_skipped_but_kept() {
        let mut sheet = Sheet::new(vec!["Name".to_string(), URL_COLUMN.to_string()]);
        sheet.rows.push(vec!["Acme".to_string(), String::new()]);
        sheet.rows.push(vec!["Beta".to_string(), "   ".to_string()]);

        let result = pipeline(options())
            .transform(Batch::Rows(sheet))
            .await
            .unwrap();

        assert_eq!(result.summary.skipped, 2);
        assert_eq!(result.summary.processed, 0);
        assert_eq!(result.sheet.rows.len(), 2);
        assert!(result.sheet.column_index(BIO_COLUMN).is_some());
    }

    #[tokio::test]
    async fn toggle_columns_added_only_when_enabled() {
        let sheet = Sheet::new(vec![URL_COLUMN.to_string()]);
        let result = pipeline(options())
            .transform(Batch::Rows(sheet))
            .await
            .unwrap();
        assert!(result
            .sheet
            .column_index(BACKGROUND_CHECK_COLUMN)
            .is_none());

        let sheet = Sheet::new(vec![URL_COLUMN.to_string()]);
        let mut with_bg = options();
        with_bg.background_check = true;
        let result = pipeline(with_bg)
            .transform(Batch::Rows(sheet))
            .await
            .unwrap();
        assert!(result.sheet.column_index(BACKGROUND_CHECK_COLUMN).is_some());
    }
}
