use std::path::Path;

use async_trait::async_trait;

use crate::config::profile::ExtractionProfile;
use crate::config::CliConfig;
use crate::core::extractor::{ExtractionWarning, Extractor};
use crate::core::workbook;
use crate::domain::model::{Batch, BatchResult, RawBlock, RunSummary, Sheet, RECORD_HEADER};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{EtlError, Result};

/// 文字清單 → Excel 工作表的萃取管道。
///
/// extract 讀入投資者文字檔並切塊，transform 逐塊萃取欄位，
/// load 寫出帶時間戳的工作簿。
pub struct ExtractPipeline<S: Storage> {
    storage: S,
    config: CliConfig,
    profile: ExtractionProfile,
    extractor: Extractor,
}

impl<S: Storage> ExtractPipeline<S> {
    pub fn new(storage: S, config: CliConfig, profile: ExtractionProfile) -> Self {
        let extractor = profile.build_extractor();
        Self {
            storage,
            config,
            profile,
            extractor,
        }
    }

    /// 決定要處理的輸入檔：單一檔案或整個輸入資料夾
    fn input_files(&self) -> Result<Vec<String>> {
        let input_dir = Path::new(&self.config.input_dir);

        if let Some(filename) = &self.config.filename {
            let path = input_dir.join(filename);
            if !path.is_file() {
                return Err(EtlError::InputNotFoundError {
                    path: path.display().to_string(),
                });
            }
            return Ok(vec![filename.clone()]);
        }

        if !input_dir.is_dir() {
            return Err(EtlError::InputNotFoundError {
                path: input_dir.display().to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(input_dir)? {
            let entry = entry?;
            if entry.path().is_file() {
                files.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        // 固定處理順序，批次結果才可重現
        files.sort();

        if files.is_empty() {
            return Err(EtlError::InputDataError {
                message: format!("No files found in {}", input_dir.display()),
            });
        }

        Ok(files)
    }

    fn print_verbose_record(index: usize, block: &RawBlock, row: &[String]) {
        println!("\n--- INVESTOR {} ({}) ---", index + 1, block.source);
        for (name, value) in RECORD_HEADER.iter().zip(row.iter()) {
            println!("{}: {}", name, value);
        }
    }
}

#[async_trait]
impl<S: Storage> Pipeline for ExtractPipeline<S> {
    async fn extract(&self) -> Result<Batch> {
        let mut blocks = Vec::new();

        for filename in self.input_files()? {
            let path = Path::new(&self.config.input_dir).join(&filename);
            tracing::info!("📂 Processing file: {}", path.display());

            let text = std::fs::read_to_string(&path)?;
            tracing::debug!("Read {} characters from {}", text.chars().count(), filename);

            let file_blocks =
                self.extractor
                    .split_blocks(&filename, &text, self.profile.block_delimiter());
            tracing::info!("✅ Found {} blocks in {}", file_blocks.len(), filename);
            blocks.extend(file_blocks);
        }

        Ok(Batch::Blocks(blocks))
    }

    async fn transform(&self, batch: Batch) -> Result<BatchResult> {
        let blocks = match batch {
            Batch::Blocks(blocks) => blocks,
            Batch::Rows(_) => {
                return Err(EtlError::ProcessingError {
                    message: "Extract pipeline expects text blocks".to_string(),
                })
            }
        };

        let mut header: Vec<String> = RECORD_HEADER.iter().map(|s| s.to_string()).collect();
        header.push("Source File".to_string());
        let mut sheet = Sheet::new(header);
        let mut summary = RunSummary::default();

        for (index, block) in blocks.iter().enumerate() {
            let extraction = self.extractor.extract_block(&block.text);

            match extraction.warning {
                Some(ExtractionWarning::EmptyBlock) => {
                    summary.skipped += 1;
                    summary.warnings += 1;
                    tracing::warn!("⏭️ Block {} is empty, skipping", index + 1);
                }
                Some(ExtractionWarning::NoLabels) => {
                    summary.processed += 1;
                    summary.warnings += 1;
                    tracing::warn!(
                        "⚠️ Block {} has no recognizable labels, kept company name only",
                        index + 1
                    );
                }
                None => summary.processed += 1,
            }

            // 每個區塊固定產出一列，順序與輸入一致
            let mut row = extraction.record.to_row();
            row.push(block.source.clone());

            if self.config.verbose {
                Self::print_verbose_record(index, block, &row);
            }

            sheet.rows.push(row);
        }

        Ok(BatchResult { sheet, summary })
    }

    async fn load(&self, result: BatchResult) -> Result<String> {
        let filename = workbook::timestamped_filename(&self.profile.output.prefix);
        let bytes = workbook::write_sheet(&result.sheet)?;

        tracing::debug!("Writing workbook ({} bytes) to storage", bytes.len());
        self.storage.write_file(&filename, &bytes).await?;

        Ok(Path::new(&self.config.output_dir)
            .join(filename)
            .display()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::core::etl::EtlEngine;
    use std::io::Write;
    use tempfile::TempDir;

    fn test_config(input_dir: &str, output_dir: &str, filename: Option<&str>) -> CliConfig {
        CliConfig {
            filename: filename.map(String::from),
            all: filename.is_none(),
            input_dir: input_dir.to_string(),
            output_dir: output_dir.to_string(),
            config: None,
            verbose: false,
            monitor: false,
        }
    }

    fn write_input(dir: &TempDir, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn extracts_blocks_into_ordered_rows() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_input(
            &input,
            "investors.txt",
            "Acme Ventures\nType: Venture Capital\nLocation: Helsinki\nView company\n\
             just a name line\nwith noise\nView company\n\
             Beta Fund\nStage: Seed\nView company\n",
        );

        let config = test_config(
            input.path().to_str().unwrap(),
            output.path().to_str().unwrap(),
            Some("investors.txt"),
        );
        let storage = LocalStorage::new(config.output_dir.clone());
        let pipeline = ExtractPipeline::new(storage, config, ExtractionProfile::default());

        let report = EtlEngine::new(pipeline).run().await.unwrap();

        // 三個區塊 → 三列，其中一塊沒有標籤要算進警告
        assert_eq!(report.summary.processed, 3);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.failed, 0);

        let bytes = std::fs::read(&report.output_path).unwrap();
        let sheet = workbook::read_sheet(&bytes).unwrap();
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0][0], "Acme Ventures");
        assert_eq!(sheet.rows[1][0], "just a name line");
        assert_eq!(sheet.rows[2][0], "Beta Fund");

        let source_idx = sheet.column_index("Source File").unwrap();
        assert_eq!(sheet.rows[0][source_idx], "investors.txt");
    }

    #[tokio::test]
    async fn missing_input_file_is_fatal() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let config = test_config(
            input.path().to_str().unwrap(),
            output.path().to_str().unwrap(),
            Some("nope.txt"),
        );
        let storage = LocalStorage::new(config.output_dir.clone());
        let pipeline = ExtractPipeline::new(storage, config, ExtractionProfile::default());

        let err = EtlEngine::new(pipeline).run().await.unwrap_err();
        assert!(matches!(err, EtlError::InputNotFoundError { .. }));
        assert!(err.exit_code() != 0);
    }

    #[tokio::test]
    async fn all_mode_combines_files_in_name_order() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_input(&input, "b.txt", "Beta Fund\nStage: Seed\nView company\n");
        write_input(&input, "a.txt", "Acme\nType: VC\nView company\n");

        let config = test_config(
            input.path().to_str().unwrap(),
            output.path().to_str().unwrap(),
            None,
        );
        let storage = LocalStorage::new(config.output_dir.clone());
        let pipeline = ExtractPipeline::new(storage, config, ExtractionProfile::default());

        let report = EtlEngine::new(pipeline).run().await.unwrap();
        let bytes = std::fs::read(&report.output_path).unwrap();
        let sheet = workbook::read_sheet(&bytes).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], "Acme");
        assert_eq!(sheet.rows[1][0], "Beta Fund");
    }
}
