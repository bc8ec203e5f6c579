pub mod cli;
pub mod credentials;
pub mod profile;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};

/// 主工具的命令列設定：把投資者文字檔萃取成 Excel 工作表
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "investor-etl")]
#[command(about = "Extract investor data from text listings into Excel workbooks")]
pub struct CliConfig {
    /// Input filename inside the input directory
    pub filename: Option<String>,

    /// Process all files in the input directory
    #[arg(short = 'a', long, conflicts_with = "filename")]
    pub all: bool,

    /// Directory containing input text files
    #[arg(long, default_value = "./input")]
    pub input_dir: String,

    /// Directory for generated workbooks
    #[arg(long = "output", default_value = "./Results")]
    pub output_dir: String,

    /// Optional TOML extraction profile (labels, delimiter, output prefix)
    #[arg(long)]
    pub config: Option<String>,

    /// Print extracted records to the terminal
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable system resource monitoring
    #[arg(long)]
    pub monitor: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.filename.is_none() && !self.all {
            return Err(EtlError::MissingConfigError {
                field: "filename (or --all)".to_string(),
            });
        }

        if let Some(filename) = &self.filename {
            validation::validate_non_empty_string("filename", filename)?;
        }
        validation::validate_path("input_dir", &self.input_dir)?;
        validation::validate_path("output_dir", &self.output_dir)?;

        Ok(())
    }
}
