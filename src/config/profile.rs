use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::extractor::{Extractor, LabelRule, DEFAULT_BLOCK_DELIMITER};
use crate::domain::model::FieldKind;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};

/// 萃取設定檔：輸入資料夾、區塊分隔方式、標籤規則與輸出位置。
/// 未提供設定檔時使用 Default。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionProfile {
    pub profile: ProfileMeta,
    pub input: InputConfig,
    #[serde(default)]
    pub labels: Vec<LabelConfig>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub directory: String,
    /// 整行等於此字串的行視為區塊分界；None 表示以空白行分界
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub label: String,
    pub field: FieldKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: String,
    pub prefix: String,
}

impl Default for ExtractionProfile {
    fn default() -> Self {
        Self {
            profile: ProfileMeta {
                name: "investors".to_string(),
                description: "Investor listing export".to_string(),
            },
            input: InputConfig {
                directory: "./input".to_string(),
                delimiter: Some(DEFAULT_BLOCK_DELIMITER.to_string()),
            },
            labels: Vec::new(),
            output: OutputConfig {
                directory: "./Results".to_string(),
                prefix: "Investors".to_string(),
            },
        }
    }
}

impl ExtractionProfile {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::InvalidConfigValueError {
            field: "profile".to_string(),
            value: "<toml>".to_string(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// 依設定建立萃取器；沒有自訂標籤時用預設規則
    pub fn build_extractor(&self) -> Extractor {
        if self.labels.is_empty() {
            Extractor::default()
        } else {
            Extractor::new(
                self.labels
                    .iter()
                    .map(|l| LabelRule::new(&l.label, l.field))
                    .collect(),
            )
        }
    }

    pub fn block_delimiter(&self) -> Option<&str> {
        self.input.delimiter.as_deref()
    }
}

impl Validate for ExtractionProfile {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("profile.name", &self.profile.name)?;
        validation::validate_path("input.directory", &self.input.directory)?;
        validation::validate_path("output.directory", &self.output.directory)?;
        validation::validate_non_empty_string("output.prefix", &self.output.prefix)?;

        for label in &self.labels {
            validation::validate_non_empty_string("labels.label", &label.label)?;
        }

        // 分隔字串允許省略，但不允許空白字串（會把每一行都當分界）
        if let Some(delim) = &self.input.delimiter {
            validation::validate_non_empty_string("input.delimiter", delim)?;
        }

        Ok(())
    }
}

/// 替換 ${VAR_NAME} 形式的環境變數，查不到的保留原樣
fn substitute_env_vars(content: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("env var pattern");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[profile]
name = "nordic-investors"
description = "Nordic investor listing"

[input]
directory = "./input"
delimiter = "View company"

[[labels]]
label = "Sijainti:"
field = "location"

[[labels]]
label = "Tyyppi:"
field = "company_type"

[output]
directory = "./Results"
prefix = "Nordic"
"#;

    #[test]
    fn parses_profile_with_custom_labels() {
        let profile = ExtractionProfile::from_toml_str(SAMPLE).unwrap();
        assert_eq!(profile.profile.name, "nordic-investors");
        assert_eq!(profile.block_delimiter(), Some("View company"));
        assert_eq!(profile.labels.len(), 2);
        assert_eq!(profile.labels[0].field, FieldKind::Location);
        assert!(profile.validate().is_ok());

        let extractor = profile.build_extractor();
        let result = extractor.extract_block("Acme\nSijainti: Espoo\n");
        assert_eq!(result.record.location.as_deref(), Some("Espoo"));
    }

    #[test]
    fn missing_delimiter_means_blank_line_blocks() {
        let toml_str = r#"
[profile]
name = "plain"

[input]
directory = "./input"

[output]
directory = "./Results"
prefix = "Plain"
"#;
        let profile = ExtractionProfile::from_toml_str(toml_str).unwrap();
        assert_eq!(profile.block_delimiter(), None);
    }

    #[test]
    fn env_vars_are_substituted() {
        std::env::set_var("ETL_TEST_OUTPUT_DIR", "/tmp/etl-out");
        let toml_str = r#"
[profile]
name = "env"

[input]
directory = "./input"

[output]
directory = "${ETL_TEST_OUTPUT_DIR}"
prefix = "Env"
"#;
        let profile = ExtractionProfile::from_toml_str(toml_str).unwrap();
        assert_eq!(profile.output.directory, "/tmp/etl-out");
    }

    #[test]
    fn invalid_field_name_is_rejected() {
        let toml_str = r#"
[profile]
name = "bad"

[input]
directory = "./input"

[[labels]]
label = "X:"
field = "no_such_field"

[output]
directory = "./Results"
prefix = "Bad"
"#;
        assert!(ExtractionProfile::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn default_profile_validates() {
        assert!(ExtractionProfile::default().validate().is_ok());
    }
}
