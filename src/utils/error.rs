use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Workbook read error: {0}")]
    WorkbookError(#[from] calamine::XlsxError),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Input file not found: {path}")]
    InputNotFoundError { path: String },

    #[error("Input data error: {message}")]
    InputDataError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing credential: {name}")]
    MissingCredentialError { name: String },

    #[error("Enrichment service error: {message}")]
    EnrichmentError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// 錯誤分類，對應規格的錯誤分類法：
/// 輸入錯誤與輸出錯誤是致命的，單列處理與外部服務錯誤可局部恢復
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Processing,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 警告性質，執行仍視為成功
    Low,
    /// 可重試的暫時性錯誤
    Medium,
    /// 處理失敗，需要使用者介入
    High,
    /// 系統層級錯誤
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::HttpError(_) | EtlError::EnrichmentError { .. } => ErrorCategory::Network,
            EtlError::WorkbookError(_)
            | EtlError::InputNotFoundError { .. }
            | EtlError::InputDataError { .. } => ErrorCategory::Input,
            EtlError::ZipError(_) | EtlError::IoError(_) => ErrorCategory::Output,
            EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingCredentialError { .. } => ErrorCategory::Configuration,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單列層級的錯誤在管道內已被吸收；會傳到頂層的都代表整批失敗
            EtlError::ProcessingError { .. } => ErrorSeverity::Low,
            EtlError::HttpError(_) | EtlError::EnrichmentError { .. } => ErrorSeverity::Medium,
            EtlError::WorkbookError(_)
            | EtlError::InputNotFoundError { .. }
            | EtlError::InputDataError { .. }
            | EtlError::ZipError(_)
            | EtlError::SerializationError(_)
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::MissingCredentialError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::HttpError(_) => {
                "Check network connectivity and retry, possibly with a longer --delay".to_string()
            }
            EtlError::EnrichmentError { .. } => {
                "Verify the AI service is reachable and the API key is valid".to_string()
            }
            EtlError::WorkbookError(_) => {
                "Make sure the input file is a valid .xlsx workbook".to_string()
            }
            EtlError::InputNotFoundError { path } => {
                format!("Check that '{}' exists and is readable", path)
            }
            EtlError::InputDataError { .. } => {
                "Inspect the input file with the preview tool to verify its structure".to_string()
            }
            EtlError::ZipError(_) | EtlError::IoError(_) => {
                "Check that the output directory is writable and has free space".to_string()
            }
            EtlError::SerializationError(_) => {
                "The service returned malformed data; retry or report the payload".to_string()
            }
            EtlError::MissingConfigError { field } => {
                format!("Provide a value for '{}' on the command line or in the profile", field)
            }
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' and run again", field)
            }
            EtlError::MissingCredentialError { name } => {
                format!("Set {} in the environment or in a .env file at the repository root", name)
            }
            EtlError::ProcessingError { .. } => {
                "Re-run with --verbose to see per-row detail".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::InputNotFoundError { path } => format!("File not found: {}", path),
            EtlError::MissingCredentialError { name } => {
                format!("No {} found in environment or .env file", name)
            }
            other => other.to_string(),
        }
    }

    /// 依嚴重程度決定進程退出碼；部分列失敗仍回報成功
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_fatal() {
        let err = EtlError::InputNotFoundError {
            path: "missing.xlsx".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(err.exit_code() != 0);
    }

    #[test]
    fn row_level_errors_exit_zero() {
        let err = EtlError::ProcessingError {
            message: "row 2 malformed".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn credential_suggestion_names_the_variable() {
        let err = EtlError::MissingCredentialError {
            name: "OPENAI_API_KEY".to_string(),
        };
        assert!(err.recovery_suggestion().contains("OPENAI_API_KEY"));
    }
}
