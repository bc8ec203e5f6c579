use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// 解析 .env 檔的 KEY=VALUE 行；讀不到或格式錯誤時安靜地回傳空表
pub fn load_env_file(path: &Path) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return vars,
    };

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            vars.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    vars
}

fn default_env_path() -> PathBuf {
    PathBuf::from(".env")
}

/// 先查進程環境變數，再退回工作目錄下的 .env 檔
pub fn openai_api_key() -> Option<String> {
    if let Ok(key) = std::env::var(OPENAI_API_KEY) {
        if !key.is_empty() {
            return Some(key);
        }
    }

    load_env_file(&default_env_path())
        .remove(OPENAI_API_KEY)
        .filter(|key| !key.is_empty())
}

/// 金鑰只能記錄長度，不可輸出內容
pub fn describe_key(key: &str) -> String {
    format!("length: {} characters", key.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_env_file_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment line").unwrap();
        writeln!(file, "OPENAI_API_KEY = sk-test-123 ").unwrap();
        writeln!(file, "OTHER=value=with=equals").unwrap();
        writeln!(file, "malformed line without equals").unwrap();

        let vars = load_env_file(file.path());
        assert_eq!(vars.get("OPENAI_API_KEY").map(String::as_str), Some("sk-test-123"));
        assert_eq!(vars.get("OTHER").map(String::as_str), Some("value=with=equals"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn missing_env_file_is_empty() {
        let vars = load_env_file(Path::new("/nonexistent/.env"));
        assert!(vars.is_empty());
    }

    #[test]
    fn describe_key_never_reveals_content() {
        let description = describe_key("sk-secret-value");
        assert!(!description.contains("secret"));
        assert!(description.contains("15"));
    }
}
