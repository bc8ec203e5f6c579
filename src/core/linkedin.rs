use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;

/// 瀏覽器 User-Agent，LinkedIn 對非瀏覽器請求會直接拒絕
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
AppleWebKit/537.36 (KHTML, like Gecko) \
Chrome/123.0 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// 抓取公開個人頁面並取出 bio/description meta 標籤的擷取器
pub struct ProfileFetcher {
    client: Client,
    meta_tag: Regex,
    key_attr: Regex,
    content_attr: Regex,
}

impl ProfileFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            meta_tag: Regex::new(r"(?is)<meta\s[^>]*>").expect("meta tag pattern"),
            key_attr: Regex::new(r#"(?i)\b(?:property|name)\s*=\s*["']([^"']+)["']"#)
                .expect("key attribute pattern"),
            content_attr: Regex::new(r#"(?i)\bcontent\s*=\s*["']([^"']*)["']"#)
                .expect("content attribute pattern"),
        }
    }

    /// 抓取個人頁面並回傳 bio 字串。
    ///
    /// 永不失敗：網路或服務錯誤以 `ERROR: ...` 字串回傳，
    /// 由呼叫端放進 Bio 欄位，批次繼續執行。
    pub async fn fetch_bio(&self, url: &str) -> String {
        if url.is_empty() {
            return String::new();
        }

        tracing::debug!("Fetching profile page: {}", url);
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            Err(e) => return format!("ERROR: {}", e),
        };

        if !response.status().is_success() {
            return format!("ERROR: HTTP {}", response.status().as_u16());
        }

        let html = match response.text().await {
            Ok(body) => body,
            Err(e) => return format!("ERROR: {}", e),
        };

        match self.extract_meta_description(&html) {
            Some(bio) => bio,
            None => "Bio not found".to_string(),
        }
    }

    /// 依偏好順序（og:description, description）找出第一個非空的 meta 內容
    pub fn extract_meta_description(&self, html: &str) -> Option<String> {
        let mut meta: HashMap<String, Vec<String>> = HashMap::new();

        for tag in self.meta_tag.find_iter(html) {
            let tag = tag.as_str();
            let key = match self.key_attr.captures(tag) {
                Some(caps) => caps[1].to_lowercase(),
                None => continue,
            };
            let content = match self.content_attr.captures(tag) {
                Some(caps) => caps[1].to_string(),
                None => continue,
            };
            meta.entry(key).or_default().push(content);
        }

        for key in ["og:description", "description"] {
            if let Some(values) = meta.get(key) {
                for value in values {
                    let cleaned = unescape_entities(value.trim());
                    if !cleaned.is_empty() {
                        return Some(cleaned);
                    }
                }
            }
        }
        None
    }
}

impl Default for ProfileFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// 還原 meta content 內常見的 HTML 實體（含十進位與十六進位數值實體）
fn unescape_entities(text: &str) -> String {
    let numeric = Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("numeric entity pattern");

    let text = numeric.replace_all(text, |caps: &regex::Captures| {
        let body = &caps[1];
        let code = if let Some(hex) = body.strip_prefix('x') {
            u32::from_str_radix(hex, 16).ok()
        } else {
            body.parse::<u32>().ok()
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_og_description_over_description() {
        let fetcher = ProfileFetcher::new();
        let html = r#"<html><head>
            <meta name="description" content="fallback text">
            <meta property="og:description" content="primary bio">
        </head></html>"#;
        assert_eq!(
            fetcher.extract_meta_description(html).as_deref(),
            Some("primary bio")
        );
    }

    #[test]
    fn falls_back_to_plain_description() {
        let fetcher = ProfileFetcher::new();
        let html = r#"<meta name="description" content="only this one">"#;
        assert_eq!(
            fetcher.extract_meta_description(html).as_deref(),
            Some("only this one")
        );
    }

    #[test]
    fn attribute_order_does_not_matter() {
        let fetcher = ProfileFetcher::new();
        let html = r#"<meta content="reversed attrs" property="og:description">"#;
        assert_eq!(
            fetcher.extract_meta_description(html).as_deref(),
            Some("reversed attrs")
        );
    }

    #[test]
    fn empty_content_is_skipped() {
        let fetcher = ProfileFetcher::new();
        let html = r#"
            <meta property="og:description" content="">
            <meta name="description" content="non empty">
        "#;
        assert_eq!(
            fetcher.extract_meta_description(html).as_deref(),
            Some("non empty")
        );
    }

    #[test]
    fn no_meta_yields_none() {
        let fetcher = ProfileFetcher::new();
        assert_eq!(fetcher.extract_meta_description("<html></html>"), None);
    }

    #[test]
    fn entities_are_unescaped() {
        assert_eq!(
            unescape_entities("Founder &amp; CEO &#8211; Acme &quot;Labs&quot;"),
            "Founder & CEO – Acme \"Labs\""
        );
        assert_eq!(unescape_entities("&#x2713; done"), "✓ done");
    }
}
