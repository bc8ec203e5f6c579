use reqwest::Client;
use serde_json::{json, Value};

use crate::utils::error::{EtlError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// 研究用模型：一般查詢用輕量模型，網路搜尋與人物背景查核用完整模型
const RESEARCH_MODEL: &str = "gpt-5-mini";
const WEB_RESEARCH_MODEL: &str = "gpt-5";
const PROFILE_MODEL: &str = "gpt-4o";

/// 投資者研究結果，對應輸出的五個 enrichment 欄位
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvestorResearch {
    pub website: String,
    pub investment_stage: String,
    pub ticket_size: String,
    pub sector_focus: String,
    pub investment_strategy: String,
    pub error: Option<String>,
}

impl InvestorResearch {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// 公司基本資料查詢結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyInfo {
    pub revenue: String,
    pub ceo_name: String,
    pub ceo_bio: String,
    pub linkedin_url: String,
    pub error: Option<String>,
}

impl CompanyInfo {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// 描述文字分析結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionAnalysis {
    pub sector_focus: String,
    pub stage: String,
    pub ticket_min: String,
    pub ticket_max: String,
    pub website: String,
    pub error: Option<String>,
}

impl DescriptionAnalysis {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// OpenAI Responses API 的查詢客戶端。
///
/// 所有查詢方法都不會把錯誤往上拋：外部服務失敗屬於單列可恢復
/// 錯誤，以結果結構中的 error 欄位回報，批次照常繼續。
pub struct EnrichmentClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl EnrichmentClient {
    pub fn new(api_key: String) -> Self {
        Self::with_api_base(api_key, DEFAULT_API_BASE.to_string())
    }

    /// 測試時可改指到 mock server
    pub fn with_api_base(api_key: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// 研究投資者：先用一般查詢，拿到占位符式的空答案時改用網路搜尋重試一次
    pub async fn research_investor(&self, company: &str, city: &str) -> InvestorResearch {
        if company.is_empty() {
            return InvestorResearch::failed("Missing company name");
        }

        tracing::info!("🤖 Researching investor: {}", company);
        let body = self.investor_request(RESEARCH_MODEL, company, city, false);
        let response_text = match self.send(body).await {
            Ok(text) => text,
            Err(e) => return InvestorResearch::failed(format!("API call failed: {}", e)),
        };

        let result = parse_investor_response(&response_text);
        if result.error.is_none() && is_placeholder_research(&result) {
            tracing::warn!(
                "Empty or placeholder response for {}, retrying with web search",
                company
            );
            return self.research_investor_with_web(company, city).await;
        }
        result
    }

    /// 啟用 web_search 工具的投資者研究
    pub async fn research_investor_with_web(&self, company: &str, city: &str) -> InvestorResearch {
        let body = self.investor_request(WEB_RESEARCH_MODEL, company, city, true);
        match self.send(body).await {
            Ok(text) => parse_investor_response(&text),
            Err(e) => InvestorResearch::failed(format!("Web search failed: {}", e)),
        }
    }

    /// 查公司營收、CEO 姓名與簡介、LinkedIn 個人頁
    pub async fn company_info(&self, company: &str) -> CompanyInfo {
        if company.is_empty() {
            return CompanyInfo::failed("Missing company name");
        }

        tracing::info!("🤖 Fetching company info: {}", company);
        let developer = "You are a financial analyst. User gives you companies one by one and \
                         your task is to find information: revenue, CEO name, CEO Bio, and \
                         LinkedIn profile URL. Look on finder.fi with company name, LinkedIn \
                         for CEO Bio and profile URL. Respond only JSON, no references, \
                         background data, nothing else.";
        let user = format!(
            "Find information defined in response JSON below.\n{{\n  \"companyName\": \"{}\",\n  \
             \"revenue\": \"X€\",\n  \"ceoName\": \"N.N.\",\n  \"ceoBioInLinkedin\": \"He is .....\",\n  \
             \"linkedInProfileUrl\": \"https://www.linkedin.com/in/ceo-name\"\n}}",
            company
        );

        let body = self.responses_request(
            RESEARCH_MODEL,
            developer,
            &user,
            "text",
            "low",
            "low",
            Some(("FI", "Helsinki")),
        );
        match self.send(body).await {
            Ok(text) => parse_company_info(&text),
            Err(e) => CompanyInfo::failed(format!("API call failed: {}", e)),
        }
    }

    /// 用模型把自由文字的投資者描述整理成結構化欄位
    pub async fn analyze_description(
        &self,
        description: &str,
        existing_ticket_size: &str,
    ) -> DescriptionAnalysis {
        // 過短的描述抽不出有意義的資料，直接跳過
        if description.len() <= 50 {
            return DescriptionAnalysis::failed("Description too short");
        }

        let developer = "Analyze this investor description and extract structured investment \
                         information.\n\nPlease return ONLY a JSON object with the following \
                         structure:\n{\n  \"SectorFocus\": [\"Technology\", \"FinTech\", \"etc\"],\n  \
                         \"Stage\": [\"Pre-Seed\", \"Seed\", \"Series A\", \"etc\"],\n  \
                         \"TicketSize\": {\"Min\": \"€100K\", \"Max\": \"€5M\"},\n  \
                         \"Website\": \"www.example.com\"\n}\n\nUse empty strings for unknown \
                         fields. Return ONLY the JSON object, no other text.";
        let user = format!(
            "Description: {}\nExisting Ticket Size Info: {}",
            description,
            if existing_ticket_size.is_empty() {
                "Not provided"
            } else {
                existing_ticket_size
            }
        );

        let body =
            self.responses_request(RESEARCH_MODEL, developer, &user, "text", "low", "low", None);
        match self.send(body).await {
            Ok(text) => parse_description_analysis(&text),
            Err(e) => DescriptionAnalysis::failed(format!("API call failed: {}", e)),
        }
    }

    /// 個人頁背景查核，回傳自由文字（錯誤以 ERROR 前綴字串表示）
    pub async fn background_check(&self, profile_url: &str) -> String {
        if profile_url.is_empty() {
            return "Background check skipped: Missing URL".to_string();
        }

        let body = self.responses_request(
            PROFILE_MODEL,
            "What are the main achievements of this entrepreneur:",
            profile_url,
            "text",
            "medium",
            "medium",
            Some(("US", "NYC")),
        );
        match self.send(body).await {
            Ok(text) => text,
            Err(e) => format!("ERROR during background check: {}", e),
        }
    }

    /// 查這個人目前任職公司的資料，回傳自由文字
    pub async fn employer_lookup(&self, profile_url: &str) -> String {
        if profile_url.is_empty() {
            return "Company lookup skipped: Missing URL".to_string();
        }

        let developer = "Find the current company information for this person. Provide the \
                         following details in English: Email, Phone number, Company type, \
                         Industry, Latest revenue. If information is not available, write \
                         'Not available' for that field.";
        let body = self.responses_request(
            PROFILE_MODEL,
            developer,
            profile_url,
            "text",
            "medium",
            "medium",
            Some(("US", "NYC")),
        );
        match self.send(body).await {
            Ok(text) => text,
            Err(e) => format!("ERROR during company lookup: {}", e),
        }
    }

    fn investor_request(&self, model: &str, company: &str, city: &str, web_search: bool) -> Value {
        let mut query = format!(
            "Find information defined in response JSON below. Make InvestmentStrategy very \
             short. Company: {}",
            company
        );
        if !city.is_empty() {
            query.push_str(&format!(", City: {}", city));
        }
        query.push_str(
            "\n{\n  \"Investor\": \"[Company Name]\",\n  \"www\": \"[website.com]\",\n  \
             \"InvestmentProfile\": {\n    \"Stage\": [\"Seed\", \"Series A\", \"etc\"],\n    \
             \"TicketSize\": {\n      \"Currency\": \"EUR/USD\",\n      \"Range\": \"€X - €Y\",\n      \
             \"Typical\": \"Around €X\"\n    },\n    \"SectorFocus\": [\"Technology\", \"B2B SaaS\", \
             \"etc\"],\n    \"InvestmentStrategy\": \"Brief strategy description\"\n  }\n}",
        );

        let developer = "You are a financial analyst. User gives you companies one by one and \
                         your task is to find investment information. Answer only JSON. No \
                         sources, explanation, summary, nothing but just JSON.";

        let location = if web_search {
            Some(("US", "New York"))
        } else {
            None
        };
        let format = if web_search { "text" } else { "json_object" };
        let (verbosity, effort) = if web_search {
            ("low", "low")
        } else {
            ("medium", "medium")
        };
        self.responses_request(model, developer, &query, format, verbosity, effort, location)
    }

    /// 組出 Responses API 的請求本體
    #[allow(clippy::too_many_arguments)]
    fn responses_request(
        &self,
        model: &str,
        developer: &str,
        user: &str,
        text_format: &str,
        verbosity: &str,
        effort: &str,
        web_search_location: Option<(&str, &str)>,
    ) -> Value {
        let tools = match web_search_location {
            Some((country, city)) => json!([{
                "type": "web_search",
                "user_location": {
                    "type": "approximate",
                    "country": country,
                    "city": city,
                },
                "search_context_size": "medium",
            }]),
            None => json!([]),
        };

        json!({
            "model": model,
            "input": [
                {
                    "role": "developer",
                    "content": [{ "type": "input_text", "text": developer }],
                },
                {
                    "role": "user",
                    "content": [{ "type": "input_text", "text": user }],
                },
            ],
            "text": {
                "format": { "type": text_format },
                "verbosity": verbosity,
            },
            "reasoning": { "effort": effort },
            "tools": tools,
            "store": false,
        })
    }

    /// 送出請求並取出回應文字
    async fn send(&self, body: Value) -> Result<String> {
        let url = format!("{}/responses", self.api_base);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EtlError::EnrichmentError {
                message: format!("HTTP {}: {}", status.as_u16(), truncate(&detail, 200)),
            });
        }

        let payload: Value = response.json().await?;
        extract_output_text(&payload).ok_or_else(|| EtlError::EnrichmentError {
            message: "Cannot extract response text".to_string(),
        })
    }
}

/// 從 Responses API 的回應 JSON 取出輸出文字。
/// 先看頂層 output_text，再退回逐一掃描 output 陣列的 message 內容。
pub fn extract_output_text(payload: &Value) -> Option<String> {
    if let Some(text) = payload.get("output_text").and_then(Value::as_str) {
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }

    let output = payload.get("output")?.as_array()?;
    let mut fragments = Vec::new();
    for item in output {
        if item.get("type").and_then(Value::as_str) != Some("message") {
            continue;
        }
        if let Some(content) = item.get("content").and_then(Value::as_array) {
            for part in content {
                if part.get("type").and_then(Value::as_str) == Some("output_text") {
                    if let Some(text) = part.get("text").and_then(Value::as_str) {
                        fragments.push(text.to_string());
                    }
                }
            }
        }
    }

    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join(""))
    }
}

fn parse_investor_response(response_text: &str) -> InvestorResearch {
    let data: Value = match serde_json::from_str(response_text) {
        Ok(value) => value,
        Err(e) => {
            // 解析失敗時保留截斷的原始回應供人工檢視
            return InvestorResearch {
                investment_strategy: truncate(response_text, 200),
                error: Some(format!("JSON parsing failed: {}", e)),
                ..InvestorResearch::default()
            };
        }
    };

    let profile = data.get("InvestmentProfile").cloned().unwrap_or(Value::Null);

    InvestorResearch {
        website: string_field(&data, "www"),
        investment_stage: joined_list(&profile, "Stage"),
        ticket_size: format_ticket_size(profile.get("TicketSize")),
        sector_focus: joined_list(&profile, "SectorFocus"),
        investment_strategy: string_field(&profile, "InvestmentStrategy"),
        error: None,
    }
}

/// 模型有時會把提示裡的 JSON 樣板原樣回填；這種占位符答案視同沒查到
fn is_placeholder_research(result: &InvestorResearch) -> bool {
    let empty_or = |value: &str, placeholders: &[&str]| {
        value.is_empty() || placeholders.contains(&value)
    };

    empty_or(&result.website, &["[website.com]"])
        || empty_or(&result.investment_stage, &["etc"])
        || empty_or(&result.ticket_size, &["€X - €Y", "Around €X", "€X - €Y (Around €X)"])
        || empty_or(&result.sector_focus, &["etc"])
        || empty_or(&result.investment_strategy, &["Brief strategy description"])
}

fn parse_company_info(response_text: &str) -> CompanyInfo {
    let data: Value = match serde_json::from_str(response_text) {
        Ok(value) => value,
        Err(e) => {
            // 非 JSON 回應：盡量從文字撈出營收與 CEO 行
            let mut revenue = String::new();
            let mut ceo_name = String::new();
            for line in response_text.lines() {
                let lower = line.to_lowercase();
                if revenue.is_empty()
                    && lower.contains("revenue")
                    && (line.contains('€') || lower.contains("million"))
                {
                    revenue = line.trim().to_string();
                }
                if ceo_name.is_empty()
                    && lower.contains("ceo")
                    && line.split_whitespace().count() < 10
                {
                    ceo_name = line.trim().to_string();
                }
            }
            return CompanyInfo {
                revenue,
                ceo_name,
                error: Some(format!(
                    "JSON parsing failed: {} ({})",
                    e,
                    truncate(response_text, 100)
                )),
                ..CompanyInfo::default()
            };
        }
    };

    CompanyInfo {
        revenue: clean_placeholder(string_field(&data, "revenue"), &["x€", "n.n."]),
        ceo_name: clean_placeholder(string_field(&data, "ceoName"), &["n.n."]),
        ceo_bio: clean_placeholder(string_field(&data, "ceoBioInLinkedin"), &["he is ....."]),
        linkedin_url: clean_placeholder(
            string_field(&data, "linkedInProfileUrl"),
            &["https://www.linkedin.com/in/ceo-name"],
        ),
        error: None,
    }
}

fn parse_description_analysis(response_text: &str) -> DescriptionAnalysis {
    let data: Value = match serde_json::from_str(response_text) {
        Ok(value) => value,
        Err(e) => {
            return DescriptionAnalysis::failed(format!(
                "JSON parsing failed: {} ({})",
                e,
                truncate(response_text, 100)
            ));
        }
    };

    let ticket = data.get("TicketSize").cloned().unwrap_or(Value::Null);

    DescriptionAnalysis {
        sector_focus: joined_list(&data, "SectorFocus"),
        stage: joined_list(&data, "Stage"),
        ticket_min: string_field(&ticket, "Min"),
        ticket_max: string_field(&ticket, "Max"),
        website: string_field(&data, "Website"),
        error: None,
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// 列表欄位以逗號串接；模型偶爾會回單一字串而不是陣列
fn joined_list(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn format_ticket_size(ticket: Option<&Value>) -> String {
    match ticket {
        Some(obj @ Value::Object(_)) => {
            let range = string_field(obj, "Range");
            let typical = string_field(obj, "Typical");
            if !range.is_empty() && !typical.is_empty() {
                format!("{} ({})", range, typical)
            } else if !range.is_empty() {
                range
            } else {
                typical
            }
        }
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

fn clean_placeholder(value: String, placeholders: &[&str]) -> String {
    let lower = value.to_lowercase();
    if placeholders.contains(&lower.as_str())
        || lower == "unknown"
        || lower == "not available"
    {
        String::new()
    } else {
        value
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_top_level_output_text() {
        let payload = serde_json::json!({ "output_text": "hello" });
        assert_eq!(extract_output_text(&payload).as_deref(), Some("hello"));
    }

    #[test]
    fn extracts_from_output_message_items() {
        let payload = serde_json::json!({
            "output": [
                { "type": "reasoning", "summary": [] },
                {
                    "type": "message",
                    "content": [
                        { "type": "output_text", "text": "{\"www\":" },
                        { "type": "output_text", "text": "\"acme.vc\"}" }
                    ]
                }
            ]
        });
        assert_eq!(
            extract_output_text(&payload).as_deref(),
            Some("{\"www\":\"acme.vc\"}")
        );
    }

    #[test]
    fn missing_output_yields_none() {
        let payload = serde_json::json!({ "id": "resp_123" });
        assert_eq!(extract_output_text(&payload), None);
    }

    #[test]
    fn parses_investor_research_json() {
        let text = r#"{
            "Investor": "Acme Ventures",
            "www": "acme.vc",
            "InvestmentProfile": {
                "Stage": ["Seed", "Series A"],
                "TicketSize": { "Currency": "EUR", "Range": "€100K - €1M", "Typical": "Around €500K" },
                "SectorFocus": ["B2B SaaS", "FinTech"],
                "InvestmentStrategy": "Hands-on early stage"
            }
        }"#;
        let result = parse_investor_response(text);

        assert_eq!(result.website, "acme.vc");
        assert_eq!(result.investment_stage, "Seed, Series A");
        assert_eq!(result.ticket_size, "€100K - €1M (Around €500K)");
        assert_eq!(result.sector_focus, "B2B SaaS, FinTech");
        assert_eq!(result.investment_strategy, "Hands-on early stage");
        assert!(result.error.is_none());
    }

    #[test]
    fn malformed_json_keeps_truncated_raw_response() {
        let result = parse_investor_response("Sorry, I could not find that company.");
        assert!(result.error.is_some());
        assert!(result
            .investment_strategy
            .starts_with("Sorry, I could not find"));
        assert!(result.website.is_empty());
    }

    #[test]
    fn template_echo_is_detected_as_placeholder() {
        let text = r#"{
            "www": "[website.com]",
            "InvestmentProfile": {
                "Stage": ["etc"],
                "TicketSize": { "Range": "€X - €Y", "Typical": "Around €X" },
                "SectorFocus": ["etc"],
                "InvestmentStrategy": "Brief strategy description"
            }
        }"#;
        let result = parse_investor_response(text);
        assert!(is_placeholder_research(&result));
    }

    #[test]
    fn real_answer_is_not_placeholder() {
        let text = r#"{
            "www": "acme.vc",
            "InvestmentProfile": {
                "Stage": ["Seed"],
                "TicketSize": { "Range": "€100K - €1M", "Typical": "" },
                "SectorFocus": ["SaaS"],
                "InvestmentStrategy": "Early stage"
            }
        }"#;
        assert!(!is_placeholder_research(&parse_investor_response(text)));
    }

    #[test]
    fn company_info_placeholders_are_cleaned() {
        let text = r#"{
            "companyName": "Acme Oy",
            "revenue": "X€",
            "ceoName": "N.N.",
            "ceoBioInLinkedin": "He is .....",
            "linkedInProfileUrl": "https://www.linkedin.com/in/ceo-name"
        }"#;
        let result = parse_company_info(text);
        assert_eq!(result.revenue, "");
        assert_eq!(result.ceo_name, "");
        assert_eq!(result.ceo_bio, "");
        assert_eq!(result.linkedin_url, "");
        assert!(result.error.is_none());
    }

    #[test]
    fn company_info_text_fallback_scrapes_lines() {
        let text = "Acme Oy is a private company.\nRevenue: €12 million in 2024.\nThe CEO is Jane Doe.";
        let result = parse_company_info(text);
        assert!(result.error.is_some());
        assert_eq!(result.revenue, "Revenue: €12 million in 2024.");
        assert_eq!(result.ceo_name, "The CEO is Jane Doe.");
    }

    #[test]
    fn description_analysis_parses_min_max() {
        let text = r#"{
            "SectorFocus": ["DeepTech"],
            "Stage": ["Pre-Seed", "Seed"],
            "TicketSize": { "Min": "€50K", "Max": "€500K" },
            "Website": "www.fund.fi"
        }"#;
        let result = parse_description_analysis(text);
        assert_eq!(result.sector_focus, "DeepTech");
        assert_eq!(result.stage, "Pre-Seed, Seed");
        assert_eq!(result.ticket_min, "€50K");
        assert_eq!(result.ticket_max, "€500K");
        assert_eq!(result.website, "www.fund.fi");
    }

    #[test]
    fn ticket_size_formats_range_and_typical() {
        let ticket = serde_json::json!({ "Range": "€1M - €5M", "Typical": "Around €2M" });
        assert_eq!(
            format_ticket_size(Some(&ticket)),
            "€1M - €5M (Around €2M)"
        );

        let range_only = serde_json::json!({ "Range": "€1M - €5M" });
        assert_eq!(format_ticket_size(Some(&range_only)), "€1M - €5M");
        assert_eq!(format_ticket_size(None), "");
    }
}
