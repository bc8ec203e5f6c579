use crate::domain::model::{FieldKind, InvestorRecord, RawBlock};

/// 預設的區塊分隔行（原始資料在每筆投資者後面都有這一行）
pub const DEFAULT_BLOCK_DELIMITER: &str = "View company";

/// 一條標籤規則：行首符合 label 時，行的其餘部分填入 field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRule {
    pub label: String,
    pub field: FieldKind,
}

impl LabelRule {
    pub fn new(label: &str, field: FieldKind) -> Self {
        Self {
            label: label.to_string(),
            field,
        }
    }
}

/// 萃取單一區塊時附帶的警告
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionWarning {
    /// 空白區塊：所有欄位皆缺漏，該筆視為 skipped
    EmptyBlock,
    /// 區塊內沒有任何可辨識的標籤，只填得出公司名稱
    NoLabels,
}

/// 單一區塊的萃取結果
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: InvestorRecord,
    pub warning: Option<ExtractionWarning>,
}

/// 將非結構化文字區塊轉成 InvestorRecord 的萃取器。
///
/// 逐行掃描，依序比對標籤規則；命中時將行的剩餘部分（去除空白）
/// 填入對應欄位。未命中的行視為最近一個命中欄位的延續；
/// 還沒有任何標籤命中前，第一個非空行就是公司名稱。
/// 同一欄位重複出現標籤時以先出現者為準，後者整行忽略。
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<LabelRule>,
}

impl Default for Extractor {
    fn default() -> Self {
        // 規則有序比對：前綴重疊的標籤（Team Size: / Team:）長的要排前面
        Self::new(vec![
            LabelRule::new("Type:", FieldKind::CompanyType),
            LabelRule::new("Location:", FieldKind::Location),
            LabelRule::new("Founded:", FieldKind::Founded),
            LabelRule::new("Focus:", FieldKind::FocusAreas),
            LabelRule::new("Description:", FieldKind::Description),
            LabelRule::new("Team Size:", FieldKind::TeamSize),
            LabelRule::new("Team:", FieldKind::TeamMembers),
            LabelRule::new("Notable Investments:", FieldKind::NotableInvestments),
            LabelRule::new("Stage:", FieldKind::Stage),
            LabelRule::new("Ticket Size:", FieldKind::TicketSize),
        ])
    }
}

impl Extractor {
    pub fn new(rules: Vec<LabelRule>) -> Self {
        Self { rules }
    }

    /// 將輸入文字切成區塊。
    ///
    /// delimiter 為 Some 時，以整行等於分隔字串的行為界；
    /// 為 None 時以空白行為界。切出的空區塊直接丟棄。
    pub fn split_blocks(&self, source: &str, text: &str, delimiter: Option<&str>) -> Vec<RawBlock> {
        let mut blocks = Vec::new();
        let mut current = String::new();

        let mut push_current = |current: &mut String| {
            if !current.trim().is_empty() {
                blocks.push(RawBlock {
                    source: source.to_string(),
                    text: std::mem::take(current),
                });
            } else {
                current.clear();
            }
        };

        for line in text.lines() {
            let is_boundary = match delimiter {
                Some(delim) => line.trim() == delim,
                None => line.trim().is_empty(),
            };
            if is_boundary {
                push_current(&mut current);
            } else {
                current.push_str(line);
                current.push('\n');
            }
        }
        push_current(&mut current);

        blocks
    }

    /// 萃取單一區塊。純函式：相同輸入必得相同輸出。
    pub fn extract_block(&self, block: &str) -> Extraction {
        let mut record = InvestorRecord::default();

        if block.trim().is_empty() {
            return Extraction {
                record,
                warning: Some(ExtractionWarning::EmptyBlock),
            };
        }

        // 延續行要接在最近一次「實際填入值」的欄位後面；
        // 重複標籤被忽略時也一併停止延續
        let mut continuation: Option<FieldKind> = None;
        let mut matched_any = false;

        for line in block.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((field, rest)) = self.match_label(line) {
                matched_any = true;
                if record.get(field).is_none() {
                    let rest = rest.trim();
                    if rest.is_empty() {
                        // 標籤後面沒有值：欄位保持缺漏，但允許延續行補值
                        continuation = Some(field);
                    } else {
                        record.set(field, rest.to_string());
                        continuation = Some(field);
                    }
                } else {
                    // 同一欄位的重複標籤：先到先贏，整行忽略
                    continuation = None;
                }
            } else if let Some(field) = continuation {
                append_continuation(&mut record, field, line);
            } else if record.company_name.is_none() {
                // 第一個非空、無標籤、且尚無延續對象的行是公司名稱
                record.company_name = Some(line.to_string());
            }
            // 其餘無法歸類的行直接忽略
        }

        let warning = if !matched_any {
            Some(ExtractionWarning::NoLabels)
        } else {
            None
        };

        Extraction { record, warning }
    }

    /// 依序比對標籤規則，回傳命中的欄位與行的剩餘部分
    fn match_label<'a>(&self, line: &'a str) -> Option<(FieldKind, &'a str)> {
        for rule in &self.rules {
            // get() 避免在多位元組字元中間切割
            if let Some(prefix) = line.get(..rule.label.len()) {
                if prefix.eq_ignore_ascii_case(&rule.label) {
                    return Some((rule.field, &line[rule.label.len()..]));
                }
            }
        }
        None
    }
}

fn append_continuation(record: &mut InvestorRecord, field: FieldKind, line: &str) {
    match record.get(field) {
        Some(existing) => {
            let merged = format!("{} {}", existing, line);
            record.set(field, merged);
        }
        None => record.set(field, line.to_string()),
    }
}
