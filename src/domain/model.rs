use serde::{Deserialize, Serialize};

/// 輸出工作表的欄位標題（固定順序）
pub const RECORD_HEADER: [&str; 11] = [
    "Company Name",
    "Type",
    "Location",
    "Founded",
    "Focus Areas",
    "Description",
    "Team Size",
    "Team Members",
    "Notable Investments",
    "Stage",
    "Ticket Size",
];

/// 可由標籤行填入的欄位（Company Name 來自區塊首行，不在此列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    CompanyType,
    Location,
    Founded,
    FocusAreas,
    Description,
    TeamSize,
    TeamMembers,
    NotableInvestments,
    Stage,
    TicketSize,
}

/// 一個未解析的投資者文字區塊
#[derive(Debug, Clone)]
pub struct RawBlock {
    pub source: String,
    pub text: String,
}

/// 從單一 RawBlock 萃取出的結構化記錄。
///
/// 每個欄位要嘛是去除前後空白的非空字串，要嘛是 None；
/// 不會出現空字串。記錄建立後不再修改。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorRecord {
    pub company_name: Option<String>,
    pub company_type: Option<String>,
    pub location: Option<String>,
    pub founded: Option<String>,
    pub focus_areas: Option<String>,
    pub description: Option<String>,
    pub team_size: Option<String>,
    pub team_members: Option<String>,
    pub notable_investments: Option<String>,
    pub stage: Option<String>,
    pub ticket_size: Option<String>,
}

impl InvestorRecord {
    pub fn get(&self, field: FieldKind) -> Option<&str> {
        match field {
            FieldKind::CompanyType => self.company_type.as_deref(),
            FieldKind::Location => self.location.as_deref(),
            FieldKind::Founded => self.founded.as_deref(),
            FieldKind::FocusAreas => self.focus_areas.as_deref(),
            FieldKind::Description => self.description.as_deref(),
            FieldKind::TeamSize => self.team_size.as_deref(),
            FieldKind::TeamMembers => self.team_members.as_deref(),
            FieldKind::NotableInvestments => self.notable_investments.as_deref(),
            FieldKind::Stage => self.stage.as_deref(),
            FieldKind::TicketSize => self.ticket_size.as_deref(),
        }
    }

    pub fn set(&mut self, field: FieldKind, value: String) {
        let slot = match field {
            FieldKind::CompanyType => &mut self.company_type,
            FieldKind::Location => &mut self.location,
            FieldKind::Founded => &mut self.founded,
            FieldKind::FocusAreas => &mut self.focus_areas,
            FieldKind::Description => &mut self.description,
            FieldKind::TeamSize => &mut self.team_size,
            FieldKind::TeamMembers => &mut self.team_members,
            FieldKind::NotableInvestments => &mut self.notable_investments,
            FieldKind::Stage => &mut self.stage,
            FieldKind::TicketSize => &mut self.ticket_size,
        };
        *slot = Some(value);
    }

    /// 是否沒有任何欄位被填入
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.company_type.is_none()
            && self.location.is_none()
            && self.founded.is_none()
            && self.focus_areas.is_none()
            && self.description.is_none()
            && self.team_size.is_none()
            && self.team_members.is_none()
            && self.notable_investments.is_none()
            && self.stage.is_none()
            && self.ticket_size.is_none()
    }

    /// 依 RECORD_HEADER 順序展開成一列字串（缺漏欄位為空字串）
    pub fn to_row(&self) -> Vec<String> {
        let cell = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            cell(&self.company_name),
            cell(&self.company_type),
            cell(&self.location),
            cell(&self.founded),
            cell(&self.focus_areas),
            cell(&self.description),
            cell(&self.team_size),
            cell(&self.team_members),
            cell(&self.notable_investments),
            cell(&self.stage),
            cell(&self.ticket_size),
        ]
    }
}

/// 一張工作表：標題列加資料列，所有儲存格皆為字串
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// 依標題名稱找欄位索引
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// 找欄位索引，不存在時在最右側新增一欄
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.header.push(name.to_string());
        self.header.len() - 1
    }

    /// 將一列補齊到至少 width 個儲存格
    pub fn pad_row(row: &mut Vec<String>, width: usize) {
        while row.len() < width {
            row.push(String::new());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pipeline 的 extract 階段輸出：文字區塊或工作表列
#[derive(Debug, Clone)]
pub enum Batch {
    Blocks(Vec<RawBlock>),
    Rows(Sheet),
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Batch::Blocks(blocks) => blocks.len(),
            Batch::Rows(sheet) => sheet.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// transform 階段的輸出：結果工作表與執行統計
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub sheet: Sheet,
    pub summary: RunSummary,
}

/// 單次執行的統計，批次結束時印出
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} failed, {} warnings",
            self.processed, self.skipped, self.failed, self.warnings
        )
    }
}
