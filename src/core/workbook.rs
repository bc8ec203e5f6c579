use std::io::{Cursor, Write};

use calamine::{DataType, Reader, Xlsx};
use zip::write::{FileOptions, ZipWriter};

use crate::domain::model::Sheet;
use crate::utils::error::{EtlError, Result};

/// 讀取 xlsx 位元組內容的第一張工作表，所有儲存格轉為字串
pub fn read_sheet(bytes: &[u8]) -> Result<Sheet> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook: Xlsx<_> = Xlsx::new(cursor)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::InputDataError {
            message: "No worksheet found in workbook".to_string(),
        })??;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in range.rows() {
        let row_values: Vec<String> = row
            .iter()
            .map(|cell| {
                cell.as_string()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("{}", cell))
            })
            .collect();
        rows.push(row_values);
    }

    if rows.is_empty() {
        return Err(EtlError::InputDataError {
            message: "Workbook does not contain any rows".to_string(),
        });
    }

    let header = rows.remove(0);
    let width = header.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));

    let mut sheet = Sheet::new(header);
    Sheet::pad_row(&mut sheet.header, width);
    for mut row in rows {
        Sheet::pad_row(&mut row, width);
        sheet.rows.push(row);
    }

    Ok(sheet)
}

/// 將工作表序列化成最小可用的 xlsx 壓縮包。
///
/// 只寫出五個必要的 OOXML 部件，所有儲存格以 inline string 表示，
/// 空儲存格省略。
pub fn write_sheet(sheet: &Sheet) -> Result<Vec<u8>> {
    let sheet_xml = build_sheet_xml(sheet);

    let content_types_xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>
"#;
    let rels_xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>
"#;
    let workbook_xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Sheet1" sheetId="1" r:id="rId1"/>
  </sheets>
</workbook>
"#;
    let workbook_rels_xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>
"#;

    let data = {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.start_file::<_, ()>("[Content_Types].xml", FileOptions::default())?;
        zip.write_all(content_types_xml.as_bytes())?;

        zip.start_file::<_, ()>("_rels/.rels", FileOptions::default())?;
        zip.write_all(rels_xml.as_bytes())?;

        zip.start_file::<_, ()>("xl/workbook.xml", FileOptions::default())?;
        zip.write_all(workbook_xml.as_bytes())?;

        zip.start_file::<_, ()>("xl/_rels/workbook.xml.rels", FileOptions::default())?;
        zip.write_all(workbook_rels_xml.as_bytes())?;

        zip.start_file::<_, ()>("xl/worksheets/sheet1.xml", FileOptions::default())?;
        zip.write_all(&sheet_xml)?;

        let cursor = zip.finish()?;
        cursor.into_inner()
    };

    Ok(data)
}

fn build_sheet_xml(sheet: &Sheet) -> Vec<u8> {
    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#.to_string(),
        concat!(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#
        )
        .to_string(),
        "  <sheetData>".to_string(),
    ];

    let all_rows = std::iter::once(&sheet.header).chain(sheet.rows.iter());
    for (row_idx, row) in all_rows.enumerate() {
        let row_ref = row_idx + 1;
        let mut cells_xml: Vec<String> = Vec::new();
        for (col_idx, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{}", column_index_to_letters(col_idx), row_ref);
            cells_xml.push(format!(
                "      <c r=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                cell_ref,
                escape_xml(value)
            ));
        }
        if cells_xml.is_empty() {
            lines.push(format!("    <row r=\"{}\"/>", row_ref));
        } else {
            lines.push(format!("    <row r=\"{}\">", row_ref));
            lines.extend(cells_xml);
            lines.push("    </row>".to_string());
        }
    }

    lines.push("  </sheetData>".to_string());
    lines.push("</worksheet>".to_string());
    lines.join("\n").into_bytes()
}

/// 0 起算的欄位索引轉 Excel 欄位字母（0 → A, 26 → AA）
pub fn column_index_to_letters(index: usize) -> String {
    let mut result = String::new();
    let mut current = index + 1;
    while current > 0 {
        let remainder = (current - 1) % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        current = (current - 1) / 26;
    }
    result
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `<prefix>_<YYYYMMDD_HHMMSS>.xlsx`，同一前綴的多次執行不會互相覆蓋
pub fn timestamped_filename(prefix: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.xlsx", prefix, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> Sheet {
        let mut sheet = Sheet::new(vec![
            "Company Name".to_string(),
            "Location".to_string(),
            "Notes".to_string(),
        ]);
        sheet.rows.push(vec![
            "Acme Ventures".to_string(),
            "Helsinki".to_string(),
            "a & b <c>".to_string(),
        ]);
        sheet.rows.push(vec![
            "Beta Fund".to_string(),
            String::new(),
            "second".to_string(),
        ]);
        sheet
    }

    #[test]
    fn written_workbook_reads_back() {
        let sheet = sample_sheet();
        let bytes = write_sheet(&sheet).unwrap();
        let read_back = read_sheet(&bytes).unwrap();

        assert_eq!(read_back.header, sheet.header);
        assert_eq!(read_back.rows.len(), 2);
        assert_eq!(read_back.rows[0][0], "Acme Ventures");
        // XML 跳脫字元要能還原
        assert_eq!(read_back.rows[0][2], "a & b <c>");
        // 空儲存格讀回為空字串且不影響欄位對齊
        assert_eq!(read_back.rows[1][1], "");
        assert_eq!(read_back.rows[1][2], "second");
    }

    #[test]
    fn row_order_is_preserved() {
        let mut sheet = Sheet::new(vec!["N".to_string()]);
        for i in 0..10 {
            sheet.rows.push(vec![format!("row-{}", i)]);
        }
        let bytes = write_sheet(&sheet).unwrap();
        let read_back = read_sheet(&bytes).unwrap();
        let values: Vec<&str> = read_back.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(
            values,
            (0..10).map(|i| format!("row-{}", i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_index_to_letters(0), "A");
        assert_eq!(column_index_to_letters(3), "D");
        assert_eq!(column_index_to_letters(25), "Z");
        assert_eq!(column_index_to_letters(26), "AA");
        assert_eq!(column_index_to_letters(27), "AB");
    }

    #[test]
    fn timestamped_filename_has_prefix_and_extension() {
        let name = timestamped_filename("LinkedIn_Bios");
        assert!(name.starts_with("LinkedIn_Bios_"));
        assert!(name.ends_with(".xlsx"));
        // LinkedIn_Bios_YYYYMMDD_HHMMSS.xlsx
        assert_eq!(name.len(), "LinkedIn_Bios_".len() + 15 + ".xlsx".len());
    }

    #[test]
    fn reading_garbage_fails_cleanly() {
        let err = read_sheet(b"not a zip at all").unwrap_err();
        assert!(matches!(err, EtlError::WorkbookError(_)));
    }
}
