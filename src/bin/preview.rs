use anyhow::Context;
use clap::Parser;
use investor_etl::core::workbook;

#[derive(Parser)]
#[command(name = "preview")]
#[command(about = "Preview workbook structure and first few rows")]
struct Args {
    /// Excel filename to preview (e.g. Investors2025.xlsx)
    filename: String,

    /// Number of rows to preview
    #[arg(short, long, default_value = "3")]
    rows: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🚀 Workbook Preview Tool");
    println!("{}", "=".repeat(80));

    let bytes = std::fs::read(&args.filename)
        .with_context(|| format!("cannot read '{}'", args.filename))?;
    let sheet = workbook::read_sheet(&bytes)
        .with_context(|| format!("cannot parse '{}' as an xlsx workbook", args.filename))?;

    println!("📊 Reading workbook: {}", args.filename);
    println!("📈 Total rows: {}", sheet.rows.len());
    println!("📈 Total columns: {}", sheet.header.len());
    println!("📈 Column names: {:?}", sheet.header);
    println!("{}", "=".repeat(80));

    let preview_count = args.rows.min(sheet.rows.len());
    if sheet.rows.is_empty() {
        println!("⚠️ Workbook has a header but no data rows");
    } else {
        println!("🔍 First {} rows:", preview_count);
        println!("{}", "-".repeat(80));
        for (i, row) in sheet.rows.iter().take(preview_count).enumerate() {
            println!("Row {}:", i + 1);
            for (name, value) in sheet.header.iter().zip(row.iter()) {
                if !value.is_empty() {
                    println!("  {}: {}", name, value);
                }
            }
        }
        println!("{}", "-".repeat(80));

        // 標出預覽範圍內的空儲存格，方便快速檢查資料品質
        println!("\n🔍 Empty cells in first {} rows:", preview_count);
        for (i, row) in sheet.rows.iter().take(preview_count).enumerate() {
            let empty: Vec<&str> = sheet
                .header
                .iter()
                .zip(row.iter())
                .filter(|(_, value)| value.is_empty())
                .map(|(name, _)| name.as_str())
                .collect();
            if empty.is_empty() {
                println!("  Row {}: No empty cells", i + 1);
            } else {
                println!("  Row {}: {:?}", i + 1, empty);
            }
        }
    }

    println!("\n✅ Preview completed successfully!");
    Ok(())
}
