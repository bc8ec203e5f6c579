use clap::Parser;
use investor_etl::config::credentials;
use investor_etl::core::openai::EnrichmentClient;
use investor_etl::utils::{logger, validation};
use investor_etl::{BioOptions, BioPipeline, EtlEngine, LocalStorage};

#[derive(Parser)]
#[command(name = "fetch-bios")]
#[command(about = "Fetch profile bios from LinkedIn URLs stored in an Excel workbook")]
struct Args {
    /// Path to the input Excel workbook
    #[arg(long, default_value = "./LinkedIN.xlsx")]
    input: String,

    /// Directory for the generated workbook
    #[arg(long = "output", default_value = "./Results")]
    output_dir: String,

    /// Delay in seconds between HTTP requests
    #[arg(long, default_value = "0.0")]
    delay: f64,

    /// Enable AI background check for each profile (needs OPENAI_API_KEY)
    #[arg(long)]
    bg: bool,

    /// Enable AI company lookup for each profile (needs OPENAI_API_KEY)
    #[arg(long)]
    company: bool,

    /// Print per-row results to the terminal
    #[arg(short, long)]
    verbose: bool,

    /// Enable system resource monitoring
    #[arg(long)]
    monitor: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("🚀 Starting LinkedIn bio fetcher");

    if let Err(e) = validation::validate_delay("delay", args.delay) {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 金鑰只在啟用 AI 功能時需要；缺了照樣抓 bio，AI 欄位標記 skipped
    let api_key = credentials::openai_api_key();
    match &api_key {
        Some(key) => {
            tracing::info!("✅ OpenAI API key loaded ({})", credentials::describe_key(key));
        }
        None => {
            tracing::info!("No OpenAI API key found in environment or .env file");
            if args.bg {
                tracing::warn!("⚠️ Background check requested but no API key available");
            }
            if args.company {
                tracing::warn!("⚠️ Company lookup requested but no API key available");
            }
        }
    }

    let client = api_key.map(EnrichmentClient::new);
    let options = BioOptions {
        input: args.input,
        output_dir: args.output_dir.clone(),
        delay: args.delay.max(0.0),
        background_check: args.bg,
        company_lookup: args.company,
        verbose: args.verbose,
    };

    let storage = LocalStorage::new(args.output_dir.clone());
    let pipeline = BioPipeline::new(storage, options, client);
    let engine = EtlEngine::new_with_monitoring(pipeline, args.monitor);

    match engine.run().await {
        Ok(report) => {
            println!("✅ Bio fetching completed!");
            println!("📊 {}", report.summary);
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Bio fetching failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
