use clap::Parser;
use investor_etl::config::credentials;
use investor_etl::core::openai::EnrichmentClient;
use investor_etl::utils::{logger, validation};
use investor_etl::{EnrichMode, EnrichOptions, EnrichPipeline, EtlEngine, LocalStorage};

#[derive(Parser)]
#[command(name = "enrich")]
#[command(about = "Enrich Excel investor data with AI research")]
struct Args {
    /// Input Excel filename (e.g. Investors2025.xlsx)
    filename: String,

    /// Research mode
    #[arg(long, value_enum, default_value = "investors")]
    mode: EnrichMode,

    /// Directory for the generated workbook
    #[arg(long = "output", default_value = "./Results")]
    output_dir: String,

    /// Delay in seconds between AI service calls
    #[arg(long, default_value = "2.0")]
    delay: f64,

    /// First data row to process (1-based)
    #[arg(long, default_value = "1")]
    start_row: usize,

    /// Maximum number of rows to process (for testing)
    #[arg(long)]
    max_rows: Option<usize>,

    /// Print detailed progress and results
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
    tracing::info!("🚀 Starting investor data enrichment");
    tracing::info!("Input file: {}", args.filename);

    if let Err(e) = validation::validate_delay("delay", args.delay)
        .and_then(|_| validation::validate_positive_number("start_row", args.start_row, 1))
    {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 這個工具整批都靠 AI 服務，沒金鑰直接終止
    let api_key = match credentials::openai_api_key() {
        Some(key) => {
            println!(
                "✅ OpenAI API key loaded ({})",
                credentials::describe_key(&key)
            );
            key
        }
        None => {
            let e = investor_etl::EtlError::MissingCredentialError {
                name: credentials::OPENAI_API_KEY.to_string(),
            };
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    let options = EnrichOptions {
        input: args.filename,
        output_dir: args.output_dir.clone(),
        mode: args.mode,
        delay: args.delay.max(0.0),
        start_row: args.start_row,
        max_rows: args.max_rows,
        verbose: args.verbose,
    };

    let storage = LocalStorage::new(args.output_dir);
    let pipeline = EnrichPipeline::new(storage, options, EnrichmentClient::new(api_key));
    let engine = EtlEngine::new_with_monitoring(pipeline, args.monitor);

    match engine.run().await {
        Ok(report) => {
            println!("✅ Enrichment completed!");
            println!("📊 {}", report.summary);
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Enrichment failed: {} (Category: {:?}, Severity: {:?})",
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
