use clap::Parser;
use engagement_etl::config::Command;
use engagement_etl::core::report::normalize_count;
use engagement_etl::utils::error::ErrorSeverity;
use engagement_etl::utils::{logger, validation::Validate};
use engagement_etl::{
    CliArgs, EtlEngine, EtlError, LocalStorage, ReportExporter, ReportRequest, ReportService,
    TomlConfig, VkClient,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting engagement-etl");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    if let Err(e) = run(args).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 2,
            ErrorSeverity::Medium => 3,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 4,
        };
        std::process::exit(exit_code);
    }
}

async fn run(args: CliArgs) -> Result<(), EtlError> {
    let mut config = TomlConfig::from_file(&args.config)?;
    if let Some(output) = &args.output {
        config.load.output_path = output.clone();
        tracing::info!("🔧 Output path overridden to: {}", output);
    }
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated successfully");

    let source = Arc::new(VkClient::new(config.client_options())?);
    let service = ReportService::bootstrap(
        source,
        &config.source.community,
        &config.roster.employees,
        config.report_settings(),
    )
    .await?;
    let storage = LocalStorage::new(config.load.output_path.clone());
    tracing::info!("📂 Reports will be written to {}", storage.base_path().display());
    let exporter = ReportExporter::new(storage);
    let engine = EtlEngine::new(service, exporter);

    let request = match args.command {
        Command::Activity { posts } => ReportRequest::Activity {
            count: normalize_count(posts),
        },
        Command::Posts { posts } => ReportRequest::Posts {
            count: normalize_count(posts),
        },
        Command::Range { from, to } => ReportRequest::Range { from, to },
        Command::Session => return run_session(&engine).await,
    };

    if let Some(file) = engine.run(&request).await? {
        println!("✅ Report saved to {}/{}", config.load.output_path, file);
    }
    Ok(())
}

/// 每行一個指令，整個 session 共用同一份快取
async fn run_session(engine: &EtlEngine<VkClient, LocalStorage>) -> Result<(), EtlError> {
    let service = engine.service();
    println!(
        "📊 {} (ID: {}), {} employees",
        service.community().name,
        service.community().id,
        service.roster().len()
    );
    println!("Commands: activity [n] | posts [n] | range <from> <to> | clear | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "quit" | "exit") {
            break;
        }

        let request = match ReportRequest::parse(line) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("❌ {}", e);
                continue;
            }
        };

        match engine.run(&request).await {
            Ok(Some(file)) => println!("✅ {}", file),
            Ok(None) => println!("🗑️ cache cleared"),
            // session 中的錯誤不中斷，只回報
            Err(e) if e.is_transient() => {
                eprintln!("❌ {} (temporary, run the same command again)", e.user_friendly_message())
            }
            Err(e) => eprintln!("❌ {} ({})", e.user_friendly_message(), e.recovery_suggestion()),
        }
    }

    tracing::info!(
        "👋 Session finished, {} cache entries held",
        service.cached_entries()
    );
    Ok(())
}
