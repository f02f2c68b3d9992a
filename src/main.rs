use clap::Parser;
use persian_mcq::utils::error::{ErrorSeverity, McqError};
use persian_mcq::utils::monitor::SystemMonitor;
use persian_mcq::utils::{logger, validation::Validate};
use persian_mcq::{CandleGenerator, CliConfig, LocalStorage, McqEngine, McqPipeline};

fn exit_with(e: &McqError, context: &str) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 不支援的 --model-name 在這裡就會被 clap 拒絕
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting persian-mcq");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        exit_with(&e, "Configuration validation failed");
    }

    let file_config = match config.load_toml() {
        Ok(file_config) => file_config,
        Err(e) => exit_with(&e, "Failed to load config file"),
    };
    if let Some(file_config) = &file_config {
        if let Err(e) = file_config.validate() {
            exit_with(&e, "Configuration validation failed");
        }
    }

    let params = config.generation_params(file_config.as_ref());
    if let Err(e) = params.validate() {
        exit_with(&e, "Configuration validation failed");
    }
    let options = config.model_options(file_config.as_ref());
    tracing::debug!("Generation params: {:?}, model options: {:?}", params, options);

    let kind = config.model_name;
    let load_monitor = SystemMonitor::new(config.monitor);
    tracing::info!("Starting to load the model {} into memory", kind);
    let generator = match CandleGenerator::load(kind, &options, params) {
        Ok(generator) => generator,
        Err(e) => exit_with(&e, "Model loading failed"),
    };
    tracing::info!("Successfully loaded the model {} into memory", kind);
    load_monitor.log_stats("Model load");

    let monitor_enabled = config.monitor;
    let pipeline = McqPipeline::new(LocalStorage::current_dir(), config, generator);
    let engine = McqEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!(
                "✅ Wrote {} of {} rows ({} failed, {} unparsed)",
                summary.written_rows,
                summary.input_rows,
                summary.failed_rows,
                summary.unparsed_rows
            );
            println!("Generated output saved to {}", summary.output_path);
        }
        Err(e) => exit_with(&e, "MCQ generation failed"),
    }

    Ok(())
}
