use clap::Parser;
use payment_dispatch::config::cli::load_credentials;
use payment_dispatch::utils::error::{DispatchError, ErrorSeverity};
use payment_dispatch::utils::logger;
use payment_dispatch::{
    CliConfig, DeletionOutcome, PaymentDispatcher, PaymentId, ProviderRegistry, RegistryConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    let registry_config = match RegistryConfig::from_file(&config.config) {
        Ok(registry_config) => registry_config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", config.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(exit_code(&e));
        }
    };

    // 初始化日誌
    if registry_config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(&config, &registry_config).await {
        tracing::error!(
            "❌ Payment deletion failed: {} (Category: {:?}, Severity: {:?}, Retryable: {})",
            e,
            e.category(),
            e.severity(),
            e.is_retryable()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }
}

async fn run(config: &CliConfig, registry_config: &RegistryConfig) -> Result<(), DispatchError> {
    let registry = Arc::new(ProviderRegistry::from_config(registry_config)?);
    let dispatcher = PaymentDispatcher::new(registry);
    let credentials = load_credentials(&config.credentials)?;
    let payment_id = PaymentId::new(config.payment_id.clone());

    if config.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the provider will not be contacted");
        let supported = dispatcher.supports_deletion(&credentials).await?;
        println!(
            "Provider '{}' {} payment deletion",
            credentials.dir_name().unwrap_or("<none>"),
            if supported { "supports" } else { "does not support" }
        );
        return Ok(());
    }

    let outcome = dispatcher.dispatch_delete(&payment_id, &credentials).await?;
    match outcome {
        DeletionOutcome::Deleted => println!("✅ Payment {} deleted", payment_id),
        DeletionOutcome::Declined => {
            println!("⚠️  Provider declined to delete payment {}", payment_id)
        }
        DeletionOutcome::Unavailable(reason) => {
            println!("⚠️  Payment {} cannot be deleted at its provider: {}", payment_id, reason)
        }
    }
    println!("{}", serde_json::to_string(&outcome)?);

    Ok(())
}

fn exit_code(e: &DispatchError) -> i32 {
    match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
