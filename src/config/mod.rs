pub mod cli;
pub mod toml_config;

pub use toml_config::{HttpGatewayConfig, ProviderConfig, ProviderKind, RegistryConfig};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "payment-dispatch")]
#[command(about = "Delete a payment at the provider that created it")]
pub struct CliConfig {
    /// Path to the provider registry TOML file
    #[arg(short, long, default_value = "providers.toml")]
    pub config: String,

    /// Identifier of the payment to delete
    #[arg(long)]
    pub payment_id: String,

    /// Stored app credentials: a JSON file path or an inline JSON document
    #[arg(long)]
    pub credentials: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Only report whether the provider supports deletion
    #[arg(long)]
    pub dry_run: bool,
}
