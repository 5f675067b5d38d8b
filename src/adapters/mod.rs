// Adapters layer: the installed payment providers and the loader that builds them from configuration.

pub mod http_gateway;
pub mod loader;
pub mod static_provider;

pub use loader::ConfiguredProviderLoader;
