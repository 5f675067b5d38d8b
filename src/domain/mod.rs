// Domain layer: core models and ports (interfaces) shared by the registry, dispatcher and providers.

pub mod model;
pub mod ports;
