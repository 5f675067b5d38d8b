use crate::domain::model::PaymentAppCredentials;
use crate::utils::error::Result;
use std::path::Path;

/// Reads credentials given on the command line, either inline JSON or a path to a JSON file.
pub fn load_credentials(arg: &str) -> Result<PaymentAppCredentials> {
    let trimmed = arg.trim_start();
    if trimmed.starts_with('{') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let data = std::fs::read(Path::new(arg))?;
    Ok(serde_json::from_slice(&data)?)
}
