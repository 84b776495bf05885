//! HTTP route handlers
//!
//! - advice_routes: `POST /generate-advice`
//! - feed_routes: REST access to the advice feed under `/api/advices`

pub mod advice_routes;
pub mod feed_routes;

use serde_json::Value;

/// Parse a raw request body as a JSON object
pub fn parse_args(body: &[u8]) -> Result<Value, String> {
    let args: Value =
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON body: {}", e))?;
    if !args.is_object() {
        return Err("Request body must be a JSON object".to_string());
    }
    Ok(args)
}

/// Extract an optional argument from JSON args
pub fn get_opt_arg<T: serde::de::DeserializeOwned>(
    args: &Value,
    name: &str,
) -> Result<Option<T>, String> {
    match args.get(name) {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| format!("Invalid argument {}: {}", name, e)),
        _ => Ok(None),
    }
}

/// Extract a required argument from JSON args
pub fn get_arg<T: serde::de::DeserializeOwned>(args: &Value, name: &str) -> Result<T, String> {
    get_opt_arg(args, name)?.ok_or_else(|| format!("Missing argument: {}", name))
}
