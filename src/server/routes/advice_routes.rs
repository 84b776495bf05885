//! Advice generation endpoint

use super::{get_opt_arg, parse_args};
use crate::error::AdviceError;
use crate::server::ServerAppState;
use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};

/// Successful response of `POST /generate-advice`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAdviceResponse {
    pub advice: String,
}

/// `POST /generate-advice` with body `{"problem": string}`
///
/// The body is taken raw so an unparseable payload is reported as a
/// processing failure instead of axum's default rejection.
pub async fn generate_advice(
    State(state): State<ServerAppState>,
    body: Bytes,
) -> Result<Json<GenerateAdviceResponse>, AdviceError> {
    let problem = parse_args(&body)
        .and_then(|args| get_opt_arg::<String>(&args, "problem"))
        .map_err(|e| {
            log::error!("Error processing advice request: {}", e);
            AdviceError::Unexpected(e)
        })?
        .unwrap_or_default();

    let advice = state.advice.handle(&problem).await?;
    Ok(Json(GenerateAdviceResponse { advice }))
}
