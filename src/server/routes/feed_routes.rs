//! Feed endpoints under `/api/advices`

use super::{get_arg, get_opt_arg, parse_args};
use crate::error::{ErrorBody, StoreError};
use crate::models::{AdviceRecord, FeedOrder, NewAdvice, VibeLevel};
use crate::server::ServerAppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// `?order=latest|popular`, latest when absent
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub order: Option<String>,
}

impl FeedQuery {
    pub fn feed_order(&self) -> Result<FeedOrder, Response> {
        match &self.order {
            None => Ok(FeedOrder::default()),
            Some(raw) => raw.parse().map_err(|e: String| {
                let body = ErrorBody {
                    error: "Invalid feed order".to_string(),
                    details: Some(e),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub votes: u64,
}

/// `GET /api/advices`
pub async fn list_advices(
    State(state): State<ServerAppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<AdviceRecord>>, Response> {
    let order = query.feed_order()?;
    let advices = state
        .feed
        .list(order)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(advices))
}

/// `POST /api/advices` with `{problem, advice, vibeLevel?}`
pub async fn create_advice(
    State(state): State<ServerAppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedResponse>), StoreError> {
    let advice = parse_new_advice(&body).map_err(StoreError::InvalidRecord)?;
    let id = state.feed.append(advice).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

fn parse_new_advice(body: &[u8]) -> Result<NewAdvice, String> {
    let args = parse_args(body)?;
    let problem: String = get_arg(&args, "problem")?;
    let advice: String = get_arg(&args, "advice")?;
    let vibe_level: Option<VibeLevel> = get_opt_arg(&args, "vibeLevel")?;

    Ok(NewAdvice {
        problem,
        advice,
        vibe_level: vibe_level.unwrap_or_else(VibeLevel::random),
    })
}

/// `GET /api/advices/:id`
pub async fn get_advice(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Json<AdviceRecord>, StoreError> {
    state
        .feed
        .get(&id)
        .await?
        .map(Json)
        .ok_or(StoreError::NotFound(id))
}

/// `POST /api/advices/:id/vote`
pub async fn vote_advice(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Json<VoteResponse>, StoreError> {
    state.feed.increment_vote(&id).await?;
    let record = state
        .feed
        .get(&id)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;

    log::debug!("Advice {} now has {} votes", id, record.votes);
    Ok(Json(VoteResponse {
        votes: record.votes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new_advice_rolls_missing_vibe() {
        let advice = parse_new_advice(br#"{"problem": "p", "advice": "a"}"#).unwrap();
        assert!((VibeLevel::MIN..=VibeLevel::MAX).contains(&advice.vibe_level.value()));
    }

    #[test]
    fn test_parse_new_advice_keeps_given_vibe() {
        let advice =
            parse_new_advice(br#"{"problem": "p", "advice": "a", "vibeLevel": 5}"#).unwrap();
        assert_eq!(advice.vibe_level.value(), 5);
    }

    #[test]
    fn test_parse_new_advice_rejects_bad_input() {
        assert!(parse_new_advice(br#"{"problem": "p"}"#).is_err());
        assert!(parse_new_advice(br#"{"problem": "p", "advice": "a", "vibeLevel": 9}"#).is_err());
    }

    #[test]
    fn test_feed_query_parsing() {
        let query = FeedQuery {
            order: Some("popular".to_string()),
        };
        assert_eq!(query.feed_order().ok(), Some(FeedOrder::Popular));
        assert_eq!(FeedQuery::default().feed_order().ok(), Some(FeedOrder::Latest));

        let query = FeedQuery {
            order: Some("random".to_string()),
        };
        let response = query.feed_order().unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
