//! Live feed over WebSocket
//!
//! Each connection subscribes to the feed store and receives a full
//! `{"order", "advices"}` snapshot on connect and after every change.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};

use super::routes::feed_routes::FeedQuery;
use super::ServerAppState;
use crate::models::{FeedOrder, FeedSnapshot};

/// WebSocket upgrade handler for `GET /ws/feed`
pub async fn ws_feed_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<FeedQuery>,
    State(state): State<ServerAppState>,
) -> Response {
    let order = match query.feed_order() {
        Ok(order) => order,
        Err(response) => return response,
    };
    ws.on_upgrade(move |socket| handle_websocket(socket, state, order))
        .into_response()
}

/// Handle a WebSocket connection
async fn handle_websocket(socket: WebSocket, state: ServerAppState, order: FeedOrder) {
    let (mut sender, mut receiver) = socket.split();

    let mut subscription = match state.feed.subscribe(order).await {
        Ok(subscription) => subscription,
        Err(e) => {
            log::error!("Failed to subscribe to feed: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    log::info!("Feed client connected (order: {})", order);

    // Forward snapshots to this client
    let send_task = tokio::spawn(async move {
        while let Some(advices) = subscription.next().await {
            let snapshot = FeedSnapshot { order, advices };
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to serialize feed snapshot: {}", e);
                }
            }
        }
        subscription.unsubscribe();
    });

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                log::info!("Feed client disconnected");
                break;
            }
            Ok(Message::Text(text)) => {
                log::debug!("Ignoring feed client message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("WebSocket error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    log::info!("Feed connection closed");
}
