use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::game::GameError;
use crate::position::CellAddress;
use crate::protocol::{BoardUpdate, MoveMessage, RoomId, RoomSnapshot};
use crate::room::{RoomError, RoomRegistry};
use crate::rules::Rules;

#[derive(Clone)]
pub struct AppState {
    rooms: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(rules: Rules) -> Self {
        AppState {
            rooms: Arc::new(RoomRegistry::new(rules)),
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        let status = match &self {
            RoomError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            RoomError::Game(GameError::NotYourTurn | GameError::GameOver) => StatusCode::CONFLICT,
            RoomError::Game(_) => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string()
            })),
        )
            .into_response()
    }
}

async fn create_room(State(app_state): State<AppState>) -> (StatusCode, Json<RoomSnapshot>) {
    (StatusCode::CREATED, Json(app_state.rooms.create_room()))
}

async fn get_room(
    State(app_state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomSnapshot>, RoomError> {
    Ok(Json(app_state.rooms.snapshot(room_id)?))
}

#[axum::debug_handler]
async fn make_move(
    State(app_state): State<AppState>,
    Json(message): Json<MoveMessage>,
) -> Result<Json<BoardUpdate>, RoomError> {
    Ok(Json(app_state.rooms.submit(&message)?))
}

async fn available_moves(
    State(app_state): State<AppState>,
    Path((room_id, cell)): Path<(RoomId, String)>,
) -> Response {
    let Ok(from) = cell.parse::<CellAddress>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("{:?} is not a board cell", cell)
            })),
        )
            .into_response();
    };

    match app_state.rooms.available_moves(room_id, from) {
        Ok(cells) => {
            let cells: Vec<String> = cells.iter().map(|cell| cell.to_string()).collect();
            Json(cells).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/:room_id", get(get_room))
        .route("/api/rooms/:room_id/moves/:cell", get(available_moves))
        .route("/api/move", post(make_move))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

pub async fn run_server(addr: SocketAddr, rules: Rules) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(rules));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("room server listening at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn new_room(app: &Router) -> u64 {
        let (status, body) = send(app, "POST", "/api/rooms", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["roomId"].as_u64().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch_room() {
        let app = router(AppState::new(Rules::default()));
        let room_id = new_room(&app).await;

        let (status, body) = send(&app, "GET", &format!("/api/rooms/{}", room_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activeColor"], "red");
        assert_eq!(body["winner"], Value::Null);
        assert_eq!(body["moves"], json!([]));
        assert!(body["boardStatus"].as_str().unwrap().starts_with("00r_01h"));
    }

    #[tokio::test]
    async fn test_move_round() {
        let app = router(AppState::new(Rules::default()));
        let room_id = new_room(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/move",
            Some(json!({ "roomId": room_id, "fromColor": "red", "move": "60_50" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nextTurnColor"], "black");
        assert!(body["boardStatus"].as_str().unwrap().contains("50P"));

        let (_, room) = send(&app, "GET", &format!("/api/rooms/{}", room_id), None).await;
        assert_eq!(room["moves"], json!(["60_50"]));
    }

    #[tokio::test]
    async fn test_rejected_moves() {
        let app = router(AppState::new(Rules::default()));
        let room_id = new_room(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/move",
            Some(json!({ "roomId": room_id, "fromColor": "black", "move": "30_40" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Not your turn");

        let (status, _) = send(
            &app,
            "POST",
            "/api/move",
            Some(json!({ "roomId": room_id, "fromColor": "red", "move": "60_40" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/move",
            Some(json!({ "roomId": 999, "fromColor": "red", "move": "60_50" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_available_moves() {
        let app = router(AppState::new(Rules::default()));
        let room_id = new_room(&app).await;

        let (status, body) = send(&app, "GET", &format!("/api/rooms/{}/moves/91", room_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["70", "72"]));

        let (status, _) = send(&app, "GET", &format!("/api/rooms/{}/moves/99", room_id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/rooms/999/moves/91", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
