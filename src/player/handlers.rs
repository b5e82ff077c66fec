use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use super::models::{Player, PlayerRequest};
use crate::shared::{AppError, AppState};

/// GET /players
#[instrument(name = "list_players", skip(state))]
pub async fn list_players(State(state): State<AppState>) -> Json<Vec<Player>> {
    Json(state.service.list_players().await)
}

/// POST /players
///
/// Registers a player; names are trimmed and must be unique ignoring case
#[instrument(name = "create_player", skip(state, request))]
pub async fn create_player(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> Result<(StatusCode, Json<Player>), AppError> {
    let player = state
        .service
        .create_player(&request.name, request.photo)
        .await?;

    info!(player_id = %player.id, name = %player.name, "Player created");
    Ok((StatusCode::CREATED, Json(player)))
}

/// GET /players/:id
#[instrument(name = "get_player", skip(state))]
pub async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<Player>, AppError> {
    Ok(Json(state.service.get_player(&player_id).await?))
}

/// PUT /players/:id
#[instrument(name = "update_player", skip(state, request))]
pub async fn update_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> Result<Json<Player>, AppError> {
    let player = state
        .service
        .update_player(&player_id, &request.name, request.photo)
        .await?;
    Ok(Json(player))
}

/// DELETE /players/:id
///
/// Past games keep their own copy of the player
#[instrument(name = "delete_player", skip(state))]
pub async fn delete_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<Player>, AppError> {
    Ok(Json(state.service.delete_player(&player_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::{body_json, memory_state};
    use axum::{
        body::Body,
        http::Request,
        routing::{get, post},
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt; // for `oneshot`

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/players", post(create_player).get(list_players))
            .route(
                "/players/:id",
                get(get_player).put(update_player).delete(delete_player),
            )
            .with_state(state)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch_player() {
        let state = memory_state().await;

        let response = router(state.clone())
            .oneshot(json_request("POST", "/players", json!({ "name": "  Ana " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["name"], "Ana");
        assert_eq!(created["gamesPlayed"], 0);

        let uri = format!("/players/{}", created["id"].as_str().unwrap());
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let state = memory_state().await;
        state.service.create_player("Ana", None).await.unwrap();

        let response = router(state)
            .oneshot(json_request("POST", "/players", json!({ "name": "ana" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn test_delete_missing_player() {
        let state = memory_state().await;

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/players/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
