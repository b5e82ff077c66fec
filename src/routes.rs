use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::shared::AppState;
use crate::{game, history, player, settings, spectator, stats, storage};

async fn health() -> &'static str {
    "ok"
}

/// Full HTTP surface: JSON API plus the spectator WebSocket
pub fn app_router(state: AppState) -> Router {
    let players = Router::new()
        .route(
            "/players",
            get(player::handlers::list_players).post(player::handlers::create_player),
        )
        .route(
            "/players/:id",
            get(player::handlers::get_player)
                .put(player::handlers::update_player)
                .delete(player::handlers::delete_player),
        )
        .route("/players/:id/stats", get(stats::handlers::player_stats));

    let games = Router::new()
        .route("/games/domino", post(game::handlers::start_domino_game))
        .route("/games/rummy", post(game::handlers::start_rummy_game))
        .route(
            "/games/current",
            get(game::handlers::current_game).delete(game::handlers::abandon_game),
        )
        .route("/games/current/finish", post(game::handlers::finish_game))
        .route("/games/current/domino", get(game::handlers::domino_view))
        .route(
            "/games/current/domino/scores",
            put(game::handlers::set_domino_score),
        )
        .route("/games/current/domino/next", post(game::handlers::next_round))
        .route(
            "/games/current/domino/previous",
            post(game::handlers::previous_round),
        )
        .route("/games/current/rummy", get(game::handlers::rummy_view))
        .route(
            "/games/current/rummy/rounds",
            post(game::handlers::commit_rummy_round),
        )
        .route(
            "/games/current/rummy/standings",
            post(game::handlers::live_standings),
        )
        .route("/games/current/rummy/turn", post(game::handlers::next_turn))
        .route(
            "/games/current/rummy/timer/start",
            post(game::handlers::start_timer),
        )
        .route(
            "/games/current/rummy/timer/stop",
            post(game::handlers::stop_timer),
        )
        .route(
            "/games/current/rummy/timer/toggle",
            post(game::handlers::toggle_timer),
        );

    let history = Router::new()
        .route("/history", get(history::handlers::list_history))
        .route(
            "/history/:id",
            get(history::handlers::get_history_entry).delete(history::handlers::delete_history_entry),
        )
        .route("/history/:id/resume", post(history::handlers::resume_game));

    let preferences = Router::new()
        .route("/settings", get(settings::handlers::get_settings))
        .route("/settings/theme", put(settings::handlers::set_theme))
        .route(
            "/settings/toggle/:key",
            post(settings::handlers::toggle_setting),
        )
        .route("/onboarding", get(settings::handlers::onboarding_status))
        .route(
            "/onboarding/complete",
            post(settings::handlers::complete_onboarding),
        );

    let data = Router::new()
        .route(
            "/backup",
            get(storage::handlers::export_backup).post(storage::handlers::import_backup),
        )
        .route("/backup/reset", post(storage::handlers::factory_reset));

    let spectators = Router::new()
        .route("/spectate", post(spectator::start_session))
        .route("/spectate/:code", get(spectator::spectate));

    Router::new()
        .route("/health", get(health))
        .merge(players)
        .merge(games)
        .merge(history)
        .merge(preferences)
        .merge(data)
        .merge(spectators)
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
