use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1_routes())
}

fn v1_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::judge::run_code))
        .routes(routes!(handlers::judge::submit_code))
        .routes(routes!(handlers::judge::get_submission))
        .routes(routes!(handlers::judge::cancel_submission))
        .routes(routes!(handlers::judge::health))
}
