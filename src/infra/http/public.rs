use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    application::carousel::CarouselService,
    infra::db::PostgresRepositories,
    presentation::views::{CarouselTemplate, CarouselView, render_template},
};

use super::{
    conditional::cacheable_html,
    db_health_response,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub carousel: Arc<CarouselService>,
    pub db: Arc<PostgresRepositories>,
    /// Prefix for stored file names, without a trailing slash.
    pub asset_base_url: Arc<str>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/carousel", get(carousel))
        .route("/_health/db", get(public_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn carousel(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let entries = match state.carousel.load().await {
        Ok(entries) => entries,
        Err(err) => return err.into_response(),
    };

    let view = CarouselView::from_entries(&entries, &state.asset_base_url);
    let body = match render_template(&CarouselTemplate { view }) {
        Ok(body) => body,
        Err(err) => return err.into_response(),
    };

    cacheable_html(&headers, body, state.carousel.cache_config().ttl_secs())
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}
