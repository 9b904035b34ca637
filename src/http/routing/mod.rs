pub mod todos;

use axum::Router;
use tower_http::trace::TraceLayer;

pub fn app(router: Router) -> Router {
    Router::new()
        .merge(router)
        .layer(TraceLayer::new_for_http())
}
