use axum::{
    routing::{get, post},
    Router,
};

pub mod predict;
pub mod system;

/// Router for probe and inference endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/", get(system::health).fallback(system::method_not_allowed))
        .route("/health", get(system::health).fallback(system::method_not_allowed))
        .route("/ready", get(system::ready).fallback(system::method_not_allowed))
        .route("/predict", post(predict::predict).fallback(system::method_not_allowed))
        .route(
            "/predict_multiple",
            post(predict::predict_multiple).fallback(system::method_not_allowed),
        )
}
