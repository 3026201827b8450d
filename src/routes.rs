// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    error::expose_error_detail,
    handlers::{advisor, auth, community, persona, products, profile, services, video},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Every sub-router has a public part and a part behind the bearer-token middleware.
/// * Uploaded files are served under `/media`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let account_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route(
                    "/profile/{username}",
                    get(profile::get_profile)
                        .put(profile::update_profile)
                        .delete(profile::delete_profile),
                )
                .route_layer(require_auth.clone()),
        );

    let article_routes = Router::new()
        .route("/", get(community::list_articles))
        .route("/{id}", get(community::get_article))
        .merge(
            Router::new()
                .route("/", post(community::create_article))
                .route(
                    "/{id}",
                    put(community::update_article).delete(community::delete_article),
                )
                .route("/{id}/comments", post(community::create_comment))
                .route(
                    "/comments/{id}",
                    put(community::update_comment).delete(community::delete_comment),
                )
                .route_layer(require_auth.clone()),
        );

    let product_routes = Router::new()
        .route("/", get(products::list_products))
        .route("/refresh", post(products::refresh_products))
        .route("/status", get(products::catalog_status))
        .route("/{id}", get(products::get_product))
        .merge(
            Router::new()
                .route("/{id}/like", post(products::toggle_like))
                .route("/{id}/join", post(products::toggle_join))
                .route("/liked", get(products::liked_products))
                .route("/joined", get(products::joined_products))
                .route("/analyze", post(advisor::analyze))
                .route("/portfolio/latest", get(advisor::latest_portfolio))
                .route("/ai-recommend", post(advisor::ai_recommend))
                .route("/recommend", get(advisor::cohort_recommend))
                .route_layer(require_auth.clone()),
        );

    let animal_routes = Router::new()
        .route("/questions", get(persona::list_questions))
        .merge(
            Router::new()
                .route("/submit", post(persona::submit))
                .route_layer(require_auth.clone()),
        );

    let service_routes = Router::new()
        .route("/market-indices", get(services::market_indices))
        .route("/bank-search", get(services::bank_search))
        .route("/route", get(services::route))
        .route("/ai-consult", post(advisor::consult));

    let video_routes = Router::new()
        .route("/search", get(video::search))
        .route("/video", get(video::video))
        .merge(
            Router::new()
                .route("/bookmark", post(video::toggle_bookmark))
                .route("/bookmark/list", get(video::list_bookmarks))
                .route_layer(require_auth),
        );

    Router::new()
        .nest("/accounts", account_routes)
        .nest("/articles", article_routes)
        .nest("/api/products", product_routes)
        .nest("/api/animals", animal_routes)
        .nest("/services", service_routes)
        .nest("/youtube", video_routes)
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(state.clone(), expose_error_detail))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
