//! # nb-api
//!
//! The web routing layer for the backup receiver.

pub mod body;
pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::http::Method;
use actix_web::web;

/// Configures the routes Nullboard talks to.
///
/// Every resource answers OPTIONS with 200; anything not listed here falls
/// through to the app's default service.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/board")
            .route(web::put().to(handlers::connection_check))
            .route(web::delete().to(handlers::acknowledge))
            .route(web::method(Method::OPTIONS).to(handlers::acknowledge)),
    )
    .service(
        web::resource("/board/{id}")
            .route(web::put().to(handlers::save_board))
            .route(web::delete().to(handlers::ignore_board_delete))
            .route(web::method(Method::OPTIONS).to(handlers::acknowledge)),
    )
    .service(
        web::resource("/stash-board/{id}")
            .route(web::put().to(handlers::stash_board))
            .route(web::delete().to(handlers::acknowledge))
            .route(web::method(Method::OPTIONS).to(handlers::acknowledge)),
    )
    .service(
        web::resource("/unstash-board")
            .route(web::get().to(handlers::unstash_board))
            .route(web::method(Method::OPTIONS).to(handlers::acknowledge)),
    )
    .service(
        web::resource("/config")
            .route(web::put().to(handlers::save_config))
            .route(web::delete().to(handlers::ignore_config_delete))
            .route(web::method(Method::OPTIONS).to(handlers::acknowledge)),
    );
}
