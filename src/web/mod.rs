//! JSON over HTTP. Every handler sends a message to the `DbExecutor` actor,
//! which owns the database connection.

use actix_web::web;

pub mod admin;
pub mod app_state;
pub mod auth;
pub mod dashboard;
pub mod error;
pub mod predictions;
pub mod races;
pub mod scores;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/register")
            .app_data(web::JsonConfig::default().limit(4096))
            .route(web::post().to(auth::perform_registration)),
    )
    .route("/races", web::get().to(races::month))
    .route("/races/week", web::get().to(races::week))
    .route("/races/{race_id}/entries", web::get().to(races::entries))
    .route(
        "/races/{race_id}/prediction",
        web::post().to(predictions::submit),
    )
    .route("/races/{race_id}/result", web::get().to(scores::race_result))
    .route("/leaderboard", web::get().to(scores::index))
    .route("/leaderboard/monthly", web::get().to(scores::monthly))
    .route("/leaderboard/filters", web::get().to(scores::filters))
    .route("/mypage", web::get().to(dashboard::index))
    .service(
        web::scope("/admin")
            .route("/races", web::post().to(admin::races::create))
            .route("/races/{race_id}", web::delete().to(admin::races::delete))
            .route(
                "/races/{race_id}/entries",
                web::put().to(admin::races::update_entries),
            )
            .route(
                "/races/{race_id}/result",
                web::put().to(admin::race_results::update),
            )
            .route(
                "/scores/recalculate",
                web::post().to(admin::scores::recalculate),
            ),
    );
}
