//! HTTP handlers and route configuration.

#[cfg(feature = "auth")]
mod auth;
mod catalog;
mod comments;
mod health;
mod posts;
mod profiles;

use actix_web::{HttpResponse, http::header, web};
use serde::Serialize;

use blog_core::{Outcome, Route};
use blog_shared::RedirectResponse;

/// Configure all application routes.
///
/// Literal segments (`create`, `edit`) are registered before the parameterised
/// routes that would otherwise capture them.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/health/", web::get().to(health::health_check))
        // Posts
        .service(
            web::resource("/posts/create/")
                .route(web::get().to(posts::create_post_page))
                .route(web::post().to(posts::create_post)),
        )
        .route("/posts/{id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{id}/edit/")
                .route(web::get().to(posts::edit_post_page))
                .route(web::post().to(posts::edit_post)),
        )
        .service(
            web::resource("/posts/{id}/delete/")
                .route(web::get().to(posts::delete_post_page))
                .route(web::post().to(posts::delete_post)),
        )
        .route("/category/{slug}/", web::get().to(posts::category_posts))
        // Comments
        .service(
            web::resource("/posts/{post_id}/comment/")
                .route(web::get().to(comments::add_comment_page))
                .route(web::post().to(comments::add_comment)),
        )
        .service(
            web::resource("/posts/{post_id}/edit_comment/{comment_id}/")
                .route(web::get().to(comments::edit_comment_page))
                .route(web::post().to(comments::edit_comment)),
        )
        .service(
            web::resource("/posts/{post_id}/delete_comment/{comment_id}/")
                .route(web::get().to(comments::delete_comment_page))
                .route(web::post().to(comments::delete_comment)),
        )
        // Profiles
        .service(
            web::resource("/profile/edit/")
                .route(web::get().to(profiles::edit_profile_page))
                .route(web::post().to(profiles::edit_profile)),
        )
        .route("/profile/{username}/", web::get().to(profiles::profile))
        // Staff catalogue management
        .service(
            web::resource("/manage/categories/")
                .route(web::get().to(catalog::categories_page))
                .route(web::post().to(catalog::create_category)),
        )
        .route(
            "/manage/categories/{slug}/delete/",
            web::post().to(catalog::delete_category),
        )
        .service(
            web::resource("/manage/locations/")
                .route(web::get().to(catalog::locations_page))
                .route(web::post().to(catalog::create_location)),
        )
        .route(
            "/manage/locations/{id}/delete/",
            web::post().to(catalog::delete_location),
        );

    #[cfg(feature = "auth")]
    cfg.service(
        web::resource("/auth/registration/")
            .route(web::get().to(auth::registration_page))
            .route(web::post().to(auth::register)),
    )
    .service(
        web::resource("/auth/login/")
            .route(web::get().to(auth::login_page))
            .route(web::post().to(auth::login)),
    );
}

/// Translate a service outcome: pages are JSON, redirects are `303 See Other`.
pub(crate) fn respond<T: Serialize>(outcome: Outcome<T>) -> HttpResponse {
    match outcome {
        Outcome::Render(page) => HttpResponse::Ok().json(page),
        Outcome::Invalid(page) => HttpResponse::UnprocessableEntity().json(page),
        Outcome::Redirect(route) => see_other(route, false),
        Outcome::LoginRequired(route) => see_other(route, true),
    }
}

fn see_other(route: Route, login_required: bool) -> HttpResponse {
    let location = route.to_string();
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.clone()))
        .json(RedirectResponse {
            location,
            login_required,
        })
}

#[cfg(test)]
mod tests;
