//! HTTP handlers and route configuration.

mod admin;
mod analytics;
mod auth;
mod health;
mod posts;


use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let auth = web::scope("/auth")
        .route("/register", web::post().to(auth::register))
        .route("/login", web::post().to(auth::login))
        .route("/me", web::get().to(auth::me))
        .route("/users", web::get().to(auth::list_users));
    #[cfg(feature = "rate-limit")]
    let auth = auth.wrap(crate::middleware::rate_limit::RateLimitMiddleware);

    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(auth)
            .service(
                web::scope("/posts")
                    .route("", web::post().to(posts::create))
                    .route("", web::get().to(posts::list))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete))
                    .route("/{id}/schedule", web::post().to(posts::schedule))
                    .route("/{id}/unschedule", web::post().to(posts::unschedule)),
            )
            // Fixed segments before `/{post_id}`
            .service(
                web::scope("/analytics")
                    .route("/top", web::get().to(analytics::top_posts))
                    .route("/summary", web::get().to(analytics::summary))
                    .route("/{post_id}", web::post().to(analytics::create))
                    .route("/{post_id}", web::get().to(analytics::get))
                    .route("/{post_id}", web::put().to(analytics::update))
                    .route("/{post_id}", web::delete().to(analytics::delete))
                    .route(
                        "/{post_id}/reactions",
                        web::post().to(analytics::increment_reaction),
                    )
                    .route("/{post_id}/graph", web::get().to(analytics::graph)),
            )
            .service(
                web::scope("/admin")
                    .route("/posts/user/{user_id}", web::get().to(admin::user_posts))
                    .route("/scheduler/stats", web::get().to(admin::scheduler_stats))
                    .route("/scheduler/overdue", web::get().to(admin::overdue_posts))
                    .route(
                        "/scheduler/process-now",
                        web::post().to(admin::process_now),
                    )
                    .route("/analytics", web::get().to(analytics::admin_list))
                    .route(
                        "/analytics/{post_id}",
                        web::delete().to(analytics::admin_delete),
                    ),
            ),
    );
}
