use crate::{
    api::{automation, leave_request},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit: {} per minute", requests_per_min))?;
    Ok(Governor::new(&cfg))
}

/// Limiter for the protected scope, built once and shared by every worker.
pub fn protected_limiter(config: &Config) -> anyhow::Result<Arc<Limiter>> {
    build_limiter(config.rate_protected_per_min).map(Arc::new)
}

pub fn configure(
    cfg: &mut web::ServiceConfig,
    config: &Config,
    limiter: Arc<Limiter>,
) {
    // Protected routes, every handler authenticates through `AuthUser`
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(limiter) // rate limiting
            .configure(leave_routes)
            .configure(automation_routes),
    );
}

pub fn leave_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            // /leave
            .service(
                web::resource("")
                    .route(web::get().to(leave_request::list_leave))
                    .route(web::post().to(leave_request::create_leave)),
            )
            // /leave/compensation, before /{id}
            .service(
                web::resource("/compensation")
                    .route(web::get().to(leave_request::preview_compensation)),
            )
            // /leave/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(leave_request::get_leave))
                    .route(web::put().to(leave_request::update_leave))
                    .route(web::delete().to(leave_request::cancel_leave)),
            )
            // /leave/{id}/approve
            .service(
                web::resource("/{id}/approve").route(web::put().to(leave_request::approve_leave)),
            )
            // /leave/{id}/reject
            .service(
                web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)),
            ),
    );
}

pub fn automation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/automation")
            // /automation/run-due
            .service(
                web::resource("/run-due").route(web::post().to(automation::run_due_rules)),
            )
            // /automation/{id}/run
            .service(web::resource("/{id}/run").route(web::post().to(automation::run_rule)))
            // /automation/{id}/run-now
            .service(
                web::resource("/{id}/run-now").route(web::post().to(automation::run_rule_now)),
            )
            // /automation/{id}/toggle
            .service(
                web::resource("/{id}/toggle").route(web::put().to(automation::toggle_rule)),
            ),
    );
}
