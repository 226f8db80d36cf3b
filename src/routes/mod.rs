// Route exports
pub mod matches;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(matches::root))
        .service(
            web::scope("/api")
                .configure(matches::configure),
        );
}
