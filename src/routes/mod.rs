// Route exports
pub mod marketplace;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(marketplace::configure),
    );
}
