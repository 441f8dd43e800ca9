use crate::{
    api::{contractual, dashboard, expense, fixed, payment},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .route("/me", web::get().to(handlers::me))
            .route("/dashboard", web::get().to(dashboard::dashboard))
            .service(
                web::scope("/payments")
                    .service(
                        web::resource("")
                            .route(web::get().to(payment::list_payments))
                            .route(web::post().to(payment::create_payment)),
                    )
                    .service(web::resource("/{id}").route(web::delete().to(payment::delete_payment))),
            )
            .service(
                web::scope("/expenses")
                    .service(
                        web::resource("")
                            .route(web::get().to(expense::list_expenses))
                            .route(web::post().to(expense::create_expense)),
                    )
                    // literal paths before /{id}
                    .service(web::resource("/material").route(web::get().to(expense::material_expenses)))
                    .service(web::resource("/bulk").route(web::post().to(expense::bulk_create_expenses)))
                    .service(web::resource("/report").route(web::post().to(expense::expense_report)))
                    .service(web::resource("/report/pdf").route(web::get().to(expense::expense_report_pdf)))
                    .service(
                        web::resource("/report/preview")
                            .route(web::get().to(expense::expense_report_preview)),
                    )
                    .service(web::resource("/{id}").route(web::delete().to(expense::delete_expense))),
            )
            .service(
                web::scope("/employees/contractual")
                    .service(
                        web::resource("")
                            .route(web::get().to(contractual::list_contractual))
                            .route(web::post().to(contractual::create_contractual)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(contractual::get_contractual))
                            .route(web::put().to(contractual::update_contractual))
                            .route(web::delete().to(contractual::delete_contractual)),
                    )
                    .service(web::resource("/{id}/work").route(web::post().to(contractual::add_work)))
                    .service(web::resource("/{id}/salary").route(web::post().to(contractual::record_salary)))
                    .service(web::resource("/{id}/report").route(web::get().to(contractual::contractual_report)))
                    .service(web::resource("/{id}/payslip").route(web::get().to(contractual::payslip)))
                    .service(
                        web::resource("/{id}/work/{child_id}")
                            .route(web::delete().to(contractual::delete_work_record)),
                    )
                    .service(
                        web::resource("/{id}/salary/{child_id}")
                            .route(web::delete().to(contractual::delete_salary_payment)),
                    )
                    .service(
                        web::resource("/{id}/advance/{child_id}")
                            .route(web::delete().to(contractual::delete_advance_payment)),
                    ),
            )
            .service(
                web::scope("/employees/fixed")
                    .service(
                        web::resource("")
                            .route(web::get().to(fixed::list_fixed))
                            .route(web::post().to(fixed::create_fixed)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(fixed::fixed_report))
                            .route(web::put().to(fixed::update_fixed))
                            .route(web::delete().to(fixed::delete_fixed)),
                    )
                    .service(web::resource("/{id}/salary").route(web::post().to(fixed::record_fixed_salary)))
                    .service(web::resource("/{id}/credit").route(web::post().to(fixed::add_credit)))
                    .service(
                        web::resource("/{id}/salary/{child_id}")
                            .route(web::delete().to(fixed::delete_fixed_salary)),
                    )
                    .service(
                        web::resource("/{id}/credit/{child_id}")
                            .route(web::delete().to(fixed::delete_credit)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new token pair, the old refresh token is revoked

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{bearer, clock, config, lazy_pool};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode};
    use actix_web::test as actix_test;

    macro_rules! app {
        () => {{
            let config = config();
            let settings = config.get_ref().clone();
            actix_test::init_service(
                App::new()
                    .app_data(lazy_pool())
                    .app_data(config)
                    .app_data(clock())
                    .configure(move |cfg| configure(cfg, settings)),
            )
            .await
        }};
    }

    fn peer() -> std::net::SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[actix_web::test]
    async fn protected_scope_needs_a_token() {
        let app = app!();
        let req = actix_test::TestRequest::get()
            .uri("/api/expenses")
            .peer_addr(peer())
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn me_answers_inside_the_scope() {
        let app = app!();
        let req = actix_test::TestRequest::get()
            .uri("/api/me")
            .peer_addr(peer())
            .insert_header(bearer(Role::Viewer))
            .to_request();

        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["can_write"], false);
    }

    #[actix_web::test]
    async fn literal_expense_paths_win_over_ids() {
        let app = app!();
        // Reaches the bulk handler, which rejects a viewer before reading rows.
        let req = actix_test::TestRequest::post()
            .uri("/api/expenses/bulk")
            .peer_addr(peer())
            .insert_header(bearer(Role::Viewer))
            .set_json(serde_json::json!({"rows": []}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
