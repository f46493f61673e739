use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    auth, dashboard, health_check, payments, slots, tickets, users, violations,
};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/session", get(auth::session))
        .route("/changepassword", patch(auth::change_password))
        .route("/logout", delete(auth::logout));

    let user_routes = Router::new()
        .route("/populate", get(users::populate))
        .route("/fetch_one", post(users::fetch_one))
        .route("/add", post(users::add))
        .route("/update", patch(users::update))
        .route("/activate", patch(users::activate))
        .route("/changepassword", patch(users::change_password));

    let slot_routes = Router::new()
        .route("/populate_sections", get(slots::populate_sections))
        .route("/populate_slots", get(slots::populate_slots))
        .route("/get_slot", get(slots::get_slot))
        .route("/add_section", post(slots::add_section))
        .route("/add", post(slots::add))
        .route("/occupy", post(slots::occupy));

    let ticket_routes = Router::new()
        .route("/", get(tickets::list))
        .route("/get_trend", get(tickets::get_trend))
        .route("/get_ticket", get(tickets::get_ticket))
        .route("/cancel", patch(tickets::cancel))
        .route("/update", patch(tickets::update));

    let payment_routes = Router::new()
        .route("/", get(payments::list))
        .route("/fetch_payment", get(payments::fetch_payment))
        .route("/trends", get(payments::trends))
        .route("/pay", post(payments::pay));

    let violation_routes = Router::new()
        .route("/", get(violations::list))
        .route("/fetch", get(violations::fetch))
        .route("/add", post(violations::add))
        .route("/remove_violation", delete(violations::remove_violation));

    let dashboard_routes = Router::new()
        .route("/", get(dashboard::get))
        .route("/reports", get(dashboard::reports));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/slots", slot_routes)
        .nest("/api/tickets", ticket_routes)
        .nest("/api/payment", payment_routes)
        .nest("/api/violations", violation_routes)
        .nest("/api/dashboard", dashboard_routes)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}
