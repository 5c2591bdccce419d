//! Admin API.
//!
//! # Routes
//! - `GET  /admin/status`: service identity and statistics switch
//! - `GET  /admin/statistics`: current statistics snapshot
//! - `POST /admin/statistics/clear`: reset counters and sample period
//! - `PUT  /admin/statistics/enabled`: `{"enabled": bool}`
//!
//! Every route requires `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::statistics::FlowStatistics;

use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the admin handlers.
#[derive(Debug, Clone)]
pub struct AdminState {
    pub statistics: Arc<FlowStatistics>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(statistics: Arc<FlowStatistics>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            statistics,
            api_key: api_key.into(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/statistics", get(get_statistics))
        .route("/admin/statistics/clear", post(clear_statistics))
        .route("/admin/statistics/enabled", put(set_statistics_enabled))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
