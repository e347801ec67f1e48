//! HTTP server layer for the mosaic service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │             GET /   POST /mosaic   GET /health                  │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    pages    │  │        routes           │  │
//! │  │ (requests)  │  │ (HTML form) │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod pages;
pub mod routes;

pub use handlers::{
    error_status, health_handler, index_handler, mosaic_handler, rebuild_handler, AppState,
    ErrorResponse, HandlerError, HealthResponse, RebuildResponse,
};
pub use routes::{create_router, RouterConfig};
