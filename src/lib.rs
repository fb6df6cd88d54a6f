//! Reverse proxy for a fixed-address camera device.
//!
//! Re-exposes the camera's HTTP endpoints (live MJPEG stream, JSON
//! status, parameter control, single-frame snapshot) through this
//! process's own HTTP server, isolating clients from the camera's address
//! and connection lifecycle.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────┐
//!                     │                CAMERA PROXY                 │
//!                     │                                            │
//!   Client Request    │  ┌─────────┐     ┌──────────────────────┐ │
//!   ──────────────────┼─▶│  http   │────▶│  proxy               │ │
//!                     │  │ server  │     │  upstream connector  │─┼──▶ Camera
//!                     │  └─────────┘     │  header parser       │ │    Device
//!                     │       │          │  stream/snapshot     │ │
//!   Client Response   │       │          │  relay tasks         │ │
//!   ◀─────────────────┼───────┴──────────│  status/control      │◀┼────
//!                     │                  └──────────────────────┘ │
//!                     │  ┌──────────────────────────────────────┐ │
//!                     │  │         Cross-Cutting Concerns        │ │
//!                     │  │  config · observability · lifecycle   │ │
//!                     │  └──────────────────────────────────────┘ │
//!                     └────────────────────────────────────────────┘
//! ```
//!
//! Stream and snapshot requests are served by dedicated relay tasks that
//! own one upstream connection each; status and control are answered
//! inline. Nothing is cached, transcoded or retried.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
