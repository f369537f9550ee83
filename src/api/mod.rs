//! API layer module
//!
//! HTTP access to one harness session. Only available when the `api` feature
//! is enabled.
//!
//! | Method | Path        | Effect                                        |
//! |--------|-------------|-----------------------------------------------|
//! | GET    | `/health`   | liveness and store readiness                  |
//! | POST   | `/generate` | start the session's single bulk generation run |
//! | GET    | `/progress` | latest progress of that run                   |
//! | POST   | `/query`    | run ad-hoc SQL                                |
//! | GET    | `/export`   | download the database as `db.sqlite`          |

pub mod client;
pub mod server;

// Re-export main types
pub use client::ApiClient;
pub use server::{ApiServer, ExecuteQueryRequest, ExecuteQueryResponse, ProgressResponse};
