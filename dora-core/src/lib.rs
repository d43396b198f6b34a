//! Deployment-frequency metrics for the DORA dashboard.
//!
//! [`service::serve`] is the single entry point: it picks the count/average
//! or total service for a request, runs the resolved statements through a
//! [`sql_client::QueryClient`] and returns a uniform [`models::Response`].

pub mod error;
pub mod models;
pub mod service;
pub mod sql_client;
pub mod sql_queries;
