//! Async client core for the AMP360 payment-terminal management API.
//!
//! # Overview
//! Every call goes through one pipeline: resolve the endpoint against the
//! base URL, build a JSON or multipart `HttpRequest`, hand it to a pluggable
//! [`Transport`], decode the response envelope and classify the outcome
//! into a typed [`ApiError`]. Resource services (`client.terminals()`,
//! `client.templates()`, ...) are thin borrows on top of that pipeline.
//!
//! # Design
//! - `HttpRequest` / `HttpResponse` are plain data; only the transport
//!   touches the network, so the pipeline is testable without sockets.
//! - Token and transport can be swapped at runtime; calls already in flight
//!   keep the values they started with.
//! - Cancellation is explicit through [`CallContext`].
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod classify;
pub mod client;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod http;
pub mod multipart;
pub mod processor;
pub mod request;
pub mod services;
pub mod transport;
pub mod types;

pub use client::Amp360Client;
pub use config::{ClientConfig, Environment};
pub use context::CallContext;
pub use endpoint::{EndpointResolver, QueryParams};
pub use error::{ApiError, BoxError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use multipart::Form;
pub use processor::BulkUpdate;
pub use transport::{LoggingTransport, ReqwestTransport, Transport};
