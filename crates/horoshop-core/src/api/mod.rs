//! REST API client module for the Horoshop platform.
//!
//! This module provides the `ApiClient` together with the request pipeline
//! it drives and the transport capability it sends requests through.
//!
//! Every call goes to `<base>/api/<path>`. The session token travels as a
//! regular `token` parameter, in the query string for GET and in the
//! form-encoded body for everything else.

pub mod client;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod transport;

pub use client::{ApiClient, ClientOptions};
pub use error::{ApiError, Result};
pub use pipeline::LastResponse;
pub use request::{Method, RequestDescriptor, ResponseEnvelope};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportRequest};
