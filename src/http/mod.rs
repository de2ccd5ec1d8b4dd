//! HTTP request/response model.
//!
//! # Data Flow
//! ```text
//! RequestConfig
//!     → normalize.rs (auth, anti-forgery, content-type rules → Headers)
//!     → url.rs (base URL + query serialization)
//!     → request.rs (TransportRequest: method, body, policy flags)
//!     → [dispatch hands it to the transport]
//!     → response.rs (RawResponse → StandardizedResponse / ErrorResponse)
//! ```

pub mod body;
pub mod headers;
pub mod normalize;
pub mod request;
pub mod response;
pub mod url;

pub use body::{FormData, FormPart, RequestBody};
pub use headers::{Headers, AUTHORIZATION, CONTENT_TYPE};
pub use normalize::normalize_headers;
pub use request::{build_request, build_request_in, RequestId, TransportRequest};
pub use response::{ErrorResponse, RawResponse, ResponseOrigin, StandardizedResponse};
pub use url::{build_url, DefaultParamsSerializer, Params, ParamsSerializer, UrlError};
