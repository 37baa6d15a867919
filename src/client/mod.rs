//! API client with transparent access-token refresh.

mod api;
mod error;
mod pipeline;
mod tokens;
mod transport;

pub use api::TodoClient;
pub use error::{ClientError, ClientResult};
pub use pipeline::{EXCLUDED_PATHS, RequestPipeline, Session};
pub use tokens::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Refresher, Transport};
