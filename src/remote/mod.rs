// ABOUTME: Remote collaborators: the prompt transport and the account/session endpoints.
// ABOUTME: All requests share one cookie-keeping HTTP client so the backend session survives.

pub mod account;
pub mod http;
pub mod transport;

pub use account::{AccountClient, AccountError, Navigation, NewChat};
pub use http::build_client;
pub use transport::{HttpTransport, PromptRequest, PromptTransport, TransportError};
