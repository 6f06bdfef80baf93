//! HTTP transport, request shapes and the authorized channel.

pub mod channel;
pub mod request;
pub mod transport;

pub use channel::ApiChannel;
pub use request::{Action, ApiRequest, Domain, Endpoint};
pub use transport::{shared_client, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
