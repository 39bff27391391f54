pub mod fetch_request;
pub mod fetch_response;
pub mod transport;
