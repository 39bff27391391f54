pub mod frame_redirector;
pub mod scope;
pub mod target_resolver;
