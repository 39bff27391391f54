pub mod cli;
pub mod dom;
pub mod drive;
pub mod error;
pub mod frames;
pub mod http;
pub mod observers;
pub mod session;
pub mod trace;
