#![allow(dead_code)]

pub mod scripted;
pub mod utils;
