pub mod ad_status;
pub mod config;
pub mod image;
pub mod storage;

pub use ad_status::{AdStatus, ParseStatusError};
