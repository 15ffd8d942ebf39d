pub mod config;
pub mod logging;

pub mod checksum;
pub mod crypto;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod playlist;
pub mod queue;
pub mod retry;
pub mod source;
pub mod storage;
pub mod url_model;
