// Library interface for newsart modules
// This allows tests and the binary to import modules

pub mod error;
pub mod images;
pub mod llm;
pub mod news;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod worker;
