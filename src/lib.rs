pub mod client;
pub mod config;
pub mod exception;
pub mod extractor;
pub mod param;
pub mod ranker;
pub mod request;
pub mod response;
pub mod server;
pub mod session;
pub mod store;
pub mod util;

pub use client::{ClientSession, Report};
pub use config::Config;
pub use exception::Exception;
pub use extractor::Fetcher;
pub use ranker::{rank, top_n, RankedList};
pub use request::Request;
pub use response::PhaseReader;
pub use store::{CountStorage, FrequencyStore, MemoryStorage, WordCount};
