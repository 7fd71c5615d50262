#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod lazy;
pub mod parser;
pub mod registry;
pub mod store;
pub mod streaming;

pub use config::ParseConfig;
pub use error::ParseError;
pub use lazy::LazyRecord;
pub use parser::{Document, DocumentParser, parse, parse_tagged};
pub use registry::{DocumentFormat, decoder_for};
pub use store::ObjectStore;
pub use streaming::parse_stream;
