#![warn(clippy::pedantic)]

pub mod error;
pub mod tag;
pub mod tokenizer;

pub use error::{BoundaryError, WireError};
pub use tag::DocumentTag;
pub use tokenizer::{Chunk, ChunkReader, Layout, RecordTokenizer, Token};
