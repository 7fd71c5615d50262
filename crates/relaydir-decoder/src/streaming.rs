use bytes::Bytes;
use relaydir_wire::{Chunk, RecordTokenizer, Token};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::config::ParseConfig;
use crate::error::ParseError;
use crate::parser::{Document, DocumentParser};
use crate::registry::DocumentFormat;
use crate::store::ObjectStore;

/// Parse a document from an async source with tokenizing and decoding
/// running as two concurrent stages.
///
/// ```text
///   producer task                        caller
///   ┌──────────────────────┐  bounded   ┌────────────────────────┐
///   │ AsyncRead            │   mpsc     │ Chunk → LazyRecord     │
///   │   → RecordTokenizer  │ ─────────▶ │   → ObjectStore        │
///   └──────────────────────┘   FIFO     └────────────────────────┘
/// ```
///
/// There is exactly one producer, so chunks arrive in document order.
/// `config.queue_capacity` bounds how far the producer may run ahead.
///
/// The first error from either stage ends the parse: the consumer stops
/// without draining the queue and the producer is aborted.
///
/// # Errors
///
/// Same as [`DocumentParser::parse`], plus
/// [`ParseError::PipelineClosed`] if the producer task dies.
pub async fn parse_stream<R>(
  reader: R,
  format: &'static DocumentFormat,
  config: ParseConfig,
) -> Result<Document, ParseError>
where
  R: AsyncRead + Unpin + Send + 'static,
{
  let parser = DocumentParser::with_config(format, config);
  let (tx, mut rx) = mpsc::channel(config.queue_capacity.max(1));
  let producer = tokio::spawn(produce(reader, parser, tx));

  let mut store = ObjectStore::new();
  while let Some(item) = rx.recv().await {
    let handle = match item.and_then(|chunk| parser.handle(&chunk)) {
      Ok(handle) => handle,
      Err(err) => {
        producer.abort();
        return Err(err);
      }
    };
    store.insert(handle);
  }

  let preamble = producer.await.map_err(|_| ParseError::PipelineClosed)?;
  let meta = parser.read_meta(preamble)?;
  debug!(format = format.type_name, records = store.len(), "stream parsed");

  Ok(Document {
    format,
    store,
    meta,
  })
}

/// Producer stage: read, tokenize, and send chunks until the document
/// ends or an error has been sent. Returns the preamble.
async fn produce<R>(
  mut reader: R,
  parser: DocumentParser,
  tx: mpsc::Sender<Result<Chunk, ParseError>>,
) -> Option<Bytes>
where
  R: AsyncRead + Unpin,
{
  let mut tokenizer = RecordTokenizer::new(parser.format().layout);
  let mut buf = vec![0u8; parser.config().read_buffer_size.max(1)];
  let mut at_eof = false;

  loop {
    let item = match tokenizer.next_token(at_eof) {
      Ok(Token::Chunk(chunk) | Token::Final(chunk)) => Ok(chunk),
      Ok(Token::Done) => break,
      Ok(Token::NeedMore) => {
        match reader.read(&mut buf).await {
          Ok(0) => at_eof = true,
          Ok(n) => tokenizer.feed(&buf[..n]),
          Err(err) => {
            // The consumer may already be gone; nothing else to report to.
            let _ = tx.send(Err(err.into())).await;
            break;
          }
        }
        continue;
      }
      Err(err) => parser.tolerate(err),
    };

    let failed = item.is_err();
    if tx.send(item).await.is_err() {
      trace!("consumer hung up, stopping producer");
      break;
    }
    if failed {
      break;
    }
  }

  tokenizer.take_preamble()
}
