//! Opening the document stream.

use std::io;
use std::path::Path;

use async_compression::tokio::bufread::GzipDecoder;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncRead, BufReader};

const READ_BUFFER: usize = 64 * 1024;

/// Line source handed to the pipeline.
pub type Input = Box<dyn AsyncBufRead + Send + Unpin>;

/// Open `path`, or standard input when it is `None` or `-`.
///
/// With `gzip` the stream is decompressed on the fly; concatenated gzip
/// members are read as one stream.
pub async fn open_input(path: Option<&Path>, gzip: bool) -> io::Result<Input> {
    let raw: Box<dyn AsyncRead + Send + Unpin> = match path {
        Some(path) if path != Path::new("-") => Box::new(File::open(path).await?),
        _ => Box::new(tokio::io::stdin()),
    };
    let reader = BufReader::with_capacity(READ_BUFFER, raw);

    if !gzip {
        return Ok(Box::new(reader));
    }

    let mut decoder = GzipDecoder::new(reader);
    decoder.multiple_members(true);
    Ok(Box::new(BufReader::with_capacity(READ_BUFFER, decoder)))
}
