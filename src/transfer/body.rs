//! Response body types
//!
//! Small bodies are buffered. File bodies are produced by a [`ChunkedStreamer`]
//! task writing into an in-memory pipe whose read half hyper consumes; when
//! hyper drops the body the next write fails with `BrokenPipe`.

use futures_util::TryStreamExt;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io;
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::bucket::TokenBucket;
use super::streamer::{ChunkedStreamer, CHUNK_SIZE};
use crate::logger;

pub type ResponseBody = BoxBody<Bytes, io::Error>;

pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Stream `length` bytes of `file` from its current position
///
/// The copy runs on its own task, paced by `limiter`. Failures other than a
/// client disconnect are logged and cut the body short, which makes hyper
/// abort the connection.
pub fn file_body(file: File, length: u64, limiter: Arc<TokenBucket>, label: String) -> ResponseBody {
    let (mut writer, reader) = tokio::io::duplex(CHUNK_SIZE);
    let streamer = ChunkedStreamer::new(limiter).with_label(label.clone());

    tokio::spawn(async move {
        let mut file = file;
        if let Err(e) = streamer.stream(&mut file, &mut writer, Some(length)).await {
            logger::log_error(&format!("Transfer of {label} failed: {e}"));
        }
    });

    let frames = ReaderStream::with_capacity(reader, CHUNK_SIZE).map_ok(Frame::data);
    BodyExt::boxed(StreamBody::new(frames))
}
