//! Download streamer: push-style byte source to pull-style chunk stream.
//!
//! The storage engine produces content by *pushing* bytes into a sink
//! ([`Resource::write_content_to`]); a download consumer *pulls* chunks on
//! demand. [`ChunkStream`] bridges the two without unbounded buffering: the
//! producer runs on a blocking task and writes through a [`ChunkSink`] that
//! frames output into chunk-size [`Bytes`] and feeds them into a bounded
//! channel. The producer blocks once `pipe_capacity` chunks are unconsumed,
//! which is the backpressure contract -- a slow consumer never causes
//! read-ahead beyond the pipe.
//!
//! Cancellation is cooperative: dropping the stream closes the channel, the
//! producer's next send fails, and the sink aborts the source with a
//! broken-pipe error. At most one in-flight chunk is produced after a
//! late-observed cancellation.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use docstore_model::{ContentChunk, ResourceKind};
use futures::Stream;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::engine::{EngineError, Resource};
use crate::error::DocStoreError;

// ---------------------------------------------------------------------------
// ChunkSink
// ---------------------------------------------------------------------------

/// `io::Write` adapter that frames written bytes into fixed-size chunks and
/// sends them into the pipe.
///
/// A partial trailing chunk is held back until [`finish`](Self::finish);
/// `flush` is deliberately a no-op so that mid-stream flushes from the
/// source never emit short chunks.
struct ChunkSink {
    tx: mpsc::Sender<Result<Bytes, EngineError>>,
    buf: BytesMut,
    chunk_size: usize,
    cancelled: bool,
}

impl ChunkSink {
    fn new(tx: mpsc::Sender<Result<Bytes, EngineError>>, chunk_size: usize) -> Self {
        Self {
            tx,
            buf: BytesMut::new(),
            chunk_size,
            cancelled: false,
        }
    }

    /// Send one framed chunk, blocking while the pipe is full.
    fn send(&mut self, chunk: Bytes) -> io::Result<()> {
        if self.tx.blocking_send(Ok(chunk)).is_err() {
            self.cancelled = true;
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "download cancelled by consumer",
            ));
        }
        Ok(())
    }

    /// Flush the trailing partial chunk, if any.
    fn finish(mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            let rest = self.buf.split().freeze();
            self.send(rest)?;
        }
        Ok(())
    }

    fn cancelled(&self) -> bool {
        self.cancelled
    }
}

impl io::Write for ChunkSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        while self.buf.len() >= self.chunk_size {
            let chunk = self.buf.split_to(self.chunk_size).freeze();
            self.send(chunk)?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChunkStream
// ---------------------------------------------------------------------------

/// Pull-based stream of content chunks for one resource download.
///
/// Yields `Ok(ContentChunk)` items in source order, a single terminal `Err`
/// if the byte source fails, and completes cleanly when the source is
/// exhausted. A zero-length resource yields zero chunks.
///
/// Dropping the stream cancels the download and stops the producer promptly.
#[derive(Debug)]
pub struct ChunkStream {
    kind: ResourceKind,
    chunk_size: usize,
    rx: mpsc::Receiver<Result<Bytes, EngineError>>,
    done: bool,
}

impl ChunkStream {
    /// Start streaming the content of `resource` in chunks of `chunk_size`
    /// bytes, buffering at most `pipe_capacity` chunks between the source
    /// and the consumer.
    ///
    /// Must be called from within a tokio runtime; the byte source runs on
    /// the blocking thread pool.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytes::Bytes;
    /// use docstore_core::download::ChunkStream;
    /// use docstore_core::engine::{Collection, MemoryCollection, Resource, ResourceContent};
    /// use docstore_model::ResourceKind;
    /// use futures::StreamExt;
    ///
    /// # tokio_test::block_on(async {
    /// let root = MemoryCollection::create("/db");
    /// let resource = root.create_resource("blob", ResourceKind::Binary).unwrap();
    /// resource
    ///     .set_content(ResourceContent::Binary(Bytes::from_static(b"hello")))
    ///     .unwrap();
    ///
    /// let chunks: Vec<_> = ChunkStream::open(resource, 2, 4)
    ///     .map(|item| item.unwrap().data)
    ///     .collect()
    ///     .await;
    /// assert_eq!(
    ///     chunks,
    ///     vec![
    ///         Bytes::from_static(b"he"),
    ///         Bytes::from_static(b"ll"),
    ///         Bytes::from_static(b"o"),
    ///     ],
    /// );
    /// # });
    /// ```
    #[must_use]
    pub fn open(resource: Arc<dyn Resource>, chunk_size: usize, pipe_capacity: usize) -> Self {
        let kind = resource.kind();
        let (tx, rx) = mpsc::channel(pipe_capacity.max(1));

        tokio::task::spawn_blocking(move || pump(&resource, &tx, chunk_size));

        Self {
            kind,
            chunk_size,
            rx,
            done: false,
        }
    }

    /// The negotiated chunk size for this download.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Content kind of the streamed resource.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl Stream for ChunkStream {
    type Item = Result<ContentChunk, DocStoreError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(data))) => {
                trace!(len = data.len(), "emitting chunk");
                Poll::Ready(Some(Ok(ContentChunk {
                    kind: this.kind,
                    data,
                })))
            }
            Poll::Ready(Some(Err(err))) => {
                this.done = true;
                Poll::Ready(Some(Err(DocStoreError::Engine(err))))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Drive the byte source to completion, or until cancellation or failure.
fn pump(
    resource: &Arc<dyn Resource>,
    tx: &mpsc::Sender<Result<Bytes, EngineError>>,
    chunk_size: usize,
) {
    let mut sink = ChunkSink::new(tx.clone(), chunk_size);
    match resource.write_content_to(&mut sink) {
        Ok(()) => {
            if sink.finish().is_err() {
                trace!(id = resource.id(), "download cancelled before final chunk");
            }
        }
        Err(err) => {
            if sink.cancelled() {
                trace!(id = resource.id(), "download cancelled by consumer");
            } else {
                warn!(id = resource.id(), error = %err, "content source failed");
                let _ = tx.blocking_send(Err(err));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
