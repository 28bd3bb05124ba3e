use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{Stream, StreamExt, TryStreamExt};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

use crate::buffer::StreamBuffer;
use crate::constraints::Constraints;
use crate::scanner::{MultipartScanner, PartHandler};

type BoxStream<'r> = Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send + 'r>>;

/// Scans a multipart body delivered as a [`Stream`] of byte chunks.
///
/// Chunks are fed into a [`StreamBuffer`] as they arrive and the parts are
/// reported to a [`PartHandler`], exactly as with
/// [`MultipartScanner::scan`]. The returned future resolves once the scan
/// completes.
///
/// # Examples
///
/// ```
/// use multiscan::{Multipart, MultipartEntry};
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let multipart = Multipart::new(stream, "multipart/form-data; boundary=X-BOUNDARY");
///
/// let result = multipart
///     .scan(|entry: &mut MultipartEntry| {
///         entry.read_to_string(|text| println!("Field: {:?}", text))
///     })
///     .await;
///
/// assert!(result.is_ok());
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
pub struct Multipart<'r> {
    stream: BoxStream<'r>,
    content_type: String,
    scanner: MultipartScanner,
}

impl<'r> Multipart<'r> {
    /// Construct a new `Multipart` instance with the given [`Bytes`] stream
    /// and the body's `Content-Type`.
    pub fn new<S, O, E, C>(stream: S, content_type: C) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
        C: Into<String>,
    {
        Multipart::new_with_constraints(stream, content_type, Constraints::default())
    }

    /// Construct a new `Multipart` instance with the given [`Bytes`] stream,
    /// the body's `Content-Type` and some [`Constraints`].
    pub fn new_with_constraints<S, O, E, C>(stream: S, content_type: C, constraints: Constraints) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
        C: Into<String>,
    {
        let stream = stream
            .map_ok(|b| -> Bytes { b.into() })
            .map_err(|err| crate::Error::StreamReadFailed(err.into()));

        Multipart {
            stream: Box::pin(stream),
            content_type: content_type.into(),
            scanner: MultipartScanner::with_constraints(constraints),
        }
    }

    /// Construct a new `Multipart` instance with the given [`AsyncRead`]
    /// reader and the body's `Content-Type`.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub fn with_reader<R, C>(reader: R, content_type: C) -> Self
    where
        R: AsyncRead + Unpin + Send + 'r,
        C: Into<String>,
    {
        Multipart::new(ReaderStream::new(reader), content_type)
    }

    /// Like [`with_reader`](Multipart::with_reader), applying `constraints`.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub fn with_reader_with_constraints<R, C>(reader: R, content_type: C, constraints: Constraints) -> Self
    where
        R: AsyncRead + Unpin + Send + 'r,
        C: Into<String>,
    {
        Multipart::new_with_constraints(ReaderStream::new(reader), content_type, constraints)
    }

    /// Reads the stream until the scan completes, reporting every part to
    /// `handler`.
    ///
    /// Stops polling the stream as soon as the final boundary was read. Fails
    /// with [`Error::IncompleteStream`](crate::Error::IncompleteStream) when
    /// the stream ends before that.
    pub async fn scan<H>(self, handler: H) -> crate::Result<()>
    where
        H: PartHandler + 'static,
    {
        let Multipart {
            mut stream,
            content_type,
            scanner,
        } = self;

        let outcome: Arc<spin::Mutex<Option<crate::Result<()>>>> = Arc::default();
        let slot = Arc::clone(&outcome);

        let mut buffer = StreamBuffer::with_limit(scanner.constraints().size_limit.whole_stream);
        scanner.scan(&mut buffer, Some(&content_type), handler, move |result| {
            *slot.lock() = Some(result);
        });

        loop {
            if let Some(result) = outcome.lock().take() {
                return result;
            }

            match stream.next().await {
                Some(Ok(bytes)) => buffer.feed(bytes),
                Some(Err(err)) => buffer.fail(err),
                None => break,
            }
        }

        buffer.finish();

        let result = outcome.lock().take();
        result.unwrap_or(Err(crate::Error::IncompleteStream))
    }
}
