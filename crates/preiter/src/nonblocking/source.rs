//! Pull sources feeding [`Lazy`](super::Lazy) buffers.

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::BoxError;

/// Asynchronous pull of one element at a time.
///
/// `Ok(None)` ends the source. An `Err` leaves the source usable: the next
/// pull retries.
#[async_trait]
pub trait Source<T>: Send {
    /// Pulls the next element.
    async fn pull(&mut self) -> Result<Option<T>, BoxError>;
}

/// Owned, type-erased source.
pub type BoxSource<T> = Box<dyn Source<T>>;

#[async_trait]
impl<T: Send> Source<T> for BoxSource<T> {
    async fn pull(&mut self) -> Result<Option<T>, BoxError> {
        (**self).pull().await
    }
}

/// Adapts a [`Stream`] of results.
#[derive(Debug)]
pub struct StreamSource<S>(pub S);

#[async_trait]
impl<S, T, E> Source<T> for StreamSource<S>
where
    S: Stream<Item = Result<T, E>> + Unpin + Send,
    T: Send,
    E: Into<BoxError>,
{
    async fn pull(&mut self) -> Result<Option<T>, BoxError> {
        self.0.next().await.transpose().map_err(Into::into)
    }
}

/// Adapts a blocking iterator of results; every pull completes immediately.
#[derive(Debug)]
pub struct IterSource<I>(pub I);

#[async_trait]
impl<I, T, E> Source<T> for IterSource<I>
where
    I: Iterator<Item = Result<T, E>> + Send,
    T: Send,
    E: Into<BoxError>,
{
    async fn pull(&mut self) -> Result<Option<T>, BoxError> {
        self.0.next().transpose().map_err(Into::into)
    }
}
