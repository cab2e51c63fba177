//! Pull-based adapter over the callback transport.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use ndstream_types::{
    Outcome, ParseError, StreamEvent, StreamHandler, StreamRequest, TransportError,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::connector::Connector;
use crate::transport::StreamTransport;

/// One item yielded by an [`EventStream`].
#[derive(Debug)]
pub enum StreamItem {
    /// A decoded event.
    Data(StreamEvent),
    /// A line that failed to decode. The stream continues.
    ParseError(ParseError),
    /// The terminal outcome. Always the last item.
    Finished(Outcome),
}

/// Events of one request as a [`Stream`].
///
/// Ends after yielding [`StreamItem::Finished`]. Dropping the stream before
/// then cancels the request. Buffering is unbounded; see
/// [`StreamTransport::stream`].
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<StreamItem>,
    cancel: CancellationToken,
}

impl EventStream {
    /// Cancel the underlying request. The stream still yields its
    /// `Finished` item.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for EventStream {
    type Item = StreamItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Forwarder {
    tx: mpsc::UnboundedSender<StreamItem>,
}

impl StreamHandler for Forwarder {
    fn on_data(&mut self, event: StreamEvent) {
        let _ = self.tx.send(StreamItem::Data(event));
    }

    fn on_error(&mut self, error: &TransportError) {
        // Fatal errors arrive with the outcome.
        if let TransportError::Parse(err) = error {
            let _ = self.tx.send(StreamItem::ParseError(err.clone()));
        }
    }
}

impl<C: Connector + Clone + 'static> StreamTransport<C> {
    /// Run `request` on a background task and yield its events.
    ///
    /// Items are buffered in an unbounded channel: the request reads as fast
    /// as the endpoint sends, regardless of how quickly the stream is polled,
    /// so a slow consumer holds the unread remainder of the response in
    /// memory. [`execute`](Self::execute) delivers each event to its handler
    /// directly, with no buffering.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn stream(&self, request: StreamRequest) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let transport = self.clone();
        let parent = cancel.clone();

        tokio::spawn(async move {
            let mut forwarder = Forwarder { tx };
            let outcome = transport
                .execute_with_parent(&request, &mut forwarder, &parent)
                .await;
            let _ = forwarder.tx.send(StreamItem::Finished(outcome));
        });

        EventStream { rx, cancel }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use ndstream_types::{CancelReason, RequestOptions};
    use serde_json::json;

    use super::*;
    use crate::config::TransportConfig;
    use crate::testing::{ScriptedConnector, Step, chunk};

    fn request() -> StreamRequest {
        StreamRequest::new(RequestOptions::new("localhost", 11434), json!({}))
    }

    #[tokio::test]
    async fn yields_events_then_outcome() {
        let transport = StreamTransport::with_connector(
            ScriptedConnector::ok(vec![chunk("{\"a\":1}\nbroken\n{\"b\":2}\n")]),
            TransportConfig::default(),
        );

        let items: Vec<StreamItem> = transport.stream(request()).collect().await;

        assert_eq!(items.len(), 4);
        assert!(matches!(&items[0], StreamItem::Data(e) if e.value() == &json!({"a": 1})));
        assert!(matches!(&items[1], StreamItem::ParseError(e) if e.line_number == 2));
        assert!(matches!(&items[2], StreamItem::Data(e) if e.value() == &json!({"b": 2})));
        assert!(matches!(&items[3], StreamItem::Finished(Outcome::Completed)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_still_yields_outcome() {
        let transport = StreamTransport::with_connector(
            ScriptedConnector::ok(vec![chunk("{\"a\":1}\n"), Step::Stall]),
            TransportConfig::default(),
        );
        let mut stream = transport.stream(request());

        assert!(matches!(stream.next().await, Some(StreamItem::Data(_))));
        stream.cancel();
        assert!(matches!(
            stream.next().await,
            Some(StreamItem::Finished(Outcome::Aborted(CancelReason::Cancelled)))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stream_releases_request() {
        let connector = ScriptedConnector::ok(vec![chunk("{\"a\":1}\n"), Step::Stall]);
        let transport =
            StreamTransport::with_connector(connector.clone(), TransportConfig::default());
        let mut stream = transport.stream(request());

        assert!(matches!(stream.next().await, Some(StreamItem::Data(_))));
        drop(stream);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(connector.body_released());
    }
}
