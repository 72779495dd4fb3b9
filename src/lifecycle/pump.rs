//! Inbound read pump.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::link::{Closure, Link, Message, Received};
use crate::observability::Observer;

/// Why a read pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The peer closed with status 1000.
    NormalClosure,
    /// Abnormal closure or receive error; the retry delay has already elapsed.
    Failed,
}

/// Drains inbound messages from one link into an observer.
pub struct ReadPump {
    link: Arc<Link>,
    observer: Arc<dyn Observer>,
    retry_delay: Duration,
}

impl ReadPump {
    pub fn new(link: Arc<Link>, observer: Arc<dyn Observer>, retry_delay: Duration) -> Self {
        Self {
            link,
            observer,
            retry_delay,
        }
    }

    pub fn spawn(self) -> JoinHandle<PumpExit> {
        tokio::spawn(self.run())
    }

    /// Receive until the link ends.
    ///
    /// Text messages go to the observer; binary messages are skipped. After a
    /// failure the pump sleeps the retry delay before returning, so the
    /// supervisor reconnects at most once per delay.
    pub async fn run(self) -> PumpExit {
        loop {
            match self.link.receive().await {
                Ok(Received::Message(Message::Text(text))) => self.observer.inbound(&text),
                Ok(Received::Message(Message::Binary(data))) => {
                    tracing::debug!(bytes = data.len(), "Ignoring binary message");
                }
                Ok(Received::Closed(Closure::Normal)) => {
                    tracing::info!(url = %self.link.url(), "Websocket closed");
                    return PumpExit::NormalClosure;
                }
                Ok(Received::Closed(closure)) => {
                    tracing::error!(url = %self.link.url(), closure = %closure, "Websocket disconnected");
                    tokio::time::sleep(self.retry_delay).await;
                    return PumpExit::Failed;
                }
                Err(e) => {
                    tracing::error!(url = %self.link.url(), error = %e, "Websocket read failed");
                    tokio::time::sleep(self.retry_delay).await;
                    return PumpExit::Failed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

    use crate::link::LinkOptions;

    #[derive(Default)]
    struct Inbound(Mutex<Vec<String>>);

    impl Observer for Inbound {
        fn inbound(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }

        fn forwarded(&self, _text: &str) {}
    }

    fn scripted_link(frames: Vec<Result<WsMessage, WsError>>) -> Arc<Link> {
        let (tx, rx) = mpsc::unbounded_channel();
        for frame in frames {
            tx.send(frame).unwrap();
        }
        drop(tx);

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        let sink = futures_util::sink::unfold((), |_, _frame: WsMessage| async move {
            Ok::<_, WsError>(())
        });
        Arc::new(Link::from_parts(
            "ws://fake.test/",
            Box::pin(sink),
            Box::pin(stream),
            LinkOptions::default(),
        ))
    }

    #[tokio::test]
    async fn test_text_dispatched_and_normal_close_returns_immediately() {
        let link = scripted_link(vec![
            Ok(WsMessage::text("one")),
            Ok(WsMessage::binary(vec![1u8, 2, 3])),
            Ok(WsMessage::text("two")),
            Ok(WsMessage::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            }))),
        ]);
        let observer = Arc::new(Inbound::default());

        let started = Instant::now();
        let exit = ReadPump::new(link, observer.clone(), Duration::from_secs(5))
            .run()
            .await;

        assert_eq!(exit, PumpExit::NormalClosure);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(*observer.0.lock().unwrap(), vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_abnormal_close_waits_retry_delay() {
        let link = scripted_link(vec![Ok(WsMessage::Close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "".into(),
        })))]);

        let started = Instant::now();
        let exit = ReadPump::new(link, Arc::new(Inbound::default()), Duration::from_millis(100))
            .run()
            .await;

        assert_eq!(exit, PumpExit::Failed);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_receive_error_fails_pump() {
        let link = scripted_link(vec![
            Ok(WsMessage::text("before")),
            Err(WsError::ConnectionClosed),
        ]);
        let observer = Arc::new(Inbound::default());

        let exit = ReadPump::new(link.clone(), observer.clone(), Duration::from_millis(10))
            .spawn()
            .await
            .unwrap();

        assert_eq!(exit, PumpExit::Failed);
        assert!(!link.is_connected());
        assert_eq!(*observer.0.lock().unwrap(), vec!["before".to_string()]);
    }
}
