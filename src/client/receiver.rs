//! Echo verification and the receiving half of a connection test
//!
//! The receiver runs as its own task from the moment the connection is
//! established. It reads inbound messages one at a time, checks each against
//! the next expected packet of the script, and reports back to the runner
//! through two channels: a one-shot "all received" signal carrying the match
//! timestamps, and its own join handle, which resolves once it has seen the
//! close acknowledgment or hit an error.

use crate::{
    error::ConnectionTestError,
    models::{PacketKind, PhaseClock, TestScript},
};
use futures_util::{Stream, StreamExt};
use std::time::Duration;
use tokio::{sync::oneshot, task::JoinHandle};
use tokio_tungstenite::tungstenite::{
    self,
    protocol::{frame::coding::CloseCode, CloseFrame},
    Message,
};

/// Checks echoes strictly in script order
#[derive(Debug, Clone)]
pub struct EchoVerifier {
    script: TestScript,
    next: usize,
}

impl EchoVerifier {
    pub fn new(script: TestScript) -> Self {
        Self { script, next: 0 }
    }

    /// Number of echoes matched so far
    pub fn matched(&self) -> usize {
        self.next
    }

    /// Number of echoes the script expects
    pub fn expected(&self) -> usize {
        self.script.len()
    }

    pub fn is_complete(&self) -> bool {
        self.next == self.script.len()
    }

    /// Compare one inbound message against the next expected packet.
    ///
    /// Returns the new matched count. The index only advances on a match.
    pub fn verify(&mut self, kind: PacketKind, payload: &[u8]) -> Result<usize, ConnectionTestError> {
        let expected = self.script.get(self.next).ok_or(ConnectionTestError::UnexpectedExtraMessage {
            expected: self.script.len(),
        })?;

        if expected.kind() != kind {
            return Err(ConnectionTestError::TypeMismatch {
                index: self.next,
                expected: expected.kind(),
                actual: kind,
            });
        }

        if expected.payload() != payload {
            return Err(ConnectionTestError::PayloadMismatch {
                index: self.next,
                expected_len: expected.len(),
                actual_len: payload.len(),
            });
        }

        self.next += 1;
        Ok(self.next)
    }

    /// Decide whether a close notification ends the test cleanly
    pub fn verify_close(&self, frame: Option<&CloseFrame<'_>>) -> Result<(), ConnectionTestError> {
        match frame.map(|f| f.code) {
            Some(CloseCode::Normal) if self.is_complete() => Ok(()),
            Some(CloseCode::Normal) => Err(ConnectionTestError::ClosedEarly {
                received: self.next,
                expected: self.script.len(),
            }),
            Some(code) => Err(ConnectionTestError::Receive(format!(
                "connection closed with code {}",
                u16::from(code)
            ))),
            None => Err(ConnectionTestError::Receive(
                "connection closed without a status code".to_string(),
            )),
        }
    }
}

/// Elapsed times, since the test began, at which echoes were matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoTimes {
    pub first_match: Duration,
    pub last_match: Duration,
}

/// How the receiver ended when the close handshake completed cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverEnd {
    /// Elapsed time, since the test began, at which the close frame arrived
    pub closed_at: Duration,
}

pub type ReceiverResult = Result<ReceiverEnd, ConnectionTestError>;

/// Read and verify echoes until the close acknowledgment or the first error
pub async fn receive_echoes<S>(
    mut stream: S,
    mut verifier: EchoVerifier,
    clock: PhaseClock,
    all_received: oneshot::Sender<EchoTimes>,
) -> ReceiverResult
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut all_received = Some(all_received);
    let mut first_match = None;

    while let Some(message) = stream.next().await {
        let message = message.map_err(|e| ConnectionTestError::Receive(e.to_string()))?;

        let matched = match &message {
            Message::Text(text) => verifier.verify(PacketKind::Text, text.as_bytes())?,
            Message::Binary(data) => verifier.verify(PacketKind::Binary, data)?,
            Message::Close(frame) => {
                verifier.verify_close(frame.as_ref())?;
                return Ok(ReceiverEnd { closed_at: clock.elapsed() });
            }
            // control frames are not echoes
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        };

        let now = clock.elapsed();
        let first = *first_match.get_or_insert(now);

        if matched == verifier.expected() {
            if let Some(tx) = all_received.take() {
                // the runner may have stopped listening after a timeout
                let _ = tx.send(EchoTimes { first_match: first, last_match: now });
            }
        }
    }

    Err(ConnectionTestError::Receive(
        "stream ended without a close frame".to_string(),
    ))
}

/// Join handle of a spawned receiver that aborts the task when dropped
pub struct ReceiverHandle {
    handle: JoinHandle<ReceiverResult>,
    finished: Option<ReceiverResult>,
}

impl ReceiverHandle {
    /// Spawn the receive loop on the runtime
    pub fn spawn<S>(
        stream: S,
        script: TestScript,
        clock: PhaseClock,
    ) -> (Self, oneshot::Receiver<EchoTimes>)
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(receive_echoes(stream, EchoVerifier::new(script), clock, tx));
        (Self { handle, finished: None }, rx)
    }

    /// Wait for the receiver to end. Safe to call again after it returned.
    pub async fn join(&mut self) -> ReceiverResult {
        if let Some(result) = &self.finished {
            return result.clone();
        }

        let result = match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) => Err(ConnectionTestError::Receive(format!("receiver task failed: {}", e))),
        };
        self.finished = Some(result.clone());
        result
    }

    /// The receiver's result if it has already ended
    pub async fn try_join(&mut self) -> Option<ReceiverResult> {
        if self.finished.is_some() || self.handle.is_finished() {
            Some(self.join().await)
        } else {
            None
        }
    }
}

impl Drop for ReceiverHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use proptest::prelude::*;

    fn script() -> TestScript {
        TestScript::builder().text("Test").binary(vec![0x7b]).build().unwrap()
    }

    fn normal_close() -> Message {
        Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }))
    }

    #[test]
    fn test_verifier_matches_in_order() {
        let mut verifier = EchoVerifier::new(script());
        assert_eq!(verifier.verify(PacketKind::Text, b"Test").unwrap(), 1);
        assert!(!verifier.is_complete());
        assert_eq!(verifier.verify(PacketKind::Binary, &[0x7b]).unwrap(), 2);
        assert!(verifier.is_complete());
    }

    #[test]
    fn test_verifier_type_mismatch_does_not_advance() {
        let mut verifier = EchoVerifier::new(script());
        let err = verifier.verify(PacketKind::Binary, b"Test").unwrap_err();
        assert_eq!(
            err,
            ConnectionTestError::TypeMismatch {
                index: 0,
                expected: PacketKind::Text,
                actual: PacketKind::Binary,
            }
        );
        assert_eq!(verifier.matched(), 0);
    }

    #[test]
    fn test_verifier_payload_mismatch() {
        let mut verifier = EchoVerifier::new(script());
        verifier.verify(PacketKind::Text, b"Test").unwrap();
        let err = verifier.verify(PacketKind::Binary, &[0x7c, 0x00]).unwrap_err();
        assert_eq!(
            err,
            ConnectionTestError::PayloadMismatch { index: 1, expected_len: 1, actual_len: 2 }
        );
    }

    #[test]
    fn test_verifier_extra_message() {
        let mut verifier = EchoVerifier::new(script());
        verifier.verify(PacketKind::Text, b"Test").unwrap();
        verifier.verify(PacketKind::Binary, &[0x7b]).unwrap();
        let err = verifier.verify(PacketKind::Text, b"Test").unwrap_err();
        assert_eq!(err, ConnectionTestError::UnexpectedExtraMessage { expected: 2 });
    }

    #[test]
    fn test_verify_close_codes() {
        let mut verifier = EchoVerifier::new(script());
        let normal = CloseFrame { code: CloseCode::Normal, reason: "".into() };
        let away = CloseFrame { code: CloseCode::Away, reason: "".into() };

        assert_eq!(
            verifier.verify_close(Some(&normal)),
            Err(ConnectionTestError::ClosedEarly { received: 0, expected: 2 })
        );

        verifier.verify(PacketKind::Text, b"Test").unwrap();
        verifier.verify(PacketKind::Binary, &[0x7b]).unwrap();
        assert!(verifier.verify_close(Some(&normal)).is_ok());
        assert!(matches!(verifier.verify_close(Some(&away)), Err(ConnectionTestError::Receive(_))));
        assert!(matches!(verifier.verify_close(None), Err(ConnectionTestError::Receive(_))));
    }

    #[tokio::test]
    async fn test_receive_loop_signals_and_ends_on_close() {
        let messages = vec![
            Ok(Message::Text("Test".to_string())),
            Ok(Message::Ping(vec![1])),
            Ok(Message::Binary(vec![0x7b])),
            Ok(normal_close()),
        ];
        let (tx, rx) = oneshot::channel();
        let clock = PhaseClock::start();

        let end = receive_echoes(stream::iter(messages), EchoVerifier::new(script()), clock, tx)
            .await
            .unwrap();
        let times = rx.await.unwrap();

        assert!(times.first_match <= times.last_match);
        assert!(times.last_match <= end.closed_at);
    }

    #[tokio::test]
    async fn test_receive_loop_stream_end_is_error() {
        let messages = vec![Ok(Message::Text("Test".to_string()))];
        let (tx, rx) = oneshot::channel();

        let err = receive_echoes(stream::iter(messages), EchoVerifier::new(script()), PhaseClock::start(), tx)
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionTestError::Receive(_)));
        // sender dropped without signalling
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_receiver_handle_join_is_repeatable() {
        let messages = vec![
            Ok(Message::Text("Test".to_string())),
            Ok(Message::Binary(vec![0x7b])),
            Ok(normal_close()),
        ];
        let (mut receiver, rx) = ReceiverHandle::spawn(stream::iter(messages), script(), PhaseClock::start());

        assert!(rx.await.is_ok());
        let first = receiver.join().await;
        let second = receiver.join().await;
        assert!(first.is_ok());
        assert_eq!(first, second);
        assert!(receiver.try_join().await.is_some());
    }

    proptest! {
        #[test]
        fn prop_exact_echo_always_completes(payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..16)) {
            let script = payloads
                .iter()
                .fold(TestScript::builder(), |builder, p| builder.binary(p.clone()))
                .build()
                .unwrap();
            let mut verifier = EchoVerifier::new(script);

            for (i, payload) in payloads.iter().enumerate() {
                prop_assert_eq!(verifier.verify(PacketKind::Binary, payload).unwrap(), i + 1);
            }
            prop_assert!(verifier.is_complete());
        }

        #[test]
        fn prop_index_never_exceeds_script(extra in 1usize..8) {
            let mut verifier = EchoVerifier::new(script());
            verifier.verify(PacketKind::Text, b"Test").unwrap();
            verifier.verify(PacketKind::Binary, &[0x7b]).unwrap();
            for _ in 0..extra {
                prop_assert!(verifier.verify(PacketKind::Binary, &[0x7b]).is_err());
                prop_assert_eq!(verifier.matched(), 2);
            }
        }
    }
}
