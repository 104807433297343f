//! WebSocket connection test runner and phase timing
//!
//! One call to [`ConnectionTestRunner::run`] performs a complete test cycle:
//! dial, write every scripted packet while a receiver task verifies the
//! echoes, close with a normal-closure frame, and wait for the peer's
//! acknowledgment. Every wait is bounded by its own timeout.

pub mod receiver;
pub mod state;

pub use receiver::{EchoTimes, EchoVerifier, ReceiverEnd, ReceiverHandle};
pub use state::ConnectionState;

use crate::{
    error::{ConnectionTestError, TestFailure},
    executor::ConnectionTest,
    models::{Endpoint, TestResult, TestScript},
    types::ConnectionPhase,
};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::{sync::oneshot, time::timeout};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
};

/// Timeouts for each bounded wait of a connection test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Bound on establishing the connection
    pub connect_timeout: Duration,
    /// Bound on each individual write, including the close frame
    pub send_timeout: Duration,
    /// Bound on waiting for all echoes once every packet is written
    pub receive_timeout: Duration,
    /// Bound on waiting for the close acknowledgment
    pub close_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let timeout = crate::defaults::DEFAULT_PHASE_TIMEOUT;
        Self {
            connect_timeout: timeout,
            send_timeout: timeout,
            receive_timeout: timeout,
            close_timeout: timeout,
        }
    }
}

/// Runs single connection tests against an echo server.
///
/// The runner holds no state between invocations, so one instance can be
/// shared by any number of concurrent workers.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTestRunner {
    config: RunnerConfig,
}

impl ConnectionTestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute one complete test cycle.
    ///
    /// On failure the returned [`TestFailure`] carries the latencies recorded
    /// before the failing phase.
    pub async fn run(&self, endpoint: &Endpoint, script: &TestScript) -> Result<TestResult, TestFailure> {
        let mut state = ConnectionState::begin();
        let mut result = TestResult::default();

        let (ws, _response) = match timeout(self.config.connect_timeout, connect_async(endpoint.as_str())).await {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => return Err(state.fail(ConnectionTestError::Dial(e.to_string()), result)),
            Err(_) => {
                return Err(state.fail(
                    ConnectionTestError::Dial(format!("timed out after {:?}", self.config.connect_timeout)),
                    result,
                ))
            }
        };
        result.connect_latency = state.elapsed();
        state.enter(ConnectionPhase::Streaming);

        let (mut sink, stream) = ws.split();
        let (mut receiver, mut all_received) = ReceiverHandle::spawn(stream, script.clone(), state.clock());

        for (index, packet) in script.iter().enumerate() {
            match timeout(self.config.send_timeout, sink.send(packet.to_message())).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(state.fail(ConnectionTestError::Send { index, reason: e.to_string() }, result))
                }
                Err(_) => {
                    return Err(state.fail(
                        ConnectionTestError::Send {
                            index,
                            reason: format!("timed out after {:?}", self.config.send_timeout),
                        },
                        result,
                    ))
                }
            }
        }
        state.enter(ConnectionPhase::AwaitingEchoes);

        let times = match timeout(
            self.config.receive_timeout,
            wait_for_echoes(&mut all_received, &mut receiver),
        )
        .await
        {
            Ok(Ok(times)) => times,
            Ok(Err(e)) => return Err(state.fail(e, result)),
            Err(_) => {
                return Err(state.fail(ConnectionTestError::ReceiveTimeout(self.config.receive_timeout), result))
            }
        };
        result.first_roundtrip_latency = times.first_match.saturating_sub(result.connect_latency);
        result.full_roundtrip_latency = times.last_match.saturating_sub(result.connect_latency);
        state.enter(ConnectionPhase::Closing);

        let close = Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }));
        let close_error = match timeout(self.config.send_timeout, sink.send(close)).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("timed out after {:?}", self.config.send_timeout)),
        };

        if let Some(reason) = close_error {
            // A server that already closed cleanly leaves nothing to send on
            return match receiver.try_join().await {
                Some(Ok(end)) => Ok(finish(&mut state, result, end)),
                _ => Err(state.fail(ConnectionTestError::CloseSend(reason), result)),
            };
        }

        match timeout(self.config.close_timeout, receiver.join()).await {
            Ok(Ok(end)) => Ok(finish(&mut state, result, end)),
            Ok(Err(e)) => Err(state.fail(e, result)),
            Err(_) => Err(state.fail(ConnectionTestError::CloseTimeout(self.config.close_timeout), result)),
        }
    }
}

#[async_trait]
impl ConnectionTest for ConnectionTestRunner {
    async fn run_test(&self, endpoint: &Endpoint, script: &TestScript) -> Result<TestResult, TestFailure> {
        self.run(endpoint, script).await
    }
}

/// Wait until every echo matched or the receiver failed
async fn wait_for_echoes(
    all_received: &mut oneshot::Receiver<EchoTimes>,
    receiver: &mut ReceiverHandle,
) -> Result<EchoTimes, ConnectionTestError> {
    tokio::select! {
        biased;

        signalled = &mut *all_received => match signalled {
            Ok(times) => Ok(times),
            // the sender is dropped only when the receive loop returns
            Err(_) => match receiver.join().await {
                Err(e) => Err(e),
                Ok(_) => Err(ConnectionTestError::Receive("receiver ended before all echoes arrived".to_string())),
            },
        },
        ended = receiver.join() => match ended {
            Err(e) => Err(e),
            Ok(_) => all_received
                .try_recv()
                .map_err(|_| ConnectionTestError::Receive("receiver ended before all echoes arrived".to_string())),
        },
    }
}

fn finish(state: &mut ConnectionState, mut result: TestResult, end: ReceiverEnd) -> TestResult {
    state.enter(ConnectionPhase::Closed);
    result.disconnect_latency = end
        .closed_at
        .saturating_sub(result.connect_latency)
        .saturating_sub(result.full_roundtrip_latency);
    result.total_duration = result.phase_sum();
    result
}
