//! Local echo servers with configurable misbehavior

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
};
use ws_echo_stress::{client::RunnerConfig, models::Endpoint};

/// How the server treats the data messages it reads, counted from 0
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Echo everything unchanged
    Echo,
    /// Switch text and binary for message `n`
    FlipType(usize),
    /// Append a byte to message `n`
    AlterPayload(usize),
    /// After echoing message `n`, send one more text message
    ExtraAfter(usize),
    /// Read everything, echo nothing
    Silent,
    /// Echo everything but never acknowledge the close
    NoCloseAck,
    /// Read `read` messages, echo the first `echo`, then close with `code`
    CloseEarly { read: usize, echo: usize, code: CloseCode },
    /// Read `n` messages, then drop the TCP connection without a close handshake
    DropAfter(usize),
}

/// Accept connections forever on an ephemeral loopback port
pub async fn spawn_server(behavior: Behavior) -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            tokio::spawn(serve(tcp, behavior));
        }
    });

    Endpoint::new("ws", &addr.to_string(), "/").unwrap()
}

/// An address nothing listens on
pub async fn closed_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Endpoint::new("ws", &addr.to_string(), "/").unwrap()
}

pub fn fast_runner_config() -> RunnerConfig {
    RunnerConfig {
        connect_timeout: Duration::from_secs(2),
        send_timeout: Duration::from_secs(2),
        receive_timeout: Duration::from_millis(500),
        close_timeout: Duration::from_millis(500),
    }
}

async fn serve(tcp: TcpStream, behavior: Behavior) {
    let Ok(mut ws) = accept_async(tcp).await else {
        return;
    };

    let mut index = 0usize;
    let mut held = Vec::new();

    // polling after a close keeps going until the reply is flushed
    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Text(_) | Message::Binary(_) => {
                let i = index;
                index += 1;

                let sent = match behavior {
                    Behavior::Echo | Behavior::NoCloseAck => ws.send(message).await,
                    Behavior::FlipType(n) if n == i => ws.send(flip(message)).await,
                    Behavior::AlterPayload(n) if n == i => ws.send(alter(message)).await,
                    Behavior::FlipType(_) | Behavior::AlterPayload(_) => ws.send(message).await,
                    Behavior::ExtraAfter(n) => {
                        let echoed = ws.send(message).await;
                        if n == i && echoed.is_ok() {
                            ws.send(Message::Text("surplus".to_string())).await
                        } else {
                            echoed
                        }
                    }
                    Behavior::Silent => Ok(()),
                    // unread data makes the kernel reset the connection
                    Behavior::DropAfter(n) if i + 1 >= n => return,
                    Behavior::DropAfter(_) => Ok(()),
                    Behavior::CloseEarly { read, echo, code } => {
                        held.push(message);
                        if held.len() == read {
                            for message in held.drain(..).take(echo) {
                                if ws.send(message).await.is_err() {
                                    return;
                                }
                            }
                            ws.close(Some(CloseFrame { code, reason: "".into() })).await
                        } else {
                            Ok(())
                        }
                    }
                };

                if sent.is_err() {
                    return;
                }
            }
            Message::Close(_) => {
                if let Behavior::NoCloseAck = behavior {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    return;
                }
            }
            _ => {}
        }
    }
}

fn flip(message: Message) -> Message {
    match message {
        Message::Text(text) => Message::Binary(text.into_bytes()),
        Message::Binary(bytes) => Message::Text(String::from_utf8_lossy(&bytes).into_owned()),
        other => other,
    }
}

fn alter(message: Message) -> Message {
    match message {
        Message::Text(text) => Message::Text(format!("{}!", text)),
        Message::Binary(mut bytes) => {
            bytes.push(0xFF);
            Message::Binary(bytes)
        }
        other => other,
    }
}
