//! Test packets and the scripts built from them

use crate::error::{AppError, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message;

const LOREM_IPSUM: &str = "Lorem ipsum dolor sit amet, consetetur sadipscing elitr, sed diam nonumy eirmod tempor invidunt ut labore et dolore magna aliquyam erat, sed diam voluptua. At vero eos et accusam et justo duo dolores et ea rebum. Stet clita kasd gubergren, no sea takimata sanctus est Lorem ipsum dolor sit amet. Lorem ipsum dolor sit amet, consetetur sadipscing elitr, sed diam nonumy eirmod tempor invidunt ut labore et dolore magna aliquyam erat, sed diam voluptua. At vero eos et accusam et justo duo dolores et ea rebum. Stet clita kasd gubergren, no sea takimata sanctus est Lorem ipsum dolor sit amet.";

/// Message type of a framed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketKind {
    Text,
    Binary,
}

impl PacketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketKind::Text => "text",
            PacketKind::Binary => "binary",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message that is sent and expected to come back unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPacket {
    kind: PacketKind,
    payload: Vec<u8>,
}

impl TestPacket {
    /// Create a text packet
    pub fn text<S: Into<String>>(payload: S) -> Self {
        Self {
            kind: PacketKind::Text,
            payload: payload.into().into_bytes(),
        }
    }

    /// Create a binary packet
    pub fn binary<B: Into<Vec<u8>>>(payload: B) -> Self {
        Self {
            kind: PacketKind::Binary,
            payload: payload.into(),
        }
    }

    /// Create a packet of the given kind; text payloads must be valid UTF-8
    pub fn new(kind: PacketKind, payload: Vec<u8>) -> Result<Self> {
        if kind == PacketKind::Text && std::str::from_utf8(&payload).is_err() {
            return Err(AppError::validation("Text packet payload must be valid UTF-8"));
        }
        Ok(Self { kind, payload })
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Build the protocol message carrying this packet
    pub fn to_message(&self) -> Message {
        match self.kind {
            // Text payloads are validated on construction, so this never replaces bytes
            PacketKind::Text => Message::Text(String::from_utf8_lossy(&self.payload).into_owned()),
            PacketKind::Binary => Message::Binary(self.payload.clone()),
        }
    }

    fn with_prefix(&self, tag: &str) -> Self {
        let mut payload = Vec::with_capacity(tag.len() + self.payload.len());
        payload.extend_from_slice(tag.as_bytes());
        payload.extend_from_slice(&self.payload);
        Self { kind: self.kind, payload }
    }
}

/// Ordered, immutable sequence of packets shared by every connection test
#[derive(Debug, Clone)]
pub struct TestScript {
    packets: Arc<[TestPacket]>,
}

impl TestScript {
    /// Create a script; it must contain at least one packet
    pub fn new(packets: Vec<TestPacket>) -> Result<Self> {
        if packets.is_empty() {
            return Err(AppError::validation("Test script must contain at least one packet"));
        }
        Ok(Self { packets: packets.into() })
    }

    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    /// The default exchange: short and long texts, tiny and large binaries
    pub fn standard(random_size: usize) -> Self {
        let mut random_data = vec![0u8; random_size];
        rand::thread_rng().fill_bytes(&mut random_data);

        let packets = vec![
            TestPacket::text("Test"),
            TestPacket::text(LOREM_IPSUM),
            TestPacket::binary(vec![123u8]),
            TestPacket::binary(random_data),
            TestPacket::text("1"),
            TestPacket::text("2"),
            TestPacket::text("3"),
            TestPacket::text("4"),
            TestPacket::text("5"),
            TestPacket::text("12"),
            TestPacket::binary(LOREM_IPSUM.as_bytes().to_vec()),
        ];

        Self { packets: packets.into() }
    }

    /// Copy of this script with every payload prefixed by `tag`
    pub fn tagged(&self, tag: &str) -> Self {
        let packets: Vec<TestPacket> = self.packets.iter().map(|p| p.with_prefix(tag)).collect();
        Self { packets: packets.into() }
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TestPacket> {
        self.packets.get(index)
    }

    pub fn packets(&self) -> &[TestPacket] {
        &self.packets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestPacket> {
        self.packets.iter()
    }

    /// Sum of all payload sizes in bytes
    pub fn total_bytes(&self) -> usize {
        self.packets.iter().map(TestPacket::len).sum()
    }
}

impl<'a> IntoIterator for &'a TestScript {
    type Item = &'a TestPacket;
    type IntoIter = std::slice::Iter<'a, TestPacket>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builder for custom scripts
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    packets: Vec<TestPacket>,
}

impl ScriptBuilder {
    pub fn text<S: Into<String>>(mut self, payload: S) -> Self {
        self.packets.push(TestPacket::text(payload));
        self
    }

    pub fn binary<B: Into<Vec<u8>>>(mut self, payload: B) -> Self {
        self.packets.push(TestPacket::binary(payload));
        self
    }

    /// Append a binary packet of `size` random bytes
    pub fn random_binary(mut self, size: usize) -> Self {
        let mut data = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut data);
        self.packets.push(TestPacket::binary(data));
        self
    }

    pub fn packet(mut self, packet: TestPacket) -> Self {
        self.packets.push(packet);
        self
    }

    pub fn build(self) -> Result<TestScript> {
        TestScript::new(self.packets)
    }
}
