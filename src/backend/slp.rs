//! Server List Ping probe.
//!
//! # Responsibilities
//! - Open a TCP connection to a backend (or the proxy itself)
//! - Send a handshake with next state = status, then a status request
//! - Decode the JSON status response and report `players.online`
//!
//! # Wire Format
//! ```text
//! packet   = VarInt(length) ‖ VarInt(packet_id) ‖ payload
//! handshake payload = VarInt(protocol) ‖ String(host) ‖ u16(port, BE) ‖ VarInt(1)
//! request  payload  = (empty), packet_id 0x00
//! response payload  = String(json), packet_id 0x00
//! String   = VarInt(byte_len) ‖ UTF-8 bytes
//! ```

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::backend::{BackendId, BackendServer, PollOutcome, ProbeError};

/// Protocol number sent in the handshake. Servers answer status requests for
/// any version; -1 is the conventional "unknown".
const STATUS_PROTOCOL_VERSION: i32 = -1;
const NEXT_STATE_STATUS: i32 = 1;
const PACKET_ID_HANDSHAKE: i32 = 0x00;
const PACKET_ID_STATUS: i32 = 0x00;

/// Upper bound on a status packet, well above what real servers send.
const MAX_PACKET_LEN: usize = 1 << 20;

/// Decoded status response. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub version: Option<StatusVersion>,
    /// Servers may hide their player list; such a server still answered.
    #[serde(default)]
    pub players: Option<StatusPlayers>,
}

impl StatusResponse {
    /// Players online, zero when the list is hidden.
    pub fn online(&self) -> u32 {
        self.players.as_ref().map_or(0, |players| players.online)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusPlayers {
    pub online: u32,
    #[serde(default)]
    pub max: u32,
}

/// A backend reached through the status protocol.
#[derive(Debug, Clone)]
pub struct SlpBackend {
    id: BackendId,
    address: String,
    timeout: Duration,
}

impl SlpBackend {
    pub fn new(id: impl Into<BackendId>, address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl BackendServer for SlpBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    fn ping(&self) -> BoxFuture<'static, PollOutcome> {
        let address = self.address.clone();
        let timeout = self.timeout;
        Box::pin(async move {
            query_players(&address, timeout).await.into()
        })
    }
}

/// Query a server's online player count, bounded by `timeout`.
pub async fn query_players(address: &str, timeout: Duration) -> Result<u32, ProbeError> {
    match tokio::time::timeout(timeout, query_status(address)).await {
        Ok(res) => res.map(|status| status.online()),
        Err(_) => Err(ProbeError::Timeout(timeout)),
    }
}

/// Run one status exchange against `address` ("host:port").
pub async fn query_status(address: &str) -> Result<StatusResponse, ProbeError> {
    let (host, port) = split_host_port(address)?;
    let mut stream = TcpStream::connect(address).await?;

    let mut handshake = Vec::with_capacity(host.len() + 16);
    write_varint(&mut handshake, PACKET_ID_HANDSHAKE);
    write_varint(&mut handshake, STATUS_PROTOCOL_VERSION);
    write_string(&mut handshake, host);
    handshake.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut handshake, NEXT_STATE_STATUS);

    let mut request = Vec::with_capacity(1);
    write_varint(&mut request, PACKET_ID_STATUS);

    let mut out = frame(&handshake);
    out.extend_from_slice(&frame(&request));
    stream.write_all(&out).await?;
    stream.flush().await?;

    let payload = read_packet(&mut stream).await?;
    let mut cursor = payload.as_slice();
    let packet_id = decode_varint(&mut cursor)?;
    if packet_id != PACKET_ID_STATUS {
        return Err(ProbeError::Protocol(format!(
            "unexpected packet id {packet_id:#04x}"
        )));
    }
    let json_len = usize::try_from(decode_varint(&mut cursor)?)
        .map_err(|_| ProbeError::Protocol("negative string length".into()))?;
    if json_len > cursor.len() {
        return Err(ProbeError::Protocol(format!(
            "string length {json_len} exceeds packet ({} bytes left)",
            cursor.len()
        )));
    }

    let status: StatusResponse = serde_json::from_slice(&cursor[..json_len])?;
    tracing::trace!(address, online = status.online(), "Status response decoded");
    Ok(status)
}

fn split_host_port(address: &str) -> Result<(&str, u16), ProbeError> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| ProbeError::Protocol(format!("address {address:?} has no port")))?;
    let port = port
        .parse()
        .map_err(|_| ProbeError::Protocol(format!("address {address:?} has an invalid port")))?;
    Ok((host.trim_start_matches('[').trim_end_matches(']'), port))
}

pub(crate) fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut v = value as u32;
    loop {
        if v & !0x7F == 0 {
            buf.push(v as u8);
            return;
        }
        buf.push(((v & 0x7F) | 0x80) as u8);
        v >>= 7;
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

pub(crate) fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 5);
    write_varint(&mut out, payload.len() as i32);
    out.extend_from_slice(payload);
    out
}

fn decode_varint(cursor: &mut &[u8]) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let (&byte, rest) = cursor
            .split_first()
            .ok_or_else(|| ProbeError::Protocol("truncated VarInt".into()))?;
        *cursor = rest;
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Protocol("VarInt too long".into()))
}

async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Protocol("VarInt too long".into()))
}

async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProbeError> {
    let len = read_varint(reader).await?;
    let len = usize::try_from(len)
        .ok()
        .filter(|l| *l > 0 && *l <= MAX_PACKET_LEN)
        .ok_or_else(|| ProbeError::Protocol(format!("bad packet length {len}")))?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_varint_encoding() {
        let cases: [(i32, &[u8]); 6] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (25565, &[0xDD, 0xC7, 0x01]),
            (-1, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];
        for (value, bytes) in cases {
            let mut buf = Vec::new();
            write_varint(&mut buf, value);
            assert_eq!(buf, bytes, "encoding {value}");

            let mut cursor = bytes;
            assert_eq!(decode_varint(&mut cursor).unwrap(), value);
            assert!(cursor.is_empty());
        }
    }

    #[test]
    fn test_truncated_varint() {
        let mut cursor: &[u8] = &[0x80, 0x80];
        assert!(matches!(decode_varint(&mut cursor), Err(ProbeError::Protocol(_))));
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("mc.example.net:25565").unwrap(), ("mc.example.net", 25565));
        assert_eq!(split_host_port("[::1]:25566").unwrap(), ("::1", 25566));
        assert!(split_host_port("localhost").is_err());
        assert!(split_host_port("localhost:http").is_err());
    }

    /// Serve a single status exchange, answering with `json`.
    async fn serve_status(json: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let handshake = read_packet(&mut socket).await.unwrap();
            let mut cursor = handshake.as_slice();
            assert_eq!(decode_varint(&mut cursor).unwrap(), PACKET_ID_HANDSHAKE);
            assert_eq!(decode_varint(&mut cursor).unwrap(), STATUS_PROTOCOL_VERSION);
            let request = read_packet(&mut socket).await.unwrap();
            assert_eq!(request, vec![0x00]);

            let mut payload = Vec::new();
            write_varint(&mut payload, PACKET_ID_STATUS);
            write_string(&mut payload, json);
            socket.write_all(&frame(&payload)).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_query_players() {
        let addr = serve_status(
            r#"{"version":{"name":"1.21.4","protocol":769},"players":{"max":20,"online":5},"description":{"text":"survival"}}"#,
        )
        .await;

        let status = query_status(&addr).await.unwrap();
        let players = status.players.as_ref().unwrap();
        assert_eq!(players.online, 5);
        assert_eq!(players.max, 20);
        assert_eq!(status.version.unwrap().protocol, 769);
    }

    #[tokio::test]
    async fn test_ping_reports_success() {
        let addr = serve_status(r#"{"players":{"online":0}}"#).await;
        let backend = SlpBackend::new("lobby", addr, Duration::from_secs(2));
        match backend.ping().await {
            PollOutcome::Success { online } => assert_eq!(online, 0),
            PollOutcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[tokio::test]
    async fn test_hidden_player_list_is_alive_and_empty() {
        let addr = serve_status(
            r#"{"version":{"name":"1.21.4","protocol":769},"description":{"text":"hidden"}}"#,
        )
        .await;
        let backend = SlpBackend::new("lobby", addr, Duration::from_secs(2));
        match backend.ping().await {
            PollOutcome::Success { online } => assert_eq!(online, 0),
            PollOutcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_failure() {
        let addr = serve_status(r#"{"players":{"online":"five"}"#).await;
        let err = query_players(&addr, Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, ProbeError::Json(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_failure() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let backend = SlpBackend::new("survival", addr, Duration::from_secs(2));
        assert!(!backend.ping().await.is_success());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = query_players(&addr, Duration::from_millis(200)).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout(_)));
    }
}
