//! Shared utilities for integration testing: a programmable HTTP backend
//! that records every request, and a mock chain node built on it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const TEST_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
pub const TEST_PUBKEY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";
pub const CHAIN_ID: &str = "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906";
pub const HEAD_BLOCK_NUM: u32 = 0x0001_2345;
pub const HEAD_BLOCK_ID: &str = "00012345aabbccdd0102030405060708090a0b0c0d0e0f101112131415161718";
/// Far enough ahead that resolved transactions never expire during a test.
pub const HEAD_BLOCK_TIME: &str = "2050-01-01T00:00:00.000";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// Requests seen by a backend, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<RecordedRequest>>>);

impl Recorder {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    fn push(&self, request: RecordedRequest) {
        self.0.lock().unwrap().push(request);
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(RecordedRequest { method, path, body })
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Start a backend on an ephemeral port that answers each request with
/// `f(request)` and records it.
pub async fn start_programmable_backend<F>(f: F) -> (SocketAddr, Recorder)
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder = Recorder::default();
    let f = Arc::new(f);

    let seen = recorder.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(&request);
                        seen.push(request);
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            status_text(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, recorder)
}

/// A backend that always answers `status` with an empty JSON object.
pub async fn start_mock_backend(status: u16) -> (SocketAddr, Recorder) {
    start_programmable_backend(move |_| (status, "{}".to_string())).await
}

pub fn token_abi() -> Value {
    json!({
        "version": "eosio::abi/1.1",
        "structs": [{"name": "transfer", "base": "", "fields": [
            {"name": "from", "type": "name"},
            {"name": "to", "type": "name"},
            {"name": "quantity", "type": "asset"},
            {"name": "memo", "type": "string"}
        ]}],
        "actions": [{"name": "transfer", "type": "transfer", "ricardian_contract": ""}]
    })
}

/// How the mock node answers `push_transaction`.
#[derive(Debug, Clone)]
pub enum PushBehaviour {
    Accept { transaction_id: String, block_num: u32 },
    Reject,
}

/// Start a mock chain node serving `abis` by account name.
pub async fn start_mock_chain(
    abis: HashMap<String, Value>,
    push: PushBehaviour,
) -> (String, Recorder) {
    let (addr, recorder) = start_programmable_backend(move |request| {
        match request.path.as_str() {
            "/v1/chain/get_info" => (
                200,
                json!({
                    "chain_id": CHAIN_ID,
                    "head_block_num": HEAD_BLOCK_NUM,
                    "head_block_id": HEAD_BLOCK_ID,
                    "last_irreversible_block_num": HEAD_BLOCK_NUM - 300,
                    "server_version": "mock"
                })
                .to_string(),
            ),
            "/v1/chain/get_block" => (
                200,
                json!({
                    "block_num": HEAD_BLOCK_NUM,
                    "id": HEAD_BLOCK_ID,
                    "timestamp": HEAD_BLOCK_TIME,
                    "ref_block_prefix": 0x0403_0201u32,
                    "transactions": []
                })
                .to_string(),
            ),
            "/v1/chain/get_abi" => {
                let account = request.json()["account_name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let abi = abis.get(&account).cloned().unwrap_or(Value::Null);
                (200, json!({ "account_name": account, "abi": abi }).to_string())
            }
            "/v1/chain/push_transaction" => match &push {
                PushBehaviour::Accept {
                    transaction_id,
                    block_num,
                } => (
                    202,
                    json!({
                        "transaction_id": transaction_id,
                        "processed": {
                            "id": transaction_id,
                            "block_num": block_num,
                            "block_time": HEAD_BLOCK_TIME,
                            "receipt": {"status": "executed"}
                        }
                    })
                    .to_string(),
                ),
                PushBehaviour::Reject => (
                    500,
                    json!({
                        "code": 500,
                        "message": "Internal Service Error",
                        "error": {
                            "code": 3050003,
                            "name": "eosio_assert_message_exception",
                            "what": "eosio_assert_message assertion failure",
                            "details": [{"message": "assertion failure with message: overdrawn balance"}]
                        }
                    })
                    .to_string(),
                ),
            },
            _ => (404, json!({"code": 404, "message": "Not Found"}).to_string()),
        }
    })
    .await;

    (format!("http://{addr}"), recorder)
}
