// src/backend/i3.rs

//! i3 and sway share one IPC protocol: a 14-byte header (`i3-ipc`, payload
//! length, message type, both native-endian `u32`) followed by a JSON payload.

use super::compositor::{self, TreeNode};
use super::{Backend, BackendError, RunOptions};
use crate::constants::IPC_TIMEOUT_MS;
use crate::core::reconciler::{self, WorkspaceIpc};
use crate::models::Target;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

const MAGIC: &[u8; 6] = b"i3-ipc";
const HEADER_LEN: usize = 14;
const RUN_COMMAND: u32 = 0;
const GET_TREE: u32 = 4;

/// Encodes one IPC request frame.
fn encode_frame(message_type: u32, payload: &str) -> Result<Vec<u8>, BackendError> {
    let length = u32::try_from(payload.len()).map_err(|_| BackendError::IpcReply {
        backend: "i3",
        message: "request payload too large".to_string(),
    })?;
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(MAGIC);
    frame.extend_from_slice(&length.to_ne_bytes());
    frame.extend_from_slice(&message_type.to_ne_bytes());
    frame.extend_from_slice(payload.as_bytes());
    Ok(frame)
}

/// Decodes a reply header into `(payload length, message type)`.
fn decode_header(header: &[u8; HEADER_LEN]) -> Option<(usize, u32)> {
    let (magic, rest) = header.split_at(MAGIC.len());
    if magic != MAGIC {
        return None;
    }
    let (length, message_type) = rest.split_at(4);
    let length = u32::from_ne_bytes(length.try_into().ok()?);
    let message_type = u32::from_ne_bytes(message_type.try_into().ok()?);
    Some((usize::try_from(length).ok()?, message_type))
}

#[derive(Deserialize, Debug)]
struct CommandOutcome {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// A connection-per-request client for an i3-compatible socket.
#[derive(Debug, Clone)]
pub struct I3Client {
    backend: &'static str,
    socket: PathBuf,
    timeout: Duration,
}

impl I3Client {
    pub fn new(backend: &'static str, socket: PathBuf) -> Self {
        Self {
            backend,
            socket,
            timeout: Duration::from_millis(IPC_TIMEOUT_MS),
        }
    }

    fn io_error(&self, source: std::io::Error) -> BackendError {
        BackendError::IpcIo {
            backend: self.backend,
            source,
        }
    }

    fn reply_error(&self, message: impl Into<String>) -> BackendError {
        BackendError::IpcReply {
            backend: self.backend,
            message: message.into(),
        }
    }

    async fn exchange(&self, message_type: u32, payload: &str) -> Result<Vec<u8>, BackendError> {
        let mut stream = UnixStream::connect(&self.socket)
            .await
            .map_err(|e| self.io_error(e))?;
        stream
            .write_all(&encode_frame(message_type, payload)?)
            .await
            .map_err(|e| self.io_error(e))?;

        let mut header = [0u8; HEADER_LEN];
        stream.read_exact(&mut header).await.map_err(|e| self.io_error(e))?;
        let (length, reply_type) =
            decode_header(&header).ok_or_else(|| self.reply_error("bad magic in reply header"))?;
        if reply_type != message_type {
            return Err(self.reply_error(format!(
                "expected reply type {}, got {}",
                message_type, reply_type
            )));
        }

        let mut body = vec![0u8; length];
        stream.read_exact(&mut body).await.map_err(|e| self.io_error(e))?;
        Ok(body)
    }

    /// Sends one request and waits for its reply, bounded by the IPC timeout.
    pub fn request(&self, message_type: u32, payload: &str) -> Result<Vec<u8>, BackendError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| self.io_error(e))?;
        runtime.block_on(async {
            tokio::time::timeout(self.timeout, self.exchange(message_type, payload))
                .await
                .map_err(|_| BackendError::IpcTimeout { backend: self.backend })?
        })
    }

    pub fn run_command(&self, command: &str) -> Result<(), BackendError> {
        log::trace!("{} RUN_COMMAND: {}", self.backend, command);
        let body = self.request(RUN_COMMAND, command)?;
        let outcomes: Vec<CommandOutcome> =
            serde_json::from_slice(&body).map_err(|e| self.reply_error(e.to_string()))?;
        match outcomes.into_iter().find(|o| !o.success) {
            Some(failed) => Err(self.reply_error(
                failed.error.unwrap_or_else(|| format!("command '{}' failed", command)),
            )),
            None => Ok(()),
        }
    }

    pub fn tree(&self) -> Result<TreeNode, BackendError> {
        let body = self.request(GET_TREE, "")?;
        serde_json::from_slice(&body).map_err(|e| self.reply_error(e.to_string()))
    }
}

impl WorkspaceIpc for I3Client {
    fn backend_name(&self) -> &'static str {
        self.backend
    }

    fn focused_workspace_windows(&self) -> Result<Vec<String>, BackendError> {
        let tree = self.tree()?;
        let workspace = compositor::focused_workspace(&tree)
            .ok_or(BackendError::NoFocusedWorkspace { backend: self.backend })?;
        Ok(compositor::workspace_windows(workspace)
            .into_iter()
            .map(|id| id.to_string())
            .collect())
    }

    fn kill_window(&self, window: &str) -> Result<(), BackendError> {
        self.run_command(&format!("[con_id={}] kill", window))
    }

    fn exec(&self, command_line: &str) -> Result<(), BackendError> {
        self.run_command(&format!("exec {}", command_line))
    }
}

/// i3 or sway, told apart only by which socket variable is set.
#[derive(Debug, Clone)]
pub struct I3Backend {
    name: &'static str,
    socket_var: &'static str,
    order: i32,
}

impl I3Backend {
    pub fn sway() -> Self {
        Self {
            name: "sway",
            socket_var: "SWAYSOCK",
            order: 201,
        }
    }

    pub fn i3() -> Self {
        Self {
            name: "i3",
            socket_var: "I3SOCK",
            order: 200,
        }
    }

    fn socket(&self) -> Option<PathBuf> {
        env::var_os(self.socket_var)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

impl Backend for I3Backend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn check(&self) -> bool {
        self.socket().is_some()
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn run(&self, target: &Target, opts: &RunOptions) -> Result<(), BackendError> {
        let socket = self
            .socket()
            .ok_or_else(|| BackendError::NoBackendAvailable(Some(self.name.to_string())))?;
        let term = env::var("TERM").unwrap_or_default();
        let client = I3Client::new(self.name, socket);
        reconciler::reconcile_workspace(&client, target, opts, &term)
    }
}
