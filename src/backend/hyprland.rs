// src/backend/hyprland.rs

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

const NAME: &str = "hyprland";
const SIGNATURE_VAR: &str = "HYPRLAND_INSTANCE_SIGNATURE";

#[derive(Deserialize, Debug)]
struct Workspace {
    id: i64,
}

#[derive(Deserialize, Debug)]
struct Client {
    address: String,
    workspace: Workspace,
}

fn instance_signature() -> Option<String> {
    env::var(SIGNATURE_VAR).ok().filter(|s| !s.is_empty())
}

/// `$XDG_RUNTIME_DIR/hypr/<sig>/.socket.sock`, or the legacy `/tmp/hypr` location.
fn socket_path(runtime_dir: Option<PathBuf>, signature: &str) -> PathBuf {
    let preferred = runtime_dir.map(|dir| dir.join("hypr").join(signature).join(".socket.sock"));
    match preferred {
        Some(path) if path.exists() => path,
        _ => PathBuf::from("/tmp/hypr").join(signature).join(".socket.sock"),
    }
}

/// Addresses of the clients living on `workspace`.
fn clients_on(clients: Vec<Client>, workspace: i64) -> Vec<String> {
    clients
        .into_iter()
        .filter(|c| c.workspace.id == workspace)
        .map(|c| c.address)
        .collect()
}

/// Request/reply client for Hyprland's command socket.
#[derive(Debug, Clone)]
pub struct HyprlandClient {
    socket: PathBuf,
    timeout: Duration,
}

impl HyprlandClient {
    pub fn new(socket: PathBuf) -> Self {
        Self {
            socket,
            timeout: Duration::from_millis(IPC_TIMEOUT_MS),
        }
    }

    fn io_error(source: std::io::Error) -> BackendError {
        BackendError::IpcIo { backend: NAME, source }
    }

    fn reply_error(message: impl Into<String>) -> BackendError {
        BackendError::IpcReply {
            backend: NAME,
            message: message.into(),
        }
    }

    async fn exchange(&self, request: &str) -> Result<String, BackendError> {
        let mut stream = UnixStream::connect(&self.socket).await.map_err(Self::io_error)?;
        stream.write_all(request.as_bytes()).await.map_err(Self::io_error)?;
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.map_err(Self::io_error)?;
        Ok(reply)
    }

    /// Sends one request; the socket closes after its reply.
    pub fn request(&self, request: &str) -> Result<String, BackendError> {
        log::trace!("hyprland request: {}", request);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Self::io_error)?;
        runtime.block_on(async {
            tokio::time::timeout(self.timeout, self.exchange(request))
                .await
                .map_err(|_| BackendError::IpcTimeout { backend: NAME })?
        })
    }

    /// A `dispatch` request; Hyprland answers `ok` on success.
    pub fn dispatch(&self, args: &str) -> Result<(), BackendError> {
        let reply = self.request(&format!("dispatch {}", args))?;
        if reply.trim() == "ok" {
            Ok(())
        } else {
            Err(Self::reply_error(reply.trim().to_string()))
        }
    }

    fn json<T: serde::de::DeserializeOwned>(&self, request: &str) -> Result<T, BackendError> {
        let reply = self.request(request)?;
        serde_json::from_str(&reply).map_err(|e| Self::reply_error(e.to_string()))
    }
}

impl WorkspaceIpc for HyprlandClient {
    fn backend_name(&self) -> &'static str {
        NAME
    }

    fn focused_workspace_windows(&self) -> Result<Vec<String>, BackendError> {
        let active: Workspace = self.json("j/activeworkspace")?;
        let clients: Vec<Client> = self.json("j/clients")?;
        Ok(clients_on(clients, active.id))
    }

    fn kill_window(&self, window: &str) -> Result<(), BackendError> {
        self.dispatch(&format!("closewindow address:{}", window))
    }

    fn exec(&self, command_line: &str) -> Result<(), BackendError> {
        self.dispatch(&format!("exec {}", command_line))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HyprlandBackend;

impl Backend for HyprlandBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn check(&self) -> bool {
        instance_signature().is_some()
    }

    fn order(&self) -> i32 {
        201
    }

    fn run(&self, target: &Target, opts: &RunOptions) -> Result<(), BackendError> {
        let signature =
            instance_signature().ok_or_else(|| BackendError::NoBackendAvailable(Some(NAME.to_string())))?;
        let client = HyprlandClient::new(socket_path(dirs::runtime_dir(), &signature));
        let term = env::var("TERM").unwrap_or_default();
        reconciler::reconcile_workspace(&client, target, opts, &term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_silent_socket_times_out() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let socket = dir.path().join(".socket.sock");
        let listener = std::os::unix::net::UnixListener::bind(&socket).unwrap();
        let server = std::thread::spawn(move || {
            // Accept once, read nothing, reply nothing.
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_millis(800));
            drop(stream);
        });

        // --- Execute ---
        let started = std::time::Instant::now();
        let err = HyprlandClient::new(socket).request("j/clients").unwrap_err();

        // --- Assert ---
        assert!(matches!(err, BackendError::IpcTimeout { backend: NAME }));
        assert!(started.elapsed() < Duration::from_millis(700));
        server.join().unwrap();
    }

    #[test]
    fn test_socket_path_prefers_runtime_dir() {
        let dir = tempdir().unwrap();
        let sock_dir = dir.path().join("hypr").join("abc");
        std::fs::create_dir_all(&sock_dir).unwrap();
        std::fs::write(sock_dir.join(".socket.sock"), "").unwrap();

        assert_eq!(
            socket_path(Some(dir.path().to_path_buf()), "abc"),
            sock_dir.join(".socket.sock")
        );
        assert_eq!(
            socket_path(Some(dir.path().to_path_buf()), "other"),
            PathBuf::from("/tmp/hypr/other/.socket.sock")
        );
        assert_eq!(socket_path(None, "abc"), PathBuf::from("/tmp/hypr/abc/.socket.sock"));
    }

    #[test]
    fn test_clients_on_active_workspace() {
        let clients: Vec<Client> = serde_json::from_str(
            r#"[
                {"address": "0x1", "workspace": {"id": 1, "name": "1"}, "class": "foot"},
                {"address": "0x2", "workspace": {"id": 2, "name": "2"}},
                {"address": "0x3", "workspace": {"id": 1, "name": "1"}}
            ]"#,
        )
        .unwrap();
        assert_eq!(clients_on(clients, 1), vec!["0x1".to_string(), "0x3".to_string()]);
    }
}
