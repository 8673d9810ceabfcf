//! Shared fixtures and helpers for session tests.

mod memory_fs;
mod recording_handler;
mod session_world;

use std::time::{Duration, Instant};

use serde_json::{Value, json};

use crate::connection::ConnectionStream;
use crate::errors::RequestError;
use crate::method::Method;
use crate::router::FileRouter;
use crate::session::{Session, SessionEnd, SessionHandle, SessionOptions};

pub use memory_fs::MemoryFileSystem;
pub use recording_handler::{
    Behaviour, RecordingHandle, RecordingHandler, sample_location, symbol,
};
pub use session_world::{SessionWorld, world};

/// A server session and a client session wired over an in-process stream
/// pair.
pub struct Channel {
    server: Option<SessionHandle>,
    client: Option<SessionHandle>,
    recording: RecordingHandle,
}

impl Channel {
    /// Connects a recording handler to a client serving `files`.
    pub fn open(options: SessionOptions, behaviour: Behaviour, files: MemoryFileSystem) -> Self {
        let (server_stream, client_stream) = ConnectionStream::pair().expect("stream pair");
        let handler = RecordingHandler::new(behaviour);
        let recording = handler.handle();

        let server = Session::language(server_stream, options, move |peer| handler.with_peer(peer))
            .expect("server session")
            .spawn()
            .expect("spawn server session");
        let client = Session::new(client_stream, SessionOptions::labelled("client"), |_| {
            FileRouter::new(files)
        })
        .expect("client session")
        .spawn()
        .expect("spawn client session");

        Self {
            server: Some(server),
            client: Some(client),
            recording,
        }
    }

    /// Connects with default options and an empty workspace.
    pub fn connected() -> Self {
        Self::open(
            SessionOptions::labelled("server"),
            Behaviour::default(),
            MemoryFileSystem::default(),
        )
    }

    /// Calls recorded by the server-side handler.
    pub fn recording(&self) -> &RecordingHandle {
        &self.recording
    }

    /// Client-side session handle.
    pub fn client(&self) -> &SessionHandle {
        self.client.as_ref().expect("client session")
    }

    /// Server-side session handle.
    pub fn server(&self) -> &SessionHandle {
        self.server.as_ref().expect("server session")
    }

    /// Sends a request from the client and waits for the result.
    pub fn request(&self, method: impl AsRef<str>, params: Value) -> Result<Value, RequestError> {
        self.client().peer().send(method, params)?.wait()
    }

    /// Sends a notification from the client.
    pub fn notify(&self, method: Method, params: Value) {
        self.client()
            .peer()
            .notify(method, params)
            .expect("send notification");
    }

    /// Runs the `initialize` handshake.
    pub fn initialize(&self) -> Value {
        let result = self
            .request(Method::Initialize, initialize_params())
            .expect("initialize");
        self.notify(Method::Initialized, json!({}));
        result
    }

    /// Waits until both sessions have finished.
    pub fn wait_until_closed(&self) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if self.server().is_finished() && self.client().is_finished() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    /// Joins the server session and reports how it ended.
    pub fn join_server(&mut self) -> SessionEnd {
        self.server
            .take()
            .expect("server session")
            .join()
            .expect("server session result")
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        for handle in [self.client.take(), self.server.take()].into_iter().flatten() {
            handle.close();
            let _ = handle.join();
        }
    }
}

/// Minimal `initialize` parameters.
pub fn initialize_params() -> Value {
    json!({
        "processId": null,
        "rootUri": "file:///",
        "capabilities": {}
    })
}

/// Parameters addressing `uri` at `line:character`.
pub fn position_params(uri: &str, line: u32, character: u32) -> Value {
    json!({
        "textDocument": {"uri": uri},
        "position": {"line": line, "character": character}
    })
}

/// Error code carried by a failed request.
pub fn error_code(result: &Result<Value, RequestError>) -> Option<i64> {
    match result {
        Err(RequestError::Remote(error)) => Some(error.code),
        _ => None,
    }
}
