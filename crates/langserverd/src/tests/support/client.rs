//! Minimal protocol client that talks to a running daemon over TCP.

use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use langserver_protocol::{
    ConnectionStream, DispatchError, Flow, Method, ProtocolError, RequestError, Router, Session,
    SessionHandle, SessionOptions,
};
use serde_json::{Value, json};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Client-side router that serves nothing.
struct RejectingRouter;

impl Router for RejectingRouter {
    fn handle_request(&mut self, method: Method, _params: Value) -> Result<Value, DispatchError> {
        Err(ProtocolError::method_not_found(method.as_str()).into())
    }

    fn handle_notification(
        &mut self,
        _method: Method,
        _params: Value,
    ) -> Result<Flow, DispatchError> {
        Ok(Flow::Continue)
    }
}

/// Client session connected to the daemon.
pub struct Client {
    session: Option<SessionHandle>,
}

impl Client {
    /// Connects to `addr` and starts the client session.
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect to daemon");
        Self::over(ConnectionStream::from(stream))
    }

    /// Starts a client session on an already connected stream.
    pub fn over(stream: ConnectionStream) -> Self {
        let session = Session::new(
            stream,
            SessionOptions::labelled("client"),
            |_| RejectingRouter,
        )
        .expect("client session")
        .spawn()
        .expect("spawn client session");
        Self {
            session: Some(session),
        }
    }

    fn session(&self) -> &SessionHandle {
        self.session.as_ref().expect("client session")
    }

    /// Sends a request and waits for its outcome.
    pub fn request(&self, method: impl AsRef<str>, params: Value) -> Result<Value, RequestError> {
        let pending = self.session().peer().send(method, params)?;
        pending
            .wait_timeout(RESPONSE_TIMEOUT)
            .unwrap_or_else(|_| panic!("no response within {RESPONSE_TIMEOUT:?}"))
    }

    /// Sends a notification.
    pub fn notify(&self, method: Method, params: Value) {
        self.session()
            .peer()
            .notify(method, params)
            .expect("send notification");
    }

    /// Runs the `initialize` handshake and returns the server's result.
    pub fn initialize(&self) -> Result<Value, RequestError> {
        let result = self.request(
            Method::Initialize,
            json!({"processId": null, "rootUri": "file:///", "capabilities": {}}),
        )?;
        self.notify(Method::Initialized, json!({}));
        Ok(result)
    }

    /// Waits until the server side has closed the connection.
    pub fn wait_until_closed(&self) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.session().is_finished() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
            let _ = session.join();
        }
    }
}

/// Parameters addressing `uri` at `line:character`.
pub fn position_params(uri: &str, line: u32, character: u32) -> Value {
    json!({
        "textDocument": {"uri": uri},
        "position": {"line": line, "character": character}
    })
}
