//! Shared world for session behaviour tests.

use std::cell::RefCell;

use rstest::fixture;
use serde_json::Value;

use super::{Behaviour, Channel, MemoryFileSystem};
use crate::errors::RequestError;
use crate::router::ShutdownPolicy;
use crate::session::SessionOptions;

/// Mutable state threaded through session scenarios.
#[derive(Default)]
pub struct SessionWorld {
    pub policy: ShutdownPolicy,
    pub behaviour: Behaviour,
    pub files: MemoryFileSystem,
    pub channel: Option<Channel>,
    pub results: Vec<Result<Value, RequestError>>,
}

impl SessionWorld {
    /// Opens the channel using the configured policy, behaviour and files.
    pub fn connect(&mut self) {
        let options = SessionOptions {
            label: String::from("server"),
            trace: true,
            shutdown: self.policy,
        };
        self.channel = Some(Channel::open(
            options,
            self.behaviour.clone(),
            self.files.clone(),
        ));
    }

    /// The open channel.
    pub fn channel(&self) -> &Channel {
        self.channel.as_ref().expect("channel should be connected")
    }

    /// Mutable access to the open channel.
    pub fn channel_mut(&mut self) -> &mut Channel {
        self.channel.as_mut().expect("channel should be connected")
    }

    /// Sends a request and stores its outcome.
    pub fn request(&mut self, method: &str, params: Value) {
        let result = self.channel().request(method, params);
        self.results.push(result);
    }

    /// Outcome of the most recent request.
    pub fn last(&self) -> &Result<Value, RequestError> {
        self.results.last().expect("a request should have been sent")
    }

    /// Makes `textDocument/hover` fail with the given code.
    pub fn fail_hover(&mut self, code: i64) {
        self.behaviour.hover_error = Some((code, String::from("index missing")));
    }
}

/// Fresh world for each scenario.
#[fixture]
pub fn world() -> RefCell<SessionWorld> {
    RefCell::new(SessionWorld::default())
}
