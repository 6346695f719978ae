use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::sync::Mutex;
use std::time::Duration;

use super::{CallError, Caller, Function, Param};
use crate::models::GameCategory;

/// One call observed by the stub, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub category: GameCategory,
    pub function: Function,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone)]
enum Reply {
    Body(Vec<u8>),
    Fail(String),
}

/// In-process backend with canned replies. Functions without a configured
/// reply answer with an empty body.
#[derive(Default)]
pub struct StubCaller {
    replies: DashMap<Function, Reply>,
    delays: DashMap<Function, Duration>,
    history: Mutex<Vec<RecordedCall>>,
}

impl StubCaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies suitable for driving a client locally without a backend.
    pub fn demo() -> Self {
        let stub = Self::new();
        stub.respond(
            Function::LoginCheck,
            r#"{"event":true,"data":{"user":{"UserID":"1","HallID":"1"},"Session":{"Session":"demo"}}}"#,
        );
        for function in [
            Function::MachineOccupy,
            Function::OnLoadInfo,
            Function::GetMachineDetail,
            Function::BeginGame,
            Function::CreditExchange,
            Function::BalanceExchange,
            Function::MachineLeave,
        ] {
            stub.respond(function, r#"{"event":true}"#);
        }
        stub
    }

    pub fn respond(&self, function: Function, body: impl Into<Vec<u8>>) -> &Self {
        self.replies.insert(function, Reply::Body(body.into()));
        self
    }

    pub fn fail(&self, function: Function, reason: &str) -> &Self {
        self.replies.insert(function, Reply::Fail(reason.to_string()));
        self
    }

    /// Hold every call to `function` for `delay` before replying.
    pub fn delay(&self, function: Function, delay: Duration) -> &Self {
        self.delays.insert(function, delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    pub fn functions(&self) -> Vec<Function> {
        self.calls().into_iter().map(|c| c.function).collect()
    }
}

impl Caller for StubCaller {
    fn call<'a>(
        &'a self,
        category: GameCategory,
        function: Function,
        params: &'a [Param],
    ) -> BoxFuture<'a, Result<Vec<u8>, CallError>> {
        async move {
            if let Ok(mut history) = self.history.lock() {
                history.push(RecordedCall {
                    category,
                    function,
                    params: params.to_vec(),
                });
            }

            let delay = self.delays.get(&function).map(|d| *d);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let reply = self.replies.get(&function).map(|r| r.clone());
            match reply {
                Some(Reply::Body(body)) => Ok(body),
                Some(Reply::Fail(reason)) => Err(CallError::Stub(reason)),
                None => Ok(Vec::new()),
            }
        }
        .boxed()
    }
}
