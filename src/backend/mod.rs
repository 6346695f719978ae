pub mod flash2db;
pub mod stub;

use futures_util::future::BoxFuture;
use std::fmt;

use crate::models::GameCategory;

pub use flash2db::Flash2db;
pub use stub::StubCaller;

/// Remote functions the gateway invokes on the game backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    LoginCheck,
    MachineOccupy,
    OnLoadInfo,
    GetMachineDetail,
    BeginGame,
    CreditExchange,
    BalanceExchange,
    MachineLeave,
}

impl Function {
    pub fn as_str(self) -> &'static str {
        match self {
            Function::LoginCheck => "loginCheck",
            Function::MachineOccupy => "machineOccupy",
            Function::OnLoadInfo => "onLoadInfo",
            Function::GetMachineDetail => "getMachineDetail",
            Function::BeginGame => "beginGame",
            Function::CreditExchange => "creditExchange",
            Function::BalanceExchange => "balanceExchange",
            Function::MachineLeave => "machineLeave",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positional backend parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Int(u64),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Text(s) => f.write_str(s),
            Param::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Text(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Text(s)
    }
}

impl From<u64> for Param {
    fn from(n: u64) -> Self {
        Param::Int(n)
    }
}

impl From<u32> for Param {
    fn from(n: u32) -> Self {
        Param::Int(n.into())
    }
}

impl From<u16> for Param {
    fn from(n: u16) -> Self {
        Param::Int(n.into())
    }
}

#[derive(Debug)]
pub enum CallError {
    Http(reqwest::Error),
    Status { status: u16, body: String },
    UnknownService { category: GameCategory },
    /// A param that would not stay a single path segment.
    InvalidParam(String),
    InvalidBaseUrl(String),
    Stub(String),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Http(e) => write!(f, "HTTP error: {e}"),
            CallError::Status { status, body } => {
                write!(f, "backend returned {status}: {body}")
            }
            CallError::UnknownService { category } => {
                write!(f, "no backend service for game category {category}")
            }
            CallError::InvalidParam(param) => write!(f, "invalid backend param {param:?}"),
            CallError::InvalidBaseUrl(url) => write!(f, "invalid backend base URL {url}"),
            CallError::Stub(msg) => write!(f, "stub failure: {msg}"),
        }
    }
}

impl std::error::Error for CallError {}

impl From<reqwest::Error> for CallError {
    fn from(e: reqwest::Error) -> Self {
        CallError::Http(e)
    }
}

/// Request/response access to the game backend.
///
/// Calls for one session are issued strictly one at a time; implementations
/// only need to be safe for concurrent calls from different sessions.
pub trait Caller: Send + Sync {
    fn call<'a>(
        &'a self,
        category: GameCategory,
        function: Function,
        params: &'a [Param],
    ) -> BoxFuture<'a, Result<Vec<u8>, CallError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_wire_names() {
        assert_eq!(Function::LoginCheck.to_string(), "loginCheck");
        assert_eq!(Function::OnLoadInfo.to_string(), "onLoadInfo");
        assert_eq!(Function::MachineLeave.to_string(), "machineLeave");
    }

    #[test]
    fn test_param_display() {
        assert_eq!(Param::from("abc").to_string(), "abc");
        assert_eq!(Param::from(9527u32).to_string(), "9527");
        assert_eq!(Param::from(0u64).to_string(), "0");
    }
}
