//! Action table of the game session state machine.
//!
//! Every recognized client action maps to one backend function, the action
//! name of its response, and what happens when the backend call fails.

use super::protocol::{action, ActionFrame};
use super::session::Session;
use crate::backend::{Function, Param};

/// Recognized client actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    LoadInfo,
    GetMachineDetail,
    BeginGame,
    ExchangeCredit,
    ExchangeBalance,
}

/// Reaction to a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    /// Abandon the step: no state change, nothing sent.
    Abort,
    /// Send the response anyway, with whatever the backend produced.
    Forward,
}

#[derive(Debug)]
pub struct Rule {
    pub action: Action,
    pub wire_name: &'static str,
    pub function: Function,
    pub response: &'static str,
    pub on_error: OnError,
}

pub const RULES: [Rule; 6] = [
    Rule {
        action: Action::Login,
        wire_name: action::LOGIN,
        function: Function::LoginCheck,
        response: action::ON_LOGIN,
        on_error: OnError::Abort,
    },
    Rule {
        action: Action::LoadInfo,
        wire_name: action::LOAD_INFO,
        function: Function::OnLoadInfo,
        response: action::ON_LOAD_INFO,
        on_error: OnError::Forward,
    },
    Rule {
        action: Action::GetMachineDetail,
        wire_name: action::GET_MACHINE_DETAIL,
        function: Function::GetMachineDetail,
        response: action::ON_GET_MACHINE_DETAIL,
        on_error: OnError::Forward,
    },
    Rule {
        action: Action::BeginGame,
        wire_name: action::BEGIN_GAME,
        function: Function::BeginGame,
        response: action::ON_BEGIN_GAME,
        on_error: OnError::Abort,
    },
    Rule {
        action: Action::ExchangeCredit,
        wire_name: action::EXCHANGE_CREDIT,
        function: Function::CreditExchange,
        response: action::ON_EXCHANGE_CREDIT,
        on_error: OnError::Forward,
    },
    Rule {
        action: Action::ExchangeBalance,
        wire_name: action::EXCHANGE_BALANCE,
        function: Function::BalanceExchange,
        response: action::ON_EXCHANGE_BALANCE,
        on_error: OnError::Forward,
    },
];

impl Action {
    pub fn from_name(name: &str) -> Option<Self> {
        RULES.iter().find(|r| r.wire_name == name).map(|r| r.action)
    }

    pub fn rule(self) -> &'static Rule {
        // RULES holds one entry per variant, in declaration order.
        &RULES[self as usize]
    }

    /// Positional parameters of this action's backend call.
    pub fn params(self, session: &Session, frame: &ActionFrame) -> Vec<Param> {
        match self {
            Action::Login => vec![Param::from(frame.sid.as_str())],
            Action::LoadInfo | Action::GetMachineDetail => {
                vec![Param::from(session.user_id()), Param::Int(0)]
            }
            Action::BeginGame => vec![
                Param::from(session.session_token()),
                Param::Int(0),
                Param::Text(frame.bet_info_text()),
            ],
            Action::ExchangeCredit => vec![
                Param::from(session.session_token()),
                Param::Int(0),
                Param::from(frame.bet_base.as_str()),
                Param::from(frame.credit.as_str()),
            ],
            Action::ExchangeBalance => identity_params(session),
        }
    }
}

/// `(userID, hallID, 0)`, shared by occupy, balance exchange and leave.
pub fn identity_params(session: &Session) -> Vec<Param> {
    vec![
        Param::from(session.user_id()),
        Param::from(session.hall_id()),
        Param::Int(0),
    ]
}
