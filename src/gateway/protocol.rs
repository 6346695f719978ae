use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

use crate::error::GatewayError;
use crate::models::{HallId, UserId};

/// Action names carried in the `action` field of frames.
pub mod action {
    pub const LOGIN: &str = "loginBySid";
    pub const LOAD_INFO: &str = "onLoadInfo2";
    pub const GET_MACHINE_DETAIL: &str = "getMachineDetail";
    pub const BEGIN_GAME: &str = "beginGame4";
    pub const EXCHANGE_CREDIT: &str = "creditExchange";
    pub const EXCHANGE_BALANCE: &str = "balanceExchange";

    pub const READY: &str = "ready";
    pub const ON_LOGIN: &str = "onLogin";
    pub const ON_TAKE_MACHINE: &str = "onTakeMachine";
    pub const ON_LOAD_INFO: &str = "onOnLoadInfo2";
    pub const ON_GET_MACHINE_DETAIL: &str = "onGetMachineDetail";
    pub const ON_BEGIN_GAME: &str = "onBeginGame";
    pub const ON_EXCHANGE_CREDIT: &str = "onCreditExchange";
    pub const ON_EXCHANGE_BALANCE: &str = "onBalanceExchange";
}

/// One decoded inbound frame. Only `action` has to be well formed; the
/// other fields are taken as text whatever JSON type they arrive in.
#[derive(Debug, Default, Deserialize)]
pub struct ActionFrame {
    #[serde(default)]
    pub action: String,
    /// Client supplied session id. Only `loginBySid` uses it.
    #[serde(default, deserialize_with = "text")]
    pub sid: String,
    #[serde(default, rename = "rate", deserialize_with = "text")]
    pub bet_base: String,
    #[serde(default, deserialize_with = "text")]
    pub credit: String,
    #[serde(default, rename = "betInfo")]
    pub bet_info: Option<Value>,
}

impl ActionFrame {
    pub fn decode(raw: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(raw).map_err(GatewayError::InvalidEncoding)
    }

    /// Bet info as the backend expects it: strings unquoted, anything else as
    /// compact JSON.
    pub fn bet_info_text(&self) -> String {
        self.bet_info.as_ref().map(value_text).unwrap_or_default()
    }
}

/// Strings unquoted, `null` empty, anything else as compact JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| value_text(&v))
}

/// Identity extracted from a successful `loginCheck`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub user_id: UserId,
    pub hall_id: HallId,
    pub session_token: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    event: bool,
    data: LoginData,
}

#[derive(Deserialize)]
struct LoginData {
    user: LoginUser,
    #[serde(rename = "Session")]
    session: LoginSession,
}

#[derive(Deserialize)]
struct LoginUser {
    #[serde(rename = "UserID", deserialize_with = "numeric")]
    user_id: UserId,
    #[serde(rename = "HallID", deserialize_with = "numeric")]
    hall_id: HallId,
}

#[derive(Deserialize)]
struct LoginSession {
    #[serde(rename = "Session", deserialize_with = "token")]
    token: String,
}

impl LoginResult {
    pub fn parse(raw: &[u8]) -> Result<Self, GatewayError> {
        let resp: LoginResponse =
            serde_json::from_slice(raw).map_err(GatewayError::MalformedLoginResponse)?;
        if !resp.event {
            tracing::debug!("login response carries event=false");
        }
        Ok(Self {
            user_id: resp.data.user.user_id,
            hall_id: resp.data.user.hall_id,
            session_token: resp.data.session.token,
        })
    }
}

/// Outbound `{action, result}` message.
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub action: &'a str,
    pub result: Option<&'a RawValue>,
}

impl<'a> Envelope<'a> {
    /// Build an envelope around a raw backend payload. An empty payload
    /// becomes `null`; anything else must already be valid JSON.
    pub fn encode(action: &'a str, raw: &'a [u8]) -> Result<Vec<u8>, GatewayError> {
        let result = if raw.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(serde_json::from_slice::<&RawValue>(raw).map_err(GatewayError::Encode)?)
        };
        serde_json::to_vec(&Envelope { action, result }).map_err(GatewayError::Encode)
    }
}

/// Unsigned integer given either as a JSON number or a numeric string.
fn numeric<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    struct NumericVisitor<T>(PhantomData<T>);

    impl<T: TryFrom<u64>> Visitor<'_> for NumericVisitor<T> {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an unsigned integer or a numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
            T::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
            let v = u64::try_from(v).map_err(|_| E::custom(format!("{v} is negative")))?;
            self.visit_u64(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
            let n: u64 = v
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("{v:?} is not a number")))?;
            self.visit_u64(n)
        }
    }

    deserializer.deserialize_any(NumericVisitor(PhantomData))
}

/// Session token given as a string, tolerating numeric tokens.
fn token<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct TokenVisitor;

    impl Visitor<'_> for TokenVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a session token")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(TokenVisitor)
}
