//! Command response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::connection::SocketUser;
use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode, UserId};

use super::{wire, RequestEnvelope};

/// Structured error carried by a failed response or a handshake rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescription {
    pub code: String,
    pub message: String,
}

impl ErrorDescription {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Reads an inbound `error` field. `None` when it is null.
    ///
    /// Numeric codes are stringified and a missing code reads as
    /// `INTERNAL_ERROR`. A bare string or number is taken as the message.
    fn from_wire(value: &Value) -> Option<Self> {
        let (code, message) = match value {
            Value::Null => return None,
            Value::Object(fields) => (
                fields.get("code").and_then(wire::text),
                fields.get("message").and_then(wire::text),
            ),
            other => (None, wire::text(other)),
        };
        Some(Self::new(
            code.unwrap_or_else(|| ErrorCode::InternalError.as_str().to_string()),
            message.unwrap_or_default(),
        ))
    }
}

impl From<&DomainError> for ErrorDescription {
    fn from(err: &DomainError) -> Self {
        Self::new(err.code.as_str(), err.message.clone())
    }
}

impl From<DomainError> for ErrorDescription {
    fn from(err: DomainError) -> Self {
        Self::from(&err)
    }
}

/// Either a result or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseOutcome {
    #[serde(rename = "response")]
    Success(Value),
    #[serde(rename = "error")]
    Failure(ErrorDescription),
}

/// Answer to exactly one request, routed only by `client_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Equals the originating request's `id`.
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ConnectionId>,
}

impl ResponseEnvelope {
    /// Builds the reply to a stamped request, addressed to its sender connection.
    pub fn reply_to(request: &RequestEnvelope, outcome: ResponseOutcome) -> Self {
        Self {
            id: request.id.clone(),
            name: request.name.clone(),
            outcome,
            user_id: request.options.user_id.clone(),
            client_id: request.options.client_id.clone(),
        }
    }

    /// Successful reply to `request`.
    pub fn success(request: &RequestEnvelope, value: Value) -> Self {
        Self::reply_to(request, ResponseOutcome::Success(value))
    }

    /// Failed reply to `request`.
    pub fn failure(request: &RequestEnvelope, error: impl Into<ErrorDescription>) -> Self {
        Self::reply_to(request, ResponseOutcome::Failure(error.into()))
    }

    /// Parses an inbound payload. `None` for null payloads or a missing `id`.
    ///
    /// A void reply may omit `response` entirely. A non-null `error` wins
    /// over `response`.
    pub fn from_wire(value: Value) -> Option<Self> {
        let mut fields = wire::fields(value)?;
        let id = wire::correlation_id(&fields, "id")?;
        let error = fields.get("error").and_then(ErrorDescription::from_wire);
        let outcome = match error {
            Some(error) => ResponseOutcome::Failure(error),
            None => ResponseOutcome::Success(wire::take(&mut fields, "response")),
        };
        Some(Self {
            id,
            name: wire::name(&fields),
            outcome,
            user_id: None,
            client_id: None,
        })
    }

    /// Overwrites `userId`/`clientId` with the sender.
    pub fn stamp(&mut self, sender: &SocketUser) {
        self.user_id = Some(sender.user_id.clone());
        self.client_id = Some(sender.client_id.clone());
    }

    /// Stamped sender, if any.
    pub fn sender(&self) -> Option<SocketUser> {
        Some(SocketUser::new(self.user_id.clone()?, self.client_id.clone()?))
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Success(_))
    }
}
