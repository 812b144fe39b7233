//! Wire shapes of the phased-rotation contract.
//!
//! External callers drive rotation by posting events shaped
//! `{secretIdentifier, requestToken, step}` and receive
//! `{statusCode, body}` back. These shapes are bit-exact for
//! compatibility; unknown step strings fail at deserialization.

use serde::{Deserialize, Serialize};

/// The four protocol steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationStep {
    CreateSecret,
    SetSecret,
    TestSecret,
    FinishSecret,
}

impl std::fmt::Display for RotationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CreateSecret => "CreateSecret",
            Self::SetSecret => "SetSecret",
            Self::TestSecret => "TestSecret",
            Self::FinishSecret => "FinishSecret",
        };
        f.write_str(s)
    }
}

/// Inbound rotation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationEvent {
    /// Secret the event targets
    pub secret_identifier: String,

    /// Caller-supplied idempotency token for this rotation attempt
    pub request_token: String,

    /// Protocol step to execute
    pub step: RotationStep,
}

impl RotationEvent {
    pub fn new(
        secret_identifier: impl Into<String>,
        request_token: impl Into<String>,
        step: RotationStep,
    ) -> Self {
        Self {
            secret_identifier: secret_identifier.into(),
            request_token: request_token.into(),
            step,
        }
    }
}

/// Response body: a step acknowledgement or an error string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Message { message: String, step: RotationStep },
    Error { error: String },
}

/// Outbound rotation response, `statusCode` 200 or 500.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

impl RotationResponse {
    /// 200 with a step acknowledgement.
    pub fn ok(message: impl Into<String>, step: RotationStep) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Message {
                message: message.into(),
                step,
            },
        }
    }

    /// 500 with an error string.
    pub fn error(error: impl std::fmt::Display) -> Self {
        Self {
            status_code: 500,
            body: ResponseBody::Error {
                error: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}
