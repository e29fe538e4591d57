//! Token header.

use serde::{Deserialize, Serialize};

/// Fixed `typ` value.
pub const TOKEN_TYPE: &str = "JWT";

/// `{alg, typ, kid?}`.
///
/// `alg` is parsed as a free string so a substituted value (`"none"`,
/// `"HS256"`) reaches the algorithm check and is reported as a mismatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl TokenHeader {
    pub fn new(alg: impl Into<String>, kid: Option<String>) -> Self {
        Self {
            alg: alg.into(),
            typ: TOKEN_TYPE.to_string(),
            kid,
        }
    }
}
