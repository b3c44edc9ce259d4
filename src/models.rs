use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;

// Inbound send-message request format
#[derive(Deserialize, Debug, Clone)]
pub struct SendMessageRequest {
    pub to: String,
    pub template: String,
    #[serde(default)]
    pub language: Option<String>,
    // Opaque upstream template components, forwarded verbatim
    #[serde(default)]
    pub components: Option<Value>,
}

impl SendMessageRequest {
    /// Parse and validate a raw request body. Manual parsing keeps malformed
    /// bodies on the gateway's JSON error envelope instead of axum's
    /// plaintext rejection.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| ApiError::BadRequest("invalid JSON body".into()))?;

        let req: SendMessageRequest = serde_json::from_value(value)
            .map_err(|_| ApiError::BadRequest("missing required fields: to, template".into()))?;

        if !is_valid_phone(&req.to) {
            return Err(ApiError::BadRequest("invalid phone number format".into()));
        }
        if !is_valid_template_name(&req.template) {
            return Err(ApiError::BadRequest("invalid template name".into()));
        }
        Ok(req)
    }

    /// Build the Graph API template-message envelope.
    pub fn to_upstream_envelope(&self, default_language: &str) -> Value {
        let language = self.language.as_deref().unwrap_or(default_language);
        let mut template = json!({
            "name": self.template,
            "language": { "code": language },
        });
        if let Some(components) = &self.components {
            template["components"] = components.clone();
        }
        json!({
            "messaging_product": "whatsapp",
            "to": self.to,
            "type": "template",
            "template": template,
        })
    }
}

// E.164-ish: "+" followed by 7-15 digits
pub fn is_valid_phone(to: &str) -> bool {
    let Some(digits) = to.strip_prefix('+') else {
        return false;
    };
    (7..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

// Template names are identifier-safe: letters, digits, "_", "-", "."
pub fn is_valid_template_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}
