//! Identity records and request/response types for auth endpoints.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use time::Date;
use utoipa::ToSchema;

// Calendar dates travel as `YYYY-MM-DD`.
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Persisted identity. The credential is an Argon2 PHC string, never the raw secret.
#[derive(Clone, Debug)]
pub struct IdentityRecord {
    pub id: String,
    pub display_name: String,
    pub credential_hash: SecretString,
    pub date_of_birth: Option<Date>,
}

impl IdentityRecord {
    /// Public view of the record, without the credential.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            name: self.display_name.clone(),
            date_of_birth: self.date_of_birth,
        }
    }
}

/// The only representation of an identity ever returned to callers.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    #[serde(default, with = "iso_date::option")]
    #[schema(value_type = Option<String>, format = Date, example = "1993-07-15")]
    pub date_of_birth: Option<Date>,
}

/// Validated sign-up input handed to the credential verifier.
#[derive(Debug)]
pub struct NewIdentity {
    pub id: String,
    pub name: String,
    pub secret: SecretString,
    pub date_of_birth: Option<Date>,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub id: Option<String>,
    #[schema(value_type = Option<String>)]
    pub pwd: Option<SecretString>,
    pub name: Option<String>,
    #[serde(default, with = "iso_date::option")]
    #[schema(value_type = Option<String>, format = Date, example = "1993-07-15")]
    pub date_of_birth: Option<Date>,
}

impl From<SignUpRequest> for NewIdentity {
    fn from(request: SignUpRequest) -> Self {
        Self {
            id: request.id.unwrap_or_default(),
            name: request.name.unwrap_or_default(),
            secret: request.pwd.unwrap_or_else(|| SecretString::from(String::new())),
            date_of_birth: request.date_of_birth,
        }
    }
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct SignInRequest {
    pub id: Option<String>,
    #[schema(value_type = Option<String>)]
    pub pwd: Option<SecretString>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use secrecy::ExposeSecret;
    use time::macros::date;

    #[test]
    fn identity_serializes_camel_case_date() -> Result<()> {
        let identity = Identity {
            id: "myId".to_string(),
            name: "myName".to_string(),
            date_of_birth: Some(date!(1993 - 07 - 15)),
        };
        let value = serde_json::to_value(&identity)?;
        let dob = value
            .get("dateOfBirth")
            .and_then(serde_json::Value::as_str)
            .context("missing dateOfBirth")?;
        assert_eq!(dob, "1993-07-15");
        assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("myName"));
        Ok(())
    }

    #[test]
    fn record_identity_drops_credential() -> Result<()> {
        let record = IdentityRecord {
            id: "charizard@pokemon.com".to_string(),
            display_name: "Charizard".to_string(),
            credential_hash: SecretString::from("$argon2id$v=19$stub".to_string()),
            date_of_birth: None,
        };
        let json = serde_json::to_string(&record.identity())?;
        assert!(!json.contains("argon2"));
        assert!(!format!("{record:?}").contains("argon2"));
        Ok(())
    }

    #[test]
    fn sign_up_request_tolerates_missing_fields() -> Result<()> {
        let request: SignUpRequest = serde_json::from_str(r#"{ "id": "myId", "pwd": "myPass" }"#)?;
        let new_identity = NewIdentity::from(request);
        assert_eq!(new_identity.id, "myId");
        assert_eq!(new_identity.secret.expose_secret(), "myPass");
        assert!(new_identity.name.is_empty());
        assert!(new_identity.date_of_birth.is_none());
        Ok(())
    }

    #[test]
    fn sign_up_request_rejects_malformed_date() {
        let result: Result<SignUpRequest, _> =
            serde_json::from_str(r#"{ "id": "myId", "dateOfBirth": "15/07/1993" }"#);
        assert!(result.is_err());
    }
}
