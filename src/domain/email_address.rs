use serde::Deserialize;
use serde::Serialize;
use validator::ValidateEmail;

/// A parsed email address, used for list members as well as list contact
/// addresses.
///
/// Deserialization goes through `parse`, so a `EmailAddress` read from a
/// request body (or from the db) is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(email: String) -> Result<Self, String> {
        ValidateEmail::validate_email(&email)
            .then_some(Self(email.clone()))
            .ok_or(format!("Invalid email: {email:?}"))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for EmailAddress {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self { value.0 }
}
