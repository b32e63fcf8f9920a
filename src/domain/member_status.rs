use serde::Deserialize;
use serde::Serialize;

/// Subscription status of a list member. Stored as lowercase `TEXT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Subscribed,
    Unsubscribed,
    Cleaned,
    Pending,
}

impl MemberStatus {
    pub const ALL: &'static [&'static str] = &["subscribed", "unsubscribed", "cleaned", "pending"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Subscribed => "subscribed",
            MemberStatus::Unsubscribed => "unsubscribed",
            MemberStatus::Cleaned => "cleaned",
            MemberStatus::Pending => "pending",
        }
    }
}

impl TryFrom<String> for MemberStatus {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "subscribed" => Ok(Self::Subscribed),
            "unsubscribed" => Ok(Self::Unsubscribed),
            "cleaned" => Ok(Self::Cleaned),
            "pending" => Ok(Self::Pending),
            s => Err(format!("Invalid member status: {s:?}")),
        }
    }
}

/// Preferred email format of a list member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Html,
    Text,
}

impl EmailType {
    pub const ALL: &'static [&'static str] = &["html", "text"];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::Html => "html",
            EmailType::Text => "text",
        }
    }
}

impl TryFrom<String> for EmailType {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "html" => Ok(Self::Html),
            "text" => Ok(Self::Text),
            s => Err(format!("Invalid email type: {s:?}")),
        }
    }
}
