use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum UserRole {
    #[default]
    #[serde(rename = "user")]
    User,
    #[serde(rename = "admin")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored account. Every profile field defaults on read so documents
/// written by older schema versions load without a migration step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub favorite_destination: String,
    #[serde(default)]
    pub goals: String,
}

impl UserAccount {
    pub fn new(password_hash: impl Into<String>) -> Self {
        Self {
            password_hash: password_hash.into(),
            profile_pic: None,
            role: UserRole::User,
            bio: String::new(),
            favorite_destination: String::new(),
            goals: String::new(),
        }
    }
}

/// Compat shim for the oldest document format, where a user was stored as a
/// bare password string instead of a record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserRecord {
    Full(UserAccount),
    Legacy(String),
}

impl From<UserRecord> for UserAccount {
    fn from(record: UserRecord) -> Self {
        match record {
            UserRecord::Full(account) => account,
            UserRecord::Legacy(password_hash) => UserAccount::new(password_hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_bare_string_upgrades_to_default_record() {
        let record: UserRecord = serde_json::from_str("\"$2b$12$abcdef\"").unwrap();
        let account = UserAccount::from(record);
        assert_eq!(account.password_hash, "$2b$12$abcdef");
        assert_eq!(account.role, UserRole::User);
        assert_eq!(account.profile_pic, None);
        assert_eq!(account.bio, "");
        assert_eq!(account.favorite_destination, "");
        assert_eq!(account.goals, "");
    }

    #[test]
    fn partial_record_backfills_missing_fields() {
        let record: UserRecord =
            serde_json::from_str(r#"{"password": "h", "bio": "wanderer"}"#).unwrap();
        let account = UserAccount::from(record);
        assert_eq!(account.bio, "wanderer");
        assert_eq!(account.role, UserRole::User);
        assert_eq!(account.goals, "");
    }

    #[test]
    fn full_record_round_trips() {
        let account = UserAccount {
            password_hash: "h".into(),
            profile_pic: Some("profile_pics/ada.png".into()),
            role: UserRole::Admin,
            bio: "b".into(),
            favorite_destination: "Kyoto".into(),
            goals: "g".into(),
        };
        let json = serde_json::to_string(&account).unwrap();
        let back: UserAccount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }
}
