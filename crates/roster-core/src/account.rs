//! The account model and form validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Profile picture used when an account is created without an upload.
pub const DEFAULT_PROFILE_PIC: &str = "https://res.cloudinary.com/dt7xsczbg/image/upload/v1742765087/accounts/f3c73723-da49-4ed7-8f21-ce00c8fdd638.png";

/// A profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, assigned at creation.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Number of posts.
    pub post_count: u64,
    /// Number of followers.
    pub followers_count: u64,
    /// Number of accounts followed.
    pub following_count: u64,
    /// Bio text. The only field that can change after creation.
    pub content: String,
    /// URL of the profile picture.
    pub profile_pic: String,
}

impl Account {
    /// Creates an account with a fresh id from validated fields.
    #[must_use]
    pub fn new(fields: NewAccount, profile_pic: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: fields.username,
            post_count: fields.post_count,
            followers_count: fields.followers_count,
            following_count: fields.following_count,
            content: fields.content,
            profile_pic: profile_pic.into(),
        }
    }

    /// The three sample accounts present at startup.
    #[must_use]
    pub fn seed() -> Vec<Self> {
        [
            ("Naveen", 30, 400, 300, "Consistency is important!", "/channel-11.jpeg"),
            ("Sam", 40, 100, 200, "Hard work is important!", "/channel-9.jpeg"),
            ("Bill", 90, 4000, 100, "Discipline is important!", "/channel-3.jpeg"),
        ]
        .into_iter()
        .map(|(username, posts, followers, following, content, pic)| {
            Self::new(
                NewAccount {
                    username: username.to_string(),
                    post_count: posts,
                    followers_count: followers,
                    following_count: following,
                    content: content.to_string(),
                },
                pic,
            )
        })
        .collect()
    }
}

/// Validated fields for a new account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAccount {
    /// Display name, trimmed and non-empty.
    pub username: String,
    /// Number of posts.
    pub post_count: u64,
    /// Number of followers.
    pub followers_count: u64,
    /// Number of accounts followed.
    pub following_count: u64,
    /// Bio text, verbatim.
    pub content: String,
}

/// Account fields exactly as submitted by the creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    /// Submitted username.
    pub username: String,
    /// Submitted post count.
    pub post_count: String,
    /// Submitted follower count.
    pub followers_count: String,
    /// Submitted following count.
    pub following_count: String,
    /// Submitted bio text.
    pub content: String,
}

impl AccountForm {
    /// Sets a field by its form name. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "username" => self.username = value,
            "post_count" => self.post_count = value,
            "followers_count" => self.followers_count = value,
            "following_count" => self.following_count = value,
            "content" => self.content = value,
            _ => {}
        }
    }

    /// Parses the raw fields into a [`NewAccount`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first field that is missing
    /// or not a non-negative whole number.
    pub fn validate(&self) -> Result<NewAccount> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(Error::validation("username", "is required"));
        }

        Ok(NewAccount {
            username: username.to_string(),
            post_count: parse_count("post_count", &self.post_count)?,
            followers_count: parse_count("followers_count", &self.followers_count)?,
            following_count: parse_count("following_count", &self.following_count)?,
            content: self.content.clone(),
        })
    }
}

/// Blank counters read as zero.
fn parse_count(field: &'static str, raw: &str) -> Result<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u64>()
        .map_err(|_| Error::validation(field, format!("'{raw}' is not a whole number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, posts: &str) -> AccountForm {
        AccountForm {
            username: username.to_string(),
            post_count: posts.to_string(),
            content: "hi".to_string(),
            ..AccountForm::default()
        }
    }

    #[test]
    fn test_validate_fills_blank_counts() {
        let account = form("Ana", "5").validate().unwrap();
        assert_eq!(account.username, "Ana");
        assert_eq!(account.post_count, 5);
        assert_eq!(account.followers_count, 0);
        assert_eq!(account.following_count, 0);
        assert_eq!(account.content, "hi");
    }

    #[test]
    fn test_validate_trims() {
        let mut raw = form("  Ana ", " 12 ");
        raw.followers_count = "  ".to_string();
        let account = raw.validate().unwrap();
        assert_eq!(account.username, "Ana");
        assert_eq!(account.post_count, 12);
        assert_eq!(account.followers_count, 0);
    }

    #[test]
    fn test_validate_rejects_non_numeric() {
        let mut raw = form("Ana", "5");
        raw.following_count = "lots".to_string();
        match raw.validate() {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "following_count"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_negative() {
        match form("Ana", "-1").validate() {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "post_count"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_requires_username() {
        match form("   ", "1").validate() {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "username"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_set_ignores_unknown_fields() {
        let mut raw = AccountForm::default();
        raw.set("username", "Ana".to_string());
        raw.set("profile_pic", "ignored".to_string());
        assert_eq!(raw.username, "Ana");
        assert_eq!(raw, AccountForm { username: "Ana".to_string(), ..AccountForm::default() });
    }

    #[test]
    fn test_seed_accounts() {
        let seed = Account::seed();
        let names: Vec<_> = seed.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, ["Naveen", "Sam", "Bill"]);
        assert_eq!(seed[2].followers_count, 4000);
        assert_eq!(seed[0].profile_pic, "/channel-11.jpeg");
        assert_ne!(seed[0].id, seed[1].id);
    }
}
