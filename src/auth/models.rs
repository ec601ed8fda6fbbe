use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Database model for the users table. Credential material stays in
/// this module; nothing downstream of the auth layer sees it.
#[derive(Debug, Clone)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserModel {
    /// Creates a new user with a generated id and creation timestamp.
    /// Registration counts as the first login.
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            username,
            password_hash,
            created_at: now,
            last_login: Some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_has_id_and_timestamps() {
        let user = UserModel::new(
            "player@example.com".to_string(),
            "player-one".to_string(),
            "salt:hash".to_string(),
        );

        assert!(!user.id.is_empty());
        assert_eq!(user.last_login, Some(user.created_at));
    }

    #[test]
    fn ids_are_unique() {
        let a = UserModel::new("a@example.com".into(), "a".into(), "h".into());
        let b = UserModel::new("b@example.com".into(), "b".into(), "h".into());
        assert_ne!(a.id, b.id);
    }
}
