use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Caller role as asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

impl UserRole {
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Instructor | UserRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at (as UTC timestamp)
}

impl Claims {
    pub fn new(user_id: &str, role: UserRole, expiration_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours);

        Self {
            sub: user_id.to_string(),
            role,
            tenant: None,
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("user-1", UserRole::Student, 24);

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, UserRole::Student);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_role_staff_check() {
        assert!(!UserRole::Student.is_staff());
        assert!(UserRole::Instructor.is_staff());
        assert!(UserRole::Admin.is_staff());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&UserRole::Instructor).expect("role should serialize");
        assert_eq!(json, "\"instructor\"");
    }
}
