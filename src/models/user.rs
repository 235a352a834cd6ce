//! User profile and authentication response types.

use serde::{Deserialize, Serialize};

/// Snapshot of the authenticated user's profile, as returned by the
/// remote store's login/register/verify endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Successful login/register response: a bearer token plus the profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSuccess {
    pub token: String,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_trims_missing_parts() {
        let user = UserProfile {
            first_name: "Ada".to_string(),
            ..Default::default()
        };
        assert_eq!(user.full_name(), "Ada");
    }
}
