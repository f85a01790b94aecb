use crate::MembershipId;
use core::fmt;

/// Identifier of a registered user, as assigned by the user store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// The profile fields a user is created with.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct UserProfile {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl UserProfile {
    /// An active profile with only an email set.
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: None,
            last_name: None,
            phone: None,
            is_active: true,
        }
    }
}

/// What a membership lookup returns about the holder of an ID.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct UserInfo {
    pub user_id: UserId,
    /// `None` until the user has been assigned an ID.
    pub membership_id: Option<MembershipId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl UserInfo {
    pub(crate) fn from_profile(
        user_id: UserId,
        membership_id: Option<MembershipId>,
        profile: &UserProfile,
    ) -> Self {
        Self {
            user_id,
            membership_id,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            is_active: profile.is_active,
        }
    }
}
