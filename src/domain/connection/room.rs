//! Room names and the reserved per-user namespace.
//!
//! Every connection is auto-joined at handshake to `user<userId>`. Names of
//! the form `user<digits>` are infrastructure-only and never joinable by
//! clients. User-addressed fan-out does not read these rooms; it uses the
//! registry's user index.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{UserId, ValidationError};

const USER_ROOM_PREFIX: &str = "user";

/// Name of a broadcast group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomName(String);

impl RoomName {
    /// Creates a room name, validating it is not empty.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::empty_field("room"));
        }
        Ok(Self(name))
    }

    /// The reserved room every connection of `user_id` joins at handshake.
    pub fn user_room(user_id: &UserId) -> Self {
        Self(format!("{}{}", USER_ROOM_PREFIX, user_id))
    }

    /// Returns true if the name falls in the reserved `user<digits>` namespace.
    pub fn is_reserved(&self) -> bool {
        is_reserved_name(&self.0)
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValidationError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<RoomName> for String {
    fn from(room: RoomName) -> Self {
        room.0
    }
}

/// `user` followed by one or more ASCII digits, nothing else.
pub fn is_reserved_name(name: &str) -> bool {
    name.strip_prefix(USER_ROOM_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn user_room_is_prefixed() {
        let user = UserId::new("42").unwrap();
        assert_eq!(RoomName::user_room(&user).as_str(), "user42");
    }

    #[test]
    fn numeric_user_rooms_are_reserved() {
        assert!(RoomName::new("user7").unwrap().is_reserved());
        assert!(RoomName::user_room(&UserId::new("123").unwrap()).is_reserved());
    }

    #[test]
    fn ordinary_rooms_are_not_reserved() {
        for name in ["lobby", "user", "users", "user7a", "xuser7", "User7", "user-7"] {
            assert!(!is_reserved_name(name), "{} should not be reserved", name);
        }
    }

    #[test]
    fn empty_room_name_is_rejected() {
        assert!(RoomName::new("").is_err());
        assert!(serde_json::from_str::<RoomName>(r#""""#).is_err());
    }

    #[test]
    fn room_name_serializes_as_plain_string() {
        let room: RoomName = serde_json::from_str(r#""lobby""#).unwrap();
        assert_eq!(serde_json::to_string(&room).unwrap(), r#""lobby""#);
    }

    proptest! {
        #[test]
        fn any_digit_suffix_is_reserved(n in 0u64..u64::MAX) {
            let name = format!("user{}", n);
            prop_assert!(is_reserved_name(&name));
        }

        #[test]
        fn names_without_user_prefix_are_never_reserved(name in "[a-tv-z][a-z0-9]{0,12}") {
            prop_assert!(!is_reserved_name(&name));
        }

        #[test]
        fn trailing_non_digit_breaks_reservation(n in 0u32..100_000, tail in "[a-z_-]{1,4}") {
            let name = format!("user{}{}", n, tail);
            prop_assert!(!is_reserved_name(&name));
        }
    }
}
