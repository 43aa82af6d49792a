use std::fmt;

use serde::{Deserialize, Serialize};

/// The workspace ID that references merged mainline data.
///
/// The platform treats the empty workspace ID as "mainline": reads against
/// it return the last submitted state rather than any pending workspace.
pub const MAINLINE_ID: &str = "";

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Identifier of a workspace holding pending configuration changes.
    WorkspaceId
}

string_id! {
    /// Identifier of a studio, e.g. `studio-interface-v2-pkg`.
    StudioId
}

string_id! {
    /// Identifier of a change control spawned by a workspace submission.
    ChangeControlId
}

string_id! {
    /// Identifier correlating an asynchronous request (build, submit) with
    /// the response the platform publishes for it.
    RequestId
}

string_id! {
    /// Serial number of a device managed by the platform.
    DeviceId
}

string_id! {
    /// Identifier of a platform action, e.g. `action-ports-table`.
    ActionId
}

string_id! {
    /// Identifier of a pending topology update awaiting acceptance.
    UpdateId
}

impl WorkspaceId {
    /// Generate a fresh random workspace ID.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The mainline pseudo-workspace (empty ID).
    pub fn mainline() -> Self {
        Self(MAINLINE_ID.to_string())
    }

    /// Returns `true` if this ID references mainline data.
    pub fn is_mainline(&self) -> bool {
        self.0 == MAINLINE_ID
    }
}

impl RequestId {
    /// Generate a fresh random request ID.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_id() {
        let id = StudioId::new("studio-evpn-services");
        assert_eq!(id.to_string(), "studio-evpn-services");
        assert_eq!(id.as_str(), "studio-evpn-services");
    }

    #[test]
    fn debug_names_the_type() {
        let id = WorkspaceId::new("ws-1");
        assert_eq!(format!("{id:?}"), "WorkspaceId(ws-1)");
    }

    #[test]
    fn mainline_is_empty() {
        let id = WorkspaceId::mainline();
        assert!(id.is_mainline());
        assert_eq!(id.as_str(), MAINLINE_ID);
        assert!(!WorkspaceId::random().is_mainline());
    }

    #[test]
    fn random_ids_are_unique() {
        assert_ne!(RequestId::random(), RequestId::random());
    }

    #[test]
    fn serde_is_transparent() {
        let id = DeviceId::new("JPE12345678");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"JPE12345678\"");
        let back: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
