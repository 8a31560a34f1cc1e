//! Instance identifiers and role labels.
//!
//! Every coordinator and worker owns a globally unique id generated at
//! startup. The id identifies the *instance*, not the role; the role is
//! carried alongside as a separate wire-significant string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 128-bit random instance identifier, textual on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The role an instance plays. Wire-significant: `Display` yields exactly
/// `"coordinator"` or `"worker"`, matching the `context` field of an
/// `ActionResult` in the lifecycle protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Coordinator,
    Worker,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coordinator => write!(f, "coordinator"),
            Role::Worker => write!(f, "worker"),
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coordinator" => Ok(Role::Coordinator),
            "worker" => Ok(Role::Worker),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrips_through_wire_strings() {
        assert_eq!(Role::Coordinator.to_string(), "coordinator");
        assert_eq!(Role::Worker.to_string(), "worker");
        assert_eq!("coordinator".parse::<Role>(), Ok(Role::Coordinator));
        assert_eq!("worker".parse::<Role>(), Ok(Role::Worker));
    }

    #[test]
    fn instance_id_roundtrips_through_display_and_parse() {
        let id = InstanceId::generate();
        let text = id.to_string();
        let parsed: InstanceId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }
}
