//! Caller identity as seen by the workflow core.
//!
//! Authentication and role assignment live outside this crate; the boundary
//! layer hands the engine an [`Actor`]. The only capability the core itself
//! checks is administration, and privileged store operations demand an
//! [`AdminGrant`] that can only be obtained from an administrator actor.

use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub administrator: bool,
}

impl Actor {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            administrator: false,
        }
    }

    pub fn administrator(user_id: i64) -> Self {
        Self {
            user_id,
            administrator: true,
        }
    }

    /// Obtain proof of administrator capability, or `Unauthorized`
    pub fn admin_grant(&self) -> WorkflowResult<AdminGrant> {
        if self.administrator {
            Ok(AdminGrant {
                user_id: self.user_id,
            })
        } else {
            Err(WorkflowError::Unauthorized(format!(
                "user {} does not hold the administrator capability",
                self.user_id
            )))
        }
    }
}

/// Capability token required by the audit purge path
#[derive(Debug)]
pub struct AdminGrant {
    user_id: i64,
}

impl AdminGrant {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_grant() {
        let grant = Actor::administrator(7).admin_grant().unwrap();
        assert_eq!(grant.user_id(), 7);

        let err = Actor::user(8).admin_grant().unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized(_)));
    }
}
