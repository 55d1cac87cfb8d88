//! Decides whether a caller may send a notification to a target.

use thiserror::Error;

use crate::directory::{DirectoryEntry, NotificationTarget, Role};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct Forbidden(pub &'static str);

/// Check `caller` against `target`. Rules apply in order: the caller
/// must be in the directory, only admins reach technicians, admins and
/// technicians reach admins, and a specific user can be reached by an
/// admin or by that same user.
pub fn authorize(
    caller: Option<&DirectoryEntry>,
    target: &NotificationTarget,
) -> Result<(), Forbidden> {
    let Some(caller) = caller else {
        return Err(Forbidden("unknown caller"));
    };

    match target {
        NotificationTarget::Role(Role::Technician) => match caller.role {
            Some(Role::Admin) => Ok(()),
            _ => Err(Forbidden("only admin can notify technicians")),
        },
        NotificationTarget::Role(Role::Admin) => match caller.role {
            Some(Role::Admin | Role::Technician) => Ok(()),
            None => Err(Forbidden("caller role may not notify admins")),
        },
        NotificationTarget::User(user_id) => {
            if caller.role == Some(Role::Admin) || *user_id == caller.id {
                Ok(())
            } else {
                Err(Forbidden("only admin can notify other users"))
            }
        }
    }
}
