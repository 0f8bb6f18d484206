//! Bootstrap and first-admin initialization

use crate::credentials::create_user_in;
use crate::error::{invalid, Result};
use crate::read::list_users;
use crate::rights::RoleName;
use crate::role::Role;
use crate::tx::transact;

/// Check if bootstrapped by seeing if any user holds ADMIN
pub fn is_bootstrapped() -> Result<bool> {
    Ok(list_users()?.iter().any(|u| u.has_role(RoleName::Admin)))
}

/// Make `name` the first admin, creating the user when needed.
/// Fails once any admin exists.
pub fn bootstrap(name: &str) -> Result<()> {
    transact(|tx| {
        if tx.list_users()?.iter().any(|u| u.has_role(RoleName::Admin)) {
            return Err(invalid("already bootstrapped"));
        }
        let mut user = match tx.get_user(name)? {
            Some(u) => u,
            None => create_user_in(tx, name)?,
        };
        user.set_role(Role::Admin);
        tx.put_user(&user)
    })?;
    tracing::info!(user = name, "bootstrapped first admin");
    Ok(())
}
