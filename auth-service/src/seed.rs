use common_auth::Role;
use tracing::info;

use crate::store::{RoleStore, StoreResult};

/// Inserts the fixed role rows when the role store is empty.
///
/// A store that already holds any role is left untouched, so running this on
/// every startup is safe. Returns the number of rows inserted.
pub async fn seed_roles<S>(store: &S) -> StoreResult<usize>
where
    S: RoleStore + ?Sized,
{
    let existing = store.count_roles().await?;
    if existing > 0 {
        info!(existing, "role store already seeded");
        return Ok(0);
    }

    let mut inserted = 0;
    for role in Role::ALL {
        if store.insert_role(role).await? {
            inserted += 1;
        }
    }
    info!(inserted, "seeded role store");
    Ok(inserted)
}
