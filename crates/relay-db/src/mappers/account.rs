//! Account entity <-> model mapper

use relay_core::entities::Account;

use crate::models::AccountModel;

/// Convert AccountModel to Account entity
impl From<AccountModel> for Account {
    fn from(model: AccountModel) -> Self {
        Account {
            id: model.id,
            username: model.username,
            created_at: model.created_at,
        }
    }
}
