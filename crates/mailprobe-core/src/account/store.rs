//! Account store abstraction.

use std::future::Future;

use super::model::{DiscoveredAccount, NewAccount, OwnerId};
use crate::error::StoreError;

/// Persistence for discovered accounts, keyed by owner.
pub trait AccountStore {
    /// Stores a new account and returns it with its assigned identifier.
    fn save(
        &self,
        account: NewAccount,
    ) -> impl Future<Output = Result<DiscoveredAccount, StoreError>> + Send;

    /// Returns every account of `owner`, oldest first.
    ///
    /// Fails with [`StoreError::NotFound`] when the owner has none.
    fn find_all_for(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Vec<DiscoveredAccount>, StoreError>> + Send;
}
