//! SQLite account storage.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, warn};

use super::credentials::{Keyring, PasswordVault};
use super::model::{AccountId, DiscoveredAccount, NewAccount, OwnerId, Security};
use super::store::AccountStore;
use crate::error::StoreError;

/// Where inbound passwords are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStorage {
    /// In the `inbound_password` column.
    Database,
    /// In the system keyring; the column holds an empty placeholder.
    #[default]
    Keyring,
}

/// Account store backed by `SQLite`.
pub struct SqliteAccountStore {
    pool: SqlitePool,
    password_storage: PasswordStorage,
    vault: Box<dyn PasswordVault>,
}

impl SqliteAccountStore {
    /// Opens (or creates) the database at `database_path`.
    ///
    /// Creates the schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(
        database_path: &str,
        password_storage: PasswordStorage,
    ) -> Result<Self, StoreError> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self {
            pool,
            password_storage,
            vault: Box::new(Keyring::default()),
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Creates an in-memory store that keeps passwords in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self {
            pool,
            password_storage: PasswordStorage::Database,
            vault: Box::new(Keyring::default()),
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                inbound_host TEXT NOT NULL,
                inbound_port INTEGER NOT NULL,
                inbound_security TEXT NOT NULL,
                inbound_user TEXT NOT NULL,
                inbound_password TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_owner ON accounts(owner_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Returns the password storage mode of this store.
    #[must_use]
    pub const fn password_storage(&self) -> PasswordStorage {
        self.password_storage
    }

    /// Deletes an account. Returns false if no such account exists.
    ///
    /// Also removes its credential from the system keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: AccountId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if self.password_storage == PasswordStorage::Keyring
            && let Err(e) = self.vault.remove(id)
        {
            warn!(account = %id, error = %e, "could not remove password from keyring");
        }

        Ok(result.rows_affected() > 0)
    }

    /// Convert a database row to an account.
    ///
    /// In keyring mode the password is loaded from the keyring first, falling
    /// back to the column for rows written before the keyring was available.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn row_to_account(&self, row: &SqliteRow) -> DiscoveredAccount {
        let id = AccountId::new(row.get("id"));
        let column_password: String = row.get("inbound_password");

        let inbound_password = match self.password_storage {
            PasswordStorage::Database => column_password,
            PasswordStorage::Keyring => match self.vault.get(id) {
                Ok(Some(password)) => password,
                Ok(None) => {
                    if !column_password.is_empty() {
                        debug!(account = %id, "password not in keyring, using database column");
                    }
                    column_password
                }
                Err(e) => {
                    warn!(account = %id, error = %e, "keyring read failed, using database column");
                    column_password
                }
            },
        };

        let security: String = row.get("inbound_security");

        DiscoveredAccount {
            id,
            owner_id: OwnerId::new(row.get::<String, _>("owner_id")),
            name: row.get("name"),
            email: row.get("email"),
            inbound_host: row.get("inbound_host"),
            inbound_port: row.get::<i64, _>("inbound_port") as u16,
            inbound_security: security.parse().unwrap_or_else(|e| {
                warn!("Account {id}: {e}, assuming ssl");
                Security::Ssl
            }),
            inbound_user: row.get("inbound_user"),
            inbound_password,
        }
    }
}

impl AccountStore for SqliteAccountStore {
    async fn save(&self, account: NewAccount) -> Result<DiscoveredAccount, StoreError> {
        let column_password = match self.password_storage {
            PasswordStorage::Database => account.inbound_password.as_str(),
            PasswordStorage::Keyring => "",
        };

        // The row, and the fallback password written into it, land together or not at all.
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            INSERT INTO accounts (
                owner_id, name, email,
                inbound_host, inbound_port, inbound_security,
                inbound_user, inbound_password
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(account.owner_id.as_str())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.inbound_host)
        .bind(i64::from(account.inbound_port))
        .bind(account.inbound_security.as_str())
        .bind(&account.inbound_user)
        .bind(column_password)
        .execute(&mut *tx)
        .await?;

        let id = AccountId::new(result.last_insert_rowid());

        let mut in_vault = false;
        if self.password_storage == PasswordStorage::Keyring {
            match self.vault.set(id, &account.inbound_password) {
                Ok(()) => in_vault = true,
                Err(e) => {
                    warn!(account = %id, error = %e, "keyring unavailable, keeping password in the database");
                    sqlx::query("UPDATE accounts SET inbound_password = ? WHERE id = ?")
                        .bind(&account.inbound_password)
                        .bind(id.0)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        if let Err(e) = tx.commit().await {
            if in_vault && let Err(cleanup) = self.vault.remove(id) {
                warn!(account = %id, error = %cleanup, "could not remove password of unsaved account from keyring");
            }
            return Err(e.into());
        }

        debug!(%id, owner = %account.owner_id, host = %account.inbound_host, "account saved");
        Ok(account.with_id(id))
    }

    async fn find_all_for(&self, owner: &OwnerId) -> Result<Vec<DiscoveredAccount>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, name, email,
                   inbound_host, inbound_port, inbound_security,
                   inbound_user, inbound_password
            FROM accounts
            WHERE owner_id = ?
            ORDER BY id ASC
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(owner.clone()));
        }

        Ok(rows.iter().map(|row| self.row_to_account(row)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account::{CredentialError, CredentialResult};

    /// A keyring that refuses every write.
    struct LockedVault;

    impl PasswordVault for LockedVault {
        fn set(&self, _id: AccountId, _password: &str) -> CredentialResult<()> {
            Err(CredentialError::Keyring(keyring::Error::PlatformFailure(
                "locked".into(),
            )))
        }

        fn get(&self, _id: AccountId) -> CredentialResult<Option<String>> {
            Ok(None)
        }

        fn remove(&self, _id: AccountId) -> CredentialResult<()> {
            Ok(())
        }
    }

    async fn keyring_store_with_locked_vault() -> SqliteAccountStore {
        let mut store = SqliteAccountStore::in_memory().await.unwrap();
        store.password_storage = PasswordStorage::Keyring;
        store.vault = Box::new(LockedVault);
        store
    }

    fn new_account(owner: &str, email: &str) -> NewAccount {
        NewAccount {
            owner_id: OwnerId::new(owner),
            name: email.to_string(),
            email: email.to_string(),
            inbound_host: "imap.example.com".to_string(),
            inbound_port: 993,
            inbound_security: Security::Ssl,
            inbound_user: email.to_string(),
            inbound_password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let store = SqliteAccountStore::in_memory().await.unwrap();

        let first = store
            .save(new_account("alice", "a@example.com"))
            .await
            .unwrap();
        let second = store
            .save(new_account("alice", "b@example.com"))
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_find_all_for_owner() {
        let store = SqliteAccountStore::in_memory().await.unwrap();
        store
            .save(new_account("alice", "a@example.com"))
            .await
            .unwrap();
        store
            .save(new_account("bob", "b@example.com"))
            .await
            .unwrap();
        store
            .save(new_account("alice", "c@example.com"))
            .await
            .unwrap();

        let accounts = store.find_all_for(&OwnerId::new("alice")).await.unwrap();
        let emails: Vec<_> = accounts.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, ["a@example.com", "c@example.com"]);
        assert_eq!(accounts[0].inbound_password, "secret");
        assert_eq!(accounts[0].inbound_security, Security::Ssl);
    }

    #[tokio::test]
    async fn test_find_all_for_unknown_owner_is_not_found() {
        let store = SqliteAccountStore::in_memory().await.unwrap();

        let result = store.find_all_for(&OwnerId::new("nobody")).await;
        assert!(matches!(result, Err(StoreError::NotFound(owner)) if owner.as_str() == "nobody"));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let store = SqliteAccountStore::in_memory().await.unwrap();
        let saved = store
            .save(new_account("alice", "a@example.com"))
            .await
            .unwrap();

        assert!(store.delete(saved.id).await.unwrap());
        assert!(!store.delete(saved.id).await.unwrap());
        assert!(matches!(
            store.find_all_for(&OwnerId::new("alice")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_security_round_trips_through_storage() {
        let store = SqliteAccountStore::in_memory().await.unwrap();
        let mut account = new_account("alice", "a@example.com");
        account.inbound_security = Security::Tls;
        account.inbound_port = 143;
        store.save(account).await.unwrap();

        let stored = store.find_all_for(&OwnerId::new("alice")).await.unwrap();
        assert_eq!(stored[0].inbound_security, Security::Tls);
        assert_eq!(stored[0].inbound_port, 143);
    }

    #[tokio::test]
    async fn test_locked_keyring_falls_back_to_column() {
        let store = keyring_store_with_locked_vault().await;
        store
            .save(new_account("alice", "a@example.com"))
            .await
            .unwrap();

        let stored = store.find_all_for(&OwnerId::new("alice")).await.unwrap();
        assert_eq!(stored[0].inbound_password, "secret");
    }

    #[tokio::test]
    async fn test_failed_fallback_leaves_no_row() {
        let store = keyring_store_with_locked_vault().await;
        sqlx::query(
            "CREATE TRIGGER accounts_read_only BEFORE UPDATE ON accounts \
             BEGIN SELECT RAISE(ABORT, 'read only'); END",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let result = store.save(new_account("alice", "a@example.com")).await;
        assert!(matches!(result, Err(StoreError::Database(_))));

        assert!(matches!(
            store.find_all_for(&OwnerId::new("alice")).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
