//! Storage contract and built-in stores for the persisted session tokens.
//!
//! The store is the sole owner of token material. Session state is never kept
//! as a separate object: a user is authenticated iff both slots hold non-empty
//! values, recomputed on demand by [`load_pair`].

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, token::TokenPair};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Fixed identifiers for the two persisted token slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreKey {
	/// Slot holding the short-lived access token.
	AccessToken,
	/// Slot holding the refresh token.
	RefreshToken,
}
impl StoreKey {
	/// Returns the stable storage identifier for this slot.
	pub const fn as_str(self) -> &'static str {
		match self {
			StoreKey::AccessToken => "accessToken",
			StoreKey::RefreshToken => "refreshToken",
		}
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Durable key-value contract over the platform secure store.
///
/// Absence is represented as `None`, never as an error, and writes must be
/// durable across process restarts.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if any.
	fn get(&self, key: StoreKey) -> StoreFuture<'_, Option<String>>;

	/// Persists or replaces the value stored under `key`.
	fn set<'a>(&'a self, key: StoreKey, value: &'a str) -> StoreFuture<'a, ()>;

	/// Removes the value stored under `key`. Removing an absent key is a no-op.
	fn delete(&self, key: StoreKey) -> StoreFuture<'_, ()>;
}

/// Persists a pair, writing the refresh token before the access token.
///
/// The platform store has no multi-key transaction, so the write order is
/// fixed: a reader that observes the new access token is guaranteed to also
/// observe its matching refresh token. Readers treat any single missing slot
/// as unauthenticated, which covers the transient window between the writes.
pub async fn save_pair(store: &dyn SessionStore, pair: &TokenPair) -> Result<(), StoreError> {
	store.set(StoreKey::RefreshToken, pair.refresh_token.expose()).await?;
	store.set(StoreKey::AccessToken, pair.access_token.expose()).await
}

/// Loads the persisted pair; one missing or empty slot yields `None`.
pub async fn load_pair(store: &dyn SessionStore) -> Result<Option<TokenPair>, StoreError> {
	let access = store.get(StoreKey::AccessToken).await?;
	let refresh = store.get(StoreKey::RefreshToken).await?;

	match (access, refresh) {
		(Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() =>
			Ok(Some(TokenPair::new(access, refresh))),
		_ => Ok(None),
	}
}

/// Removes both token slots.
pub async fn clear_pair(store: &dyn SessionStore) -> Result<(), StoreError> {
	store.delete(StoreKey::AccessToken).await?;
	store.delete(StoreKey::RefreshToken).await
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
