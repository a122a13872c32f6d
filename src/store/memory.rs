//! Thread-safe in-memory [`SessionStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreError, StoreFuture, StoreKey},
};

type SlotMap = Arc<RwLock<HashMap<StoreKey, String>>>;

/// Keeps token slots in-process; nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SlotMap);
impl MemoryStore {
	fn get_now(map: SlotMap, key: StoreKey) -> Option<String> {
		map.read().get(&key).cloned()
	}

	fn set_now(map: SlotMap, key: StoreKey, value: String) -> Result<(), StoreError> {
		map.write().insert(key, value);

		Ok(())
	}

	fn delete_now(map: SlotMap, key: StoreKey) -> Result<(), StoreError> {
		map.write().remove(&key);

		Ok(())
	}
}
impl SessionStore for MemoryStore {
	fn get(&self, key: StoreKey) -> StoreFuture<'_, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn set<'a>(&'a self, key: StoreKey, value: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let value = value.to_owned();

		Box::pin(async move { Self::set_now(map, key, value) })
	}

	fn delete(&self, key: StoreKey) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::delete_now(map, key) })
	}
}
