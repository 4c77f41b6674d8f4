// Copyright (C) 2021 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The host key-value store boundary. The real store format (keying,
//! pruning, serialization of values) belongs to the host; this crate only
//! depends on the [`ClientStore`] trait.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(any(test, feature = "test-vectors"))]
use std::collections::BTreeMap;

use beefy_client_primitives::{ConsensusState, Height};

use crate::error::Error;

/// Host-provided key-value store for `ClientState`/`ConsensusState` values.
pub trait ClientStore {
	/// Fetch the raw bytes stored at `key`.
	fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
	/// Store `value` at `key`.
	fn set(&mut self, key: &[u8], value: Vec<u8>);
	/// Remove the value at `key`, if any.
	fn delete(&mut self, key: &[u8]);

	/// The stored consensus state heights immediately before and after
	/// `height`, needed by `CheckForMisbehaviour`'s monotonic-timestamp
	/// check.
	fn neighbouring_consensus_state_heights(
		&self,
		height: Height,
	) -> (Option<Height>, Option<Height>);

	/// Fetch the `ConsensusState` stored at `height`, if any.
	fn consensus_state(&self, height: Height) -> Option<ConsensusState>;

	/// Persist `state` at `height`.
	fn set_consensus_state(&mut self, height: Height, state: ConsensusState);
}

/// An in-memory [`ClientStore`] for tests. Never a production default: the
/// real key-value format is a host concern.
#[cfg(any(test, feature = "test-vectors"))]
#[derive(Debug, Default)]
pub struct MemoryClientStore {
	kv: BTreeMap<Vec<u8>, Vec<u8>>,
	consensus_states: BTreeMap<Height, ConsensusState>,
}

#[cfg(any(test, feature = "test-vectors"))]
impl MemoryClientStore {
	/// An empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

#[cfg(any(test, feature = "test-vectors"))]
impl ClientStore for MemoryClientStore {
	fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
		self.kv.get(key).cloned()
	}

	fn set(&mut self, key: &[u8], value: Vec<u8>) {
		self.kv.insert(key.to_vec(), value);
	}

	fn delete(&mut self, key: &[u8]) {
		self.kv.remove(key);
	}

	fn neighbouring_consensus_state_heights(
		&self,
		height: Height,
	) -> (Option<Height>, Option<Height>) {
		let prev = self.consensus_states.keys().filter(|h| **h < height).next_back().copied();
		let next = self.consensus_states.keys().find(|h| **h > height).copied();
		(prev, next)
	}

	fn consensus_state(&self, height: Height) -> Option<ConsensusState> {
		self.consensus_states.get(&height).cloned()
	}

	fn set_consensus_state(&mut self, height: Height, state: ConsensusState) {
		self.consensus_states.insert(height, state);
	}
}

#[cfg(all(test, feature = "test-vectors"))]
mod tests {
	use super::*;

	#[test]
	fn memory_store_roundtrips_kv() {
		let mut store = MemoryClientStore::new();
		store.set(b"k", b"v".to_vec());
		assert_eq!(store.get(b"k"), Some(b"v".to_vec()));
		store.delete(b"k");
		assert_eq!(store.get(b"k"), None);
	}

	#[test]
	fn memory_store_finds_neighbouring_heights() {
		let mut store = MemoryClientStore::new();
		let h10 = Height::new(10);
		let h20 = Height::new(20);
		let h30 = Height::new(30);
		store.set_consensus_state(h10, ConsensusState { timestamp: 1, root: [0u8; 32] });
		store.set_consensus_state(h30, ConsensusState { timestamp: 3, root: [0u8; 32] });

		let (prev, next) = store.neighbouring_consensus_state_heights(h20);
		assert_eq!(prev, Some(h10));
		assert_eq!(next, Some(h30));
	}
}
