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

//! Deterministic test authorities, the same role `beefy-test`'s `Keyring`
//! played for the gadget and RPC crates this workspace grew from.

use beefy_client_primitives::Address;
use strum::{Display, EnumIter};

use crate::hasher::{address_of, keccak_256};

/// A fixed, named keypair deriving its secret key from its own variant name.
/// Stable across test runs: `Keyring::Alice` always recovers to the same
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Keyring {
	Alice,
	Bob,
	Charlie,
	Dave,
	Eve,
	Ferdie,
	One,
	Two,
}

impl Keyring {
	/// Deterministic secret key: `Keccak256(variant name)`, taken as the
	/// scalar directly. `SecretKey::parse` rejects the (astronomically
	/// unlikely) case where that hash isn't a valid scalar.
	pub fn secret_key(&self) -> libsecp256k1::SecretKey {
		let seed = keccak_256(self.to_string().as_bytes());
		libsecp256k1::SecretKey::parse(&seed).expect("fixed keyring seeds are valid scalars; qed")
	}

	/// The public key corresponding to [`Keyring::secret_key`].
	pub fn public_key(&self) -> libsecp256k1::PublicKey {
		libsecp256k1::PublicKey::from_secret_key(&self.secret_key())
	}

	/// The Ethereum-style address this authority signs commitments as.
	pub fn address(&self) -> Address {
		address_of(&self.public_key())
	}

	/// Sign `message_hash` (the Keccak-256 hash of a SCALE-encoded
	/// `Commitment`), returning a `r || s || v` signature with `v` in
	/// `{0, 1}`.
	pub fn sign(&self, message_hash: &[u8; 32]) -> [u8; 65] {
		let message = libsecp256k1::Message::parse(message_hash);
		let (signature, recovery_id) = libsecp256k1::sign(&message, &self.secret_key());

		let mut bytes = [0u8; 65];
		bytes[0..64].copy_from_slice(&signature.serialize());
		bytes[64] = recovery_id.serialize();
		bytes
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use strum::IntoEnumIterator;

	#[test]
	fn addresses_are_deterministic_and_distinct() {
		let alice_again = Keyring::Alice.address();
		assert_eq!(Keyring::Alice.address(), alice_again);

		let addresses: Vec<_> = Keyring::iter().map(|k| k.address()).collect();
		for (i, a) in addresses.iter().enumerate() {
			for (j, b) in addresses.iter().enumerate() {
				if i != j {
					assert_ne!(a, b, "{:?} and {:?} collide", Keyring::iter().nth(i), Keyring::iter().nth(j));
				}
			}
		}
	}

	#[test]
	fn signature_recovers_to_own_address() {
		let message_hash = keccak_256(b"a commitment");
		let signature = Keyring::Bob.sign(&message_hash);
		let recovered = crate::hasher::recover_address(&message_hash, &signature).unwrap();
		assert_eq!(recovered, Keyring::Bob.address());
	}
}
