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

//! Keccak-256 hashing and ECDSA signature recovery, converting recovered
//! public keys into Ethereum-style 20-byte addresses the same way
//! `beefy-mmr-pallet` converts BEEFY authority keys on-chain.

use beefy_client_primitives::Address;
use tiny_keccak::{Hasher as _, Keccak};

use crate::error::Error;

/// Hash arbitrary bytes with Keccak-256.
pub fn keccak_256(data: &[u8]) -> [u8; 32] {
	let mut keccak = Keccak::v256();
	keccak.update(data);
	let mut output = [0_u8; 32];
	keccak.finalize(&mut output);
	output
}

/// Adapts [`keccak_256`] to `beefy_client_merkle`'s [`Hasher`] trait so the
/// authorities/parachain-heads Merkle proofs and the MMR verifier can share
/// one hash function.
///
/// [`Hasher`]: beefy_client_merkle::Hasher
pub struct Keccak256;

impl beefy_client_merkle::Hasher for Keccak256 {
	fn hash(data: &[u8]) -> beefy_client_merkle::Output {
		keccak_256(data)
	}
}

/// Recover the signing authority's address from a `message_hash` and a
/// `r || s || v` signature, where `v` may be `{0,1}` or `{27,28}`.
pub fn recover_address(message_hash: &[u8; 32], signature: &[u8; 65]) -> Result<Address, Error> {
	let recovery_id = match signature[64] {
		0 | 27 => 0u8,
		1 | 28 => 1u8,
		_ => return Err(Error::InvalidCommitmentSignature),
	};

	let mut rs = [0u8; 64];
	rs.copy_from_slice(&signature[0..64]);

	let signature = libsecp256k1::Signature::parse_standard(&rs)
		.map_err(|_| Error::InvalidCommitmentSignature)?;
	let recovery_id = libsecp256k1::RecoveryId::parse(recovery_id)
		.map_err(|_| Error::InvalidCommitmentSignature)?;
	let message = libsecp256k1::Message::parse(message_hash);

	let public_key = libsecp256k1::recover(&message, &signature, &recovery_id)
		.map_err(|_| Error::InvalidCommitmentSignature)?;

	Ok(address_of(&public_key))
}

/// Ethereum-style address derivation: Keccak-256 of the uncompressed public
/// key (minus its leading `0x04` tag byte), low 20 bytes.
pub fn address_of(public_key: &libsecp256k1::PublicKey) -> Address {
	let uncompressed = public_key.serialize();
	debug_assert_eq!(uncompressed.len(), 65);
	let hash = keccak_256(&uncompressed[1..]);
	let mut address = [0u8; 20];
	address.copy_from_slice(&hash[12..32]);
	address
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn recovers_known_address() {
		let secret = libsecp256k1::SecretKey::parse(&[7u8; 32]).unwrap();
		let public = libsecp256k1::PublicKey::from_secret_key(&secret);
		let address = address_of(&public);

		let message_hash = keccak_256(b"hello beefy");
		let message = libsecp256k1::Message::parse(&message_hash);
		let (sig, recovery_id) = libsecp256k1::sign(&message, &secret);

		let mut signature = [0u8; 65];
		signature[0..64].copy_from_slice(&sig.serialize());
		signature[64] = recovery_id.serialize();

		let recovered = recover_address(&message_hash, &signature).unwrap();
		assert_eq!(recovered, address);
	}

	#[test]
	fn accepts_legacy_v_offset() {
		let secret = libsecp256k1::SecretKey::parse(&[3u8; 32]).unwrap();
		let public = libsecp256k1::PublicKey::from_secret_key(&secret);
		let address = address_of(&public);

		let message_hash = keccak_256(b"another message");
		let message = libsecp256k1::Message::parse(&message_hash);
		let (sig, recovery_id) = libsecp256k1::sign(&message, &secret);

		let mut signature = [0u8; 65];
		signature[0..64].copy_from_slice(&sig.serialize());
		signature[64] = recovery_id.serialize() + 27;

		let recovered = recover_address(&message_hash, &signature).unwrap();
		assert_eq!(recovered, address);
	}

	#[test]
	fn rejects_out_of_range_v() {
		let mut signature = [0u8; 65];
		signature[64] = 99;
		let message_hash = [1u8; 32];
		assert_eq!(
			recover_address(&message_hash, &signature),
			Err(Error::InvalidCommitmentSignature)
		);
	}
}
