// Copyright (C) 2020 Parity Technologies (UK) Ltd.
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

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use codec::{Decode, Encode};

use crate::{BlockNumber, ValidatorSetId};

/// A single payload entry of a [`Commitment`].
///
/// The entry with `payload_id == *b"mh"` carries the 32-byte MMR root.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Payload {
	/// Two-byte payload discriminator, e.g. `*b"mh"` for the MMR root.
	pub payload_id: [u8; 2],
	/// Payload contents; callers must check the length themselves since it
	/// varies by `payload_id`.
	pub payload_data: Vec<u8>,
}

impl Payload {
	/// The `payload_id` carrying the MMR root.
	pub const MMR_ROOT_ID: [u8; 2] = *b"mh";

	/// Construct an MMR-root payload entry.
	pub fn mmr_root(root: [u8; 32]) -> Self {
		Payload { payload_id: Self::MMR_ROOT_ID, payload_data: root.to_vec() }
	}
}

/// A commitment signed by BEEFY authorities.
///
/// Authorities sign `Keccak256(SCALE(commitment))`; this encoding must stay
/// bit-exact with the signing relay chain, or every signature over it is
/// meaningless.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Commitment {
	/// Ordered list of payload entries, e.g. the `"mh"` MMR-root entry.
	pub payload: Vec<Payload>,
	/// Relay chain block number this commitment is for.
	pub block_number: BlockNumber,
	/// Authority set supposed to have signed this commitment.
	pub validator_set_id: ValidatorSetId,
}

impl Commitment {
	/// Find the payload entry carrying the MMR root, if present.
	pub fn mmr_root(&self) -> Option<&[u8]> {
		self.payload
			.iter()
			.find(|p| p.payload_id == Payload::MMR_ROOT_ID)
			.map(|p| p.payload_data.as_slice())
	}
}

/// A 65-byte recoverable ECDSA signature, `r || s || v`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ValidatorSignature {
	/// Index of the signing authority within the declared authority set.
	pub authority_index: u32,
	/// `r || s || v` signature bytes; `v` may be `{0,1}` or `{27,28}`.
	pub signature: [u8; 65],
}

/// A [`Commitment`] together with a sparse list of authority signatures over
/// it (fewer than `len` entries are allowed, subject to the threshold check
/// in `VerifyClientMessage`).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct SignedCommitment {
	/// The commitment being signed.
	pub commitment: Commitment,
	/// Sparse list of authority signatures over `commitment`.
	pub signatures: Vec<ValidatorSignature>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn commitment_encode_decode() {
		let commitment = Commitment {
			payload: vec![Payload::mmr_root([7u8; 32])],
			block_number: 5,
			validator_set_id: 0,
		};

		let encoded = commitment.encode();
		let decoded = Commitment::decode(&mut &encoded[..]).unwrap();

		assert_eq!(decoded, commitment);
	}

	#[test]
	fn mmr_root_lookup() {
		let commitment = Commitment {
			payload: vec![
				Payload { payload_id: *b"xx", payload_data: vec![1, 2, 3] },
				Payload::mmr_root([9u8; 32]),
			],
			block_number: 1,
			validator_set_id: 0,
		};
		assert_eq!(commitment.mmr_root(), Some(&[9u8; 32][..]));
	}

	#[test]
	fn mmr_root_missing() {
		let commitment = Commitment {
			payload: vec![Payload { payload_id: *b"xx", payload_data: vec![] }],
			block_number: 1,
			validator_set_id: 0,
		};
		assert_eq!(commitment.mmr_root(), None);
	}

	#[test]
	fn signed_commitment_encode_decode() {
		let commitment = Commitment {
			payload: vec![Payload::mmr_root([1u8; 32])],
			block_number: 5,
			validator_set_id: 0,
		};
		let signed = SignedCommitment {
			commitment,
			signatures: vec![
				ValidatorSignature { authority_index: 2, signature: [9u8; 65] },
				ValidatorSignature { authority_index: 3, signature: [8u8; 65] },
			],
		};

		let encoded = signed.encode();
		let decoded = SignedCommitment::decode(&mut &encoded[..]).unwrap();

		assert_eq!(decoded, signed);
	}
}
