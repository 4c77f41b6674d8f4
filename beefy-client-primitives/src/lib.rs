// Copyright (C) 2020-2021 Parity Technologies (UK) Ltd.
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

//! Data model for the BEEFY light-client verification core.
//!
//! Every type here is SCALE-encoded on the wire and most are hashed or
//! signed, so field order matters: it must stay bit-exact with the signing
//! relay chain (see [`Commitment`]).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use codec::{Decode, Encode};

mod commitment;

pub use commitment::{Commitment, Payload, SignedCommitment, ValidatorSignature};

/// Relay-chain block number.
pub type BlockNumber = u32;

/// Identifier of a rotating BEEFY authority set.
pub type ValidatorSetId = u64;

/// 32-byte digest produced by the core's [`Hasher`](../beefy_light_client/trait.Hasher.html).
pub type Digest = [u8; 32];

/// 20-byte Ethereum-style address derived from a recovered authority public key.
pub type Address = [u8; 20];

/// A rotating BEEFY authority set, committed to by a Merkle root over
/// `Keccak256(address_i)` for each authority `i`.
///
/// Sets are totally ordered by `id`; ids grow monotonically by 1 on rotation.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AuthoritySet {
	/// Monotonically increasing identifier of this set.
	pub id: ValidatorSetId,
	/// Number of authorities in the set.
	pub len: u32,
	/// Root of the Merkle tree of `Keccak256(address_i)` leaves.
	pub authority_root: Digest,
}

/// Partial MMR leaf: a [`BeefyMmrLeaf`] without the `parachain_heads` field,
/// which the verifier reconstructs from a supplied parachain-heads proof
/// instead of trusting as given.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MmrLeafPartial {
	/// Leaf format version.
	pub version: u8,
	/// Number of the relay chain block this leaf describes the parent of.
	pub parent_number: BlockNumber,
	/// Hash of the relay chain block this leaf describes the parent of.
	pub parent_hash: Digest,
	/// Next BEEFY authority set, as advertised by the relay chain.
	pub beefy_next_authority_set: AuthoritySet,
}

/// A complete MMR leaf: [`MmrLeafPartial`] extended with the parachain-heads
/// Merkle root. SCALE-encoded then Keccak-hashed to form the MMR leaf digest.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BeefyMmrLeaf {
	/// Leaf format version.
	pub version: u8,
	/// Number of the relay chain block this leaf describes the parent of.
	pub parent_number: BlockNumber,
	/// Hash of the relay chain block this leaf describes the parent of.
	pub parent_hash: Digest,
	/// Next BEEFY authority set, as advertised by the relay chain.
	pub beefy_next_authority_set: AuthoritySet,
	/// Root of the Merkle tree over all parachain heads included at this leaf.
	pub parachain_heads: Digest,
}

impl BeefyMmrLeaf {
	/// Reconstruct a complete leaf from its partial form plus a freshly
	/// recomputed parachain-heads root (never trust one supplied by a proof).
	pub fn from_partial(partial: MmrLeafPartial, parachain_heads: Digest) -> Self {
		BeefyMmrLeaf {
			version: partial.version,
			parent_number: partial.parent_number,
			parent_hash: partial.parent_hash,
			beefy_next_authority_set: partial.beefy_next_authority_set,
			parachain_heads,
		}
	}
}

/// The `{para_id: u32, header: bytes}` tuple whose SCALE encoding is hashed
/// to build a single-leaf proof against a relay block's parachain-heads root.
///
/// Rust has no anonymous-tuple SCALE encoding, so this struct stands in for
/// the `(para_id, header)` pair hashed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ParaIdAndHeader {
	/// Parachain identifier.
	pub para_id: u32,
	/// Opaque SCALE-encoded Substrate header.
	pub header: Vec<u8>,
}

/// A single parachain header together with everything needed to re-anchor it
/// under the signed MMR root.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ParachainHeaderProof {
	/// Opaque SCALE-encoded Substrate header.
	pub parachain_header: Vec<u8>,
	/// The MMR leaf this header's relay block produced, without the
	/// parachain-heads field (reconstructed by the verifier).
	pub partial_mmr_leaf: MmrLeafPartial,
	/// Sibling digests proving `parachain_header` was included in its relay
	/// block's parachain-heads Merkle tree.
	pub parachain_heads_proof: Vec<Digest>,
	/// This header's leaf index in the parachain-heads tree.
	pub heads_leaf_index: u64,
	/// Total number of leaves in the parachain-heads tree.
	pub heads_total_count: u32,
	/// Proof that the timestamp extrinsic is included under the header's
	/// extrinsics root, as a sequence of trie proof nodes.
	pub extrinsic_proof: Vec<Vec<u8>>,
}

/// Batch MMR inclusion proof covering every parachain header in a [`Header`].
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ConsensusStateUpdate {
	/// Total number of leaves in the MMR at the time this proof was
	/// generated, fed directly into `mountains()`'s binary decomposition on
	/// the verifier side. Not a total node count.
	pub mmr_size: u64,
	/// Ordered sibling digests (including peak hashes) for the batch proof.
	pub mmr_proofs: Vec<Digest>,
	/// Parachain headers being re-anchored by this update.
	pub parachain_headers: Vec<ParachainHeaderProof>,
}

/// Everything needed to verify one BEEFY commitment and the MMR leaf it signs.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct HeaderClientState {
	/// Sibling digests proving the recovered authority addresses belong to
	/// the declared authority set.
	pub authorities_proof: Vec<Digest>,
	/// The signed BEEFY commitment.
	pub signed_commitment: SignedCommitment,
	/// The MMR leaf advertised as the latest one at `signed_commitment`'s
	/// block number.
	pub mmr_leaf: BeefyMmrLeaf,
	/// Absolute leaf index of `mmr_leaf` in the MMR.
	pub mmr_leaf_index: u64,
	/// Sibling digests proving `mmr_leaf` is included under the commitment's
	/// signed MMR root.
	pub mmr_proof: Vec<Digest>,
}

/// The BEEFY client's `Header` message: a signed commitment advancing trust,
/// plus a batch of parachain headers re-anchored under the (possibly just
/// updated) MMR root.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Header {
	/// Commitment-and-MMR-leaf proof advancing the client's trust anchor.
	pub client_state: HeaderClientState,
	/// Parachain headers to re-anchor under the resulting MMR root.
	pub consensus_state_update: ConsensusStateUpdate,
}

/// Pre-validated misbehaviour evidence. The Go source this was distilled
/// from treats misbehaviour proofs as validated upstream of the light
/// client core (`CheckForMisbehaviour` just returns `true` for this
/// variant) — this core does not re-derive equivocation proofs itself.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Misbehaviour {
	/// Parachain height the misbehaviour concerns.
	pub height: BlockNumber,
	/// Human-readable reason, surfaced to the host for auditing.
	pub reason: Vec<u8>,
}

/// Two-variant tagged union dispatched on by [`verify_client_message`].
///
/// [`verify_client_message`]: ../beefy_light_client/fn.verify_client_message.html
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum ClientMessage {
	/// A new signed BEEFY commitment and parachain headers to verify.
	Header(Header),
	/// Pre-validated misbehaviour evidence.
	Misbehaviour(Misbehaviour),
}

/// Height at which the client was activated: below this, leaf-index
/// arithmetic takes the `beefy_activation_block == 0` branch.
pub type ActivationBlock = BlockNumber;

/// Persistent trust root of the light client.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ClientState {
	/// Parachain this client tracks.
	pub para_id: u32,
	/// Highest relay chain block number whose commitment has been verified.
	pub latest_beefy_height: BlockNumber,
	/// MMR root authenticated by the most recently verified commitment.
	pub mmr_root_hash: Digest,
	/// Relay chain block at which BEEFY was activated (0 if since genesis).
	pub beefy_activation_block: ActivationBlock,
	/// Currently active authority set.
	pub authority: AuthoritySet,
	/// Authority set expected to take over at the next rotation.
	pub next_authority_set: AuthoritySet,
	/// Set to `true` after misbehaviour is detected; terminal.
	pub frozen: bool,
}

impl ClientState {
	/// `true` once [`UpdateStateOnMisbehaviour`] has run.
	///
	/// [`UpdateStateOnMisbehaviour`]: ../beefy_light_client/fn.update_state_on_misbehaviour.html
	pub fn is_frozen(&self) -> bool {
		self.frozen
	}
}

/// Per-height consensus state, one per accepted parachain height.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ConsensusState {
	/// Wall-clock timestamp of the parachain block, in milliseconds.
	pub timestamp: u64,
	/// Parachain state root (the IBC commitment root extracted from the
	/// header's digest).
	pub root: Digest,
}

/// `(revision_number, revision_height)` height pair used at the host
/// boundary; `revision_number` is always `0` for this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode)]
pub struct Height {
	/// Always `0` for this client type.
	pub revision_number: u64,
	/// Parachain block number.
	pub revision_height: u64,
}

impl Height {
	/// Construct a height for this client's fixed revision number.
	pub fn new(revision_height: u64) -> Self {
		Height { revision_number: 0, revision_height }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_authority_set(id: u64) -> AuthoritySet {
		AuthoritySet { id, len: 4, authority_root: [id as u8; 32] }
	}

	#[test]
	fn authority_set_round_trips() {
		let set = sample_authority_set(7);
		let encoded = set.encode();
		let decoded = AuthoritySet::decode(&mut &encoded[..]).unwrap();
		assert_eq!(set, decoded);
	}

	#[test]
	fn beefy_mmr_leaf_round_trips() {
		let leaf = BeefyMmrLeaf {
			version: 1,
			parent_number: 42,
			parent_hash: [1u8; 32],
			beefy_next_authority_set: sample_authority_set(1),
			parachain_heads: [2u8; 32],
		};
		let encoded = leaf.encode();
		let decoded = BeefyMmrLeaf::decode(&mut &encoded[..]).unwrap();
		assert_eq!(leaf, decoded);
	}

	#[test]
	fn from_partial_preserves_fields() {
		let partial = MmrLeafPartial {
			version: 1,
			parent_number: 10,
			parent_hash: [3u8; 32],
			beefy_next_authority_set: sample_authority_set(2),
		};
		let leaf = BeefyMmrLeaf::from_partial(partial.clone(), [9u8; 32]);
		assert_eq!(leaf.version, partial.version);
		assert_eq!(leaf.parent_number, partial.parent_number);
		assert_eq!(leaf.parent_hash, partial.parent_hash);
		assert_eq!(leaf.beefy_next_authority_set, partial.beefy_next_authority_set);
		assert_eq!(leaf.parachain_heads, [9u8; 32]);
	}

	#[test]
	fn para_id_and_header_round_trips() {
		let v = ParaIdAndHeader { para_id: 2000, header: vec![1, 2, 3, 4] };
		let encoded = v.encode();
		let decoded = ParaIdAndHeader::decode(&mut &encoded[..]).unwrap();
		assert_eq!(v, decoded);
	}

	#[test]
	fn height_orders_by_revision_height() {
		assert!(Height::new(5) < Height::new(6));
		assert_eq!(Height::new(5).revision_number, 0);
	}
}
