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

//! The client state machine: `verify_client_message`, `check_for_misbehaviour`,
//! `update_state_on_misbehaviour` and `update_state`.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use codec::Encode;
use log::{debug, warn};

use beefy_client_primitives::{
	AuthoritySet, BeefyMmrLeaf, ClientMessage, ClientState, ConsensusState, Header, Height,
	ParaIdAndHeader,
};
use beefy_client_merkle::{IndexedLeaf, MerkleMultiProof};

use crate::{
	error::Error,
	hasher::{keccak_256, recover_address, Keccak256},
	limits::Limits,
	membership::{ExtrinsicProofVerifier, HostHeaderCodec},
	mmr::{leaf_index_to_mmr_size, MmrBatchProof, MmrLeaf},
	store::ClientStore,
};

/// Super-majority threshold for an authority set of size `len`: `⌈2n/3⌉ + 1`.
fn authority_threshold(len: u32) -> u32 {
	(2 * len) / 3 + 1
}

/// Dispatch a [`ClientMessage`] to its verification routine.
///
/// Only `Header` is handled; like the upstream client this was distilled
/// from, anything else is an unrecognized client-message type rather than a
/// case this function validates.
pub fn verify_client_message(
	client_state: &mut ClientState,
	message: &ClientMessage,
	limits: &Limits,
) -> Result<(), Error> {
	if client_state.is_frozen() {
		warn!(target: "beefy-light-client", "rejecting client message: client is frozen");
		return Err(Error::ClientFrozen);
	}

	match message {
		ClientMessage::Header(header) => verify_header(client_state, header, limits),
		ClientMessage::Misbehaviour(_) => Err(Error::InvalidClientType),
	}
}

fn verify_header(
	client_state: &mut ClientState,
	header: &Header,
	limits: &Limits,
) -> Result<(), Error> {
	let client = &header.client_state;
	let signed_commitment = &client.signed_commitment;
	let commitment = &signed_commitment.commitment;

	if signed_commitment.signatures.len() as u32 > limits.max_signatures
		|| header.consensus_state_update.parachain_headers.len() as u32
			> limits.max_parachain_headers
		|| client.authorities_proof.len() as u32 > limits.max_proof_items
		|| client.mmr_proof.len() as u32 > limits.max_proof_items
		|| header.consensus_state_update.mmr_proofs.len() as u32 > limits.max_proof_items
	{
		return Err(Error::InvalidCommitment);
	}

	// Checking signatures is expensive, so check that the sparse signature
	// set can possibly meet either authority set's threshold before doing
	// any recovery work.
	let signature_count = signed_commitment.signatures.len() as u32;
	if authority_threshold(client_state.authority.len) > signature_count
		|| authority_threshold(client_state.next_authority_set.len) > signature_count
	{
		debug!(
			target: "beefy-light-client",
			"commitment for block {} has {} signatures, below the super-majority threshold",
			commitment.block_number, signature_count,
		);
		return Err(Error::CommitmentNotFinal);
	}

	let updated_authority = if commitment.validator_set_id == client_state.authority.id {
		false
	} else if commitment.validator_set_id == client_state.next_authority_set.id {
		true
	} else {
		return Err(Error::AuthoritySetUnknown(
			commitment.validator_set_id,
			client_state.authority.id,
			client_state.next_authority_set.id,
		));
	};

	let authority_set =
		if updated_authority { &client_state.next_authority_set } else { &client_state.authority };

	let commitment_bytes = commitment.encode();
	let commitment_hash = keccak_256(&commitment_bytes);

	let mut authority_leaves = Vec::with_capacity(signed_commitment.signatures.len());
	for signature in &signed_commitment.signatures {
		let address = recover_address(&commitment_hash, &signature.signature)?;
		authority_leaves.push(IndexedLeaf {
			hash: keccak_256(&address),
			index: signature.authority_index as u64,
		});
	}

	let authorities_proof = MerkleMultiProof {
		total_count: authority_set.len as u64,
		leaves: authority_leaves,
		proof: client.authorities_proof.clone(),
	};
	let authorities_valid = authorities_proof
		.verify::<Keccak256>(&authority_set.authority_root)
		.map_err(|_| Error::AuthoritySetUnknown(
			commitment.validator_set_id,
			client_state.authority.id,
			client_state.next_authority_set.id,
		))?;
	if !authorities_valid {
		return Err(Error::AuthoritySetUnknown(
			commitment.validator_set_id,
			client_state.authority.id,
			client_state.next_authority_set.id,
		));
	}

	if commitment.block_number > client_state.latest_beefy_height {
		// A trust-advancing commitment with no "mh" payload leaves the trust
		// anchor untouched; it is not an error, and parachain-heads
		// re-anchoring below still runs against the unchanged MMR root.
		if let Some(mmr_root) = commitment.mmr_root() {
			if mmr_root.len() != 32 {
				return Err(Error::InvalidCommitment);
			}

			let mmr_leaf_bytes = client.mmr_leaf.encode();
			let mmr_size = leaf_index_to_mmr_size(client.mmr_leaf_index);
			let leaf_proof = MmrBatchProof {
				mmr_size,
				leaves: vec![MmrLeaf {
					hash: keccak_256(&mmr_leaf_bytes),
					leaf_index: client.mmr_leaf_index,
				}],
				proof: client.mmr_proof.clone(),
			};

			let mut expected_root = [0u8; 32];
			expected_root.copy_from_slice(mmr_root);
			if !leaf_proof.verify(&expected_root)? {
				return Err(Error::FailedVerifyMMRLeaf);
			}

			client_state.latest_beefy_height = commitment.block_number;
			client_state.mmr_root_hash = expected_root;
			debug!(
				target: "beefy-light-client",
				"advanced trust to block {}", commitment.block_number,
			);

			if updated_authority {
				debug!(
					target: "beefy-light-client",
					"rotated authority set {} -> {}",
					client_state.authority.id, client_state.next_authority_set.id,
				);
				client_state.authority = client_state.next_authority_set.clone();
				client_state.next_authority_set = client.mmr_leaf.beefy_next_authority_set.clone();
			}
		}
	}

	verify_parachain_headers(client_state, header)
}

fn verify_parachain_headers(client_state: &ClientState, header: &Header) -> Result<(), Error> {
	let mut mmr_leaves = Vec::with_capacity(header.consensus_state_update.parachain_headers.len());

	for proof in &header.consensus_state_update.parachain_headers {
		let heads_leaf = ParaIdAndHeader {
			para_id: client_state.para_id,
			header: proof.parachain_header.clone(),
		};
		let heads_leaf_hash = keccak_256(&heads_leaf.encode());

		let heads_proof = MerkleMultiProof {
			total_count: proof.heads_total_count as u64,
			leaves: vec![IndexedLeaf { hash: heads_leaf_hash, index: proof.heads_leaf_index }],
			proof: proof.parachain_heads_proof.clone(),
		};
		let parachain_heads_root =
			heads_proof.root::<Keccak256>().map_err(|_| Error::InvalidParachainHeadsProof)?;

		let leaf = BeefyMmrLeaf::from_partial(proof.partial_mmr_leaf.clone(), parachain_heads_root);
		let leaf_bytes = leaf.encode();

		let leaf_index = leaf_index_for_block_number(
			client_state,
			proof.partial_mmr_leaf.parent_number.wrapping_add(1),
		);

		mmr_leaves.push(MmrLeaf { hash: keccak_256(&leaf_bytes), leaf_index: leaf_index as u64 });
	}

	if mmr_leaves.is_empty() {
		return Ok(());
	}

	let batch_proof = MmrBatchProof {
		mmr_size: header.consensus_state_update.mmr_size,
		leaves: mmr_leaves,
		proof: header.consensus_state_update.mmr_proofs.clone(),
	};

	if !batch_proof.verify(&client_state.mmr_root_hash)? {
		return Err(Error::FailedVerifyMMRLeaf);
	}

	Ok(())
}

/// Leaf index for the MMR leaf whose parent is `block_number - 1`, i.e. the
/// leaf produced at `block_number`.
///
/// Replicates the upstream client's arithmetic exactly, including its
/// asymmetry with [`block_number_for_leaf_index`] when
/// `beefy_activation_block != 0`: the two are not true inverses there, and
/// this core does not paper over that with "fixed" arithmetic.
pub fn leaf_index_for_block_number(client_state: &ClientState, block_number: u32) -> u32 {
	if client_state.beefy_activation_block == 0 {
		block_number.wrapping_sub(1)
	} else {
		client_state.beefy_activation_block.wrapping_sub(block_number.wrapping_add(1))
	}
}

/// Inverse-in-spirit of [`leaf_index_for_block_number`] used when a host
/// needs to map a trusted leaf back to the block number it commits to.
pub fn block_number_for_leaf_index(client_state: &ClientState, leaf_index: u32) -> u32 {
	if client_state.beefy_activation_block == 0 {
		leaf_index.wrapping_add(1)
	} else {
		client_state.beefy_activation_block.wrapping_add(leaf_index)
	}
}

/// Detect duplicate-height and BFT-time-violation misbehaviour.
///
/// A `Misbehaviour` message is treated as already validated by
/// [`verify_client_message`]'s caller and always reports misbehaviour; a
/// `Header` is checked against the store for a conflicting or
/// non-monotonic consensus state.
pub fn check_for_misbehaviour<S: ClientStore, C: HostHeaderCodec, E: ExtrinsicProofVerifier>(
	store: &S,
	host_codec: &C,
	extrinsic_verifier: &E,
	message: &ClientMessage,
) -> Result<bool, Error> {
	match message {
		ClientMessage::Misbehaviour(_) => Ok(true),
		ClientMessage::Header(header) => {
			let first = header
				.consensus_state_update
				.parachain_headers
				.first()
				.ok_or(Error::InvalidParachainHeader)?;
			let decoded = host_codec.decode_header(&first.parachain_header)?;
			let height = Height::new(decoded.number as u64);
			let ibc_root =
				decoded.ibc_commitment_root().ok_or(Error::MissingIbcCommitmentDigest)?;
			if ibc_root.len() != 32 {
				return Err(Error::MissingIbcCommitmentDigest);
			}
			let mut ibc_root_bytes = [0u8; 32];
			ibc_root_bytes.copy_from_slice(ibc_root);

			if let Some(prev) = store.consensus_state(height) {
				let conflicting = prev.root != ibc_root_bytes;
				if conflicting {
					warn!(
						target: "beefy-light-client",
						"conflicting consensus state root at height {:?}", height,
					);
				}
				return Ok(conflicting);
			}

			let new_timestamp =
				extrinsic_verifier.timestamp_from_proof(&decoded.extrinsics_root, &first.extrinsic_proof)?;

			let (prev_height, next_height) = store.neighbouring_consensus_state_heights(height);

			if let Some(prev_height) = prev_height {
				if let Some(prev_state) = store.consensus_state(prev_height) {
					if prev_state.timestamp >= new_timestamp {
						return Ok(true);
					}
				}
			}

			if let Some(next_height) = next_height {
				if let Some(next_state) = store.consensus_state(next_height) {
					if next_state.timestamp <= new_timestamp {
						return Ok(true);
					}
				}
			}

			Ok(false)
		},
	}
}

/// Freeze the client following detected misbehaviour. Terminal: a frozen
/// client rejects every subsequent `verify_client_message` call.
pub fn update_state_on_misbehaviour(client_state: &mut ClientState) {
	warn!(target: "beefy-light-client", "freezing client after detected misbehaviour");
	client_state.frozen = true;
}

/// Persist a `ConsensusState` for every newly-seen parachain height carried
/// by `header`, returning the heights written.
pub fn update_state<S: ClientStore, C: HostHeaderCodec, E: ExtrinsicProofVerifier>(
	store: &mut S,
	header: &Header,
	host_codec: &C,
	extrinsic_verifier: &E,
) -> Result<Vec<Height>, Error> {
	let mut written = Vec::new();

	for proof in &header.consensus_state_update.parachain_headers {
		let decoded = host_codec.decode_header(&proof.parachain_header)?;
		let height = Height::new(decoded.number as u64);

		if store.consensus_state(height).is_some() {
			continue;
		}

		let timestamp = extrinsic_verifier
			.timestamp_from_proof(&decoded.extrinsics_root, &proof.extrinsic_proof)?;
		let root = decoded.ibc_commitment_root().ok_or(Error::MissingIbcCommitmentDigest)?;
		if root.len() != 32 {
			return Err(Error::MissingIbcCommitmentDigest);
		}
		let mut root_bytes = [0u8; 32];
		root_bytes.copy_from_slice(root);

		store.set_consensus_state(height, ConsensusState { timestamp, root: root_bytes });
		written.push(height);
	}

	Ok(written)
}

#[cfg(all(test, feature = "test-vectors"))]
mod tests {
	use super::*;

	fn sample_authority(id: u64, len: u32) -> AuthoritySet {
		AuthoritySet { id, len, authority_root: [0u8; 32] }
	}

	#[test]
	fn authority_threshold_matches_super_majority() {
		assert_eq!(authority_threshold(1), 1);
		assert_eq!(authority_threshold(3), 3);
		assert_eq!(authority_threshold(4), 3);
		assert_eq!(authority_threshold(100), 67);
	}

	#[test]
	fn frozen_client_rejects_any_message() {
		let mut client_state = ClientState {
			para_id: 2000,
			latest_beefy_height: 10,
			mmr_root_hash: [0u8; 32],
			beefy_activation_block: 0,
			authority: sample_authority(0, 3),
			next_authority_set: sample_authority(1, 3),
			frozen: true,
		};
		let message = ClientMessage::Misbehaviour(beefy_client_primitives::Misbehaviour {
			height: 1,
			reason: vec![],
		});
		assert_eq!(
			verify_client_message(&mut client_state, &message, &Limits::default()),
			Err(Error::ClientFrozen)
		);
	}

	#[test]
	fn leaf_index_bijection_matches_activation_zero_case() {
		let client_state = ClientState {
			para_id: 2000,
			latest_beefy_height: 10,
			mmr_root_hash: [0u8; 32],
			beefy_activation_block: 0,
			authority: sample_authority(0, 3),
			next_authority_set: sample_authority(1, 3),
			frozen: false,
		};
		assert_eq!(leaf_index_for_block_number(&client_state, 1), 0);
		assert_eq!(leaf_index_for_block_number(&client_state, 11), 10);
		assert_eq!(
			block_number_for_leaf_index(&client_state, leaf_index_for_block_number(&client_state, 11)),
			11
		);
	}

	#[test]
	fn leaf_index_bijection_is_not_invertible_after_activation() {
		let client_state = ClientState {
			para_id: 2000,
			latest_beefy_height: 10,
			mmr_root_hash: [0u8; 32],
			beefy_activation_block: 100,
			authority: sample_authority(0, 3),
			next_authority_set: sample_authority(1, 3),
			frozen: false,
		};
		let leaf_index = leaf_index_for_block_number(&client_state, 105);
		let round_tripped = block_number_for_leaf_index(&client_state, leaf_index);
		assert_ne!(round_tripped, 105);
	}
}
