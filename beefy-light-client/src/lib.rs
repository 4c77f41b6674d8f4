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

//! Verification core for an IBC-style light client that tracks a relay
//! chain's BEEFY commitments and re-anchors parachain headers under them.
//!
//! A host wires in its own [`ClientStore`], [`HostHeaderCodec`] and
//! [`ExtrinsicProofVerifier`] and drives the four entry points: [`verify_client_message`],
//! [`check_for_misbehaviour`], [`update_state_on_misbehaviour`] and
//! [`update_state`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod client;
mod error;
mod hasher;
mod limits;
mod membership;
mod mmr;
mod store;

#[cfg(any(test, feature = "test-vectors"))]
mod keyring;

pub use client::{
	block_number_for_leaf_index, check_for_misbehaviour, leaf_index_for_block_number,
	update_state, update_state_on_misbehaviour, verify_client_message,
};
pub use error::Error;
pub use hasher::{address_of, keccak_256, recover_address, Keccak256};
pub use limits::Limits;
pub use membership::{DecodedParachainHeader, ExtrinsicProofVerifier, HostHeaderCodec, MembershipVerifier};
pub use mmr::{leaf_index_to_mmr_size, MmrBatchProof, MmrLeaf};
pub use store::ClientStore;

#[cfg(any(test, feature = "test-vectors"))]
pub use keyring::Keyring;
#[cfg(any(test, feature = "test-vectors"))]
pub use membership::StubHeaderCodec;
#[cfg(any(test, feature = "test-vectors"))]
pub use store::MemoryClientStore;

pub use beefy_client_merkle::{
	generate_proof, merkle_root, Hasher, IndexedLeaf, MerkleMultiProof,
	Output,
};
pub use beefy_client_primitives::{
	ActivationBlock, Address, AuthoritySet, BeefyMmrLeaf, BlockNumber, ClientMessage,
	ClientState, Commitment, ConsensusState, ConsensusStateUpdate, Digest, Header,
	HeaderClientState, Height, Misbehaviour, MmrLeafPartial, ParaIdAndHeader,
	ParachainHeaderProof, Payload, SignedCommitment, ValidatorSetId, ValidatorSignature,
};
