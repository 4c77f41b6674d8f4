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

use displaydoc::Display;

/// A single flat error type for every fallible operation in this crate, so a
/// host can match on a stable set of variants the way it would on an IBC
/// client error code.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum Error {
	/// commitment does not have enough signatures to meet either the current
	/// or next authority set threshold
	CommitmentNotFinal,
	/// commitment's validator_set_id ({0}) does not match the current ({1})
	/// or next ({2}) authority set id
	AuthoritySetUnknown(u64, u64, u64),
	/// commitment could not be SCALE-encoded for hashing, or the message
	/// carries more signatures, parachain headers or proof items than the
	/// configured resource limits allow
	InvalidCommitment,
	/// a commitment signature could not be used to recover a public key
	InvalidCommitmentSignature,
	/// recovered signer is not part of the authority set it claims to
	/// belong to
	InvalidAuthorityProof,
	/// the BEEFY MMR leaf could not be SCALE-encoded
	FailedEncodeMMRLeaf,
	/// the BEEFY MMR leaf proof did not verify against the committed MMR
	/// root
	FailedVerifyMMRLeaf,
	/// a parachain-heads leaf does not decode to a structurally valid MMR
	/// leaf
	InvalidMMRLeaf,
	/// a parachain header's inclusion proof in the parachain-heads merkle
	/// tree did not verify
	InvalidParachainHeadsProof,
	/// client message carries an unrecognized client type discriminator
	InvalidClientType,
	/// client is frozen following detected misbehaviour and can no longer
	/// be updated
	ClientFrozen,
	/// a submitted header's block number is not greater than the client's
	/// latest known height
	StaleHeader,
	/// a decoded parachain header is missing required fields
	InvalidParachainHeader,
	/// extrinsic proof did not verify against the parachain header's
	/// extrinsics root
	InvalidExtrinsicProof,
	/// the timestamp extrinsic could not be decoded from the proven
	/// extrinsic bytes
	InvalidTimestampExtrinsic,
	/// no `/IBC` consensus digest item was found in the parachain header
	MissingIbcCommitmentDigest,
	/// the underlying key-value client store returned an error
	ClientStoreError,
	/// no consensus state is stored at the requested height
	ConsensusStateNotFound,
}
