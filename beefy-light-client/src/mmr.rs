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

//! A Merkle Mountain Range is a forest of perfect binary "mountains" whose
//! sizes are the powers of two in the binary decomposition of the leaf
//! count, ordered left (tallest) to right (shortest); its root is the
//! mountains' peaks bagged right-to-left with `Keccak256(left || right)`.
//!
//! Membership is proven the same way a single mountain's membership would
//! be ([`beefy_client_merkle::verify_path`]), plus one digest per mountain
//! that carries none of the leaves being proven.

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
use std::collections::BTreeMap;

use beefy_client_merkle::{verify_path, IndexedLeaf, Output};

use crate::{error::Error, hasher::Keccak256};

/// The MMR size (in leaves) such that `leaf_index` is the rightmost leaf.
///
/// Mirrors the Go source's `mmr.LeafIndexToMMRSize`, which is called with a
/// single freshly-produced leaf to establish "we treat this leaf as the
/// latest leaf in the mmr". Note this workspace's `mmr_size` counts leaves
/// throughout, not total MMR nodes as the upstream Go library's position
/// numbering does; see `mountains` below.
pub fn leaf_index_to_mmr_size(leaf_index: u64) -> u64 {
	leaf_index + 1
}

/// Mountain sizes (as leaf counts, each a power of two) for an MMR holding
/// `leaves_count` leaves, ordered left (largest) to right (smallest).
///
/// `leaves_count` here is a leaf count, not the total node count the
/// upstream Go library's position numbers would use — this implementation's
/// binary decomposition is defined directly over leaves, so every caller
/// (`ConsensusStateUpdate::mmr_size`, `MmrBatchProof::mmr_size`) carries that
/// same leaf-count meaning, a deliberate, disclosed departure from reading
/// "mmr_size" as a node count.
fn mountains(leaves_count: u64) -> Vec<u64> {
	let mut sizes = Vec::new();
	for bit in (0..64).rev() {
		let size = 1u64 << bit;
		if leaves_count & size != 0 {
			sizes.push(size);
		}
	}
	sizes
}

/// Locate which mountain `leaf_index` falls into, and its local index
/// within that mountain.
fn locate(leaf_index: u64, mountain_sizes: &[u64]) -> Option<(usize, u64)> {
	let mut offset = 0u64;
	for (i, size) in mountain_sizes.iter().enumerate() {
		if leaf_index < offset + size {
			return Some((i, leaf_index - offset));
		}
		offset += size;
	}
	None
}

/// One leaf supplied to an MMR membership proof.
#[derive(Debug, Clone, Copy)]
pub struct MmrLeaf {
	/// Keccak-256 hash of the SCALE-encoded MMR leaf.
	pub hash: Output,
	/// Absolute leaf index within the MMR.
	pub leaf_index: u64,
}

/// A batch MMR membership proof: some leaves, the MMR's declared size (in
/// leaves, not total nodes — see [`mountains`]), and the flat sibling/peak
/// digest stream needed to recompute the root.
#[derive(Debug, Clone)]
pub struct MmrBatchProof {
	/// Declared size of the MMR, in leaves.
	pub mmr_size: u64,
	/// The leaves being proven.
	pub leaves: Vec<MmrLeaf>,
	/// Ordered sibling/peak digests, consumed mountain by mountain,
	/// left-to-right.
	pub proof: Vec<Output>,
}

impl MmrBatchProof {
	/// Recompute the MMR root implied by this proof.
	pub fn root(&self) -> Result<Output, Error> {
		if self.leaves.is_empty() {
			return Err(Error::FailedVerifyMMRLeaf);
		}

		let mountain_sizes = mountains(self.mmr_size);
		let mut by_mountain: BTreeMap<usize, Vec<IndexedLeaf>> = BTreeMap::new();

		for leaf in &self.leaves {
			let (mountain, local_index) =
				locate(leaf.leaf_index, &mountain_sizes).ok_or(Error::FailedVerifyMMRLeaf)?;
			by_mountain
				.entry(mountain)
				.or_insert_with(Vec::new)
				.push(IndexedLeaf { hash: leaf.hash, index: local_index });
		}

		let mut proof = self.proof.iter().copied();
		let mut peaks = Vec::with_capacity(mountain_sizes.len());

		for (i, size) in mountain_sizes.iter().enumerate() {
			let peak = match by_mountain.get(&i) {
				Some(leaves) => verify_path::<Keccak256>(*size, leaves, &mut proof)
					.map_err(|_| Error::FailedVerifyMMRLeaf)?,
				None => proof.next().ok_or(Error::FailedVerifyMMRLeaf)?,
			};
			peaks.push(peak);
		}

		Ok(bag_peaks(&peaks))
	}

	/// Recompute the MMR root implied by this proof and compare it to
	/// `root`.
	pub fn verify(&self, root: &Output) -> Result<bool, Error> {
		Ok(&self.root()? == root)
	}
}

/// Bag peaks right-to-left: starting from the rightmost (smallest) peak,
/// repeatedly combine the next peak to its left with the accumulator so
/// far, `Keccak256(peak || accumulator)`.
fn bag_peaks(peaks: &[Output]) -> Output {
	let mut iter = peaks.iter().rev();
	let mut acc = *iter.next().expect("peaks is non-empty; qed");
	for peak in iter {
		let mut combined = [0u8; 64];
		combined[0..32].copy_from_slice(peak);
		combined[32..64].copy_from_slice(&acc);
		acc = crate::hasher::keccak_256(&combined);
	}
	acc
}

#[cfg(test)]
mod tests {
	use super::*;
	use beefy_client_merkle::generate_proof;

	fn leaf(n: u8) -> [u8; 1] {
		[n]
	}

	#[test]
	fn mountains_decompose_by_binary_representation() {
		assert_eq!(mountains(1), vec![1]);
		assert_eq!(mountains(2), vec![2]);
		assert_eq!(mountains(3), vec![2, 1]);
		assert_eq!(mountains(7), vec![4, 2, 1]);
	}

	#[test]
	fn single_mountain_round_trip() {
		let data = vec![leaf(1), leaf(2), leaf(3), leaf(4)];
		let root = beefy_client_merkle::merkle_root::<Keccak256, _, _>(data.clone());

		let single = generate_proof::<Keccak256, _, _>(data.clone(), &[2]);
		let mmr_proof = MmrBatchProof {
			mmr_size: 4,
			leaves: vec![MmrLeaf {
				hash: <Keccak256 as beefy_client_merkle::Hasher>::hash(&data[2]),
				leaf_index: 2,
			}],
			proof: single.proof.clone(),
		};

		assert!(mmr_proof.verify(&root).unwrap());
	}

	#[test]
	fn locate_places_leaves_in_expected_mountains() {
		// 5 leaves -> mountains [4, 1]: indices 0..4 in mountain 0, index 4 in mountain 1.
		let sizes = mountains(5);
		assert_eq!(locate(0, &sizes), Some((0, 0)));
		assert_eq!(locate(3, &sizes), Some((0, 3)));
		assert_eq!(locate(4, &sizes), Some((1, 0)));
		assert_eq!(locate(5, &sizes), None);
	}

	#[test]
	fn leaf_index_to_mmr_size_treats_index_as_last_leaf() {
		assert_eq!(leaf_index_to_mmr_size(0), 1);
		assert_eq!(leaf_index_to_mmr_size(41), 42);
	}
}
