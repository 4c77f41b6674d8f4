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

//! Binary Merkle tree root and sparse multi-leaf inclusion-proof
//! verification.
//!
//! `merkle_root` builds a full tree bottom-up, promoting odd nodes
//! unchanged. `MerkleMultiProof` verifies a proof against a declared total
//! leaf count without ever building the full tree: it recomputes exactly the
//! nodes on the path from the supplied leaves to the root, consuming one
//! proof digest per sibling that isn't itself among the supplied leaves.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
use std::collections::BTreeMap;

/// A 32-byte digest.
pub type Output = [u8; 32];

/// Hash function used to combine two nodes or hash a leaf.
pub trait Hasher {
	/// Hash arbitrary bytes into a digest.
	fn hash(data: &[u8]) -> Output;
}

/// Error returned when a multi-proof is structurally unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// A leaf's index is not smaller than `total_count`.
	IndexOutOfBounds,
	/// The proof ran out of sibling digests before the root was reached.
	ProofTooShort,
	/// No leaves were supplied.
	NoLeaves,
}

/// Build a Merkle root over `leaves`, hashing each with `H` first.
///
/// Odd nodes at any level are promoted unchanged to the next level rather
/// than paired with themselves.
pub fn merkle_root<H, I, T>(leaves: I) -> Output
where
	H: Hasher,
	I: IntoIterator<Item = T>,
	T: AsRef<[u8]>,
{
	let iter = leaves.into_iter().map(|l| H::hash(l.as_ref()));
	let mut next = match merkelize_row::<H, _>(iter) {
		Ok(root) => return root,
		Err(next) if next.is_empty() => return Output::default(),
		Err(next) => next,
	};

	loop {
		next = match merkelize_row::<H, _>(next.into_iter()) {
			Ok(root) => return root,
			Err(next) => next,
		};
	}
}

fn merkelize_row<H, I>(mut iter: I) -> Result<Output, Vec<Output>>
where
	H: Hasher,
	I: Iterator<Item = Output>,
{
	let mut next = Vec::with_capacity(iter.size_hint().0);
	let mut combined = [0_u8; 64];
	loop {
		let a = iter.next();
		let b = iter.next();

		match (a, b) {
			(Some(a), Some(b)) => {
				combined[0..32].copy_from_slice(&a);
				combined[32..64].copy_from_slice(&b);
				next.push(H::hash(&combined));
			},
			// Odd number of items. Promote the item to the upper layer.
			(Some(a), None) if !next.is_empty() => {
				next.push(a);
			},
			// Last item = root.
			(Some(a), None) => return Ok(a),
			// Finish up, no more items.
			_ => return Err(next),
		}
	}
}

/// One leaf supplied to a [`MerkleMultiProof`]: its hash and its absolute
/// index among `total_count` leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedLeaf {
	/// `Keccak256`-ed (or otherwise pre-hashed) leaf value.
	pub hash: Output,
	/// Absolute index of this leaf, `< total_count`.
	pub index: u64,
}

/// A sparse multi-leaf inclusion proof: some leaves plus the sibling
/// digests needed to recompute the root that would be produced by
/// [`merkle_root`] over all `total_count` leaves.
#[derive(Debug, Clone)]
pub struct MerkleMultiProof {
	/// Total number of leaves in the tree this proof is against.
	pub total_count: u64,
	/// The leaves being proven, with their absolute indices.
	pub leaves: Vec<IndexedLeaf>,
	/// Ordered sibling digests, consumed left-to-right, level by level.
	pub proof: Vec<Output>,
}

impl MerkleMultiProof {
	/// Recompute the root implied by this proof and compare it to `root`.
	pub fn verify<H: Hasher>(&self, root: &Output) -> Result<bool, Error> {
		Ok(&self.root::<H>()? == root)
	}

	/// Recompute the root implied by this proof, without comparing it to
	/// anything.
	pub fn root<H: Hasher>(&self) -> Result<Output, Error> {
		let mut proof = self.proof.iter().copied();
		verify_path::<H>(self.total_count, &self.leaves, &mut proof)
	}
}

/// Recompute the root of a `total_count`-leaf tree given some `leaves` and a
/// source of sibling digests, consuming one digest per sibling not already
/// present among `leaves`.
///
/// Shared by [`MerkleMultiProof::root`] and by callers (such as an MMR
/// verifier) that need to walk several such trees against one flat,
/// concatenated proof stream.
pub fn verify_path<H: Hasher>(
	total_count: u64,
	leaves: &[IndexedLeaf],
	proof: &mut dyn Iterator<Item = Output>,
) -> Result<Output, Error> {
	if leaves.is_empty() {
		return Err(Error::NoLeaves);
	}
	if leaves.iter().any(|l| l.index >= total_count) {
		return Err(Error::IndexOutOfBounds);
	}

	let mut layer: BTreeMap<u64, Output> = leaves.iter().map(|l| (l.index, l.hash)).collect();
	let mut width = total_count;

	while width > 1 {
		let mut next: BTreeMap<u64, Output> = BTreeMap::new();
		let indices: Vec<u64> = layer.keys().copied().collect();
		let mut consumed: BTreeMap<u64, ()> = BTreeMap::new();

		for index in indices {
			if consumed.contains_key(&index) {
				continue;
			}
			let sibling = index ^ 1;
			let this_hash = layer[&index];

			if sibling >= width {
				// Odd node at this level: promote unchanged.
				next.insert(index / 2, this_hash);
				consumed.insert(index, ());
			} else if let Some(&sibling_hash) = layer.get(&sibling) {
				let (left, right) = order(index, this_hash, sibling, sibling_hash);
				next.insert(index / 2, combine::<H>(left, right));
				consumed.insert(index, ());
				consumed.insert(sibling, ());
			} else {
				let sibling_hash = proof.next().ok_or(Error::ProofTooShort)?;
				let (left, right) = order(index, this_hash, sibling, sibling_hash);
				next.insert(index / 2, combine::<H>(left, right));
				consumed.insert(index, ());
			}
		}

		layer = next;
		width = (width + 1) / 2;
	}

	layer.get(&0).copied().ok_or(Error::ProofTooShort)
}

fn order(index: u64, hash: Output, sibling: u64, sibling_hash: Output) -> (Output, Output) {
	if index < sibling {
		(hash, sibling_hash)
	} else {
		(sibling_hash, hash)
	}
}

fn combine<H: Hasher>(left: Output, right: Output) -> Output {
	let mut combined = [0_u8; 64];
	combined[0..32].copy_from_slice(&left);
	combined[32..64].copy_from_slice(&right);
	H::hash(&combined)
}

/// Test/tooling helper: generate a [`MerkleMultiProof`] for `leaf_indices`
/// out of the full `leaves` set. Used by this workspace's own test fixtures
/// (a relayer would have the equivalent on the prover side); not exercised
/// by the verification core itself.
pub fn generate_proof<H, I, T>(leaves: I, leaf_indices: &[u64]) -> MerkleMultiProof
where
	H: Hasher,
	I: IntoIterator<Item = T>,
	T: AsRef<[u8]>,
{
	let hashed: Vec<Output> = leaves.into_iter().map(|l| H::hash(l.as_ref())).collect();
	let total_count = hashed.len() as u64;

	let mut layer: BTreeMap<u64, Output> =
		hashed.iter().enumerate().map(|(i, h)| (i as u64, *h)).collect();
	let mut wanted: BTreeMap<u64, ()> = leaf_indices.iter().map(|i| (*i, ())).collect();
	let mut proof = Vec::new();
	let mut width = total_count;

	while width > 1 {
		let mut next: BTreeMap<u64, Output> = BTreeMap::new();
		let mut next_wanted: BTreeMap<u64, ()> = BTreeMap::new();
		let indices: Vec<u64> = layer.keys().copied().collect();
		let mut consumed: BTreeMap<u64, ()> = BTreeMap::new();

		for index in indices {
			if consumed.contains_key(&index) {
				continue;
			}
			let sibling = index ^ 1;
			let this_hash = layer[&index];

			if sibling >= width {
				next.insert(index / 2, this_hash);
				if wanted.contains_key(&index) {
					next_wanted.insert(index / 2, ());
				}
				consumed.insert(index, ());
			} else {
				let sibling_hash = layer[&sibling];
				if wanted.contains_key(&index) && !wanted.contains_key(&sibling) {
					proof.push(sibling_hash);
				} else if wanted.contains_key(&sibling) && !wanted.contains_key(&index) {
					proof.push(this_hash);
				}
				let (left, right) = order(index, this_hash, sibling, sibling_hash);
				next.insert(index / 2, combine::<H>(left, right));
				if wanted.contains_key(&index) || wanted.contains_key(&sibling) {
					next_wanted.insert(index / 2, ());
				}
				consumed.insert(index, ());
				consumed.insert(sibling, ());
			}
		}

		layer = next;
		wanted = next_wanted;
		width = (width + 1) / 2;
	}

	let leaves = leaf_indices
		.iter()
		.map(|&i| IndexedLeaf { hash: hashed[i as usize], index: i })
		.collect();

	MerkleMultiProof { total_count, leaves, proof }
}

#[cfg(test)]
mod tests {
	use super::*;
	use hex_literal::hex;
	use tiny_keccak::{Hasher as _, Keccak};

	struct Keccak256;
	impl Hasher for Keccak256 {
		fn hash(data: &[u8]) -> Output {
			let mut keccak = Keccak::v256();
			keccak.update(data);
			let mut output = [0_u8; 32];
			keccak.finalize(&mut output);
			output
		}
	}

	#[test]
	fn should_generate_empty_root() {
		let data: Vec<[u8; 1]> = Default::default();
		let out = merkle_root::<Keccak256, _, _>(data);
		assert_eq!(out, Output::default());
	}

	#[test]
	fn should_generate_single_root() {
		let data = vec![hex!("E04CC55ebEE1cBCE552f250e85c57B70B2E2625b")];
		let out = merkle_root::<Keccak256, _, _>(data.clone());
		assert_eq!(out, Keccak256::hash(&data[0]));
	}

	#[test]
	fn should_generate_root_complex() {
		let test = |data: Vec<&str>| {
			let root = merkle_root::<Keccak256, _, _>(data.clone());
			let proof = generate_proof::<Keccak256, _, _>(data.clone(), &[0]);
			assert!(proof.verify::<Keccak256>(&root).unwrap());
		};

		test(vec!["a", "b", "c"]);
		test(vec!["a", "b", "a", "b"]);
		test(vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
	}

	#[test]
	fn multi_proof_single_leaf_pow_of_two() {
		let data = vec!["a", "b", "c", "d"];
		let root = merkle_root::<Keccak256, _, _>(data.clone());

		for i in 0..data.len() as u64 {
			let proof = generate_proof::<Keccak256, _, _>(data.clone(), &[i]);
			assert!(proof.verify::<Keccak256>(&root).unwrap(), "leaf {} failed", i);
		}
	}

	#[test]
	fn multi_proof_several_leaves_at_once() {
		let data = vec!["a", "b", "c", "d", "e", "f", "g"];
		let root = merkle_root::<Keccak256, _, _>(data.clone());

		let proof = generate_proof::<Keccak256, _, _>(data.clone(), &[1, 4, 6]);
		assert!(proof.verify::<Keccak256>(&root).unwrap());
	}

	#[test]
	fn multi_proof_rejects_wrong_root() {
		let data = vec!["a", "b", "c", "d"];
		let wrong_root = merkle_root::<Keccak256, _, _>(vec!["x", "y", "z", "w"]);

		let proof = generate_proof::<Keccak256, _, _>(data, &[0]);
		assert!(!proof.verify::<Keccak256>(&wrong_root).unwrap());
	}

	#[test]
	fn multi_proof_rejects_out_of_bounds_index() {
		let proof = MerkleMultiProof {
			total_count: 4,
			leaves: vec![IndexedLeaf { hash: [1u8; 32], index: 9 }],
			proof: vec![],
		};
		assert_eq!(proof.verify::<Keccak256>(&[0u8; 32]), Err(Error::IndexOutOfBounds));
	}

	#[test]
	fn multi_proof_rejects_truncated_proof() {
		let data = vec!["a", "b", "c", "d"];
		let root = merkle_root::<Keccak256, _, _>(data.clone());
		let mut proof = generate_proof::<Keccak256, _, _>(data, &[0]);
		proof.proof.pop();
		assert_eq!(proof.verify::<Keccak256>(&root), Err(Error::ProofTooShort));
	}

	#[test]
	fn corrupting_a_proof_byte_breaks_verification() {
		let data = vec!["a", "b", "c", "d", "e"];
		let root = merkle_root::<Keccak256, _, _>(data.clone());
		let mut proof = generate_proof::<Keccak256, _, _>(data, &[2]);
		proof.proof[0][0] ^= 0xFF;
		assert!(!proof.verify::<Keccak256>(&root).unwrap());
	}
}
