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

/// Resource bounds checked before any signature-recovery or hashing work
/// begins, so a maliciously oversized [`ClientMessage`] is rejected cheaply.
///
/// [`ClientMessage`]: beefy_client_primitives::ClientMessage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
	/// Maximum number of signatures accepted on a single commitment.
	pub max_signatures: u32,
	/// Maximum number of parachain headers accepted in one `Header` update.
	pub max_parachain_headers: u32,
	/// Maximum number of sibling digests accepted in any single Merkle or
	/// MMR proof.
	pub max_proof_items: u32,
}

impl Default for Limits {
	fn default() -> Self {
		Limits { max_signatures: 1024, max_parachain_headers: 128, max_proof_items: 512 }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_recommended_bounds() {
		let limits = Limits::default();
		assert_eq!(limits.max_signatures, 1024);
		assert_eq!(limits.max_parachain_headers, 128);
	}
}
