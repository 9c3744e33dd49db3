//! Cross-module integration tests, driven through the full `FixedUpdate`
//! step loop (`TestNet`) or against frozen snapshots with randomized
//! networks.
