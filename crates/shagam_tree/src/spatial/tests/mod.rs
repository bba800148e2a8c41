//! Cross-module tests of the tree invariants

mod partition_invariants;
