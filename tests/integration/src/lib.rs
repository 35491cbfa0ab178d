//! Cross-crate integration tests for Credo. See `tests/`.
