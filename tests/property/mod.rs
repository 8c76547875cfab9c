//! Property-based tests for identity and idempotence guarantees
