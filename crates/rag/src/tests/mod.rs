//! Crate-level tests and in-memory doubles for the hosted services.
