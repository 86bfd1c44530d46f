//! Integration tests for the sync engine
//!
//! The engine runs against in-memory fakes of the remote service and the
//! local stores; see `common` for the harness.

mod common;

mod test_errors;
mod test_folder;
