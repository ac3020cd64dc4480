//! Shared DTOs for the stubfix workspace.
//!
//! # Design constraints
//! - `FixOutcome` is serialized to stdout in JSON mode; keep field names stable.
//! - Prefer adding optional fields over changing semantics.

pub mod outcome;
pub mod rule;

/// Schema identifiers.
pub mod schema {
    pub const STUBFIX_OUTCOME_V1: &str = "stubfix.outcome.v1";
}

/// File name the protocol compiler emits for the gRPC service stub.
pub const DEFAULT_STUB_FILE: &str = "llmserver_pb2_grpc.py";
