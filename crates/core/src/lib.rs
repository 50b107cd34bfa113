pub mod event;
pub mod relevance;
pub mod signature;

pub use event::{ChangedFields, IssueAction, IssueEvent, IssueState, ParseError, ISSUE_ENTITY};
pub use relevance::RelevanceEngine;
pub use signature::{verify_signature, SignatureError};
