//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod commentary;

pub use commentary::CommentaryService;
