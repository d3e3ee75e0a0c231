//! # Newsroom Pipeline
//!
//! Turns candidate items into a digest. The two-stage pipeline asks the
//! provider to select a bounded subset of keyed candidates, then to write the
//! digest from the selected records. Topic mode skips selection and writes
//! from a topic list, optionally researching with the `web_search` tool.
//!
//! Both modes run under [`retry::with_retry`], which repeats the whole
//! invocation on failure.

pub mod digest;
pub mod error;
pub mod prompts;
pub mod retry;
pub mod selection;
pub mod source;
pub mod topic;

pub use digest::{Digest, DigestPipeline, PipelineSettings};
pub use error::{FetchError, PipelineError, Stage};
pub use retry::{RetryPolicy, generate_with_retry, with_retry};
pub use selection::{SelectionBounds, parse_selection};
pub use source::{CandidateSource, JsonFileSource, StaticSource};
pub use topic::{TopicGenerator, TopicSettings};
