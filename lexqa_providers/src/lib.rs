mod http;
pub mod retry;

pub use http::{HttpSpanExtractor, parse_candidates};
pub use retry::{RetryPolicy, retry_with_backoff};
