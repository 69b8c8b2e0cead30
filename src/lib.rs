#![deny(warnings)]

//! Client core of a versioned prompt manager: SSE stream decoding with
//! cancellation, placeholder templating, and version diffing with a
//! change-rate metric. The UI shell and the REST backend live elsewhere.

pub mod client;
pub mod diff;
pub mod error;
pub mod logger;
pub mod prompts;
pub mod stream;
pub mod template;
pub mod tokens;
