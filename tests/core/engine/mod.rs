//! Engine lifecycle tests
//!
//! Initialization sources and recovery, refresh caching, and
//! searches racing rebuilds.

mod test_concurrency;
mod test_initialize;
