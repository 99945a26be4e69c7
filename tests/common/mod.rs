// Common test utilities and fixtures


// Re-export commonly used items
// Note: These may appear unused in some test binaries but are used in others
#[allow(unused_imports)]
pub use fixtures::{
    long_section_doc, paragraph, realistic_corpus, write_file, TestDataRoot, REVISED_DOC,
    TWO_SECTION_DOC,
};
#[allow(unused_imports)]
pub use helpers::{create_test_engine, create_test_services, fast_lock, StaticFetcher};
