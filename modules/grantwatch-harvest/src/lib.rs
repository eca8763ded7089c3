pub mod dedup;
pub mod extractor;
pub mod harvester;
pub mod liveness;
pub mod reconcile;
pub mod recovery;
pub mod scraper;
pub mod sources;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod validate;
