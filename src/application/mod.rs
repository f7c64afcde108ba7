pub mod classifier;
pub mod dashboard;
pub mod oauth;
pub mod reconciler;
pub mod schedule_builder;
pub mod templates;
