//! Concrete inference providers

pub mod http;
pub mod rules;

pub use http::HttpInferenceProvider;
pub use rules::RuleBasedProvider;
