pub mod invoker;
pub mod normalizer;
pub mod ranking;
pub mod types;
