pub mod cancel;
pub mod chain;
pub mod config;
pub mod pipe;
pub mod runtime;
