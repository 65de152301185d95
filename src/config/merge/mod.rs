pub mod defaults;
pub mod service;
