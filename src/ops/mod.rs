pub mod auto_clear;
pub mod debounce;
pub mod item_ops;
pub mod migrate;
pub mod reconcile;
pub mod service;
