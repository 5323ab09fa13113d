pub mod data_core;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod performance;
pub mod search;
