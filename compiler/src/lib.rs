pub mod config;
pub mod ir;
pub mod pipeline;
