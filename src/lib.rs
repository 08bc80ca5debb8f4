pub mod config;
pub mod cpu;
pub mod environment;
pub mod error;
pub mod genome;
pub mod head;
pub mod inst;
pub mod label;
pub mod memory;
pub mod metrics;
pub mod organism;
pub mod population;
pub mod tasks;
pub mod testcpu;
