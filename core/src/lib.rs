pub mod aggregate;
pub mod capacity;
pub mod config;
pub mod error;
pub mod expenses;
pub mod loan;
pub mod members;
pub mod metric;
pub mod monte_carlo;
pub mod revenue;
pub mod rng;
pub mod statement;
pub mod store;
pub mod trial;
pub mod types;
