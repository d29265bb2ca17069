pub mod routes;
pub mod startup;
pub mod state;
pub mod stores;
pub mod errors;

pub use startup::run;
