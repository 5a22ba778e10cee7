//! Expectancy and compounded-return estimation.

mod simulator;

pub use simulator::{ExpectancyError, ExpectancySimulator};
