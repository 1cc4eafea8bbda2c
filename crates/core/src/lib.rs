#![forbid(unsafe_code)]

pub mod flow;
pub mod model;

pub use flow::{FlowAction, FlowError, FlowOutcome, FlowProgress, QuizFlow};
