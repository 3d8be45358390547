//! Built-in tools for the wizard agent.

pub mod calculator;
pub mod wizard;

pub use calculator::{CalculatorArgs, CalculatorTool, evaluate, format_number};
pub use wizard::{LookupResponse, PotionRecord, WizardLookupArgs, WizardLookupTool};
