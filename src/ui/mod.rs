//! Terminal front end: the training report and the interactive menu.

pub mod menu;
pub mod report;
