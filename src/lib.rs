//! Critters - a strip of small autonomous desktop pets

pub mod command;
pub mod core;
pub mod entity;
pub mod persistence;
pub mod renderer;
pub mod simulation;
pub mod ui;
