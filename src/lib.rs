//! silkroad: single-symbol algorithmic trading orchestrator.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. [`app`] wires them together from a
//! YAML config and [`cli`] exposes the `backtest`, `live`, `validate` and
//! `serve` commands.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod ports;
