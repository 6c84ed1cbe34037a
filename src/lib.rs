//! Coach Compass - Decision pipeline for an AI coaching chat
//!
//! For every inbound user message this crate decides whether the message
//! signals a crisis, which coaching domain the conversation belongs to,
//! which model tier should generate the reply, and which synthesized
//! behavioral patterns are worth injecting into the reply's context.
//! Every public component fails open: internal errors degrade to safe
//! defaults and never block message generation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
