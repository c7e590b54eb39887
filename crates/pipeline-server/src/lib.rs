//! # Pipeline Server
//!
//! The composition root: wires the durable queue, job store, pipeline supervisor,
//! observability hub, and REST/push API into a single running process.

pub mod app;
pub mod startup;
