//! Discrete-event simulation of a multilevel feedback queue CPU scheduler
//! with three blocking I/O devices.

pub mod scheduler;
