#![allow(unused_must_use)]
/*! # Rebound Tests

Headless [`Stepper`](stepper::Stepper) driving a full rebound `App` frame by frame, and the
integration tests built on it.
*/

pub mod stepper;

#[cfg(test)]
mod lifecycle;
#[cfg(test)]
mod reconciliation;
