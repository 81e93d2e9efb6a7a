// SPDX-License-Identifier: MIT

//! Randomized-timeout leader election among the parliament's
//! representatives
//!
//! Every node counts down a random number of ticks. The first one to reach
//! zero becomes a candidate and asks everybody else for a vote. A candidate
//! that collects a vote from every other participant declares itself the
//! leader and announces it. A candidacy that does not conclude in time falls
//! back to counting down again.

pub mod config;
pub mod election;
pub mod service;
