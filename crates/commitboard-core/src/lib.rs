//! Runtime plumbing for the Commitboard indexer.
//!
//! This crate sits between the pure replay logic in `commitboard-ledger`
//! and the outer surfaces (chain client, HTTP observer). It owns the
//! configuration model, the calendar zone that defines "today", the daily
//! puzzle, and the polling loop that keeps the published view fresh.
//!
//! # Modules
//!
//! - [`clock`] -- Fixed-offset calendar clock and puzzle day index.
//! - [`config`] -- Configuration loading from `commitboard-config.yaml`
//!   into strongly-typed structs.
//! - [`poller`] -- [`HistorySource`] and [`RefreshSink`] traits and the
//!   [`Poller`] refresh loop.
//! - [`puzzle`] -- Daily puzzle rotation, answer checking, and solved flags.
//! - [`suggest`] -- Commit helper: categorized, personalized phrasing
//!   suggestions and draft tidying.
//!
//! [`HistorySource`]: poller::HistorySource
//! [`RefreshSink`]: poller::RefreshSink
//! [`Poller`]: poller::Poller

pub mod clock;
pub mod config;
pub mod poller;
pub mod puzzle;
pub mod suggest;
