//! Feedgen API Routes
//!
//! - /feeds - Feed configuration, history and downloads
//! - /feeds/:id/regenerate, /feeds/:id/preview - Generation
//! - /feeds/run-scheduled - Scheduler tick for external cron
//! - /feeds/:id/schedule - Automation
//! - /feeds/:id/webhook - Notifications and delivery journal

pub mod error;
pub mod feed;
pub mod generation;
pub mod schedule;
pub mod swagger;
pub mod webhook;
