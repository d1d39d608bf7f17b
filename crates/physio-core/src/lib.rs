//! Core library for the clinic site.
//!
//! Holds the lead-capture popup: the display scheduler with its persisted
//! cooldowns, the form draft and its validation, and the orchestrator that
//! submits a draft to the appointment store and the email relay at once.
//! Also holds the smaller form flows (contact message, consultation email,
//! admin login). This crate depends on `physio-storage` for the key-value
//! store trait and defines the gateway traits that the server implements over
//! HTTP; it makes no network calls itself.

pub mod admin;
pub mod clock;
pub mod consultation;
pub mod contact;
pub mod cooldown;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod popup;
pub mod schedule;
pub mod scheduler;
pub mod submission;
