//! Module for all main functionality

pub mod download;
