//! Integration tests for Stockwatch
//!
//! These tests serve catalog pages from a wiremock server and drive the
//! real HTTP-backed document through complete runs.

mod scrape_tests;
