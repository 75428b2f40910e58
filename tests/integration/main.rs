//! Integration tests for the pipeline
//!
//! These tests use wiremock to stand in for both the marketplace and the downstream ingestion
//! service, and run the stages end-to-end against real HTTP.

mod common;
mod pipeline_tests;
mod renderer_tests;
mod sync_tests;
