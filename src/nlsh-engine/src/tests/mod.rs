//! Tests for the nlsh engine.

mod chat_tests;
mod orchestrator_tests;
