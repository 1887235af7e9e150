//! Core pipeline orchestration for kbscrape.
//!
//! This crate ties together sitemap discovery, page fetching, boilerplate
//! stripping, content location and Markdown rendering into one run that
//! writes assembled documents to a sink.

pub mod assembler;
pub mod pipeline;
pub mod sink;
