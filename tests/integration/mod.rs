//! Integration tests for markdrive, driven through the in-memory remote store

mod cli_parse;
mod conflict_protocol;
mod session_flow;
mod tree_projection;
