//! Same-origin proxy for the inference server
//!
//! Keeps the upstream location and its API key on the server. Browsers (and
//! `llmchess` with `LLM_PROVIDER=proxy`) post prompts to `/api/llama` and get
//! back a bare move.

pub mod api;
pub mod config;
