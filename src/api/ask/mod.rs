// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Question-answering API endpoint
//!
//! Provides the `/v1/ask` HTTP endpoint.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::ask_handler;
pub use request::AskRequest;
pub use response::AskResponse;
