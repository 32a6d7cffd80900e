// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Answer generation over retrieved context
//!
//! The retrieved chunks are stuffed into one fixed prompt and sent to a
//! remote OpenAI-compatible chat-completion endpoint in a single call.

pub mod client;
pub mod composer;
pub mod errors;

pub use client::{ChatCompletionClient, GroqClient};
pub use composer::{Answer, AnswerComposer};
pub use errors::InferenceError;

use crate::rag::RetrievedChunk;

/// Instruction template; `{context}` and `{input}` are substituted
pub const PROMPT_TEMPLATE: &str = "Answer the questions based on the provided context only.
Please provide the most accurate response based on the question in at least 100 words.
Keep your answer concise and focused.
<context>
{context}
</context>
Questions:{input}";

/// Fill the template with the question and the retrieved chunk texts
///
/// Chunks keep their retrieval order and are separated by a blank line.
/// Placeholders are expanded in a single pass over the template, so
/// braces inside chunk text or the question are copied verbatim.
pub fn build_prompt(query: &str, context: &[RetrievedChunk]) -> String {
    let joined = context
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    fill_template(PROMPT_TEMPLATE, &joined, query)
}

fn fill_template(template: &str, context: &str, input: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + input.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{input}") {
            out.push_str(input);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
