// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-page question form served at `/`

use axum::response::Html;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>PDF Q&amp;A</title>
<style>
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
input[type=text] { width: 100%; padding: .5rem; font-size: 1rem; }
#answer { white-space: pre-wrap; margin-top: 1rem; }
.chunk { white-space: pre-wrap; border-top: 1px solid #ccc; padding: .5rem 0; }
.error { color: #b00; }
</style>
</head>
<body>
<h1>PDF Q&amp;A</h1>
<form id="ask">
<input type="text" id="query" placeholder="Input your prompt here" autofocus>
</form>
<div id="answer"></div>
<details id="context-box" hidden>
<summary>Document Similarity Search</summary>
<div id="context"></div>
</details>
<script>
const form = document.getElementById('ask');
form.addEventListener('submit', async (event) => {
  event.preventDefault();
  const query = document.getElementById('query').value;
  const answer = document.getElementById('answer');
  const box = document.getElementById('context-box');
  const context = document.getElementById('context');
  answer.className = '';
  answer.textContent = 'Thinking...';
  context.replaceChildren();
  box.hidden = true;

  const showError = (message) => {
    answer.className = 'error';
    answer.textContent = message;
  };

  let res, body;
  try {
    res = await fetch('/v1/ask', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ query, includeContext: true }),
    });
    const type = res.headers.get('content-type') || '';
    if (type.includes('application/json')) {
      body = await res.json();
    } else {
      body = { message: await res.text() };
    }
  } catch (err) {
    showError('Error processing query: ' + err);
    return;
  }
  if (!res.ok) {
    showError(body.message || ('Error processing query: HTTP ' + res.status));
    return;
  }
  answer.textContent = body.answer;
  (body.context || []).forEach((chunk, i) => {
    const div = document.createElement('div');
    div.className = 'chunk';
    div.textContent = 'Document ' + (i + 1) + ':\n' + chunk.text;
    context.appendChild(div);
  });
  box.hidden = (body.context || []).length === 0;
});
</script>
</body>
</html>
"#;

/// GET / - Browser form for asking questions
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}
