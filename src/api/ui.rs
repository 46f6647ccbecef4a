use axum::response::Html;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Web and Video Summarizer</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 3rem auto; padding: 0 1rem; color: #222; }
  form { display: flex; gap: .5rem; }
  input { flex: 1; padding: .5rem; font-size: 1rem; }
  button { padding: .5rem 1rem; font-size: 1rem; }
  .tags span { display: inline-block; background: #eef; border-radius: .75rem; padding: .1rem .6rem; margin: .15rem; }
  .error { color: #b00020; }
</style>
</head>
<body>
<h1>Web and Video Summarizer</h1>
<p>Summarize any web page or YouTube video with a single click.</p>
<form id="form">
  <input id="url" type="url" placeholder="Enter URL here" required>
  <button id="go" type="submit">Generate</button>
</form>
<div id="out"></div>
<script>
const form = document.getElementById("form");
const out = document.getElementById("out");
const go = document.getElementById("go");

function text(tag, value, cls) {
  const el = document.createElement(tag);
  el.textContent = value;
  if (cls) el.className = cls;
  return el;
}

form.addEventListener("submit", async (event) => {
  event.preventDefault();
  go.disabled = true;
  out.replaceChildren(text("p", "Analyzing content, please wait..."));
  try {
    const res = await fetch("/api/summarize", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ url: document.getElementById("url").value }),
    });
    const body = await res.json();
    if (!res.ok) {
      out.replaceChildren(text("p", body.error || res.statusText, "error"));
      return;
    }
    const tags = document.createElement("p");
    tags.className = "tags";
    body.tags.forEach((tag) => tags.appendChild(text("span", tag)));
    out.replaceChildren(text("h2", body.title), text("p", body.summary), tags);
  } catch (err) {
    out.replaceChildren(text("p", String(err), "error"));
  } finally {
    go.disabled = false;
  }
});
</script>
</body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
