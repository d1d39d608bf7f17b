//! Landing page, maintenance notice and health check.
//!
//! The full marketing site is deployed separately; this server renders a
//! minimal landing page at `/` that drives the popup API.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Maintenance notice headline.
pub const MAINTENANCE_TITLE: &str = "Site is under maintenance";

/// Maintenance notice detail line.
pub const MAINTENANCE_DETAIL: &str = "Please check back later!";

/// Build the UI router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(landing_page))
        .route("/v1/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub maintenance: bool,
    pub sessions: usize,
    pub time: String,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        maintenance: state.config.maintenance,
        sessions: state.sessions.read().await.len(),
        time: chrono::Utc::now().to_rfc3339(),
    })
}

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Static maintenance notice.
#[must_use]
pub fn maintenance_page() -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"/><title>{MAINTENANCE_TITLE}</title></head>
<body style="text-align:center;padding:50px;background-color:#f8d7da">
<h1 style="color:#721c24">{MAINTENANCE_TITLE}</h1>
<p>{MAINTENANCE_DETAIL}</p>
</body></html>
"##
    )
}

/// Landing page with the lead-capture popup wired to `/v1/popup`.
const LANDING_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"/><meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>Physiotherapy Clinic | Pain-Free Living. Powerful Healing.</title>
<style>
body{font-family:Poppins,-apple-system,sans-serif;margin:0;color:#1f2937}
.hero{text-align:center;padding:120px 24px}
.hero h1{font-size:48px;margin-bottom:16px}
.popup{display:none;position:fixed;inset:0;background:rgba(0,0,0,.5);align-items:center;justify-content:center}
.popup.open{display:flex}
.card{background:#fff;border-radius:16px;padding:32px;max-width:420px;width:100%}
.card input,.card select,.card textarea{display:block;width:100%;margin:6px 0 12px;padding:8px;box-sizing:border-box}
.error{color:#b91c1c}
</style></head>
<body>
<section class="hero"><h1>Pain-Free Living. Powerful Healing.</h1>
<p>Expert physiotherapy with over two decades of experience.</p></section>
<div class="popup" id="popup"><div class="card" id="card"></div></div>
<script>
const visitor = localStorage.getItem("visitorId") || crypto.randomUUID();
localStorage.setItem("visitorId", visitor);
const base = "/v1/popup/" + visitor;
const fields = ["name","email","phone","age","gender","city","consultationMode","message"];
let timer;
async function call(method, path, body) {
  const res = await fetch(base + path, {method, headers: {"content-type": "application/json"}, body: body && JSON.stringify(body)});
  return {status: res.status, json: await res.json().catch(() => ({}))};
}
function render(view) {
  const popup = document.getElementById("popup");
  const card = document.getElementById("card");
  clearTimeout(timer);
  if (view.phase === "hidden") {
    popup.classList.remove("open");
    if (view.reveal_at) timer = setTimeout(refresh, Math.max(view.reveal_at - Date.now(), 0) + 50);
    return;
  }
  popup.classList.add("open");
  if (view.phase === "success") {
    card.innerHTML = "<h2>Thank you!</h2><p>We will contact you shortly.</p><button id='close'>Close</button>";
  } else {
    card.innerHTML = "<h2>Book a free consultation</h2>" +
      fields.map(f => "<label>" + f + "<input name='" + f + "'/></label>").join("") +
      (view.submission === "error" ? "<p class='error'>Something went wrong. Please try again.</p>" : "") +
      "<button id='submit'" + (view.submitting ? " disabled" : "") + ">Submit</button> <button id='close'>Close</button>";
    fields.forEach(f => card.querySelector("[name=" + f + "]").value = view.draft[f] || "");
    card.querySelector("#submit").onclick = async () => {
      const draft = {};
      fields.forEach(f => draft[f] = card.querySelector("[name=" + f + "]").value);
      const res = await call("POST", "/submit", draft);
      render(res.json.view || view);
    };
  }
  card.querySelector("#close").onclick = async () => render((await call("POST", "/close")).json);
}
async function refresh() { render((await call("GET", "")).json); }
call("POST", "").then(r => render(r.json));
</script>
</body></html>
"##;
