// SPDX-License-Identifier: MIT

//! Server-rendered HTML pages.
//!
//! Presentation is deliberately minimal; these pages exist so the gated paths
//! serve something real. The gate middleware has already decided who gets
//! here, and pass-through requests carry the resolved `CurrentUser`.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Extension, Router,
};
use html_escape::encode_text;
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::gate::CurrentUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home_page))
        .route("/login", get(login_page))
        .route("/onboarding", get(onboarding_page))
        .route("/docs", get(docs_page))
}

/// Shared page shell.
fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        encode_text(title),
        body
    ))
}

/// Home page: greets the user and shows the stored answers. Read-only
/// consumer of the profile store.
async fn home_page(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<CurrentUser>>,
) -> Html<String> {
    let mut body = String::from("<main>\n<h1>Welcome to Your Dashboard</h1>\n");

    if let Some(Extension(user)) = user {
        if let Some(email) = &user.email {
            body.push_str(&format!("<p>Hello, {}!</p>\n", encode_text(email)));
        }
        body.push_str("<p>You've successfully completed onboarding.</p>\n");

        // The profile is fetched fresh; the gate only read the flag.
        match state.profiles.get(&user.id).await {
            Ok(Some(profile)) => {
                body.push_str("<h2>Your answers</h2>\n<ol>\n");
                for answer in [
                    &profile.question_1_answer,
                    &profile.question_2_answer,
                    &profile.question_3_answer,
                ] {
                    body.push_str(&format!(
                        "<li>{}</li>\n",
                        encode_text(answer.as_deref().unwrap_or(""))
                    ));
                }
                body.push_str("</ol>\n");
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, user_id = %user.id, "Profile fetch failed on home page");
            }
        }
    }

    body.push_str(
        "<p><a href=\"/docs\">Documentation</a></p>\n\
         <form method=\"post\" action=\"/auth/logout\"><button type=\"submit\">Sign out</button></form>\n\
         </main>",
    );

    page("Dashboard", &body)
}

#[derive(Deserialize)]
struct LoginPageParams {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    notice: Option<String>,
}

async fn login_page(Query(params): Query<LoginPageParams>) -> Html<String> {
    let mut body = String::from("<main>\n<h1>Sign in</h1>\n");

    if let Some(error) = &params.error {
        body.push_str(&format!(
            "<p role=\"alert\">{}</p>\n",
            encode_text(error)
        ));
    }
    if params.notice.as_deref() == Some("confirm") {
        body.push_str("<p>Check your email to confirm your account, then sign in.</p>\n");
    }

    body.push_str(
        "<form method=\"post\" action=\"/auth/login\">\n\
         <label>Email <input type=\"email\" name=\"email\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required minlength=\"6\"></label>\n\
         <button type=\"submit\">Sign in</button>\n\
         </form>\n\
         <form method=\"post\" action=\"/auth/signup\">\n\
         <label>Email <input type=\"email\" name=\"email\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required minlength=\"6\"></label>\n\
         <button type=\"submit\">Create account</button>\n\
         </form>\n\
         <p>Or continue with\n\
         <a href=\"/auth/oauth/google\">Google</a> |\n\
         <a href=\"/auth/oauth/github\">GitHub</a></p>\n\
         </main>",
    );

    page("Sign in", &body)
}

async fn onboarding_page() -> Html<String> {
    // The form posts JSON to /api/onboarding and then navigates home; the
    // gate re-reads the completion flag on that navigation.
    let body = r#"<main>
<h1>Welcome! Let's get to know you</h1>
<p>Please answer these quick questions to complete your onboarding.</p>
<p id="error" role="alert"></p>
<form id="onboarding-form">
<label for="question1">1. What brings you here today?</label>
<textarea id="question1" rows="4" required></textarea>
<label for="question2">2. What's your current role or area of expertise?</label>
<textarea id="question2" rows="4" required></textarea>
<label for="question3">3. How can we help you succeed?</label>
<textarea id="question3" rows="4" required></textarea>
<button type="submit">Complete onboarding</button>
</form>
<script>
document.getElementById('onboarding-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const payload = {
    question1: document.getElementById('question1').value,
    question2: document.getElementById('question2').value,
    question3: document.getElementById('question3').value,
  };
  const response = await fetch('/api/onboarding', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(payload),
  });
  if (response.ok) {
    window.location.href = '/';
  } else {
    const data = await response.json().catch(() => ({ error: 'An unexpected error occurred' }));
    document.getElementById('error').textContent = data.error;
  }
});
</script>
</main>"#;

    page("Onboarding", body)
}

/// Documentation viewer: pre-rendered markdown plus a heading TOC.
async fn docs_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut body = String::from("<nav>\n<h2>Contents</h2>\n<ul>\n");
    for entry in state.docs.toc() {
        body.push_str(&format!(
            "<li data-level=\"{}\"><a href=\"#{}\">{}</a></li>\n",
            entry.level,
            entry.id,
            encode_text(&entry.text)
        ));
    }
    body.push_str("</ul>\n</nav>\n<article>\n");
    body.push_str(state.docs.html());
    body.push_str("</article>\n<p><a href=\"/\">Back to dashboard</a></p>");

    page("Documentation", &body)
}
