//! The single HTML page served at `/`.
//!
//! Rendered server-side from the controller state. A short inline script
//! polls `/status` while the form is submitting so the bar moves during a
//! run.

use crate::controller::ConversionState;
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; padding: 0 1rem; color: #222; }
h1 { font-size: 1.6rem; }
form { display: grid; gap: 0.8rem; margin: 1.5rem 0; }
progress { width: 100%; }
.result { padding: 0.8rem 1rem; border-radius: 6px; }
.ok { background: #e8f5e9; }
.err { background: #fdecea; }
"#;

const SCRIPT: &str = r#"
const form = document.getElementById('convert');
const bar = document.getElementById('progress');
const label = document.getElementById('progress-label');
form.addEventListener('submit', () => {
  form.querySelector('button').disabled = true;
  bar.hidden = false;
  const poll = async () => {
    try {
      const s = await (await fetch('/status')).json();
      bar.value = s.progress;
      label.textContent = s.state === 'running'
        ? `Converting ${s.file_name}: ${Math.round(s.progress * 100)}%` : '';
    } catch (_) {}
    setTimeout(poll, 500);
  };
  poll();
});
"#;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the form plus whatever the last run left behind.
pub fn render_page(state: &ConversionState, notice: Option<&str>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>PDF to Google Slides</title><style>{STYLE}</style></head><body>\
         <h1>PDF to Google Slides</h1>\
         <p>Every page of the PDF becomes one full-bleed image slide in a new presentation.</p>"
    );

    let running = state.is_running();
    let _ = write!(
        html,
        "<form id=\"convert\" method=\"post\" action=\"/convert\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" accept=\"application/pdf,.pdf\" required>\
         <label><input type=\"checkbox\" name=\"save_images\" value=\"on\" checked> \
         Also download slide images (ZIP)</label>\
         <button type=\"submit\"{}>Start conversion</button>\
         <progress id=\"progress\" max=\"1\" value=\"{}\"{}></progress>\
         <span id=\"progress-label\"></span>\
         </form>",
        if running { " disabled" } else { "" },
        match state {
            ConversionState::Running { progress, .. } => *progress,
            _ => 0.0,
        },
        if running { "" } else { " hidden" },
    );

    if let Some(notice) = notice {
        let _ = write!(
            html,
            "<div class=\"result err\">{}</div>",
            escape_html(notice)
        );
    }

    match state {
        ConversionState::Idle => {}
        ConversionState::Running { file_name, .. } => {
            let _ = write!(
                html,
                "<p>Converting <strong>{}</strong>…</p>",
                escape_html(file_name)
            );
        }
        ConversionState::Succeeded(outcome) => {
            let _ = write!(
                html,
                "<div class=\"result ok\"><p>Converted <strong>{}</strong> into {} slides.</p>\
                 <p><a href=\"{}\" target=\"_blank\" rel=\"noopener\">Open the presentation</a></p>",
                escape_html(&outcome.file_name),
                outcome.slide_count,
                escape_html(&outcome.presentation_url),
            );
            if let Some(archive) = &outcome.archive {
                let _ = write!(
                    html,
                    "<p><a href=\"/archive\" download=\"{}\">Download slide images ({} files)</a></p>",
                    escape_html(&archive.file_name),
                    archive.entries,
                );
            }
            html.push_str("</div>");
        }
        ConversionState::Failed { file_name, message } => {
            let _ = write!(
                html,
                "<div class=\"result err\"><p>Converting <strong>{}</strong> failed:</p><pre>{}</pre></div>",
                escape_html(file_name),
                escape_html(message),
            );
        }
    }

    let _ = write!(html, "<script>{SCRIPT}</script></body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ConversionOutcome;
    use crate::pipeline::archive::ImageArchive;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn idle_page_has_checked_option() {
        let html = render_page(&ConversionState::Idle, None);
        assert!(html.contains(r#"name="save_images" value="on" checked"#));
        assert!(html.contains(r#"action="/convert""#));
        assert!(!html.contains("class=\"result"));
    }

    #[test]
    fn success_links_deck_and_archive() {
        let state = ConversionState::Succeeded(ConversionOutcome {
            file_name: "talk.pdf".into(),
            presentation_url: "https://docs.google.com/presentation/d/xyz".into(),
            slide_count: 3,
            archive: Some(ImageArchive {
                file_name: "talk_images.zip".into(),
                entries: 3,
                bytes: Vec::new(),
            }),
        });
        let html = render_page(&state, None);
        assert!(html.contains(r#"href="https://docs.google.com/presentation/d/xyz""#));
        assert!(html.contains(r#"href="/archive" download="talk_images.zip""#));
        assert!(html.contains("into 3 slides"));
    }

    #[test]
    fn failure_message_is_escaped() {
        let state = ConversionState::Failed {
            file_name: "<b>.pdf".into(),
            message: "Drive said <nope>".into(),
        };
        let html = render_page(&state, None);
        assert!(html.contains("&lt;b&gt;.pdf"));
        assert!(html.contains("Drive said &lt;nope&gt;"));
        assert!(!html.contains("<nope>"));
    }

    #[test]
    fn running_page_disables_submit() {
        let state = ConversionState::Running {
            file_name: "a.pdf".into(),
            progress: 0.5,
        };
        let html = render_page(&state, Some("A conversion is already running"));
        assert!(html.contains("<button type=\"submit\" disabled>"));
        assert!(html.contains("value=\"0.5\""));
        assert!(html.contains("A conversion is already running"));
    }
}
