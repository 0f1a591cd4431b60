use crate::models::{CalendarEvent, DateGroup, HomeworkResponse, ScheduleResponse};
use crate::preferences::{PrefKey, Preferences};
use crate::view::PopupSnapshot;

pub fn render_popup(snapshot: &PopupSnapshot) -> String {
    let prefs = &snapshot.prefs;
    fill_template(
        POPUP_HTML,
        &[
            ("CLOCK", escape_html(&snapshot.clock)),
            ("SCHEDULE", render_schedule(&snapshot.schedule)),
            ("HOMEWORK_OPEN", open_class(prefs.homework_visible).to_string()),
            ("HOMEWORK", render_homework(&snapshot.homework)),
            ("EXTRA_OPEN", open_class(prefs.devtools_visible).to_string()),
            ("INJECTORS", render_injectors(prefs)),
        ],
    )
}

// Single pass over the template: substituted values are never rescanned, so
// `{{...}}` inside feed or preference text stays literal.
fn fill_template(template: &str, slots: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let slot = after.find("}}").and_then(|end| {
            let name = &after[..end];
            slots
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (value, end))
        });
        match slot {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn render_schedule(schedule: &ScheduleResponse) -> String {
    if schedule.loading {
        return LOADING_HTML.to_string();
    }

    let mut html = match &schedule.current {
        Some(event) => event_card("Ara", "current-card", event),
        None => "<p class=\"empty\">No hi ha classe per ara.</p>".to_string(),
    };
    if let Some(event) = &schedule.next {
        html.push_str(&event_card("Següent hora", "next-card", event));
    }
    html
}

fn event_card(title: &str, class: &str, event: &CalendarEvent) -> String {
    format!(
        "<div class=\"card {class}\"><div class=\"card-header\">{title}</div>\
         <div class=\"card-body\"><div class=\"card-title\">{subject} ({from} - {to})</div>\
         <div class=\"card-text\">{teacher}</div><div class=\"card-text\">{room}</div></div></div>",
        subject = escape_html(&event.subject),
        from = escape_html(&event.from),
        to = escape_html(&event.to),
        teacher = escape_html(&event.teacher),
        room = escape_html(&event.room),
    )
}

pub fn render_homework(homework: &HomeworkResponse) -> String {
    if homework.loading {
        return LOADING_HTML.to_string();
    }
    if homework.groups.is_empty() {
        return "<p class=\"empty\">No hi ha deures.</p>".to_string();
    }
    homework.groups.iter().map(date_group).collect()
}

fn date_group(group: &DateGroup) -> String {
    let mut html = format!("<h6 class=\"date\">{}</h6>", escape_html(&group.date));
    for item in &group.items {
        html.push_str(&format!(
            "<div class=\"card\"><div class=\"card-header\"><b>{}</b> {}</div>\
             <div class=\"card-body\"><p class=\"card-text\">{}</p></div></div>",
            escape_html(&item.subject),
            escape_html(&item.head),
            escape_html(&item.body),
        ));
    }
    html
}

fn render_injectors(prefs: &Preferences) -> String {
    let mut html = String::new();
    for (label, text_label, flag_key, text_key, checked, text) in [
        (
            "Injectar Javascript",
            "Script JS",
            PrefKey::JsInjector,
            PrefKey::JsText,
            prefs.js_injector,
            &prefs.js_text,
        ),
        (
            "Injectar CSS",
            "Script CSS",
            PrefKey::CssInjector,
            PrefKey::CssText,
            prefs.css_injector,
            &prefs.css_text,
        ),
    ] {
        // The textarea is only editable while its injector is enabled.
        html.push_str(&format!(
            "<div class=\"injector\"><label><input type=\"checkbox\" data-toggle=\"{flag}\" data-target=\"{textk}\"{checked}> {label}</label>\
             <label class=\"text-label\">{text_label}</label>\
             <textarea data-text=\"{textk}\"{disabled}>{text}</textarea></div>",
            flag = flag_key.as_str(),
            textk = text_key.as_str(),
            checked = if checked { " checked" } else { "" },
            disabled = if checked { "" } else { " disabled" },
            text = escape_html(text),
        ));
    }
    html
}

fn open_class(open: bool) -> &'static str {
    if open { "open" } else { "closed" }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const LOADING_HTML: &str = r#"<div class="loading"><div class="spinner" role="status"></div><div>Now loading...</div></div>"#;

const POPUP_HTML: &str = r#"<!DOCTYPE html>
<html lang="ca">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>DAM Tools</title>
  <style>
    :root {
      --ink: #1f2430;
      --muted: #6b7280;
      --accent: #2f6fed;
      --card: #ffffff;
      --line: rgba(31, 36, 48, 0.1);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      width: 380px;
      padding: 16px;
      background: #f3f5f9;
      color: var(--ink);
      font-family: system-ui, sans-serif;
    }

    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 12px;
      margin-bottom: 12px;
      overflow: hidden;
    }

    .card-header {
      padding: 8px 12px;
      border-bottom: 1px solid var(--line);
      font-weight: 600;
    }

    .card-body {
      padding: 10px 12px;
    }

    .card-title {
      font-weight: 600;
      margin-bottom: 4px;
    }

    .card-text {
      color: var(--muted);
    }

    .current-card .card-header {
      color: var(--accent);
    }

    .section h2 {
      cursor: pointer;
      user-select: none;
      font-size: 1.15rem;
      margin: 0;
      padding: 12px;
    }

    .section h2::before {
      content: "\25B8";
      display: inline-block;
      margin-right: 8px;
      transition: transform 150ms ease;
    }

    .section.open h2::before {
      transform: rotate(90deg);
    }

    .section .content {
      padding: 0 12px 12px 24px;
    }

    .section.closed .content {
      display: none;
    }

    .date {
      color: var(--muted);
      margin: 14px 0 6px;
    }

    .injector {
      margin-bottom: 14px;
    }

    .injector label {
      display: block;
      margin-bottom: 4px;
    }

    textarea {
      width: 100%;
      min-height: 64px;
      font-family: ui-monospace, monospace;
    }

    button {
      border: none;
      border-radius: 8px;
      padding: 10px 18px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }

    .loading {
      text-align: center;
      padding: 16px;
      color: var(--muted);
    }

    .spinner {
      width: 24px;
      height: 24px;
      margin: 0 auto 8px;
      border: 3px solid var(--line);
      border-top-color: var(--accent);
      border-radius: 50%;
      animation: spin 800ms linear infinite;
    }

    .empty {
      color: var(--muted);
    }

    @keyframes spin {
      to {
        transform: rotate(360deg);
      }
    }
  </style>
</head>
<body>
  <div class="card">
    <div class="card-body">
      <h1 class="card-title">DAM Tools</h1>
      <div class="card-text">Són les <span id="clock">{{CLOCK}}</span></div>
    </div>
  </div>

  <div id="schedule">{{SCHEDULE}}</div>

  <div class="card section {{HOMEWORK_OPEN}}" data-section="homeworkVisible">
    <h2>Deures</h2>
    <div class="content">{{HOMEWORK}}</div>
  </div>

  <div class="card section {{EXTRA_OPEN}}" data-section="devtoolsVisible">
    <h2>Extra</h2>
    <div class="content">
      {{INJECTORS}}
      <button id="inject" type="button">Injectar</button>
    </div>
  </div>

  <script>
    const post = (url, body) =>
      fetch(url, {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body)
      });

    const clockEl = document.getElementById('clock');
    const tick = setInterval(async () => {
      try {
        const res = await fetch('/api/clock');
        if (res.ok) {
          clockEl.textContent = (await res.json()).time;
        }
      } catch (err) {
        console.log(err);
      }
    }, 1000);
    window.addEventListener('pagehide', () => clearInterval(tick));

    document.querySelectorAll('.section').forEach((section) => {
      section.querySelector('h2').addEventListener('click', () => {
        const open = section.classList.toggle('open');
        section.classList.toggle('closed', !open);
        post('/api/preferences/toggle', { key: section.dataset.section }).catch(console.log);
      });
    });

    document.querySelectorAll('[data-toggle]').forEach((box) => {
      box.addEventListener('change', () => {
        const area = document.querySelector(`[data-text="${box.dataset.target}"]`);
        if (area) {
          area.disabled = !box.checked;
        }
        post('/api/preferences/toggle', { key: box.dataset.toggle }).catch(console.log);
      });
    });

    document.querySelectorAll('[data-text]').forEach((area) => {
      area.addEventListener('input', () => {
        post('/api/preferences/text', { key: area.dataset.text, value: area.value }).catch(console.log);
      });
    });

    document.getElementById('inject').addEventListener('click', () => {
      post('/api/inject').catch(console.log);
    });
  </script>
</body>
</html>
"#;
