use crate::models::StateResponse;

pub fn render_index(snapshot: &StateResponse) -> String {
    let state_json = serde_json::to_string(snapshot)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/");

    INDEX_HTML
        .replace("{{DATE}}", &snapshot.date)
        .replace("{{PHASE}}", snapshot.phase_label.as_str())
        .replace("{{PROGRESS}}", &snapshot.stats.progress.to_string())
        .replace("{{HOURS}}", &format!("{:.1}", snapshot.hours))
        .replace("{{STREAK}}", &snapshot.streak.to_string())
        .replace("{{STATE_JSON}}", &state_json)
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Data Roadmap Tracker</title>
  <style>
    :root {
      --bg: #000;
      --card: #18181b;
      --border: #27272a;
      --muted: #a1a1aa;
      --ink: #fafafa;
      --accent: #2563eb;
      --done: #16a34a;
      --warn: #f87171;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: ui-sans-serif, system-ui, sans-serif;
      padding: 24px;
    }

    .app {
      width: min(900px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    h1 {
      margin: 0;
      font-size: 1.9rem;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.2rem;
    }

    .card {
      background: var(--card);
      border: 1px solid var(--border);
      border-radius: 14px;
      padding: 16px;
    }

    .row {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    .muted {
      color: var(--muted);
      margin: 4px 0 0;
    }

    select,
    input {
      background: var(--bg);
      color: var(--ink);
      border: 1px solid var(--border);
      border-radius: 8px;
      padding: 8px;
      font-size: 0.95rem;
    }

    button {
      appearance: none;
      border: 1px solid var(--border);
      background: transparent;
      color: var(--ink);
      border-radius: 8px;
      padding: 8px 12px;
      font-size: 0.9rem;
      cursor: pointer;
    }

    button.done {
      background: var(--done);
      border-color: var(--done);
    }

    button.primary {
      background: var(--accent);
      border-color: var(--accent);
    }

    .task {
      border: 1px solid var(--border);
      border-radius: 12px;
      padding: 8px 10px;
      margin-bottom: 8px;
    }

    .task .buttons {
      display: flex;
      gap: 6px;
    }

    .bar {
      height: 10px;
      border-radius: 999px;
      background: var(--border);
      overflow: hidden;
    }

    .bar > div {
      height: 100%;
      background: var(--accent);
      transition: width 200ms ease;
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }

    .stat .label {
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.5rem;
      font-weight: 600;
    }

    .warn {
      color: var(--warn);
    }

    .charts {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(380px, 1fr));
      gap: 16px;
    }

    svg {
      width: 100%;
      height: 220px;
      display: block;
    }

    svg text {
      fill: var(--muted);
      font-size: 11px;
    }

    .status {
      min-height: 1.2em;
      color: var(--muted);
    }

    .status[data-type="error"] {
      color: var(--warn);
    }

    [hidden] {
      display: none !important;
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Data Career Tracker</h1>

    <section class="card row">
      <div>
        <div>Current Phase</div>
        <p class="muted" id="phase-label">{{PHASE}}</p>
      </div>
      <select id="phase"></select>
    </section>

    <section class="card row" id="editor" hidden>
      <input id="task-name" type="text" placeholder="Task Name" />
      <input id="task-hours" type="number" step="0.1" min="0" placeholder="Hours" />
      <button class="primary" id="task-save" type="button">Add</button>
    </section>

    <section class="card">
      <h2>Today's Tasks <span class="muted" id="date">{{DATE}}</span></h2>
      <div id="tasks"></div>
    </section>

    <section class="card">
      <div class="bar"><div id="progress-bar" style="width: {{PROGRESS}}%"></div></div>
      <div class="stats" style="margin-top: 14px">
        <div class="stat"><div class="label">Progress</div><div class="value" id="progress">{{PROGRESS}}%</div></div>
        <div class="stat"><div class="label">Hours today</div><div class="value" id="hours">{{HOURS}}h</div></div>
        <div class="stat"><div class="label">Streak</div><div class="value" id="streak">{{STREAK}}</div></div>
        <div class="stat"><div class="label">This month</div><div class="value" id="monthly">0h</div></div>
      </div>
      <p class="warn" id="burnout" hidden>Burnout Risk (7-day avg &gt; 5h)</p>
      <div class="row" style="margin-top: 8px">
        <span class="status" id="status"></span>
        <button class="primary" id="end-day" type="button">End Day</button>
      </div>
    </section>

    <section class="charts">
      <div class="card"><h2>Today</h2><svg id="pie-chart" viewBox="0 0 400 220"></svg></div>
      <div class="card"><h2>Tasks</h2><svg id="task-chart" viewBox="0 0 400 220"></svg></div>
      <div class="card"><h2>Last 7 days</h2><svg id="week-chart" viewBox="0 0 400 220"></svg></div>
      <div class="card"><h2>This month</h2><svg id="month-chart" viewBox="0 0 400 220"></svg></div>
    </section>
  </main>

  <script>
    let state = {{STATE_JSON}};
    let editingId = null;

    const el = (id) => document.getElementById(id);
    const statusEl = el('status');
    const nameInput = el('task-name');
    const hoursInput = el('task-hours');
    const saveButton = el('task-save');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const escapeHtml = (text) =>
      String(text).replace(/[&<>"']/g, (c) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c]));

    const formatHours = (value) => `${(Math.round(value * 10) / 10).toFixed(1)}h`;

    const renderPie = (slices) => {
      const svg = el('pie-chart');
      const total = slices.reduce((sum, s) => sum + s.value, 0);
      if (!total) {
        svg.innerHTML = '<text x="50%" y="50%" text-anchor="middle">No tasks</text>';
        return;
      }
      const colors = ['#16a34a', '#3f3f46'];
      const cx = 110;
      const cy = 110;
      const r = 90;
      let angle = -Math.PI / 2;
      let parts = '';
      slices.forEach((slice, index) => {
        if (!slice.value) {
          return;
        }
        const sweep = (slice.value / total) * Math.PI * 2;
        if (slice.value === total) {
          parts += `<circle cx="${cx}" cy="${cy}" r="${r}" fill="${colors[index]}" />`;
        } else {
          const x1 = cx + r * Math.cos(angle);
          const y1 = cy + r * Math.sin(angle);
          const x2 = cx + r * Math.cos(angle + sweep);
          const y2 = cy + r * Math.sin(angle + sweep);
          const large = sweep > Math.PI ? 1 : 0;
          parts += `<path d="M ${cx} ${cy} L ${x1} ${y1} A ${r} ${r} 0 ${large} 1 ${x2} ${y2} Z" fill="${colors[index]}" />`;
        }
        angle += sweep;
      });
      const legend = slices
        .map((s, i) => `<rect x="240" y="${80 + i * 24}" width="12" height="12" fill="${colors[i]}" /><text x="260" y="${91 + i * 24}">${s.name}: ${s.value}</text>`)
        .join('');
      svg.innerHTML = parts + legend;
    };

    const renderBars = (svgId, points, max, color) => {
      const svg = el(svgId);
      if (!points.length) {
        svg.innerHTML = '<text x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }
      const width = 400;
      const height = 220;
      const bottom = 30;
      const top = 10;
      const step = width / points.length;
      const barWidth = Math.max(2, step * 0.6);
      const scale = (height - top - bottom) / (max || 1);
      const labelEvery = points.length > 10 ? Math.ceil(points.length / 10) : 1;
      svg.innerHTML = points
        .map((p, i) => {
          const h = p.value * scale;
          const x = i * step + (step - barWidth) / 2;
          const label = i % labelEvery === 0
            ? `<text x="${x + barWidth / 2}" y="${height - 10}" text-anchor="middle">${escapeHtml(p.label)}</text>`
            : '';
          return `<rect x="${x}" y="${height - bottom - h}" width="${barWidth}" height="${h}" fill="${color}"><title>${escapeHtml(p.title)}</title></rect>${label}`;
        })
        .join('');
    };

    const renderLine = (points) => {
      const svg = el('week-chart');
      const width = 400;
      const height = 220;
      const padX = 30;
      const padY = 30;
      const max = Math.max(1, ...points.map((p) => p.hours));
      const xStep = (width - padX * 2) / Math.max(1, points.length - 1);
      const x = (i) => padX + i * xStep;
      const y = (v) => height - padY - (v / max) * (height - padY - 10);
      const path = points.map((p, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(2)} ${y(p.hours).toFixed(2)}`).join(' ');
      const dots = points.map((p, i) => `<circle cx="${x(i)}" cy="${y(p.hours)}" r="3" fill="#2563eb"><title>${formatHours(p.hours)}</title></circle>`).join('');
      const labels = points.map((p, i) => `<text x="${x(i)}" y="${height - 10}" text-anchor="middle">${p.label}</text>`).join('');
      svg.innerHTML = `<path d="${path}" fill="none" stroke="#2563eb" stroke-width="2" />${dots}${labels}`;
    };

    const renderTasks = () => {
      const list = el('tasks');
      list.innerHTML = state.tasks
        .map((task) => {
          const done = !!state.completed[task.id];
          const edit = state.editable
            ? `<button type="button" data-edit="${task.id}">Edit</button><button type="button" data-delete="${task.id}">Delete</button>`
            : '';
          return `<div class="task row"><span>${escapeHtml(task.name)} (${task.hrs}h)</span><div class="buttons"><button type="button" class="${done ? 'done' : ''}" data-toggle="${task.id}">${done ? 'Done' : 'Mark'}</button>${edit}</div></div>`;
        })
        .join('');
    };

    const render = () => {
      const stats = state.stats;
      el('date').textContent = state.date;
      el('phase-label').textContent = state.phase_label;
      el('phase').innerHTML = state.phases
        .map((p) => `<option value="${p.id}" ${p.id === state.phase ? 'selected' : ''}>${escapeHtml(p.label)}</option>`)
        .join('');
      el('editor').hidden = !state.editable;
      el('progress').textContent = `${stats.progress}%`;
      el('progress-bar').style.width = `${stats.progress}%`;
      el('hours').textContent = formatHours(state.hours);
      el('streak').textContent = state.streak;
      el('monthly').textContent = formatHours(stats.monthly_hours);
      el('burnout').hidden = !stats.burnout;
      renderTasks();
      renderPie(stats.pie);
      renderBars(
        'task-chart',
        stats.task_bar.map((b) => ({ label: `#${state.tasks.findIndex((t) => t.id === b.id) + 1}`, title: b.name, value: b.done })),
        1,
        '#16a34a'
      );
      renderLine(stats.last_7_days);
      renderBars(
        'month-chart',
        stats.month_bar.map((d) => ({ label: d.label.slice(3), title: `${d.date}: ${formatHours(d.hours)}`, value: d.hours })),
        Math.max(1, ...stats.month_bar.map((d) => d.hours)),
        '#2563eb'
      );
    };

    const send = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: body ? { 'content-type': 'application/json' } : {},
        body: body ? JSON.stringify(body) : undefined
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      state = await res.json();
      render();
    };

    const run = (promise) => promise.catch((err) => setStatus(err.message, 'error'));

    const resetEditor = () => {
      editingId = null;
      nameInput.value = '';
      hoursInput.value = '';
      saveButton.textContent = 'Add';
    };

    el('phase').addEventListener('change', (event) => {
      run(send('POST', '/api/phase', { phase: event.target.value }));
    });

    el('tasks').addEventListener('click', (event) => {
      const target = event.target.closest('button');
      if (!target) {
        return;
      }
      if (target.dataset.toggle) {
        run(send('POST', `/api/tasks/${target.dataset.toggle}/toggle`));
      } else if (target.dataset.delete) {
        run(send('DELETE', `/api/tasks/${target.dataset.delete}`));
      } else if (target.dataset.edit) {
        const task = state.tasks.find((t) => String(t.id) === target.dataset.edit);
        if (task) {
          editingId = task.id;
          nameInput.value = task.name;
          hoursInput.value = task.hrs;
          saveButton.textContent = 'Save';
        }
      }
    });

    saveButton.addEventListener('click', () => {
      const body = { name: nameInput.value, hrs: hoursInput.value };
      const request = editingId === null
        ? send('POST', '/api/tasks', body)
        : send('PUT', `/api/tasks/${editingId}`, body);
      run(request.then(resetEditor));
    });

    el('end-day').addEventListener('click', () => {
      run(send('POST', '/api/end-day').then(() => setStatus('Day ended', 'ok')));
    });

    if (state) {
      render();
    } else {
      run(fetch('/api/state').then((res) => res.json()).then((data) => { state = data; render(); }));
    }
  </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{MemoryStore, StoreAdapter};
    use crate::tracker::Tracker;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn index_embeds_current_snapshot() {
        let clock = Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()));
        let adapter = StoreAdapter::new(Arc::new(MemoryStore::new()), "roadmapData");
        let mut tracker = Tracker::initialize(adapter, clock, true);
        let input = serde_json::from_value(serde_json::json!({ "name": "</script>", "hrs": 1 }))
            .unwrap();
        tracker.add_task(&input).unwrap();

        let html = render_index(&tracker.snapshot());
        assert!(html.contains("2024-05-20"));
        assert!(html.contains("Analyst Foundation"));
        assert!(html.contains("<\\/script>"));
        assert!(!html.contains("{{STATE_JSON}}"));
        assert!(!html.contains("{{PROGRESS}}"));
    }

    #[test]
    fn index_template_is_complete() {
        assert!(INDEX_HTML.starts_with("<!DOCTYPE html>"));
        assert!(INDEX_HTML.contains(r##"stroke="#2563eb""##));
        assert!(INDEX_HTML.trim_end().ends_with("</html>"));
    }
}
