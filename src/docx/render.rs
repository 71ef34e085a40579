use anyhow::bail;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::docx::xml::{set_attr, XmlEvent, XmlPart};
use crate::resolve::truthy;

// `{name}` scalar, `{#name}` section open, `{/name}` section close, `{.}`
// current item. Tags are never split across text nodes; the template corpus
// is authored that way.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([#/]?)([^{}]+)\}").expect("tag regex"));

pub fn part_has_tags(part: &XmlPart) -> bool {
    part.events
        .iter()
        .any(|ev| matches!(ev, XmlEvent::Text { text } if TAG_RE.is_match(text)))
}

/// Renders one XML part against the transformed data: scalar substitution,
/// section loops/gates, newline to `<w:br/>` conversion.
pub fn render_part(part: &XmlPart, data: &Value) -> anyhow::Result<XmlPart> {
    let mut scope = Scope::new(data);
    let events = render_events(&part.name, &part.events, &mut scope)?;
    Ok(XmlPart {
        name: part.name.clone(),
        events,
    })
}

/// Lexical scope stack. Lookup walks innermost-first, skipping non-object
/// frames, so a boolean gate does not shadow its parent row.
struct Scope<'a> {
    frames: Vec<&'a Value>,
}

impl<'a> Scope<'a> {
    fn new(root: &'a Value) -> Self {
        Self { frames: vec![root] }
    }

    fn push(&mut self, value: &'a Value) {
        self.frames.push(value);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn lookup(&self, name: &str) -> Option<&'a Value> {
        if name == "." {
            return self.frames.last().copied();
        }
        for frame in self.frames.iter().rev() {
            if let Some(map) = frame.as_object() {
                if let Some(v) = map.get(name) {
                    return Some(v);
                }
            }
        }
        None
    }
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => String::new(),
    }
}

/// A section tag located in the event stream.
struct TagAt {
    event_idx: usize,
    start: usize,
    end: usize,
    name: String,
}

fn render_events(
    part: &str,
    events: &[XmlEvent],
    scope: &mut Scope,
) -> anyhow::Result<Vec<XmlEvent>> {
    let Some(open) = find_first_section(part, events)? else {
        return Ok(substitute_scalars(events, scope));
    };
    let close = find_matching_close(part, events, &open)?;
    let (prefix, chunk, suffix) = split_section(events, &open, &close);

    let mut out = substitute_scalars(&prefix, scope);
    match scope.lookup(&open.name) {
        Some(Value::Array(items)) => {
            for item in items {
                scope.push(item);
                let rendered = render_events(part, &chunk, scope);
                scope.pop();
                out.extend(rendered?);
            }
        }
        Some(value) if truthy(value) => {
            scope.push(value);
            let rendered = render_events(part, &chunk, scope);
            scope.pop();
            out.extend(rendered?);
        }
        _ => {
            debug!("section {{#{}}} is falsy or unset; dropped", open.name);
        }
    }
    out.extend(render_events(part, &suffix, scope)?);
    Ok(out)
}

fn find_first_section(part: &str, events: &[XmlEvent]) -> anyhow::Result<Option<TagAt>> {
    for (idx, ev) in events.iter().enumerate() {
        let XmlEvent::Text { text } = ev else { continue };
        for caps in TAG_RE.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let kind = &caps[1];
            if kind.is_empty() {
                continue;
            }
            let name = caps[2].trim().to_string();
            if kind == "/" {
                bail!("section {{/{name}}} in {part} has no opening tag");
            }
            return Ok(Some(TagAt {
                event_idx: idx,
                start: m.start(),
                end: m.end(),
                name,
            }));
        }
    }
    Ok(None)
}

fn find_matching_close(
    part: &str,
    events: &[XmlEvent],
    open: &TagAt,
) -> anyhow::Result<TagAt> {
    let mut depth = 0usize;
    for (idx, ev) in events.iter().enumerate().skip(open.event_idx) {
        let XmlEvent::Text { text } = ev else { continue };
        for caps in TAG_RE.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if idx == open.event_idx && m.start() < open.end {
                continue;
            }
            let kind = &caps[1];
            if kind.is_empty() {
                continue;
            }
            let name = caps[2].trim().to_string();
            if kind == "#" {
                depth += 1;
                continue;
            }
            if depth > 0 {
                depth -= 1;
                continue;
            }
            if name != open.name {
                bail!(
                    "section {{#{}}} in {part} is closed by {{/{name}}}",
                    open.name
                );
            }
            return Ok(TagAt {
                event_idx: idx,
                start: m.start(),
                end: m.end(),
                name,
            });
        }
    }
    bail!("section {{#{}}} in {part} is never closed", open.name)
}

/// Splits the event stream into the part before the section, the repeated
/// chunk, and the part after it. Same-paragraph sections expand inline;
/// sections spanning paragraphs repeat whole `<w:tr>` rows when both tags
/// sit in table rows, whole `<w:p>` paragraphs otherwise. A paragraph
/// containing nothing but its section tag is dropped rather than repeated.
fn split_section(
    events: &[XmlEvent],
    open: &TagAt,
    close: &TagAt,
) -> (Vec<XmlEvent>, Vec<XmlEvent>, Vec<XmlEvent>) {
    if open.event_idx == close.event_idx {
        let text = text_of(&events[open.event_idx]);
        let mut prefix = events[..open.event_idx].to_vec();
        push_text(&mut prefix, &text[..open.start]);
        let chunk = text_events(&text[open.end..close.start]);
        let mut suffix = text_events(&text[close.end..]);
        suffix.extend_from_slice(&events[close.event_idx + 1..]);
        return (prefix, chunk, suffix);
    }

    let open_p = enclosing(events, open.event_idx, "w:p");
    let close_p = enclosing(events, close.event_idx, "w:p");
    if let (Some((op_s, op_e)), Some((cp_s, cp_e))) = (open_p, close_p) {
        if (op_s, op_e) != (cp_s, cp_e) {
            let open_tr = enclosing(events, open.event_idx, "w:tr");
            let close_tr = enclosing(events, close.event_idx, "w:tr");
            if let (Some((otr_s, _)), Some((_, ctr_e))) = (open_tr, close_tr) {
                let mut chunk = events[otr_s..=ctr_e].to_vec();
                strip_tag(&mut chunk, close.event_idx - otr_s, close);
                strip_tag(&mut chunk, open.event_idx - otr_s, open);
                return (
                    events[..otr_s].to_vec(),
                    chunk,
                    events[ctr_e + 1..].to_vec(),
                );
            }

            let mut open_par = events[op_s..=op_e].to_vec();
            strip_tag(&mut open_par, open.event_idx - op_s, open);
            let mut close_par = events[cp_s..=cp_e].to_vec();
            strip_tag(&mut close_par, close.event_idx - cp_s, close);

            let mut chunk: Vec<XmlEvent> = Vec::new();
            if !paragraph_is_blank(&open_par) {
                chunk.extend(open_par);
            }
            chunk.extend_from_slice(&events[op_e + 1..cp_s]);
            if !paragraph_is_blank(&close_par) {
                chunk.extend(close_par);
            }
            return (events[..op_s].to_vec(), chunk, events[cp_e + 1..].to_vec());
        }
    }

    // Same paragraph (or no paragraph at all): inline expansion between the
    // two tags. The chunk's leading End/Start bridge stays balanced across
    // repetitions.
    let open_text = text_of(&events[open.event_idx]);
    let close_text = text_of(&events[close.event_idx]);
    let mut prefix = events[..open.event_idx].to_vec();
    push_text(&mut prefix, &open_text[..open.start]);
    let mut chunk = text_events(&open_text[open.end..]);
    chunk.extend_from_slice(&events[open.event_idx + 1..close.event_idx]);
    push_text(&mut chunk, &close_text[..close.start]);
    let mut suffix = text_events(&close_text[close.end..]);
    suffix.extend_from_slice(&events[close.event_idx + 1..]);
    (prefix, chunk, suffix)
}

/// Inclusive (start, end) event range of the `tag` element enclosing `idx`.
fn enclosing(events: &[XmlEvent], idx: usize, tag: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut start = None;
    for j in (0..=idx).rev() {
        match &events[j] {
            XmlEvent::End { name } if name == tag => depth += 1,
            XmlEvent::Start { name, .. } if name == tag => {
                if depth == 0 {
                    start = Some(j);
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    let start = start?;
    let mut depth = 0usize;
    for (j, ev) in events.iter().enumerate().skip(start + 1) {
        match ev {
            XmlEvent::Start { name, .. } if name == tag => depth += 1,
            XmlEvent::End { name } if name == tag => {
                if depth == 0 {
                    return Some((start, j));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn strip_tag(events: &mut [XmlEvent], idx: usize, tag: &TagAt) {
    if let Some(XmlEvent::Text { text }) = events.get_mut(idx) {
        if tag.end <= text.len() {
            text.replace_range(tag.start..tag.end, "");
        }
    }
}

fn paragraph_is_blank(events: &[XmlEvent]) -> bool {
    events.iter().all(|ev| match ev {
        XmlEvent::Text { text } => text.trim().is_empty(),
        _ => true,
    })
}

fn text_of(ev: &XmlEvent) -> String {
    match ev {
        XmlEvent::Text { text } => text.clone(),
        _ => String::new(),
    }
}

fn push_text(out: &mut Vec<XmlEvent>, text: &str) {
    if !text.is_empty() {
        out.push(XmlEvent::Text {
            text: text.to_string(),
        });
    }
}

fn text_events(text: &str) -> Vec<XmlEvent> {
    let mut out = Vec::new();
    push_text(&mut out, text);
    out
}

fn needs_preserve(text: &str) -> bool {
    text.starts_with(' ') || text.ends_with(' ')
}

fn start_attrs(ev: &XmlEvent) -> Vec<(String, String)> {
    match ev {
        XmlEvent::Start { attrs, .. } => attrs.clone(),
        _ => Vec::new(),
    }
}

/// Replaces scalar tags in text events. Substituted `<w:t>` nodes with edge
/// whitespace get `xml:space="preserve"`; newlines in values split the node
/// around `<w:br/>` elements.
fn substitute_scalars(events: &[XmlEvent], scope: &Scope) -> Vec<XmlEvent> {
    let mut out: Vec<XmlEvent> = Vec::with_capacity(events.len());
    let mut open_wt: Option<usize> = None;
    for ev in events {
        match ev {
            XmlEvent::Start { name, .. } => {
                if name == "w:t" {
                    open_wt = Some(out.len());
                }
                out.push(ev.clone());
            }
            XmlEvent::End { name } => {
                if name == "w:t" {
                    open_wt = None;
                }
                out.push(ev.clone());
            }
            XmlEvent::Text { text } if TAG_RE.is_match(text) => {
                let new_text = TAG_RE
                    .replace_all(text, |caps: &Captures| {
                        scalar_text(scope.lookup(caps[2].trim()))
                    })
                    .into_owned();
                let Some(wt_idx) = open_wt else {
                    out.push(XmlEvent::Text { text: new_text });
                    continue;
                };
                let split = new_text.contains('\n');
                if split || needs_preserve(&new_text) {
                    set_attr(&mut out[wt_idx], "xml:space", "preserve");
                }
                let attrs = start_attrs(&out[wt_idx]);
                let mut lines = new_text.split('\n');
                push_text(&mut out, lines.next().unwrap_or(""));
                for line in lines {
                    out.push(XmlEvent::End {
                        name: "w:t".to_string(),
                    });
                    out.push(XmlEvent::Empty {
                        name: "w:br".to_string(),
                        attrs: Vec::new(),
                    });
                    open_wt = Some(out.len());
                    out.push(XmlEvent::Start {
                        name: "w:t".to_string(),
                        attrs: attrs.clone(),
                    });
                    push_text(&mut out, line);
                }
            }
            _ => out.push(ev.clone()),
        }
    }
    out
}
