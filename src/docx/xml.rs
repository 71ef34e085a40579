use anyhow::Context;
use quick_xml::events::Event;
use quick_xml::Reader;

/// One event of a parsed XML part. Attribute values hold the raw
/// already-escaped bytes from the source document.
#[derive(Clone, Debug)]
pub enum XmlEvent {
    Decl {
        version: String,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Empty {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
    CData {
        text: String,
    },
    Comment {
        text: String,
    },
    PI {
        content: String,
    },
    DocType {
        text: String,
    },
}

/// A template part as a flat event stream, serializable back to bytes
/// without structural drift.
#[derive(Clone)]
pub struct XmlPart {
    pub name: String,
    pub events: Vec<XmlEvent>,
}

pub fn parse_xml_part(name: &str, xml_bytes: &[u8]) -> anyhow::Result<XmlPart> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(false);

    let mut events: Vec<XmlEvent> = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let ev = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("read xml event in {name}"))?;
        match convert_event(ev)? {
            Some(ev) => events.push(ev),
            None => break,
        }
    }

    Ok(XmlPart {
        name: name.to_string(),
        events,
    })
}

/// quick-xml event to our owned form; `None` marks end of input. Text is
/// unescaped here and re-escaped on write; attribute values are NOT
/// unescaped. Character references in attributes such as the `&#13;&#10;`
/// CRLF encoding inside VML `o:gfxdata` must survive verbatim, because
/// attribute-value normalization on re-parse would turn literal newlines
/// into spaces and corrupt the embedded object.
fn convert_event(ev: Event<'_>) -> anyhow::Result<Option<XmlEvent>> {
    Ok(Some(match ev {
        Event::Eof => return Ok(None),
        Event::Decl(d) => XmlEvent::Decl {
            version: utf8(d.version().context("xml decl version")?),
            encoding: d.encoding().and_then(Result::ok).map(utf8),
            standalone: d.standalone().and_then(Result::ok).map(utf8),
        },
        Event::Start(s) => XmlEvent::Start {
            name: utf8(s.name().as_ref()),
            attrs: raw_attrs(s.attributes())?,
        },
        Event::Empty(s) => XmlEvent::Empty {
            name: utf8(s.name().as_ref()),
            attrs: raw_attrs(s.attributes())?,
        },
        Event::End(e) => XmlEvent::End {
            name: utf8(e.name().as_ref()),
        },
        Event::Text(t) => XmlEvent::Text {
            text: t.unescape().context("unescape text")?.into_owned(),
        },
        Event::CData(t) => XmlEvent::CData {
            text: utf8(t.into_inner()),
        },
        Event::Comment(t) => XmlEvent::Comment {
            text: utf8(t.into_inner()),
        },
        Event::PI(t) => XmlEvent::PI {
            content: format!("{}{}", utf8(t.target()), utf8(t.content())),
        },
        Event::DocType(t) => XmlEvent::DocType {
            text: utf8(t.into_inner()),
        },
    }))
}

fn raw_attrs(attrs: quick_xml::events::attributes::Attributes<'_>) -> anyhow::Result<Vec<(String, String)>> {
    attrs
        .map(|a| {
            let a = a.context("xml attribute")?;
            Ok((utf8(a.key.as_ref()), utf8(a.value.as_ref())))
        })
        .collect()
}

fn utf8(bytes: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(bytes.as_ref()).into_owned()
}

pub fn write_xml_part(part: &XmlPart) -> anyhow::Result<Vec<u8>> {
    let mut out = String::new();
    for ev in &part.events {
        write_event(&mut out, ev);
    }
    Ok(out.into_bytes())
}

fn write_event(out: &mut String, ev: &XmlEvent) {
    match ev {
        XmlEvent::Decl {
            version,
            encoding,
            standalone,
        } => {
            out.push_str("<?xml version=\"");
            out.push_str(version);
            out.push('"');
            if let Some(enc) = encoding {
                out.push_str(" encoding=\"");
                out.push_str(enc);
                out.push('"');
            }
            if let Some(sa) = standalone {
                out.push_str(" standalone=\"");
                out.push_str(sa);
                out.push('"');
            }
            out.push_str("?>");
        }
        XmlEvent::Start { name, attrs } => write_element(out, name, attrs, false),
        XmlEvent::Empty { name, attrs } => write_element(out, name, attrs, true),
        XmlEvent::End { name } => {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        XmlEvent::Text { text } => escape_text_into(out, text),
        XmlEvent::CData { text } => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        XmlEvent::Comment { text } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        XmlEvent::PI { content } => {
            out.push_str("<?");
            out.push_str(content);
            out.push_str("?>");
        }
        XmlEvent::DocType { text } => {
            out.push_str("<!DOCTYPE");
            out.push_str(text);
            out.push('>');
        }
    }
}

// Attribute values are raw escaped bytes and go back out untouched.
fn write_element(out: &mut String, name: &str, attrs: &[(String, String)], empty: bool) {
    out.push('<');
    out.push_str(name);
    for (k, v) in attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(v);
        out.push('"');
    }
    out.push_str(if empty { "/>" } else { ">" });
}

fn escape_text_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Sets or appends an attribute on a Start/Empty event; other events are
/// left alone.
pub fn set_attr(ev: &mut XmlEvent, key: &str, value: &str) {
    let (XmlEvent::Start { attrs, .. } | XmlEvent::Empty { attrs, .. }) = ev else {
        return;
    };
    match attrs.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value.to_string(),
        None => attrs.push((key.to_string(), value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_xml_part, set_attr, write_xml_part, XmlEvent};

    fn round_trip(xml: &[u8]) -> String {
        let part = parse_xml_part("test.xml", xml).expect("parse xml");
        String::from_utf8(write_xml_part(&part).expect("write xml")).expect("utf8")
    }

    #[test]
    fn declaration_round_trips() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document/>"#;
        assert_eq!(round_trip(xml), String::from_utf8_lossy(&xml[..]));
    }

    #[test]
    fn write_preserves_attr_entity_refs() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?><root xmlns:o="urn:test" o:gfxdata="A&#xD;&#xA;B"/>"#;
        let s = round_trip(xml);
        assert!(s.contains(r#"o:gfxdata="A&#xD;&#xA;B""#));
        assert!(!s.contains(r#"o:gfxdata="A&amp;#xD;"#));
    }

    #[test]
    fn text_round_trips_with_escapes() {
        let xml = br#"<?xml version="1.0"?><w:t>a &amp; b &lt;c&gt;</w:t>"#;
        let part = parse_xml_part("document.xml", xml).expect("parse xml");
        let texts: Vec<_> = part
            .events
            .iter()
            .filter_map(|ev| match ev {
                XmlEvent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["a & b <c>"]);

        let out = write_xml_part(&part).expect("write xml");
        let s = String::from_utf8(out).expect("utf8");
        assert!(s.contains("a &amp; b &lt;c&gt;"));
    }

    #[test]
    fn set_attr_updates_or_appends() {
        let mut ev = XmlEvent::Start {
            name: "w:t".to_string(),
            attrs: vec![],
        };
        set_attr(&mut ev, "xml:space", "preserve");
        set_attr(&mut ev, "xml:space", "preserve");
        match ev {
            XmlEvent::Start { attrs, .. } => {
                assert_eq!(attrs, vec![("xml:space".to_string(), "preserve".to_string())]);
            }
            _ => unreachable!(),
        }
    }
}
