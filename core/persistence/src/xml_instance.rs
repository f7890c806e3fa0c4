//! FILENAME: core/persistence/src/xml_instance.rs
//! Flattens an XForm submission instance into a `Record`.
//!
//! Each leaf element becomes one field keyed by its element path below the
//! root (`household/head/name`). Empty leaves become null. An element path
//! that repeats (a repeat group) collects its values into a list. The root's
//! `id` attribute, when present, is stored under the form id-string field.

use engine::{FieldValue, Record, ID_STRING};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::PersistenceError;

struct OpenElement {
    name: String,
    has_children: bool,
    text: Option<String>,
}

pub fn parse_instance_xml(xml: &str) -> Result<Record, PersistenceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut record = Record::new();
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                open_element(&reader, &e, &mut stack, &mut record, &mut saw_root)?;
            }
            Event::Empty(e) => {
                open_element(&reader, &e, &mut stack, &mut record, &mut saw_root)?;
                close_element(&mut stack, &mut record);
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                add_text(&mut stack, &text);
            }
            Event::CData(c) => {
                add_text(&mut stack, &String::from_utf8_lossy(&c));
            }
            Event::End(_) => close_element(&mut stack, &mut record),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(PersistenceError::InvalidFormat(
            "Instance has no root element".to_string(),
        ));
    }
    Ok(record)
}

fn open_element(
    reader: &Reader<&[u8]>,
    e: &BytesStart,
    stack: &mut Vec<OpenElement>,
    record: &mut Record,
    saw_root: &mut bool,
) -> Result<(), PersistenceError> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    if stack.is_empty() {
        if *saw_root {
            return Err(PersistenceError::InvalidFormat(format!(
                "Unexpected second root element <{}>",
                name
            )));
        }
        *saw_root = true;
        let id = e.try_get_attribute("id").map_err(quick_xml::Error::from)?;
        if let Some(id) = id {
            record.insert(ID_STRING, id.decode_and_unescape_value(reader)?.into_owned());
        }
    } else if let Some(parent) = stack.last_mut() {
        parent.has_children = true;
    }

    stack.push(OpenElement {
        name,
        has_children: false,
        text: None,
    });
    Ok(())
}

fn close_element(stack: &mut Vec<OpenElement>, record: &mut Record) {
    let key = field_key(stack);
    if let Some(element) = stack.pop() {
        // The root itself never becomes a field
        if stack.is_empty() {
            return;
        }
        match element.text {
            Some(text) => store(record, key, FieldValue::Text(text)),
            None if !element.has_children => store(record, key, FieldValue::Null),
            None => {}
        }
    }
}

/// Text and CDATA pieces of one element are joined into a single value.
fn add_text(stack: &mut [OpenElement], text: &str) {
    if stack.len() < 2 {
        return;
    }
    if let Some(element) = stack.last_mut() {
        element.text.get_or_insert_with(String::new).push_str(text);
    }
}

/// Path of the innermost open element, excluding the root.
fn field_key(stack: &[OpenElement]) -> String {
    stack
        .iter()
        .skip(1)
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn store(record: &mut Record, key: String, value: FieldValue) {
    let merged = match record.get(&key) {
        None => value,
        Some(FieldValue::List(items)) => {
            let mut items = items.clone();
            items.push(value);
            FieldValue::List(items)
        }
        Some(existing) => FieldValue::List(vec![existing.clone(), value]),
    };
    record.insert(key, merged);
}
