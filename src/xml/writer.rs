//! Low-level XML writing utilities shared by the SSDL and MSL writers.
//!
//! These are the building blocks for writing start/end tags, empty elements
//! and the small recurring patterns (`PropertyRef`, boolean attributes).

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Create a writer indenting nested elements by two spaces.
pub(crate) fn new_writer<W: Write>(inner: W) -> Writer<W> {
    Writer::new_with_indent(inner, b' ', 2)
}

/// Write `<?xml version="1.0" encoding="utf-8"?>`.
pub(crate) fn write_declaration<W: Write>(writer: &mut Writer<W>) -> anyhow::Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    Ok(())
}

/// Write a start tag with the given attributes, in order.
pub(crate) fn write_start<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
) -> anyhow::Result<()> {
    let elem = BytesStart::new(name).with_attributes(attributes.iter().copied());
    writer.write_event(Event::Start(elem))?;
    Ok(())
}

pub(crate) fn write_end<W: Write>(writer: &mut Writer<W>, name: &str) -> anyhow::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Write an empty element with the given attributes, in order.
///
/// Generates: `<name a="1" b="2"/>`
pub(crate) fn write_empty<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
) -> anyhow::Result<()> {
    let elem = BytesStart::new(name).with_attributes(attributes.iter().copied());
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Write an element containing only escaped text.
///
/// Generates: `<name>text</name>`
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Generates: `<PropertyRef Name="name"/>`
pub(crate) fn write_property_ref<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
) -> anyhow::Result<()> {
    write_empty(writer, "PropertyRef", &[("Name", name)])
}

/// XML schema boolean spelling (`true`/`false`).
pub(crate) fn xml_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
