//! C8: the `<mplotdoc>` XML document format described in `spec.md` §6,
//! read and written with `quick_xml`.
//!
//! `open` replaces the registry's current contents outright; `save` refuses
//! to serialize an empty registry rather than writing a document with no
//! `<function>` entries.

use std::fmt;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use rustc_hash::FxHashMap;

use crate::core::ParserContext;
use crate::functions::{Bound, CartesianSubtype, Color, Function, FunctionKind, FunctionRegistry, FunctionType};

/// A document load or save failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    /// The XML reader or writer reported an error; the message is its
    /// `Display` text.
    Xml(Box<str>),
    /// The document had no `<mplotdoc>` root element.
    MissingRoot,
    /// The root element contained no `<function>` entries.
    EmptyDocument,
    /// [`save`] was asked to serialize an empty registry.
    EmptyRegistry,
    /// The document ended before an open element was closed.
    UnexpectedEof,
    /// A required child element was absent from a `<function>` entry.
    MissingField {
        /// The missing element's tag name.
        field: Box<str>,
    },
    /// A child element's text did not parse as the value it represents.
    InvalidValue {
        /// The element's tag name.
        field: Box<str>,
        /// The text that failed to parse.
        text: Box<str>,
    },
    /// `<type>` held something other than `cartesian`, `parametric`, or
    /// `implicit`.
    InvalidFunctionType {
        /// The unrecognized text.
        text: Box<str>,
    },
    /// Restoring a parsed entry into the registry failed, most commonly
    /// because two `<function>` entries in the document share a name.
    Rejected {
        /// The entry's name.
        name: Box<str>,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(message) => write!(f, "xml error: {message}"),
            Self::MissingRoot => write!(f, "document has no <mplotdoc> root element"),
            Self::EmptyDocument => write!(f, "document has no <function> entries"),
            Self::EmptyRegistry => write!(f, "cannot save an empty registry"),
            Self::UnexpectedEof => write!(f, "document ended inside an open element"),
            Self::MissingField { field } => write!(f, "missing <{field}>"),
            Self::InvalidValue { field, text } => write!(f, "<{field}> holds an invalid value: '{text}'"),
            Self::InvalidFunctionType { text } => write!(f, "unknown function type '{text}'"),
            Self::Rejected { name } => write!(f, "could not restore function '{name}'"),
        }
    }
}

impl std::error::Error for DocumentError {}

impl From<quick_xml::Error> for DocumentError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string().into_boxed_str())
    }
}

/// Parses `xml` and replaces `registry`'s current contents with the
/// documented entries, per `spec.md` §6's "open replaces the current
/// registry contents".
///
/// # Errors
///
/// Returns [`DocumentError`] if the document is not well-formed, is missing
/// its root or any `<function>` entries, or a `<function>` entry is missing
/// a required child element or holds an unparsable value.
pub fn open(xml: &str, registry: &FunctionRegistry) -> Result<(), DocumentError> {
    let functions = parse(xml, &registry.context())?;
    registry.clear();
    for function in functions {
        let name = function.name.clone();
        registry.insert(function).map_err(|_| DocumentError::Rejected { name })?;
    }
    Ok(())
}

/// Serializes every entry in `registry`, in painting order, as an
/// `<mplotdoc>` document.
///
/// # Errors
///
/// Returns [`DocumentError::EmptyRegistry`] if `registry` holds no entries,
/// or [`DocumentError::Xml`] if the underlying writer fails.
pub fn save(registry: &FunctionRegistry) -> Result<String, DocumentError> {
    let names = registry.names();
    if names.is_empty() {
        return Err(DocumentError::EmptyRegistry);
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Start(BytesStart::new("mplotdoc")))?;
    for name in &names {
        if let Some(result) = registry.with_function(name, |function| write_function(&mut writer, function)) {
            result?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("mplotdoc")))?;

    let bytes = writer.into_inner();
    String::from_utf8(bytes).map_err(|err| DocumentError::Xml(err.to_string().into_boxed_str()))
}

fn parse(xml: &str, ctx: &ParserContext) -> Result<Vec<Function>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut raw_functions = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if qname_str(e.name()) == "mplotdoc" => break,
            Event::Eof => return Err(DocumentError::MissingRoot),
            _ => {}
        }
    }

    loop {
        match reader.read_event()? {
            Event::Start(e) if qname_str(e.name()) == "function" => {
                raw_functions.push(read_function(&mut reader)?);
            }
            Event::End(e) if qname_str(e.name()) == "mplotdoc" => break,
            Event::Eof => return Err(DocumentError::UnexpectedEof),
            _ => {}
        }
    }

    if raw_functions.is_empty() {
        return Err(DocumentError::EmptyDocument);
    }

    raw_functions.into_iter().map(|raw| raw.into_function(ctx)).collect()
}

struct RawFunction {
    function_type: String,
    name: String,
    width: f32,
    color: Color,
    fields: FxHashMap<String, String>,
}

fn read_function(reader: &mut Reader<&[u8]>) -> Result<RawFunction, DocumentError> {
    let mut color = Color::rgb(0, 0, 0);
    let mut fields: FxHashMap<String, String> = FxHashMap::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = qname_str(e.name());
                if tag == "color" {
                    color = read_color(reader)?;
                } else {
                    let text = read_text(reader, &tag)?;
                    fields.insert(tag, text);
                }
            }
            Event::Empty(e) => {
                let tag = qname_str(e.name());
                if tag != "color" {
                    fields.insert(tag, String::new());
                }
            }
            Event::End(e) if qname_str(e.name()) == "function" => break,
            Event::Eof => return Err(DocumentError::UnexpectedEof),
            _ => {}
        }
    }

    let function_type = take_field(&mut fields, "type")?;
    let name = take_field(&mut fields, "name")?;
    let width = match fields.remove("width") {
        Some(text) => parse_value("width", &text)?,
        None => 1.0,
    };

    Ok(RawFunction { function_type, name, width, color, fields })
}

fn read_color(reader: &mut Reader<&[u8]>) -> Result<Color, DocumentError> {
    let mut r = 0_u8;
    let mut g = 0_u8;
    let mut b = 0_u8;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = qname_str(e.name());
                let text = read_text(reader, &tag)?;
                let value = parse_value(&tag, &text)?;
                match tag.as_str() {
                    "r" => r = value,
                    "g" => g = value,
                    "b" => b = value,
                    _ => {}
                }
            }
            Event::End(e) if qname_str(e.name()) == "color" => break,
            Event::Eof => return Err(DocumentError::UnexpectedEof),
            _ => {}
        }
    }
    Ok(Color::rgb(r, g, b))
}

fn read_text(reader: &mut Reader<&[u8]>, tag: &str) -> Result<String, DocumentError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::End(e) if qname_str(e.name()) == tag => break,
            Event::Eof => return Err(DocumentError::UnexpectedEof),
            _ => {}
        }
    }
    Ok(text.trim().to_owned())
}

fn qname_str(name: quick_xml::name::QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

fn take_field(fields: &mut FxHashMap<String, String>, key: &str) -> Result<String, DocumentError> {
    fields.remove(key).ok_or_else(|| DocumentError::MissingField { field: key.into() })
}

fn parse_value<T: std::str::FromStr>(field: &str, text: &str) -> Result<T, DocumentError> {
    text.trim()
        .parse()
        .map_err(|_err| DocumentError::InvalidValue { field: field.into(), text: text.into() })
}

fn parse_bool(field: &str, text: &str) -> Result<bool, DocumentError> {
    match text.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DocumentError::InvalidValue { field: field.into(), text: text.into() }),
    }
}

impl RawFunction {
    fn into_function(mut self, ctx: &ParserContext) -> Result<Function, DocumentError> {
        let kind = match self.function_type.as_str() {
            "cartesian" => {
                let formula = take_field(&mut self.fields, "formula")?;
                let subtype = match self.fields.remove("subtype").as_deref() {
                    None | Some("x_to_y") => CartesianSubtype::XToY,
                    Some("y_to_x") => CartesianSubtype::YToX,
                    Some(other) => return Err(DocumentError::InvalidFunctionType { text: other.into() }),
                };
                let min = read_bound(&mut self.fields, "min_flag", "min")?;
                let max = read_bound(&mut self.fields, "max_flag", "max")?;
                FunctionKind::cartesian_from_source(ctx, subtype, &formula, min, max)
            }
            "parametric" => {
                let x_formula = take_field(&mut self.fields, "x_formula")?;
                let y_formula = take_field(&mut self.fields, "y_formula")?;
                let min_param = read_numeric(&mut self.fields, "min_param", 0.0)?;
                let max_param = read_numeric(&mut self.fields, "max_param", 1.0)?;
                let param_step = read_numeric(&mut self.fields, "param_step", 0.01)?;
                FunctionKind::parametric_from_source(ctx, &x_formula, &y_formula, min_param, max_param, param_step)
            }
            "implicit" => {
                let formula = take_field(&mut self.fields, "formula")?;
                let draw_accuracy = match self.fields.remove("draw_accuracy") {
                    Some(text) => parse_value("draw_accuracy", &text)?,
                    None => 4,
                };
                FunctionKind::implicit_from_source(ctx, &formula, draw_accuracy)
            }
            other => return Err(DocumentError::InvalidFunctionType { text: other.into() }),
        };

        let mut function = Function::new(self.name, self.color, kind);
        function.width = self.width;
        Ok(function)
    }
}

fn read_bound(fields: &mut FxHashMap<String, String>, flag_field: &str, value_field: &str) -> Result<Bound, DocumentError> {
    let enabled = match fields.remove(flag_field) {
        Some(text) => parse_bool(flag_field, &text)?,
        None => false,
    };
    let value = match fields.remove(value_field) {
        Some(text) => parse_value(value_field, &text)?,
        None => 0.0,
    };
    Ok(Bound { enabled, value })
}

fn read_numeric(fields: &mut FxHashMap<String, String>, field: &str, default: f64) -> Result<f64, DocumentError> {
    match fields.remove(field) {
        Some(text) => parse_value(field, &text),
        None => Ok(default),
    }
}

fn write_function(writer: &mut Writer<Vec<u8>>, function: &Function) -> Result<(), DocumentError> {
    writer.write_event(Event::Start(BytesStart::new("function")))?;
    write_text(writer, "type", function_type_str(function.kind.function_type()))?;
    write_text(writer, "name", &function.name)?;
    write_text(writer, "width", &function.width.to_string())?;
    write_color(writer, function.color)?;

    match &function.kind {
        FunctionKind::Cartesian { subtype, formula, min, max } => {
            write_text(writer, "formula", &formula.expression())?;
            write_text(writer, "subtype", subtype_str(*subtype))?;
            write_text(writer, "min_flag", bool_str(min.enabled))?;
            write_text(writer, "min", &min.value.to_string())?;
            write_text(writer, "max_flag", bool_str(max.enabled))?;
            write_text(writer, "max", &max.value.to_string())?;
        }
        FunctionKind::Parametric { x_formula, y_formula, min_param, max_param, param_step } => {
            write_text(writer, "x_formula", &x_formula.expression())?;
            write_text(writer, "y_formula", &y_formula.expression())?;
            write_text(writer, "min_param", &min_param.to_string())?;
            write_text(writer, "max_param", &max_param.to_string())?;
            write_text(writer, "param_step", &param_step.to_string())?;
        }
        FunctionKind::Implicit { formula, draw_accuracy } => {
            write_text(writer, "formula", &formula.expression())?;
            write_text(writer, "draw_accuracy", &draw_accuracy.to_string())?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("function")))?;
    Ok(())
}

fn write_color(writer: &mut Writer<Vec<u8>>, color: Color) -> Result<(), DocumentError> {
    writer.write_event(Event::Start(BytesStart::new("color")))?;
    write_text(writer, "r", &color.r.to_string())?;
    write_text(writer, "g", &color.g.to_string())?;
    write_text(writer, "b", &color.b.to_string())?;
    writer.write_event(Event::End(BytesEnd::new("color")))?;
    Ok(())
}

fn write_text(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<(), DocumentError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn function_type_str(function_type: FunctionType) -> &'static str {
    match function_type {
        FunctionType::Cartesian => "cartesian",
        FunctionType::Parametric => "parametric",
        FunctionType::Implicit => "implicit",
    }
}

fn subtype_str(subtype: CartesianSubtype) -> &'static str {
    match subtype {
        CartesianSubtype::XToY => "x_to_y",
        CartesianSubtype::YToX => "y_to_x",
    }
}

const fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionType as Kind;

    #[test]
    fn save_then_open_round_trips_a_cartesian_entry() {
        let registry = FunctionRegistry::new();
        let name = registry.add(Kind::Cartesian);
        registry.with_function_mut(&name, |f| {
            if let FunctionKind::Cartesian { formula, min, .. } = &mut f.kind {
                formula.set_expression("x ^ 2").expect("parse ok");
                *min = Bound::at(-5.0);
            }
        });

        let xml = save(&registry).expect("save ok");
        assert!(xml.contains("<mplotdoc>"));
        assert!(xml.contains("x ^ 2") || xml.contains("x^2"));

        let reloaded = FunctionRegistry::new();
        open(&xml, &reloaded).expect("open ok");
        assert_eq!(reloaded.names(), vec![name]);
    }

    #[test]
    fn save_refuses_an_empty_registry() {
        let registry = FunctionRegistry::new();
        assert_eq!(save(&registry), Err(DocumentError::EmptyRegistry));
    }

    #[test]
    fn open_replaces_existing_contents() {
        let registry = FunctionRegistry::new();
        registry.add(Kind::Implicit);

        let source = registry.add(Kind::Cartesian);
        registry.with_function_mut(&source, |f| {
            if let FunctionKind::Cartesian { formula, .. } = &mut f.kind {
                formula.set_expression("x").expect("parse ok");
            }
        });
        let one_function_doc = {
            let fresh = FunctionRegistry::new();
            let name = fresh.add(Kind::Cartesian);
            fresh.with_function_mut(&name, |f| {
                if let FunctionKind::Cartesian { formula, .. } = &mut f.kind {
                    formula.set_expression("2 * x").expect("parse ok");
                }
            });
            save(&fresh).expect("save ok")
        };

        open(&one_function_doc, &registry).expect("open ok");
        assert_eq!(registry.names().len(), 1);
    }

    #[test]
    fn open_rejects_a_document_without_a_root_element() {
        let registry = FunctionRegistry::new();
        let err = open("<notmplotdoc></notmplotdoc>", &registry);
        assert_eq!(err, Err(DocumentError::MissingRoot));
    }

    #[test]
    fn open_rejects_a_document_with_no_functions() {
        let registry = FunctionRegistry::new();
        let err = open("<mplotdoc></mplotdoc>", &registry);
        assert_eq!(err, Err(DocumentError::EmptyDocument));
    }
}
