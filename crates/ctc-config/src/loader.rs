//! Configuration Loader
//!
//! Parses the XML input declaration of one target:
//!
//! ```xml
//! <crete>
//!     <exec>/usr/bin/target</exec>
//!     <args>
//!         <arg index="1" value="-n" size="" concolic="false"/>
//!         <arg index="2" value="" size="8" concolic="true"/>
//!     </args>
//!     <files>
//!         <file path="/tmp/input" size="16" concolic="true"/>
//!     </files>
//!     <stdin size="32" concolic="true"/>
//! </crete>
//! ```
//!
//! Elements are matched by tag name anywhere in the document, so the
//! grouping elements (`args`, `files`) are optional.

use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{argument_name, Configuration, InputDecl};

/// Load a configuration from a document on disk
///
/// # Errors
/// `NotFound` if the document or the executable it names does not exist,
/// otherwise whatever [`load`] reports.
pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<Configuration> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ConfigError::not_found("configuration document", path));
    }
    let document = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
    tracing::debug!("Loading configuration from {}", path.display());
    load(&document)
}

/// Load a configuration from document text
///
/// The only filesystem access is the executable existence check.
///
/// # Errors
/// - `Malformed` for missing or unparsable elements and attributes
/// - `NotFound` if the executable does not exist
/// - `Validation` for declarations the engine cannot bind
pub fn load(document: &str) -> ConfigResult<Configuration> {
    let doc = Document::parse(document)
        .map_err(|e| ConfigError::malformed(format!("not well-formed XML: {e}")))?;

    let executable = parse_executable(&doc)?;
    if !executable.is_file() {
        return Err(ConfigError::not_found("target executable", executable));
    }
    tracing::info!("Target executable '{}'", executable.display());

    let mut config = Configuration::new(executable);

    for node in elements(&doc, "arg") {
        let decl = parse_argument(node)?;
        tracing::debug!(
            "{}: {} argument, size {}",
            decl.name(),
            if decl.is_concolic() { "symbolic" } else { "concrete" },
            decl.size()
        );
        config.add_argument(decl)?;
    }

    for node in elements(&doc, "file") {
        let decl = parse_file(node)?;
        tracing::debug!("concolic file: {}, {}", decl.name(), decl.size());
        config.add_file(decl)?;
    }

    let stdin_nodes: Vec<_> = elements(&doc, "stdin").collect();
    if stdin_nodes.len() > 1 {
        return Err(ConfigError::validation(format!(
            "{} stdin elements given, at most one is allowed",
            stdin_nodes.len()
        )));
    }
    if let Some(node) = stdin_nodes.first() {
        match parse_stdin(*node)? {
            Some(decl) => {
                tracing::debug!("stdin size from configuration: {}", decl.size());
                config.set_stdin(decl)?;
            }
            None => tracing::debug!("stdin declared with size 0, treated as absent"),
        }
    }

    Ok(config)
}

fn elements<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.descendants()
        .filter(move |n| n.is_element() && n.has_tag_name(tag))
}

fn parse_executable(doc: &Document<'_>) -> ConfigResult<PathBuf> {
    let exec = elements(doc, "exec")
        .next()
        .ok_or_else(|| ConfigError::malformed("missing <exec> element"))?;
    let text = exec.text().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ConfigError::malformed("<exec> element is empty"));
    }
    Ok(PathBuf::from(text))
}

fn parse_argument(node: Node<'_, '_>) -> ConfigResult<InputDecl> {
    let index = parse_index(required(node, "arg", "index")?)?;
    let value = node.attribute("value").unwrap_or_default();
    // An empty size attribute means "derive from value"
    let size = match node.attribute("size").map(str::trim) {
        None | Some("") => 0,
        Some(raw) => parse_integer("arg", "size", raw)?,
    };
    let concolic = match node.attribute("concolic") {
        None => false,
        Some(raw) => parse_flag("arg", raw)?,
    };

    if index == 0 {
        return Err(ConfigError::validation(
            "argument index 0 is reserved for the target executable",
        ));
    }

    let decl = if concolic {
        let decl = InputDecl::symbolic_argument(index, size, value.as_bytes());
        if decl.size() == 0 {
            return Err(ConfigError::validation(format!(
                "symbolic argument {} has neither a size nor a value",
                argument_name(index)
            )));
        }
        decl
    } else {
        InputDecl::concrete_argument(index, value.as_bytes(), size)
    };
    check_width(decl)
}

fn parse_file(node: Node<'_, '_>) -> ConfigResult<InputDecl> {
    let path = required(node, "file", "path")?;
    let size = parse_integer("file", "size", required(node, "file", "size")?)?;
    let concolic = parse_flag("file", required(node, "file", "concolic")?)?;

    if !concolic {
        return Err(ConfigError::validation(format!(
            "non-concolic file given: {path}"
        )));
    }
    if size == 0 {
        return Err(ConfigError::validation(format!(
            "concolic file {path} has size 0"
        )));
    }
    check_width(InputDecl::file(path, size))
}

fn parse_stdin(node: Node<'_, '_>) -> ConfigResult<Option<InputDecl>> {
    let size = parse_integer("stdin", "size", required(node, "stdin", "size")?)?;
    let concolic = parse_flag("stdin", required(node, "stdin", "concolic")?)?;

    if !concolic {
        return Err(ConfigError::validation("non-concolic stdin given"));
    }
    if size == 0 {
        return Ok(None);
    }
    check_width(InputDecl::stdin(size)).map(Some)
}

/// Widths must fit the signed 32-bit length fields of a test case
fn check_width(decl: InputDecl) -> ConfigResult<InputDecl> {
    if i32::try_from(decl.size()).is_err() {
        return Err(ConfigError::validation(format!(
            "{} is {} bytes wide, the limit is {} bytes",
            decl.name(),
            decl.size(),
            i32::MAX
        )));
    }
    Ok(decl)
}

fn parse_index(raw: &str) -> ConfigResult<usize> {
    match raw.trim().parse::<i64>() {
        Ok(index) if index < 0 => Err(ConfigError::validation(format!(
            "argument index {index} is out of range"
        ))),
        _ => parse_integer("arg", "index", raw),
    }
}

fn required<'a>(node: Node<'a, '_>, element: &str, attribute: &str) -> ConfigResult<&'a str> {
    node.attribute(attribute).ok_or_else(|| {
        ConfigError::malformed(format!("<{element}> is missing attribute '{attribute}'"))
    })
}

fn parse_integer(element: &str, attribute: &str, raw: &str) -> ConfigResult<usize> {
    raw.trim().parse().map_err(|_| {
        ConfigError::malformed(format!(
            "<{element}> attribute '{attribute}' is not a non-negative integer: '{raw}'"
        ))
    })
}

fn parse_flag(element: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ConfigError::malformed(format!(
            "<{element}> attribute 'concolic' must be \"true\" or \"false\", got '{other}'"
        ))),
    }
}
