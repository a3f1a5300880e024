//! Component invocation builder.
//!
//! Props are written as `key={json}` with a JSON formatter that escapes `"`,
//! `<` and `>` inside strings as `\uXXXX`, so a value never closes the
//! attribute or the surrounding tag early.

use std::io;

use serde::Serialize;
use serde_json::ser::{CharEscape, CompactFormatter, Formatter};

use crate::state::escape_html;

/// Compact JSON formatter safe for template-attribute position.
struct AttrFormatter;

impl Formatter for AttrFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut last = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                _ => continue,
            };
            writer.write_all(&fragment.as_bytes()[last..i])?;
            writer.write_all(escaped.as_bytes())?;
            last = i + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[last..])
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        match char_escape {
            CharEscape::Quote => writer.write_all(b"\\u0022"),
            other => CompactFormatter.write_char_escape(writer, other),
        }
    }
}

/// Serialize `value` as attribute-safe JSON.
pub fn to_attr_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AttrFormatter);
    value.serialize(&mut serializer)?;
    // The formatter only ever writes UTF-8 produced from `&str` fragments.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// A component invocation under construction.
#[derive(Debug)]
pub(crate) struct Component {
    name: &'static str,
    props: String,
}

impl Component {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            props: String::new(),
        }
    }

    /// Add `key={json}`.
    pub(crate) fn prop<T: Serialize + ?Sized>(
        mut self,
        key: &str,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let json = to_attr_json(value)?;
        self.props.push_str(&format!(" {key}={{{json}}}"));
        Ok(self)
    }

    /// Add `key={json}` when `value` is present.
    pub(crate) fn opt_prop<T: Serialize>(
        self,
        key: &str,
        value: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        match value {
            Some(value) => self.prop(key, value),
            None => Ok(self),
        }
    }

    /// Add a plain `key="value"` attribute.
    pub(crate) fn attr(mut self, key: &str, value: &str) -> Self {
        self.props.push_str(&format!(r#" {key}="{}""#, escape_html(value)));
        self
    }

    /// Add `key={expr}` with `expr` inserted verbatim.
    pub(crate) fn expr(mut self, key: &str, expr: &str) -> Self {
        self.props.push_str(&format!(" {key}={{{expr}}}"));
        self
    }

    /// Add `key={true}` when `flag` is set.
    pub(crate) fn flag(self, key: &str, flag: bool) -> Self {
        if flag { self.expr(key, "true") } else { self }
    }

    /// Render as `<Name ... />`.
    pub(crate) fn self_closing(&self) -> String {
        format!("<{}{} />", self.name, self.props)
    }

    /// Render as `<Name ...>` + `children` + `</Name>`.
    pub(crate) fn wrap(&self, children: &str) -> String {
        format!("<{name}{props}>\n{children}</{name}>", name = self.name, props = self.props)
    }
}

/// Named slot holding rendered content.
pub(crate) fn slot(name: &str, content: &str) -> String {
    format!("<svelte:fragment slot=\"{name}\">\n{}\n</svelte:fragment>\n", content.trim_end())
}
