//! Text sink used by the presentation boundary.
//!
//! Nodes append their own textual form through [`Dumpable::dump`]; the sink
//! only tracks indentation and never performs I/O.

use crate::method_info::MethodPrototype;
use crate::signature::JavaType;

/// Indenting string sink.
#[derive(Clone, Debug)]
pub struct Dumper {
    indent: String,
    output: String,
    indent_level: usize,
    at_line_start: bool,
}

impl Default for Dumper {
    fn default() -> Self {
        Self::new()
    }
}

impl Dumper {
    pub fn new() -> Self {
        Self::with_indent("    ")
    }

    pub fn with_indent(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
            output: String::new(),
            indent_level: 0,
            at_line_start: true,
        }
    }

    /// Append text, indenting it if it starts a new line.
    pub fn print(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if self.at_line_start {
            for _ in 0..self.indent_level {
                self.output.push_str(&self.indent);
            }
            self.at_line_start = false;
        }
        self.output.push_str(text);
        self
    }

    pub fn newln(&mut self) -> &mut Self {
        self.output.push('\n');
        self.at_line_start = true;
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    pub fn outdent(&mut self) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    /// Dump `node` into this sink.
    pub fn dump(&mut self, node: &dyn Dumpable) -> &mut Self {
        node.dump(self)
    }

    /// Append each item separated by `separator`.
    pub fn separated<T: Dumpable>(&mut self, items: &[T], separator: &str) -> &mut Self {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.print(separator);
            }
            item.dump(self);
        }
        self
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn finish(self) -> String {
        self.output
    }
}

/// Anything that can append its textual form to a [`Dumper`].
pub trait Dumpable {
    fn dump<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper;

    /// Render into a fresh sink.
    fn dumped(&self) -> String {
        let mut d = Dumper::new();
        self.dump(&mut d);
        d.finish()
    }
}

impl Dumpable for JavaType {
    fn dump<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
        d.print(&self.to_string())
    }
}

impl Dumpable for MethodPrototype {
    fn dump<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
        d.print(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Word(&'static str);

    impl Dumpable for Word {
        fn dump<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
            d.print(self.0)
        }
    }

    #[test]
    fn test_indentation_applies_at_line_start() {
        let mut d = Dumper::new();
        d.print("class A {").newln().indent();
        d.print("int x").print(";").newln().outdent();
        d.print("}").newln();
        assert_eq!(d.as_str(), "class A {\n    int x;\n}\n");
    }

    #[test]
    fn test_separated() {
        let mut d = Dumper::new();
        d.separated(&[Word("a"), Word("b"), Word("c")], ", ");
        assert_eq!(d.finish(), "a, b, c");
        assert_eq!(Word("x").dumped(), "x");
    }
}
