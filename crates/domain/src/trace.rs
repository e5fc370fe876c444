//! First-frame extraction from raw stack-trace text.
//!
//! Frames follow the `at function (file:line:column)` convention, with the
//! anonymous `at file:line:column` form also accepted. The parser never fails:
//! anything it cannot read yields a trace with no location at all.

use serde_json::Value;

/// Location of the first readable frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLocation {
    file_name: Box<str>,
    line_number: u32,
    column_number: u32,
    function_name: Option<Box<str>>,
}

impl FrameLocation {
    /// Source file or URL of the frame.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 1-based line number.
    #[must_use]
    pub const fn line_number(&self) -> u32 {
        self.line_number
    }

    /// 1-based column number.
    #[must_use]
    pub const fn column_number(&self) -> u32 {
        self.column_number
    }

    /// Function name; `None` for anonymous frames.
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }
}

/// Result of parsing a stack trace.
///
/// Location fields are all present or all absent; partial locations are
/// never produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTrace {
    stack_trace: Option<Box<str>>,
    location: Option<FrameLocation>,
    code: Option<Value>,
}

impl ParsedTrace {
    /// Original trace text, if any was supplied.
    #[must_use]
    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    /// First-frame location.
    #[must_use]
    pub const fn location(&self) -> Option<&FrameLocation> {
        self.location.as_ref()
    }

    /// File of the first frame.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.location.as_ref().map(FrameLocation::file_name)
    }

    /// Line of the first frame.
    #[must_use]
    pub fn line_number(&self) -> Option<u32> {
        self.location.as_ref().map(FrameLocation::line_number)
    }

    /// Column of the first frame.
    #[must_use]
    pub fn column_number(&self) -> Option<u32> {
        self.location.as_ref().map(FrameLocation::column_number)
    }

    /// Function of the first frame.
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        self.location.as_ref().and_then(FrameLocation::function_name)
    }

    /// Error code carried alongside the trace.
    #[must_use]
    pub const fn code(&self) -> Option<&Value> {
        self.code.as_ref()
    }

    /// Attach the error code resolved from the source error.
    #[must_use]
    pub fn with_code(mut self, code: Option<Value>) -> Self {
        self.code = code;
        self
    }
}

/// Parse the first frame beneath the message line of `stack`.
pub fn parse_stack_trace(stack: Option<&str>) -> ParsedTrace {
    let stack_trace = stack.filter(|text| !text.is_empty());
    let Some(text) = stack_trace else {
        return ParsedTrace::default();
    };

    let location = text.lines().skip(1).find_map(parse_frame);
    if location.is_none() {
        tracing::debug!(
            target: "logshape",
            stack_len = text.len(),
            "stack trace has no readable frame"
        );
    }

    ParsedTrace {
        stack_trace: Some(text.into()),
        location,
        code: None,
    }
}

fn parse_frame(line: &str) -> Option<FrameLocation> {
    let frame = line.trim().strip_prefix("at ")?.trim();

    let (function_name, location) = match frame.strip_suffix(')') {
        Some(body) => {
            let open = body.rfind(" (")?;
            let function = body.get(..open)?.trim();
            let location = body.get(open + 2..)?;
            (normalize_function_name(function), location)
        }
        None => (None, frame),
    };

    let (file_name, line_number, column_number) = split_location(location)?;
    Some(FrameLocation {
        file_name: file_name.into(),
        line_number,
        column_number,
        function_name: function_name.map(Into::into),
    })
}

fn normalize_function_name(function: &str) -> Option<&str> {
    let function = function.strip_prefix("async ").unwrap_or(function).trim();
    match function {
        "" | "<anonymous>" => None,
        named => Some(named),
    }
}

fn split_location(location: &str) -> Option<(&str, u32, u32)> {
    // Nested eval frames wrap a second location; they carry no single file.
    if location.contains(['(', ')', ',']) {
        return None;
    }
    let mut parts = location.rsplitn(3, ':');
    let column = parts.next()?.parse::<u32>().ok()?;
    let line = parts.next()?.parse::<u32>().ok()?;
    let file = parts.next().filter(|file| !file.is_empty())?;
    Some((file, line, column))
}
