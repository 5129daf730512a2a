//! # Console Service
//!
//! Redirects script-level logging calls to the host output channel.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: Script code never writes to a stream directly
//! - **Structured arguments**: Every argument is rendered as JSON, so a
//!   string `"1"` and a number `1` never look the same
//! - **Fire-and-forget**: A console call has no result and never fails
//!
//! ## Line format
//!
//! `[out]: ` or `[err]: `, then each argument as JSON joined by a single
//! space, then exactly one newline.

use host_api::HostApi;
use serde_json::Value;
use std::sync::Arc;

pub use serde_json::json;

/// Output stream a console line is tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    /// Normal output (`console.log`)
    Out,
    /// Error output (`console.error`)
    Err,
}

impl ConsoleStream {
    /// Line prefix for this stream
    pub fn tag(&self) -> &'static str {
        match self {
            ConsoleStream::Out => "[out]: ",
            ConsoleStream::Err => "[err]: ",
        }
    }

    /// Whether the host should route the line to its error stream
    pub fn is_error(&self) -> bool {
        matches!(self, ConsoleStream::Err)
    }
}

/// Builds a console argument list from expressions
///
/// Each argument is converted with [`json!`], so anything `Serialize`
/// whose JSON form has string keys can be passed.
///
/// ```
/// use services_console::console_args;
///
/// let args = console_args!("performing task", 3, [1, 2]);
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! console_args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::json!($arg)),*]
    };
}

/// Formats one console line
pub fn format_line(stream: ConsoleStream, args: &[Value]) -> String {
    let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
    let mut line = String::from(stream.tag());
    line.push_str(&rendered.join(" "));
    line.push('\n');
    line
}

/// Console bound to a host
pub struct Console<H: HostApi> {
    host: Arc<H>,
}

impl<H: HostApi> Clone for Console<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
        }
    }
}

impl<H: HostApi> Console<H> {
    /// Creates a console writing through `host`
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    /// Writes one line on the normal stream
    pub fn log(&self, args: &[Value]) {
        self.write(ConsoleStream::Out, args);
    }

    /// Writes one line on the error stream
    pub fn error(&self, args: &[Value]) {
        self.write(ConsoleStream::Err, args);
    }

    /// Writes one line on `stream`
    pub fn write(&self, stream: ConsoleStream, args: &[Value]) {
        self.host.print(&format_line(stream, args), stream.is_error());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use sim_host::SimHost;

    #[test]
    fn test_strings_are_quoted() {
        let line = format_line(ConsoleStream::Out, &console_args!("hello"));
        assert_eq!(line, "[out]: \"hello\"\n");
    }

    #[test]
    fn test_args_joined_by_single_space() {
        let line = format_line(ConsoleStream::Out, &console_args!("a", 1, true, ()));
        assert_eq!(line, "[out]: \"a\" 1 true null\n");
    }

    #[test]
    fn test_string_and_number_are_distinct() {
        let s = format_line(ConsoleStream::Out, &console_args!("1"));
        let n = format_line(ConsoleStream::Out, &console_args!(1));
        assert_ne!(s, n);
    }

    #[test]
    fn test_empty_args_still_one_line() {
        let line = format_line(ConsoleStream::Err, &[]);
        assert_eq!(line, "[err]: \n");
    }

    #[test]
    fn test_exactly_one_trailing_newline() {
        let line = format_line(ConsoleStream::Out, &console_args!("ends with newline\n"));
        assert!(line.ends_with('\n'));
        assert!(!line.ends_with("\n\n"));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_structured_values() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }
        let line = format_line(ConsoleStream::Out, &console_args!(Point { x: 1, y: 2 }));
        assert_eq!(line, "[out]: {\"x\":1,\"y\":2}\n");
    }

    #[test]
    fn test_console_routes_streams() {
        let host = Arc::new(SimHost::new());
        let console = Console::new(Arc::clone(&host));
        console.log(&console_args!("fine"));
        console.error(&console_args!("bad"));

        let printed = host.printed();
        assert_eq!(printed.len(), 2);
        assert!(!printed[0].is_error);
        assert_eq!(printed[0].line, "[out]: \"fine\"\n");
        assert!(printed[1].is_error);
        assert_eq!(printed[1].line, "[err]: \"bad\"\n");
    }
}
