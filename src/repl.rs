//! Interactive read-eval-print loop.
//!
//! The loop is generic over its reader, writers, and query handler so tests
//! can drive it with in-memory buffers. A failed query prints an error and
//! the loop keeps going; only an empty line, an exit word, or end of input
//! stops it.

use std::io::{BufRead, Write};

use crate::error::Result;

const PROMPT: &str = "> ";
const EXIT_WORDS: &[&str] = &["exit", "quit"];

/// Run the REPL until the input ends or the user leaves.
///
/// # Errors
///
/// Returns an error only for I/O failures on the reader or writers.
/// Handler errors are printed to `err` and the loop continues.
pub async fn run_loop<R, O, E, F, Fut>(
    mut input: R,
    out: &mut O,
    err: &mut E,
    mut handle: F,
) -> Result<()>
where
    R: BufRead,
    O: Write,
    E: Write,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let query = line.trim();
        if query.is_empty() || EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            break;
        }

        match handle(query.to_owned()).await {
            Ok(answer) => writeln!(out, "{}", format_answer(&answer))?,
            Err(e) => writeln!(err, "Error: {e}")?,
        }
    }
    Ok(())
}

/// Pretty-print answers that are JSON objects or arrays; pass everything
/// else through untouched.
#[must_use]
pub fn format_answer(answer: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(answer) {
        Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| answer.to_owned())
        }
        _ => answer.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{Error, ToolError};
    use crate::tools::calculator;
    use std::cell::Cell;
    use std::io::Cursor;

    fn arithmetic_handler(
        calls: &Cell<usize>,
    ) -> impl FnMut(String) -> std::future::Ready<Result<String>> {
        move |query: String| {
            calls.set(calls.get() + 1);
            let result = calculator::evaluate(&query)
                .map(calculator::format_number)
                .map_err(Error::Tool);
            std::future::ready(result)
        }
    }

    #[tokio::test]
    async fn errors_do_not_stop_the_loop() {
        let calls = Cell::new(0);
        let input = Cursor::new("2+2\nbad(\n3*3\n");
        let mut out = Vec::new();
        let mut err = Vec::new();

        run_loop(input, &mut out, &mut err, arithmetic_handler(&calls))
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        let err = String::from_utf8(err).unwrap();

        assert_eq!(calls.get(), 3);
        assert!(out.contains("4\n"));
        assert!(out.contains("9\n"));
        assert!(err.contains("Error:"));
        assert!(err.contains("Invalid expression"));
    }

    #[tokio::test]
    async fn empty_line_exits() {
        let calls = Cell::new(0);
        let input = Cursor::new("1+1\n\n5*5\n");
        let mut out = Vec::new();
        let mut err = Vec::new();

        run_loop(input, &mut out, &mut err, arithmetic_handler(&calls))
            .await
            .unwrap();

        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn exit_words_exit() {
        for word in ["exit", "quit", "EXIT"] {
            let calls = Cell::new(0);
            let input = Cursor::new(format!("{word}\n1+1\n"));
            let mut out = Vec::new();
            let mut err = Vec::new();

            run_loop(input, &mut out, &mut err, arithmetic_handler(&calls))
                .await
                .unwrap();

            assert_eq!(calls.get(), 0, "{word} should exit before any query");
        }
    }

    #[tokio::test]
    async fn eof_exits_cleanly() {
        let calls = Cell::new(0);
        let mut out = Vec::new();
        let mut err = Vec::new();

        run_loop(
            Cursor::new(""),
            &mut out,
            &mut err,
            arithmetic_handler(&calls),
        )
        .await
        .unwrap();

        assert_eq!(calls.get(), 0);
        assert!(String::from_utf8(out).unwrap().starts_with(PROMPT));
    }

    #[tokio::test]
    async fn prompt_appears_before_each_line() {
        let calls = Cell::new(0);
        let input = Cursor::new("1+1\n2+2\n");
        let mut out = Vec::new();
        let mut err = Vec::new();

        run_loop(input, &mut out, &mut err, arithmetic_handler(&calls))
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches(PROMPT).count(), 3);
    }

    #[tokio::test]
    async fn handler_error_variants_are_printed() {
        let input = Cursor::new("anything\n");
        let mut out = Vec::new();
        let mut err = Vec::new();

        run_loop(input, &mut out, &mut err, |_query: String| {
            std::future::ready(Err(Error::Tool(ToolError::lookup("API down"))))
        })
        .await
        .unwrap();

        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("Lookup failed"));
    }

    mod format_answer {
        use super::*;

        #[test]
        fn json_objects_are_pretty_printed() {
            let formatted = format_answer(r#"{"query":"x","potions":[]}"#);
            assert!(formatted.contains("\n"));
            assert!(formatted.contains("\"query\""));
        }

        #[test]
        fn plain_text_is_untouched() {
            assert_eq!(format_answer("The answer is 42"), "The answer is 42");
        }

        #[test]
        fn bare_numbers_are_untouched() {
            assert_eq!(format_answer("42"), "42");
        }
    }
}
