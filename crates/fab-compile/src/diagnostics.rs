//! Ariadne-based rendering of compile errors.
//!
//! Renders a [`CompileError`] against the wrapped method source it points
//! into. Output is colorless so tests can assert on it directly.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use fab_common::CompileError;

/// Render a compile error into a formatted diagnostic string.
///
/// `source` is the wrapped script the error's span indexes into. Errors
/// without a span label the whole source.
pub fn render(error: &CompileError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();

    let clamp = |r: Range<usize>| -> Range<usize> {
        let start = r.start.min(source_len);
        let end = r.end.min(source_len).max(start);
        // Ariadne needs at least a one-character span.
        if start == end {
            start..end.saturating_add(1).min(source_len)
        } else {
            start..end
        }
    };

    let span = clamp(
        error
            .context
            .span
            .map(|s| s.range())
            .unwrap_or(0..source_len),
    );

    let mut label_message = error.kind.to_string();
    if let Some(method) = &error.context.method {
        label_message = format!("in method `{method}`: {label_message}");
    }

    let report = Report::build(ReportKind::Error, span.clone())
        .with_message(error.kind.to_string())
        .with_config(config)
        .with_label(Label::new(span).with_message(label_message))
        .finish();

    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_common::Span;

    #[test]
    fn render_labels_the_span() {
        let source = "(function () {\ndb.quary(sql)\n})()";
        let offset = source.find("db.quary").unwrap() as u32;
        let err = CompileError::unknown_callee("db.quary")
            .with_span(Span::new(offset, offset + 8))
            .with_method("get");
        let rendered = render(&err, source);
        assert!(rendered.contains("db.quary"), "{rendered}");
        assert!(rendered.contains("known target"), "{rendered}");
    }

    #[test]
    fn render_without_span_covers_source() {
        let err = CompileError::model_lookup("User");
        let rendered = render(&err, "x");
        assert!(rendered.contains("model [User] not found"), "{rendered}");
    }
}
