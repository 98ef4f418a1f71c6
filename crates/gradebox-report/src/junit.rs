//! Forward-only scan of a JUnit XML report.
//!
//! One report is one XML document. The scan walks structural events with a
//! pull reader and never builds a document tree, so memory stays bounded
//! per entry regardless of report size. No state survives across reports.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{ReportError, Result};
use crate::model::TestCase;

/// Element that opens a report document.
const SUITE_ELEMENT: &[u8] = b"testsuite";
/// Element describing one test case.
const CASE_ELEMENT: &[u8] = b"testcase";
/// Nested element marking a test case as failed.
const FAILURE_ELEMENT: &[u8] = b"failure";

/// A fully scanned report document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    /// The suite's timestamp attribute, verbatim; `None` when absent.
    pub timestamp: Option<String>,
    /// Test cases in document order.
    pub cases: Vec<TestCase>,
}

/// Returns whether an archive entry path names a JUnit report file.
#[must_use]
pub fn is_report_file(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name.starts_with(gradebox_common::constants::REPORT_FILE_PREFIX)
        && file_name.ends_with(gradebox_common::constants::REPORT_FILE_SUFFIX)
}

/// Scans one report document from a byte stream.
///
/// The first structural start element must be a testsuite; each testcase
/// found below it becomes a [`TestCase`]. Unrecognized elements are
/// skipped, not rejected.
///
/// # Errors
///
/// - [`ReportError::UnexpectedStructure`] if the document opens with
///   anything other than a testsuite element.
/// - [`ReportError::MissingName`] if a testcase has no name attribute.
/// - [`ReportError::MalformedReport`] on structurally invalid XML.
pub fn parse_report<R: BufRead>(stream: R) -> Result<TestReport> {
    let mut reader = Reader::from_reader(stream);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let (timestamp, suite_has_children) = read_suite_open(&mut reader, &mut buf)?;

    let mut cases = Vec::new();
    if suite_has_children {
        loop {
            buf.clear();
            match read_event(&mut reader, &mut buf)? {
                Event::Start(element) if element.local_name().as_ref() == CASE_ELEMENT => {
                    let name = required_name(&element)?;
                    cases.push(scan_case(&mut reader, name)?);
                }
                Event::Empty(element) if element.local_name().as_ref() == CASE_ELEMENT => {
                    // Self-closing testcase: nothing nested, so it passed.
                    cases.push(TestCase::passed(required_name(&element)?));
                }
                Event::Eof => break,
                _ => {}
            }
        }
    }

    tracing::debug!(cases = cases.len(), "report scanned");
    Ok(TestReport { timestamp, cases })
}

/// Advances to the first structural start element and validates it names a
/// testsuite. Returns the suite's timestamp and whether the suite element
/// can contain children (false for a self-closing suite).
fn read_suite_open<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
) -> Result<(Option<String>, bool)> {
    loop {
        buf.clear();
        match read_event(reader, buf)? {
            Event::Start(element) => {
                expect_suite(&element)?;
                return Ok((attribute_value(&element, "timestamp")?, true));
            }
            Event::Empty(element) => {
                expect_suite(&element)?;
                return Ok((attribute_value(&element, "timestamp")?, false));
            }
            Event::Eof => {
                return Err(ReportError::UnexpectedStructure {
                    found: "end of document".into(),
                });
            }
            _ => {}
        }
    }
}

fn expect_suite(element: &BytesStart<'_>) -> Result<()> {
    if element.local_name().as_ref() == SUITE_ELEMENT {
        Ok(())
    } else {
        Err(ReportError::UnexpectedStructure {
            found: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
        })
    }
}

/// Scans the inside of one testcase element until its end tag.
///
/// A directly nested failure element decides the outcome; any other nested
/// element is skipped wholesale.
fn scan_case<R: BufRead>(reader: &mut Reader<R>, name: String) -> Result<TestCase> {
    let mut buf = Vec::new();
    let mut failure_messages: Option<Vec<String>> = None;
    let mut depth = 0usize;

    loop {
        buf.clear();
        match read_event(reader, &mut buf)? {
            Event::Start(element) => {
                if depth == 0
                    && failure_messages.is_none()
                    && element.local_name().as_ref() == FAILURE_ELEMENT
                {
                    failure_messages = Some(failure_message_list(&element)?);
                }
                depth += 1;
            }
            Event::Empty(element) => {
                if depth == 0
                    && failure_messages.is_none()
                    && element.local_name().as_ref() == FAILURE_ELEMENT
                {
                    failure_messages = Some(failure_message_list(&element)?);
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(ReportError::MalformedReport {
                    message: format!("document ended inside testcase {name:?}"),
                });
            }
            _ => {}
        }
    }

    Ok(match failure_messages {
        Some(messages) => TestCase::failed(name, messages),
        None => TestCase::passed(name),
    })
}

/// The failure message attribute as a list: one element when present,
/// empty when the attribute is legitimately absent.
fn failure_message_list(element: &BytesStart<'_>) -> Result<Vec<String>> {
    Ok(attribute_value(element, "message")?
        .map(|message| vec![message])
        .unwrap_or_default())
}

fn required_name(element: &BytesStart<'_>) -> Result<String> {
    attribute_value(element, "name")?.ok_or(ReportError::MissingName)
}

fn attribute_value(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let attribute = element
        .try_get_attribute(name)
        .map_err(|e| ReportError::MalformedReport {
            message: e.to_string(),
        })?;
    attribute
        .map(|a| {
            a.unescape_value()
                .map(std::borrow::Cow::into_owned)
                .map_err(|e| ReportError::MalformedReport {
                    message: e.to_string(),
                })
        })
        .transpose()
}

fn read_event<'b, R: BufRead>(
    reader: &mut Reader<R>,
    buf: &'b mut Vec<u8>,
) -> Result<Event<'b>> {
    reader
        .read_event_into(buf)
        .map_err(|e| ReportError::MalformedReport {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestOutcome;

    fn parse(xml: &str) -> Result<TestReport> {
        parse_report(xml.as_bytes())
    }

    #[test]
    fn report_file_naming_convention() {
        assert!(is_report_file("test/TEST-CalculatorTest.xml"));
        assert!(is_report_file("TEST-CalculatorTest.xml"));
        assert!(!is_report_file("test/TEST-CalculatorTest.txt"));
        assert!(!is_report_file("test/NOTES-CalculatorTest.xml"));
        assert!(!is_report_file("test/binary-results.bin"));
    }

    #[test]
    fn passing_case_without_children() {
        let report = parse(
            r#"<?xml version="1.0"?>
<testsuite name="CalculatorTest" timestamp="2026-02-11T10:54:31">
  <testcase name="testAdd" classname="CalculatorTest" time="0.01"/>
</testsuite>"#,
        )
        .expect("parse");

        assert_eq!(report.timestamp.as_deref(), Some("2026-02-11T10:54:31"));
        assert_eq!(report.cases, vec![TestCase::passed("testAdd")]);
    }

    #[test]
    fn failing_case_with_message() {
        let report = parse(
            r#"<testsuite name="S" timestamp="t">
  <testcase name="testDiv">
    <failure message="division by zero" type="java.lang.ArithmeticException">stack</failure>
  </testcase>
</testsuite>"#,
        )
        .expect("parse");

        assert_eq!(
            report.cases,
            vec![TestCase::failed("testDiv", vec!["division by zero".into()])]
        );
    }

    #[test]
    fn failing_case_without_message_has_empty_list() {
        let report = parse(
            r#"<testsuite name="S">
  <testcase name="testDiv"><failure type="AssertionError"/></testcase>
</testsuite>"#,
        )
        .expect("parse");

        let case = &report.cases[0];
        assert_eq!(case.outcome, TestOutcome::Failed);
        assert!(case.messages.is_empty());
    }

    #[test]
    fn non_failure_children_are_ignored() {
        let report = parse(
            r#"<testsuite name="S">
  <testcase name="testLog">
    <system-out>noise</system-out>
  </testcase>
  <testcase name="testWarn">
    <system-err>more noise</system-err>
    <failure message="boom"/>
  </testcase>
</testsuite>"#,
        )
        .expect("parse");

        assert_eq!(
            report.cases,
            vec![
                TestCase::passed("testLog"),
                TestCase::failed("testWarn", vec!["boom".into()]),
            ]
        );
    }

    #[test]
    fn mixed_outcomes_keep_document_order() {
        let report = parse(
            r#"<testsuite name="S" timestamp="2026-02-11T10:54:31">
  <testcase name="a"/>
  <testcase name="b"><failure message="x"/></testcase>
  <testcase name="c"/>
</testsuite>"#,
        )
        .expect("parse");

        let names: Vec<&str> = report.cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(report.cases[1].is_failed());
    }

    #[test]
    fn missing_timestamp_is_none() {
        let report = parse(r#"<testsuite name="S"><testcase name="a"/></testsuite>"#)
            .expect("parse");
        assert_eq!(report.timestamp, None);
    }

    #[test]
    fn wrong_root_element_is_rejected_by_name() {
        let err = parse(r"<report><testcase name='a'/></report>").unwrap_err();
        match err {
            ReportError::UnexpectedStructure { found } => assert_eq!(found, "report"),
            other => panic!("expected UnexpectedStructure, got {other}"),
        }
    }

    #[test]
    fn testcase_without_name_is_rejected() {
        let err = parse(r#"<testsuite name="S"><testcase time="1"/></testsuite>"#).unwrap_err();
        assert!(matches!(err, ReportError::MissingName));
    }

    #[test]
    fn unbalanced_document_is_malformed() {
        let err = parse(r#"<testsuite name="S"><testcase name="a"><failure>"#).unwrap_err();
        assert!(matches!(err, ReportError::MalformedReport { .. }));
    }

    #[test]
    fn mismatched_end_tag_is_malformed() {
        let err =
            parse(r#"<testsuite name="S"><testcase name="a"></wrong></testsuite>"#).unwrap_err();
        assert!(matches!(err, ReportError::MalformedReport { .. }));
    }

    #[test]
    fn parsing_is_idempotent() {
        let xml = r#"<testsuite name="S" timestamp="2026-02-11T10:54:31">
  <testcase name="a"/>
  <testcase name="b"><failure message="x"/></testcase>
</testsuite>"#;

        let first = parse(xml).expect("first parse");
        let second = parse(xml).expect("second parse");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_suite_yields_no_cases() {
        let report = parse(r#"<testsuite name="S" timestamp="t"/>"#).expect("parse");
        assert_eq!(report.timestamp.as_deref(), Some("t"));
        assert!(report.cases.is_empty());
    }
}
