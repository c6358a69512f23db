//! Static HTML data docs.
//!
//! The site is an `index.html` listing every validation run plus one page per
//! validation result under `validations/`. Pages are written with the
//! `quick-xml` writer so every value is escaped.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use dq_model::{ExpectationValidationResult, ValidationResult};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tracing::info;

use crate::error::{ReportError, Result};
use crate::key::ResultKey;

pub const INDEX_FILE: &str = "index.html";
pub const VALIDATIONS_DIR: &str = "validations";

const STYLE: &str = "body { font-family: sans-serif; margin: 2em; }\n\
table { border-collapse: collapse; }\n\
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; vertical-align: top; }\n\
.passed { color: #1a7f37; }\n\
.failed { color: #cf222e; }\n";

struct HtmlDoc {
    path: PathBuf,
    xml: Writer<Vec<u8>>,
}

impl HtmlDoc {
    fn new(path: &Path) -> Result<Self> {
        let mut buffer = Vec::new();
        buffer
            .write_all(b"<!DOCTYPE html>\n")
            .map_err(|e| ReportError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            xml: Writer::new_with_indent(buffer, b' ', 2),
        })
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.xml
            .write_event(event)
            .map_err(|e| ReportError::Render {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(tag);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        self.event(Event::Start(start))
    }

    fn close(&mut self, tag: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    fn text_element(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.open(tag, attrs)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.close(tag)
    }

    fn head(&mut self, title: &str) -> Result<()> {
        self.open("html", &[("lang", "en")])?;
        self.open("head", &[])?;
        self.event(Event::Empty(BytesStart::new("meta").with_attributes([("charset", "utf-8")])))?;
        self.text_element("title", &[], title)?;
        self.text_element("style", &[], STYLE)?;
        self.close("head")?;
        self.open("body", &[])
    }

    fn row(&mut self, cells: &[&str], header: bool) -> Result<()> {
        let tag = if header { "th" } else { "td" };
        self.open("tr", &[])?;
        for cell in cells {
            self.text_element(tag, &[], cell)?;
        }
        self.close("tr")
    }

    fn finish(mut self) -> Result<()> {
        self.close("body")?;
        self.close("html")?;
        let path = self.path;
        let mut bytes = self.xml.into_inner();
        bytes.push(b'\n');
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
        }
        fs::write(&path, bytes).map_err(|e| ReportError::io(&path, e))
    }
}

fn status_label(success: bool) -> (&'static str, &'static str) {
    if success {
        ("passed", "Passed")
    } else {
        ("failed", "Failed")
    }
}

/// A local docs site rooted at one directory.
#[derive(Debug, Clone)]
pub struct DataDocsSite {
    site_dir: PathBuf,
}

impl DataDocsSite {
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_dir: site_dir.into(),
        }
    }

    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.site_dir.join(INDEX_FILE)
    }

    fn page_relative(result: &ValidationResult) -> PathBuf {
        Path::new(VALIDATIONS_DIR).join(ResultKey::for_result(result).relative_path("html"))
    }

    pub fn page_path(&self, result: &ValidationResult) -> PathBuf {
        self.site_dir.join(Self::page_relative(result))
    }

    /// Render one page per result and an index over all of them.
    ///
    /// Results are listed newest first. Returns the index path.
    pub fn build(&self, results: &[ValidationResult]) -> Result<PathBuf> {
        let mut ordered: Vec<&ValidationResult> = results.iter().collect();
        ordered.sort_by(|a, b| {
            b.run_id
                .run_time
                .cmp(&a.run_id.run_time)
                .then_with(|| a.expectation_suite_name.cmp(&b.expectation_suite_name))
                .then_with(|| a.batch_id.cmp(&b.batch_id))
        });

        for result in &ordered {
            self.write_validation_page(result)?;
        }
        let index = self.index_path();
        self.write_index(&index, &ordered)?;
        info!(
            index = %index.display(),
            pages = ordered.len(),
            "data docs rebuilt"
        );
        Ok(index)
    }

    fn write_index(&self, path: &Path, results: &[&ValidationResult]) -> Result<()> {
        let mut doc = HtmlDoc::new(path)?;
        doc.head("Data docs")?;
        doc.text_element("h1", &[], "Validation results")?;
        if results.is_empty() {
            doc.text_element("p", &[], "No validation results yet.")?;
            return doc.finish();
        }

        doc.open("table", &[])?;
        doc.row(
            &["Run time", "Run name", "Expectation suite", "Data asset", "Status", "Successful"],
            true,
        )?;
        for result in results {
            let run_time = result
                .run_id
                .run_time
                .to_rfc3339_opts(SecondsFormat::Secs, true);
            let (class, label) = status_label(result.success);
            let link = Self::page_relative(result)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let ratio = format!(
                "{} / {}",
                result.statistics.successful_expectations,
                result.statistics.evaluated_expectations
            );

            doc.open("tr", &[])?;
            doc.open("td", &[])?;
            doc.text_element("a", &[("href", link.as_str())], &run_time)?;
            doc.close("td")?;
            doc.text_element("td", &[], &result.run_id.run_name)?;
            doc.text_element("td", &[], &result.expectation_suite_name)?;
            doc.text_element("td", &[], &result.data_asset_name)?;
            doc.text_element("td", &[("class", class)], label)?;
            doc.text_element("td", &[], &ratio)?;
            doc.close("tr")?;
        }
        doc.close("table")?;
        doc.finish()
    }

    fn write_validation_page(&self, result: &ValidationResult) -> Result<()> {
        let path = self.page_path(result);
        let depth = Self::page_relative(result).components().count() - 1;
        let back = format!("{}{INDEX_FILE}", "../".repeat(depth));

        let mut doc = HtmlDoc::new(&path)?;
        doc.head(&result.expectation_suite_name)?;
        doc.open("p", &[])?;
        doc.text_element("a", &[("href", back.as_str())], "All results")?;
        doc.close("p")?;
        doc.text_element("h1", &[], &result.expectation_suite_name)?;

        let (class, label) = status_label(result.success);
        let percent = result
            .statistics
            .success_percent
            .map(|p| format!("{p:.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        let run_time = result
            .run_id
            .run_time
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        let evaluated = result.statistics.evaluated_expectations.to_string();
        let successful = result.statistics.successful_expectations.to_string();
        let unsuccessful = result.statistics.unsuccessful_expectations.to_string();

        doc.open("table", &[])?;
        doc.open("tr", &[])?;
        doc.text_element("th", &[], "Status")?;
        doc.text_element("td", &[("class", class)], label)?;
        doc.close("tr")?;
        for (name, value) in [
            ("Run name", result.run_id.run_name.as_str()),
            ("Run time", run_time.as_str()),
            ("Data asset", result.data_asset_name.as_str()),
            ("Batch", result.batch_id.as_str()),
            ("Evaluated expectations", evaluated.as_str()),
            ("Successful expectations", successful.as_str()),
            ("Unsuccessful expectations", unsuccessful.as_str()),
            ("Success percent", percent.as_str()),
        ] {
            doc.row(&[name, value], false)?;
        }
        doc.close("table")?;

        doc.text_element("h2", &[], "Expectations")?;
        doc.open("table", &[])?;
        doc.row(
            &[
                "Status",
                "Expectation",
                "Column",
                "Arguments",
                "Observed",
                "Unexpected",
                "Sample unexpected values",
            ],
            true,
        )?;
        for outcome in &result.results {
            expectation_row(&mut doc, outcome)?;
        }
        doc.close("table")?;
        doc.finish()
    }
}

fn expectation_row(doc: &mut HtmlDoc, outcome: &ExpectationValidationResult) -> Result<()> {
    let (class, label) = status_label(outcome.success);
    let mut kwargs = outcome.expectation_config.kwargs.clone();
    kwargs.remove("column");
    let arguments = if kwargs.is_empty() {
        String::new()
    } else {
        serde_json::Value::Object(kwargs).to_string()
    };
    let observed = match (&outcome.result.observed_value, &outcome.exception_info.exception_message) {
        (_, Some(message)) if outcome.exception_info.raised_exception => message.clone(),
        (Some(value), _) => value.to_string(),
        (None, _) => String::new(),
    };
    let unexpected = if outcome.result.element_count == 0 && outcome.result.unexpected_count == 0 {
        String::new()
    } else {
        format!(
            "{} ({:.2}%)",
            outcome.result.unexpected_count, outcome.result.unexpected_percent
        )
    };
    let samples = outcome.result.partial_unexpected_list.join(", ");

    doc.open("tr", &[])?;
    doc.text_element("td", &[("class", class)], label)?;
    doc.text_element("td", &[], &outcome.expectation_config.expectation_type)?;
    doc.text_element("td", &[], outcome.column().unwrap_or(""))?;
    doc.text_element("td", &[], &arguments)?;
    doc.text_element("td", &[], &observed)?;
    doc.text_element("td", &[], &unexpected)?;
    doc.text_element("td", &[], &samples)?;
    doc.close("tr")
}
