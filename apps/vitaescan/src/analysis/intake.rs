//! Pending résumé list: PDF-only, unique by filename.

use bytes::Bytes;

pub const PDF_MIME: &str = "application/pdf";

/// A résumé waiting to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl PendingFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Media type check only; parameters such as `; charset=` are ignored.
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .split(';')
            .next()
            .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME))
            .unwrap_or(false)
    }
}

/// What happened to one `FileIntake::add` batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntakeReport {
    pub accepted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

impl IntakeReport {
    /// Count-only message for rejected non-PDF files, if any.
    pub fn rejection_message(&self) -> Option<String> {
        (self.rejected > 0).then(|| format!("Algunos archivos no eran PDF: {}", self.rejected))
    }
}

#[derive(Debug, Default)]
pub struct FileIntake {
    files: Vec<PendingFile>,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every PDF whose name is not already pending. Non-PDF files are
    /// counted, never stored.
    pub fn add(&mut self, incoming: impl IntoIterator<Item = PendingFile>) -> IntakeReport {
        let mut report = IntakeReport::default();
        for file in incoming {
            if !file.is_pdf() {
                report.rejected += 1;
            } else if self.files.iter().any(|f| f.name == file.name) {
                report.duplicates += 1;
            } else {
                self.files.push(file);
                report.accepted += 1;
            }
        }
        report
    }

    pub fn files(&self) -> &[PendingFile] {
        &self.files
    }
}
