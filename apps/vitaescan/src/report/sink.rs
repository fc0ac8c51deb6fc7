/// Receives the finished report. Called exactly once per successful build.
pub trait ReportSink {
    fn save(&mut self, bytes: Vec<u8>, filename: String);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Holds the saved report in memory so the HTTP layer can return it as an attachment.
#[derive(Debug, Default)]
pub struct DownloadSink {
    saved: Option<SavedReport>,
    saves: usize,
}

impl DownloadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn into_saved(self) -> Option<SavedReport> {
        self.saved
    }
}

impl ReportSink for DownloadSink {
    fn save(&mut self, bytes: Vec<u8>, filename: String) {
        self.saves += 1;
        self.saved = Some(SavedReport { bytes, filename });
    }
}
