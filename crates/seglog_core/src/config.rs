//! Journal configuration.

/// Record format version written into new journal files.
pub const FORMAT_VERSION: u16 = 1;

/// Configuration for a journal file registry.
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Prefix of journal file names.
    pub file_prefix: String,

    /// Extension of journal file names, without the dot.
    pub file_extension: String,

    /// Format version assigned to newly created files.
    pub format_version: u16,

    /// Id given to the first file created by an empty registry.
    pub first_file_id: u64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            file_prefix: "seglog".to_string(),
            file_extension: "log".to_string(),
            format_version: FORMAT_VERSION,
            first_file_id: 1,
        }
    }
}

impl JournalConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file name prefix.
    #[must_use]
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Sets the file name extension.
    #[must_use]
    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    /// Sets the format version for new files.
    #[must_use]
    pub const fn format_version(mut self, version: u16) -> Self {
        self.format_version = version;
        self
    }

    /// Sets the id of the first allocated file.
    #[must_use]
    pub const fn first_file_id(mut self, id: u64) -> Self {
        self.first_file_id = id;
        self
    }
}
