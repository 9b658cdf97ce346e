//! Page and script reading
//!
//! Provides consistent handling for:
//! - Non-UTF-8 files
//! - Oversized files
//! - Binary files
//!
//! Pages are never truncated: a cut page would move comments away from the
//! elements they annotate.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::model::{ResultItem, TraceIssue};

/// Default maximum file size in bytes (64 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Strategy for handling non-UTF-8 content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingStrategy {
    /// Skip non-UTF-8 files entirely
    Skip,
    /// Use lossy conversion (replace invalid bytes with U+FFFD)
    #[default]
    Lossy,
}

/// Configuration for file reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReadConfig {
    /// Files larger than this are skipped
    pub max_file_size: u64,

    /// How to handle non-UTF-8 content
    pub encoding_strategy: EncodingStrategy,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            encoding_strategy: EncodingStrategy::Lossy,
        }
    }
}

/// Result of reading a file
#[derive(Debug, Clone)]
pub struct FileReadResult {
    /// The file content (if successfully read)
    pub content: Option<String>,

    /// Whether lossy conversion was used
    pub lossy_conversion: bool,

    /// Warnings generated during reading
    pub warnings: Vec<FileWarning>,

    /// Reason for skipping (if skipped)
    pub skip_reason: Option<String>,
}

impl FileReadResult {
    /// Create a successful read result
    pub fn success(content: String) -> Self {
        Self {
            content: Some(content),
            lossy_conversion: false,
            warnings: Vec::new(),
            skip_reason: None,
        }
    }

    /// Create a skipped result
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            content: None,
            lossy_conversion: false,
            warnings: Vec::new(),
            skip_reason: Some(reason.into()),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.content.is_none()
    }

    /// Mark as lossy conversion
    pub fn with_lossy(mut self) -> Self {
        self.lossy_conversion = true;
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, warning: FileWarning) -> Self {
        self.warnings.push(warning);
        self
    }
}

/// Warning codes for file operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    /// File was skipped due to size
    FileSkippedSize,
    /// File was skipped due to encoding
    FileSkippedEncoding,
    /// Lossy encoding conversion used
    LossyConversion,
    /// File appears to be binary
    BinaryFile,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::FileSkippedSize => "FILE_SKIPPED_SIZE",
            WarningCode::FileSkippedEncoding => "FILE_SKIPPED_ENCODING",
            WarningCode::LossyConversion => "LOSSY_CONVERSION",
            WarningCode::BinaryFile => "BINARY_FILE",
        }
    }
}

/// A structured warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWarning {
    pub code: WarningCode,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FileWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Convert to an issue item for lint output
    pub fn to_result_item(&self) -> ResultItem {
        let mut item = ResultItem::issue(TraceIssue::new(self.code.as_str(), &self.message));
        item.path = self.path.clone();
        item
    }
}

/// Read a file with the given configuration
pub fn read_file_with_config(path: &Path, config: &FileReadConfig) -> FileReadResult {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            return FileReadResult::skipped(format!("Cannot read metadata: {}", e));
        }
    };

    let file_size = metadata.len();
    if file_size > config.max_file_size {
        let warning = FileWarning::new(
            WarningCode::FileSkippedSize,
            format!(
                "File exceeds size limit ({} > {} bytes)",
                file_size, config.max_file_size
            ),
        )
        .with_path(path.display().to_string());
        return FileReadResult::skipped(format!(
            "File size {} exceeds limit {}",
            file_size, config.max_file_size
        ))
        .with_warning(warning);
    }

    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            return FileReadResult::skipped(format!("Cannot read file: {}", e));
        }
    };

    // Null bytes in the first 8KB mean this is not markup
    let check_len = std::cmp::min(8192, bytes.len());
    if bytes[..check_len].contains(&0) {
        let warning = FileWarning::new(
            WarningCode::BinaryFile,
            "File appears to be binary (contains null bytes)",
        )
        .with_path(path.display().to_string());
        return FileReadResult::skipped("Binary file").with_warning(warning);
    }

    match String::from_utf8(bytes) {
        Ok(content) => FileReadResult::success(content),
        Err(e) => match config.encoding_strategy {
            EncodingStrategy::Skip => {
                let warning = FileWarning::new(
                    WarningCode::FileSkippedEncoding,
                    "File contains invalid UTF-8 sequences",
                )
                .with_path(path.display().to_string());
                FileReadResult::skipped("Invalid UTF-8").with_warning(warning)
            }
            EncodingStrategy::Lossy => {
                let content = String::from_utf8_lossy(e.as_bytes()).into_owned();
                let warning = FileWarning::new(
                    WarningCode::LossyConversion,
                    "Lossy UTF-8 conversion applied (some characters replaced)",
                )
                .with_path(path.display().to_string());
                FileReadResult::success(content)
                    .with_lossy()
                    .with_warning(warning)
            }
        },
    }
}

/// Convenience function with default config
pub fn read_file_safe(path: &Path) -> FileReadResult {
    read_file_with_config(path, &FileReadConfig::default())
}

/// Read a file for a command, failing with the skip reason.
///
/// Warnings are logged, the content is returned as is.
pub fn read_required(path: &Path) -> anyhow::Result<String> {
    let result = read_file_safe(path);
    for warning in &result.warnings {
        tracing::warn!(code = warning.code.as_str(), path = %path.display(), "{}", warning.message);
    }
    match result.content {
        Some(content) => Ok(content),
        None => anyhow::bail!(
            "Cannot read {:?}: {}",
            path,
            result.skip_reason.unwrap_or_else(|| "unknown reason".to_string())
        ),
    }
}

/// Read a page found while walking a directory.
///
/// Size and encoding problems come back as warnings on the result so the walk
/// can continue; a file that cannot be read at all is an error.
pub fn read_lenient(path: &Path) -> anyhow::Result<FileReadResult> {
    let result = read_file_safe(path);
    if result.is_skipped() && result.warnings.is_empty() {
        anyhow::bail!(
            "Cannot read {:?}: {}",
            path,
            result.skip_reason.unwrap_or_else(|| "unknown reason".to_string())
        );
    }
    Ok(result)
}
