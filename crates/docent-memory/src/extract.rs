use docent_core::{DocentError, DocentResult};
use std::time::Duration;
use tracing::info;

/// Upper bound on PDF text extraction, which can stall on unusual fonts.
const PDF_TIMEOUT: Duration = Duration::from_secs(60);

/// Document formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.pdf`, extracted with `pdf-extract`.
    Pdf,
    /// `.txt`, decoded as UTF-8 (lossily).
    Text,
}

impl FileKind {
    /// Detect the kind from the file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> DocentResult<Self> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "txt" => Ok(FileKind::Text),
            _ => Err(DocentError::UnsupportedFile(
                "Only PDF and TXT files are supported".to_string(),
            )),
        }
    }
}

/// Extract the plain text of an uploaded file.
///
/// Fails with `UnsupportedFile` for other extensions and `InvalidInput` when
/// the file yields no text.
pub async fn extract_text(file_name: &str, bytes: Vec<u8>) -> DocentResult<String> {
    let kind = FileKind::from_file_name(file_name)?;

    let text = match kind {
        FileKind::Text => String::from_utf8(bytes)
            .map_err(|e| DocentError::InvalidInput(format!("File is not valid UTF-8: {e}")))?,
        FileKind::Pdf => extract_pdf(bytes).await?,
    };

    if text.trim().is_empty() {
        return Err(DocentError::InvalidInput(
            "No text could be extracted from the document".to_string(),
        ));
    }

    info!(file_name, kind = ?kind, chars = text.chars().count(), "Extracted document text");
    Ok(text)
}

async fn extract_pdf(bytes: Vec<u8>) -> DocentResult<String> {
    let task = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes));

    match tokio::time::timeout(PDF_TIMEOUT, task).await {
        Ok(Ok(Ok(text))) => Ok(text),
        Ok(Ok(Err(e))) => Err(DocentError::InvalidInput(format!("Failed to read PDF: {e}"))),
        Ok(Err(e)) => Err(DocentError::InvalidInput(format!("PDF extraction aborted: {e}"))),
        Err(_) => Err(DocentError::Timeout("PDF extraction".to_string())),
    }
}
