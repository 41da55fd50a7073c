//! Multipart upload with progress reporting.
//!
//! The file body is streamed in fixed-size chunks; each chunk handed to the
//! transport advances the reported percentage. The callback is borrowed, so
//! percentages travel over a channel and are relayed while the request runs.

use bytes::Bytes;
use insightdesk_core::error::{AppError, AppResult};
use insightdesk_core::gateway::ProgressFn;
use insightdesk_core::models::{PendingFile, UploadReceipt};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::sync::mpsc;

use crate::ApiClient;

pub(crate) const UPLOAD_PATH: &str = "/upload";

const CHUNK_SIZE: usize = 64 * 1024;
const MIB: f64 = 1024.0 * 1024.0;

/// Content type from the file extension, for files picked without one.
pub fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100) / total) as u8
}

/// Body that yields `data` in chunks and reports the running percentage.
fn progress_body(data: Bytes, progress: mpsc::UnboundedSender<u8>) -> Body {
    let total = data.len() as u64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
        .collect();

    let mut sent = 0u64;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        // Receiver gone means the request was abandoned; nothing to report.
        let _ = progress.send(percent(sent, total));
        Ok::<Bytes, std::io::Error>(chunk)
    }));
    Body::wrap_stream(stream)
}

/// Forwards percentages to the caller's callback, never going backwards.
struct Relay<'a> {
    callback: Option<ProgressFn<'a>>,
    last: Option<u8>,
}

impl Relay<'_> {
    fn report(&mut self, pct: u8) {
        if self.last.is_some_and(|last| pct <= last) {
            return;
        }
        self.last = Some(pct);
        if let Some(callback) = self.callback {
            callback(pct);
        }
    }
}

impl ApiClient {
    /// Upload one file to `POST /upload` as the `file` form field.
    pub async fn upload(
        &self,
        file: &PendingFile,
        on_progress: Option<ProgressFn<'_>>,
    ) -> AppResult<UploadReceipt> {
        let size = file.size();
        if size > self.max_upload_bytes() {
            return Err(AppError::PayloadTooLarge(format!(
                "{} is {:.1} MiB; the upload limit is {} MiB",
                file.file_name,
                size as f64 / MIB,
                self.max_upload_bytes() as f64 / MIB
            )));
        }

        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| guess_content_type(&file.file_name).to_string());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let part = Part::stream_with_length(progress_body(file.data.clone(), tx), size)
            .file_name(file.file_name.clone())
            .mime_str(&content_type)
            .map_err(|e| AppError::InvalidInput(format!("Invalid content type '{}': {}", content_type, e)))?;
        let form = Form::new().part("file", part);

        tracing::debug!(
            file_name = %file.file_name,
            size_bytes = size,
            content_type = %content_type,
            "Uploading file"
        );

        let mut relay = Relay {
            callback: on_progress,
            last: None,
        };
        relay.report(0);

        let request = self.post_multipart::<UploadReceipt>(UPLOAD_PATH, form);
        tokio::pin!(request);
        let result = loop {
            tokio::select! {
                result = &mut request => break result,
                Some(pct) = rx.recv() => relay.report(pct),
            }
        };
        while let Ok(pct) = rx.try_recv() {
            relay.report(pct);
        }

        let receipt = result?;
        relay.report(100);

        tracing::info!(
            file_name = %file.file_name,
            reference = %receipt.reference,
            size_bytes = size,
            duplicate = receipt.is_duplicate,
            "File uploaded"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("cover.PNG"), "image/png");
        assert_eq!(guess_content_type("talk.mov"), "video/quicktime");
        assert_eq!(guess_content_type("README"), "application/octet-stream");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 200), 0);
        assert_eq!(percent(100, 200), 50);
        assert_eq!(percent(300, 200), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_relay_is_monotonic() {
        let seen = Mutex::new(Vec::new());
        let record = |pct: u8| seen.lock().unwrap().push(pct);
        let callback: ProgressFn<'_> = &record;
        let mut relay = Relay {
            callback: Some(callback),
            last: None,
        };
        for pct in [0, 30, 30, 20, 80, 100, 100] {
            relay.report(pct);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 30, 80, 100]);
    }
}
