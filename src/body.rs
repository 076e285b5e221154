//! Bounded response-body reading.

use futures_util::StreamExt;
use reqwest::Response;

use crate::Error;

/// Default body ceiling: 5 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Read a response body as text with the default 5 MiB ceiling.
pub async fn read_text(response: Response) -> Result<String, Error> {
    read_text_safe(response, DEFAULT_MAX_BODY_BYTES).await
}

/// Read a response body as text, enforcing a byte ceiling while streaming.
///
/// Bytes are counted per chunk as they arrive; the first chunk that would
/// push the total over `max_bytes` aborts the stream and fails with
/// [`Error::ResponseTooLarge`]. The body is never buffered whole before the
/// check, and there is no silent truncation: a caller either gets the
/// complete text or an error.
///
/// A `Content-Length` header that already exceeds the ceiling fails fast,
/// but the per-chunk count still applies since the header can lie.
///
/// On success the bytes are decoded as UTF-8, replacing invalid sequences.
/// The response body is exhausted after this call.
pub async fn read_text_safe(response: Response, max_bytes: usize) -> Result<String, Error> {
    let url = response.url().to_string();

    if let Some(len) = response.content_length() {
        if len > max_bytes as u64 {
            return Err(Error::ResponseTooLarge {
                url,
                limit: max_bytes,
            });
        }
    }

    let capacity = response
        .content_length()
        .map(|len| (len as usize).min(max_bytes))
        .unwrap_or(8 * 1024);
    let mut buf = Vec::with_capacity(capacity);

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::transport(&url, e.to_string()))?;
        if buf.len() + chunk.len() > max_bytes {
            // Dropping the stream cancels the in-flight body.
            return Err(Error::ResponseTooLarge {
                url,
                limit: max_bytes,
            });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
