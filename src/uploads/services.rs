use anyhow::Context;
use bytes::Bytes;
use time::OffsetDateTime;

use crate::storage::StorageClient;

pub struct UploadItem {
    pub original_name: Option<String>,
    pub body: Bytes,
}

/// `<unix-millis><original name>`, with the original reduced to a safe basename.
pub fn generate_filename(original: Option<&str>, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    format!("{millis}{}", sanitize_name(original))
}

fn sanitize_name(original: Option<&str>) -> String {
    let base = original
        .map(|n| n.rsplit(['/', '\\']).next().unwrap_or(n))
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or("upload");
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub async fn store_upload(storage: &dyn StorageClient, item: UploadItem) -> anyhow::Result<String> {
    let filename = generate_filename(item.original_name.as_deref(), OffsetDateTime::now_utc());
    storage
        .put_object(&filename, item.body)
        .await
        .with_context(|| format!("store upload {filename}"))?;
    Ok(filename)
}
