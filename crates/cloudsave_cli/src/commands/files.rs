//! Blob file round trip.

use super::{CliError, LocalCloud};
use cloudsave_client::{FileMetadata, StatusReporter};
use std::fs;
use std::path::Path;

/// Uploads a local file, inspects it remotely, downloads it to `output`
/// and deletes the remote copy unless `keep` is set.
///
/// The remote name defaults to the input's file name.
pub async fn roundtrip(
    cloud: &LocalCloud,
    reporter: &StatusReporter,
    input: &Path,
    key: Option<&str>,
    output: &Path,
    keep: bool,
) -> Result<FileMetadata, CliError> {
    let key = match key {
        Some(key) => key.to_string(),
        None => input
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| CliError::Usage(format!("cannot name {}", input.display())))?,
    };
    let data = fs::read(input)?;
    let files = cloud.files();

    let uploaded = files.upload(&key, data).await;
    reporter.report("Upload", &uploaded, |_| format!("Uploaded {}", key));
    uploaded?;

    let metadata = files.metadata(&key).await;
    reporter.report("Metadata", &metadata, |m| {
        format!("{}: {} bytes", m.key, m.size_bytes)
    });
    let metadata = metadata?;

    let listed = files.list_all_metadata().await;
    reporter.report("List files", &listed, |all| {
        let names: Vec<&str> = all.iter().map(|m| m.key.as_str()).collect();
        format!("{} file(s): {}", all.len(), names.join(", "))
    });
    listed?;

    let downloaded = files.download(&key).await;
    reporter.report("Download", &downloaded, |bytes| {
        format!("Downloaded {} bytes", bytes.len())
    });
    let bytes = downloaded?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &bytes)?;
    reporter.info(format!("Wrote {}", output.display()));

    if !keep {
        let deleted = files.delete(&key).await;
        reporter.report("Delete", &deleted, |_| format!("Deleted {}", key));
        deleted?;
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{ready_cloud, recording};

    #[tokio::test]
    async fn roundtrip_copies_file() {
        let cloud = ready_cloud().await;
        let (reporter, _) = recording();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("avatar.png");
        let output = dir.path().join("out").join("avatar.png");
        let contents: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        fs::write(&input, &contents).unwrap();

        let metadata = roundtrip(&cloud, &reporter, &input, None, &output, false)
            .await
            .unwrap();

        assert_eq!(metadata.key, "avatar.png");
        assert_eq!(metadata.size_bytes, 4096);
        assert_eq!(fs::read(&output).unwrap(), contents);
        assert!(cloud.files().list_all_metadata().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keep_leaves_remote_copy() {
        let cloud = ready_cloud().await;
        let (reporter, _) = recording();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("save.dat");
        fs::write(&input, b"x").unwrap();

        roundtrip(
            &cloud,
            &reporter,
            &input,
            Some("slot1.dat"),
            &dir.path().join("copy.dat"),
            true,
        )
        .await
        .unwrap();

        let listed = cloud.files().list_all_metadata().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "slot1.dat");
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let cloud = ready_cloud().await;
        let (reporter, lines) = recording();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.bin");
        fs::write(&input, b"").unwrap();

        let err = roundtrip(&cloud, &reporter, &input, None, &dir.path().join("o"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Store(_)));
        assert!(lines.lock().unwrap()[0].is_error());
    }

    #[tokio::test]
    async fn missing_input_is_io_error() {
        let cloud = ready_cloud().await;
        let (reporter, _) = recording();
        let dir = tempfile::tempdir().unwrap();

        let err = roundtrip(
            &cloud,
            &reporter,
            &dir.path().join("nope.bin"),
            None,
            &dir.path().join("o"),
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
