//! Video-sharing search resolver backed by the `yt-dlp` extractor.
//!
//! One invocation does both the search and the stream-URL extraction:
//! `ytsearch1:` limits the search to the single best match, the format
//! selector asks for best-available audio, playlists are never expanded and
//! diagnostic output is suppressed. Any transport or parsing fault maps to
//! a spoken "Failed to find ..." without retrying.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{Candidate, StreamResolver, StreamTarget, sanitize_title};
use crate::error::{Error, Result};

pub struct VideoResolver {
    ytdlp_bin: String,
}

#[derive(Debug, Deserialize)]
struct ExtractedInfo {
    title: String,
    url: String,
}

impl VideoResolver {
    pub fn new(ytdlp_bin: impl Into<String>) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
        }
    }

    fn not_found(query: &str) -> Error {
        Error::NotFound(format!("Failed to find {query}"))
    }
}

#[async_trait]
impl StreamResolver for VideoResolver {
    fn subject(&self) -> &'static str {
        "song"
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
        tracing::debug!(query, bin = %self.ytdlp_bin, "Video search");

        let output = Command::new(&self.ytdlp_bin)
            .arg("--default-search")
            .arg("ytsearch1:")
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--dump-json")
            .arg(query)
            .output()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to run extractor");
                Self::not_found(query)
            })?;

        if !output.status.success() {
            tracing::warn!(status = ?output.status.code(), query, "Extractor exited non-zero");
            return Err(Self::not_found(query));
        }

        // --dump-json emits one JSON object per line; ytsearch1 yields one
        let line = String::from_utf8_lossy(&output.stdout);
        let line = line.lines().next().unwrap_or_default().trim();
        if line.is_empty() {
            return Err(Self::not_found(query));
        }

        let info: ExtractedInfo = serde_json::from_str(line).map_err(|e| {
            tracing::warn!(error = %e, query, "Extractor output was not the expected JSON");
            Self::not_found(query)
        })?;

        tracing::debug!(title = %info.title, "Video search hit");
        Ok(vec![Candidate {
            id: info.url,
            title: info.title,
        }])
    }

    async fn resolve(&self, candidate: &Candidate) -> Result<StreamTarget> {
        if candidate.id.is_empty() {
            return Err(Error::Resolution(format!(
                "Failed to find {}",
                sanitize_title(&candidate.title)
            )));
        }
        Ok(StreamTarget {
            url: candidate.id.clone(),
            label: sanitize_title(&candidate.title),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Drop a tiny executable standing in for yt-dlp
    fn fake_extractor(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("voxpi-fake-{}-{}", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "{body}").unwrap();
        drop(file);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn search_parses_single_json_line() {
        let bin = fake_extractor(
            "hit",
            r#"echo '{"title":"Daylight_Official_Video","url":"http://example.test/audio"}'"#,
        );
        let resolver = VideoResolver::new(bin.to_string_lossy());

        let candidates = resolver.search("daylight").await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Daylight_Official_Video");

        let target = resolver.resolve(&candidates[0]).await.unwrap();
        assert_eq!(target.url, "http://example.test/audio");
        assert_eq!(target.label, "Daylight Official Video");

        let _ = std::fs::remove_file(bin);
    }

    #[tokio::test]
    async fn nonzero_exit_becomes_not_found() {
        let bin = fake_extractor("fail", "exit 1");
        let resolver = VideoResolver::new(bin.to_string_lossy());

        let err = resolver.search("daylight").await.unwrap_err();
        assert!(err.to_string().contains("Failed to find daylight"));

        let _ = std::fs::remove_file(bin);
    }

    #[tokio::test]
    async fn garbage_output_becomes_not_found() {
        let bin = fake_extractor("garbage", "echo not-json-at-all");
        let resolver = VideoResolver::new(bin.to_string_lossy());

        let err = resolver.search("daylight").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let _ = std::fs::remove_file(bin);
    }

    #[tokio::test]
    async fn missing_binary_becomes_not_found() {
        let resolver = VideoResolver::new("voxpi-no-such-extractor");
        let err = resolver.search("daylight").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
