use std::fmt::Write;
use std::path::Path;

use loupe_client::Loaded;
use loupe_client::image::DynamicImage;
use serde::Serialize;

/// Summary of a single load, printed to stdout.
#[derive(Debug, Serialize)]
pub struct Report {
    pub url: String,
    pub source_url: Option<String>,
    pub etag: Option<String>,
    pub source: &'static str,
    pub bytes: usize,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Report {
    pub fn new(url: &str, loaded: &Loaded<DynamicImage>, output: Option<&Path>) -> Self {
        Self {
            url: url.to_string(),
            source_url: loaded.blob.source_url.clone(),
            etag: loaded.blob.etag.clone(),
            source: loaded.source.as_str(),
            bytes: loaded.blob.data.len(),
            width: loaded.resource.width(),
            height: loaded.resource.height(),
            output: output.map(|p| p.display().to_string()),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "url:     {}", self.url);
        if let Some(source_url) = &self.source_url {
            let _ = writeln!(out, "from:    {}", source_url);
        }
        let _ = writeln!(out, "etag:    {}", self.etag.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "source:  {}", self.source);
        let _ = writeln!(out, "bytes:   {}", self.bytes);
        let _ = writeln!(out, "size:    {}x{}", self.width, self.height);
        if let Some(output) = &self.output {
            let _ = writeln!(out, "written: {}", output);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_client::LoadSource;
    use loupe_client::image::RgbaImage;
    use loupe_core::CachedBlob;

    fn loaded(etag: Option<&str>, source: LoadSource) -> Loaded<DynamicImage> {
        Loaded {
            resource: DynamicImage::ImageRgba8(RgbaImage::new(12, 7)),
            blob: CachedBlob::new(
                vec![1u8; 42],
                Some("https://x/a.png".to_string()),
                etag.map(str::to_string),
            ),
            source,
        }
    }

    #[test]
    fn test_report_fields() {
        let report = Report::new("https://x/a.png", &loaded(Some("\"v1\""), LoadSource::Fetched), None);
        assert_eq!(report.source, "fetched");
        assert_eq!(report.bytes, 42);
        assert_eq!((report.width, report.height), (12, 7));
        assert_eq!(report.etag.as_deref(), Some("\"v1\""));
    }

    #[test]
    fn test_render_text_without_etag() {
        let report = Report::new("https://x/a.png", &loaded(None, LoadSource::Stale), None);
        let text = report.render_text();
        assert!(text.contains("etag:    -"));
        assert!(text.contains("source:  stale"));
        assert!(text.contains("size:    12x7"));
        assert!(!text.contains("written:"));
    }

    #[test]
    fn test_json_omits_missing_output() {
        let report = Report::new("https://x/a.png", &loaded(Some("e"), LoadSource::Revalidated), None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "revalidated");
        assert!(json.get("output").is_none());

        let report = Report::new(
            "https://x/a.png",
            &loaded(Some("e"), LoadSource::Revalidated),
            Some(Path::new("/tmp/out.png")),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["output"], "/tmp/out.png");
    }
}
