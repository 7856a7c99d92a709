//! Classification of topic video references.
//!
//! A stored reference is an external URL or a local `uploads/videos/` path.
//! [`classify`] is pure and total: every input string maps to exactly one
//! variant and nothing panics. [`view_for`] layers the render-time concerns
//! on top — the empty reference and the presence check for local files.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches watch, share and embed URL shapes; a YouTube id is always
/// 11 characters of `[A-Za-z0-9_-]`.
static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([A-Za-z0-9_-]{11})")
        .expect("youtube id pattern is valid")
});

static VIMEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vimeo\.com/(?:video/)?(\d+)").expect("vimeo id pattern is valid"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    Vimeo,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Vimeo => "Vimeo",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    /// Embeddable YouTube video with its extracted id.
    YouTube(String),
    /// Embeddable Vimeo video with its extracted numeric id.
    Vimeo(String),
    /// Locally uploaded file, storage-relative path.
    LocalFile(String),
    /// A URL on a platform this portal cannot embed.
    ExternalLink(String),
    /// Recognized platform, but no id could be extracted from the URL.
    Unembeddable(Platform),
}

/// Classify a stored video reference. Total: never fails, never panics.
pub fn classify(reference: &str) -> VideoSource {
    if reference.contains("youtube.com/") || reference.contains("youtu.be/") {
        match YOUTUBE_ID.captures(reference) {
            Some(captures) => VideoSource::YouTube(captures[1].to_owned()),
            None => VideoSource::Unembeddable(Platform::YouTube),
        }
    } else if reference.contains("vimeo.com/") {
        match VIMEO_ID.captures(reference) {
            Some(captures) => VideoSource::Vimeo(captures[1].to_owned()),
            None => VideoSource::Unembeddable(Platform::Vimeo),
        }
    } else if reference.contains("uploads/videos/") {
        VideoSource::LocalFile(reference.to_owned())
    } else {
        VideoSource::ExternalLink(reference.to_owned())
    }
}

/// What the topic page should render for the video section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoView {
    /// No video lecture was provided for the topic.
    None,
    YouTube(String),
    Vimeo(String),
    /// Local file present on disk; holds the URL it is served under.
    Local(String),
    /// The database references a local file that is gone from storage.
    LocalMissing,
    /// Plain outbound link with a not-embeddable warning.
    Link(String),
    /// Recognized platform but broken URL; holds the platform name.
    Unembeddable(&'static str),
}

pub fn view_for(reference: &str) -> VideoView {
    if reference.is_empty() {
        return VideoView::None;
    }
    match classify(reference) {
        VideoSource::YouTube(id) => VideoView::YouTube(id),
        VideoSource::Vimeo(id) => VideoView::Vimeo(id),
        VideoSource::LocalFile(path) => {
            if crate::filesystem::media_exists(&path) {
                VideoView::Local(format!("/{}", path))
            } else {
                VideoView::LocalMissing
            }
        }
        VideoSource::ExternalLink(url) => VideoView::Link(url),
        VideoSource::Unembeddable(platform) => VideoView::Unembeddable(platform.name()),
    }
}
