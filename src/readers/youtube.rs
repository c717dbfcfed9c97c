use std::sync::Arc;

use url::Url;

use super::{MetadataProbe, PageReader, ReaderKind};
use crate::error::ReaderError;
use crate::page::{Page, RenderOptions, Renderable};

pub const KIND: ReaderKind = ReaderKind {
    name: "youtube",
    can_handle: YoutubeReader::can_handle,
    build,
};

fn build(url: &str, probe: Arc<dyn MetadataProbe>) -> Box<dyn PageReader> {
    Box::new(YoutubeReader::new(url, probe))
}

/// Video id from a `youtu.be/<id>` link or a `youtube.com` watch/embed URL
pub fn parse_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    let id = if host == "youtu.be" {
        parsed.path_segments()?.next().map(str::to_string)
    } else if host.contains("youtube.com") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .or_else(|| parsed.path_segments()?.last().map(str::to_string))
    } else {
        None
    };
    id.filter(|id| !id.is_empty())
}

pub fn embed_url(video_id: &str, autoplay: bool) -> String {
    let mut src = format!("https://www.youtube.com/embed/{video_id}");
    if autoplay {
        src.push_str("?autoplay=1");
    }
    src
}

/// A single embedded-player page
pub struct YoutubeReader {
    url: String,
    probe: Arc<dyn MetadataProbe>,
}

impl YoutubeReader {
    pub fn new(url: impl Into<String>, probe: Arc<dyn MetadataProbe>) -> Self {
        Self {
            url: url.into(),
            probe,
        }
    }

    pub fn can_handle(url: &str) -> bool {
        parse_video_id(url).is_some()
    }
}

impl PageReader for YoutubeReader {
    fn pages(&self) -> Result<Vec<Page>, ReaderError> {
        let video_id = parse_video_id(&self.url)
            .ok_or_else(|| ReaderError::InvalidYoutubeUrl(self.url.clone()))?;
        let size = self.probe.dimensions(&self.url)?;

        let page = Page::new(size.width, size.height, move |options: &RenderOptions| {
            Renderable::Embed {
                src: embed_url(&video_id, options.autoplay),
            }
        });
        Ok(vec![page])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::readers::FixedProbe;

    #[test]
    fn video_ids() {
        assert_eq!(parse_video_id("https://youtu.be/dQw4w9WgXcQ?t=42").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=x").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            parse_video_id("https://m.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(parse_video_id("https://youtu.be/"), None);
        assert_eq!(parse_video_id("https://vimeo.com/12345"), None);
        assert_eq!(parse_video_id("watch?v=abc"), None);
    }

    #[test]
    fn renders_embed_with_autoplay() {
        let probe = Arc::new(FixedProbe(Size::new(560.0, 315.0)));
        let reader = YoutubeReader::new("https://youtu.be/abc123", probe);
        let page = reader.page(0).unwrap();
        assert_eq!((page.width, page.height), (560.0, 315.0));

        assert_eq!(
            page.render(&RenderOptions::default()),
            Renderable::Embed {
                src: "https://www.youtube.com/embed/abc123".into()
            }
        );
        let autoplay = RenderOptions {
            autoplay: true,
            ..RenderOptions::default()
        };
        assert_eq!(
            page.render(&autoplay),
            Renderable::Embed {
                src: "https://www.youtube.com/embed/abc123?autoplay=1".into()
            }
        );
    }

    #[test]
    fn invalid_url_fails_on_load() {
        let probe = Arc::new(FixedProbe(Size::new(1.0, 1.0)));
        let reader = YoutubeReader::new("https://example.com/v", probe);
        assert!(matches!(reader.pages(), Err(ReaderError::InvalidYoutubeUrl(_))));
    }
}
