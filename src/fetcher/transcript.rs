//! YouTube caption tracks as a stand-in for page text.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::FetchedDocument;

static PLAYER_RESPONSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)ytInitialPlayerResponse\s*=\s*(\{.*?\})\s*;\s*(?:var\s|</script>|if\s*\(|window\[)")
        .expect("Failed to compile player response pattern")
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    video_details: Option<VideoDetails>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// `"asr"` marks auto-generated captions.
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, language: &str) -> bool {
        self.language_code.eq_ignore_ascii_case(language)
            || self
                .language_code
                .to_ascii_lowercase()
                .starts_with(&format!("{}-", language.to_ascii_lowercase()))
    }
}

impl PlayerResponse {
    fn title(&self) -> Option<String> {
        self.video_details.as_ref().and_then(|d| d.title.clone())
    }

    fn caption_tracks(&self) -> &[CaptionTrack] {
        self.captions
            .as_ref()
            .and_then(|c| c.tracklist.as_ref())
            .map(|t| t.caption_tracks.as_slice())
            .unwrap_or_default()
    }
}

// json3 caption format
#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Returns the YouTube video id if `url` points at a single video.
pub fn video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .or_else(|| host.strip_prefix("music."))
        .unwrap_or(host);

    let id = match host {
        "youtu.be" => parsed.path_segments()?.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = parsed.path_segments()?;
            match segments.next()? {
                "watch" => parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                "shorts" | "embed" | "live" => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    is_video_id(&id).then_some(id)
}

fn is_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn parse_player_response(html: &str) -> Option<PlayerResponse> {
    let captures = PLAYER_RESPONSE_RE.captures(html)?;
    serde_json::from_str(captures.get(1)?.as_str()).ok()
}

/// Picks a track in the first preferred language that has one, favoring
/// manual captions over auto-generated ones. Without a match, the first
/// manual track wins, then the first track of any kind.
fn select_track<'a>(tracks: &'a [CaptionTrack], preferred: &[String]) -> Option<&'a CaptionTrack> {
    for language in preferred {
        let mut matching = tracks.iter().filter(|t| t.matches_language(language));
        let first = matching.next();
        if let Some(first) = first {
            if !first.is_generated() {
                return Some(first);
            }
            return Some(matching.find(|t| !t.is_generated()).unwrap_or(first));
        }
    }

    tracks
        .iter()
        .find(|t| !t.is_generated())
        .or_else(|| tracks.first())
}

fn json3_url(base_url: &str) -> Option<String> {
    let mut url = Url::parse(base_url).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");
    Some(url.into())
}

fn transcript_text(captions: &Json3) -> String {
    captions
        .events
        .iter()
        .flat_map(|event| event.segs.iter())
        .flat_map(|seg| seg.utf8.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds an `Accept-Language` value ranking the preferred languages in order.
fn accept_language(languages: &[String]) -> String {
    if languages.is_empty() {
        return "en".to_string();
    }
    languages
        .iter()
        .enumerate()
        .map(|(i, lang)| match i {
            0 => lang.clone(),
            _ => format!("{};q={:.1}", lang, (1.0 - 0.1 * i as f32).max(0.1)),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Fetches caption tracks for video URLs.
#[derive(Debug, Clone)]
pub struct TranscriptFetcher {
    client: Client,
    languages: Vec<String>,
    accept_language: String,
}

impl TranscriptFetcher {
    pub fn new(client: Client, languages: Vec<String>) -> Self {
        let accept_language = accept_language(&languages);
        Self {
            client,
            languages,
            accept_language,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let id = video_id(url).ok_or_else(|| AppError::fetch(url, "not a recognised video URL"))?;
        let watch_url = format!("https://www.youtube.com/watch?v={}", id);

        let page = self.get_text(url, &watch_url).await?;
        let player = parse_player_response(&page)
            .ok_or_else(|| AppError::fetch(url, "video page did not include player data"))?;

        let track = select_track(player.caption_tracks(), &self.languages)
            .ok_or_else(|| AppError::fetch(url, "no transcript is available for this video"))?;
        info!(
            video_id = %id,
            language = %track.language_code,
            generated = track.is_generated(),
            "downloading transcript"
        );

        let captions_url = json3_url(&track.base_url)
            .ok_or_else(|| AppError::fetch(url, "caption track has an invalid URL"))?;
        let body = self.get_text(url, &captions_url).await?;
        let captions: Json3 = serde_json::from_str(&body)
            .map_err(|e| AppError::fetch(url, format!("unreadable transcript: {}", e)))?;

        let text = transcript_text(&captions);
        if text.is_empty() {
            return Err(AppError::fetch(url, "transcript is empty"));
        }

        Ok(FetchedDocument::transcript(player.title(), text))
    }

    async fn get_text(&self, url: &str, target: &str) -> Result<String> {
        self.client
            .get(target)
            .header("Accept-Language", self.accept_language.as_str())
            .header("Cookie", "CONSENT=YES+1")
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AppError::fetch(url, e))?
            .text()
            .await
            .map_err(|e| AppError::fetch(url, e))
    }
}
