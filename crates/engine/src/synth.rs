use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use renamarr_core::{EngineError, ReconciledEpisode, RenamePlan, Selection};

// Show name is whatever precedes the SxxExx token.
static RE_SHOW_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<show>.+?)\s*-?\s*S\d{1,3}E\d{1,4}").unwrap()
});

static RE_VIDEO_EXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(mkv|mp4|avi|m4v|mov|wmv|webm|ts|mpg|mpeg)\b").unwrap()
});

// Last bracketed segment, e.g. "[WEBDL-1080p]".
static RE_BRACKET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").unwrap());

// Trailing release/resolution token without brackets, e.g. "...WEBRip-720p".
static RE_TRAILING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[ ._-]((?:WEB-?DL|WEBRip|BluRay|Blu-Ray|HDTV|DVDRip)(?:[-.](?:2160p|1080p|720p|480p))?|2160p|1080p|720p|480p)$",
    )
    .unwrap()
});

static RE_ILLEGAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Build the canonical filename for a selection of episodes.
///
/// Output shape: `<Show> - S<SS>E<range> - <titles> [<quality>].<ext>`,
/// where the bracketed segment is omitted when the original name carries
/// no recognizable quality tag. Titles join with " and " in ascending
/// episode order, so the result does not depend on the order episodes
/// were picked in.
pub fn synthesize(
    original_filename: &str,
    selection: &Selection,
    reconciled: &[ReconciledEpisode],
) -> Result<String, EngineError> {
    let episodes = resolve_selection(selection, reconciled)?;

    let show = parse_show_name(original_filename);
    let quality = extract_quality_tag(original_filename);
    let extension = extract_extension(original_filename);

    // The range spans min..max even for a non-contiguous selection. That
    // is the established naming convention for bundled files, kept as-is.
    let first = episodes[0].episode_number;
    let last = episodes[episodes.len() - 1].episode_number;
    let episode_token = if first == last {
        format!("E{first:02}")
    } else {
        format!("E{first:02}-E{last:02}")
    };

    let titles: Vec<&str> = episodes.iter().map(|e| e.title.as_str()).collect();
    let mut name = format!(
        "{show} - S{season:02}{episode_token} - {titles}",
        season = selection.season(),
        titles = titles.join(" and "),
    );
    if let Some(tag) = quality {
        name.push_str(&format!(" [{tag}]"));
    }
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(&ext);
    }

    let name = sanitize_filename(&name);
    debug!(original = original_filename, proposed = %name, "synthesized filename");
    Ok(name)
}

/// Derive a [`RenamePlan`] for a source file and episode selection. The
/// target is always a sibling of the source.
pub fn plan_rename(
    source_path: &Path,
    selection: &Selection,
    reconciled: &[ReconciledEpisode],
) -> Result<RenamePlan, EngineError> {
    let file_name = source_path
        .file_name()
        .ok_or_else(|| EngineError::InvalidPath(source_path.to_path_buf()))?
        .to_string_lossy();

    let proposed = synthesize(&file_name, selection, reconciled)?;
    let target_path = match source_path.parent() {
        Some(parent) => parent.join(&proposed),
        None => Path::new(&proposed).to_path_buf(),
    };

    Ok(RenamePlan {
        source_path: source_path.to_path_buf(),
        target_path,
        preserved_quality_tag: extract_quality_tag(&file_name),
    })
}

fn resolve_selection<'a>(
    selection: &Selection,
    reconciled: &'a [ReconciledEpisode],
) -> Result<Vec<&'a ReconciledEpisode>, EngineError> {
    let by_key: HashMap<_, _> = reconciled.iter().map(|e| (e.key(), e)).collect();

    let mut episodes = Vec::with_capacity(selection.keys().len());
    for key in selection.keys() {
        let ep = by_key
            .get(key)
            .copied()
            .ok_or(EngineError::UnknownEpisode(*key))?;
        episodes.push(ep);
    }
    episodes.sort_by_key(|e| e.episode_number);
    Ok(episodes)
}

/// Pull the show name out of the original filename. Falls back to the
/// cleaned stem when no SxxExx token is present.
fn parse_show_name(filename: &str) -> String {
    if let Some(caps) = RE_SHOW_PREFIX.captures(filename) {
        let show = clean_title(&caps["show"]);
        if !show.is_empty() {
            return show;
        }
    }

    let stem = RE_VIDEO_EXT.replace_all(filename, "");
    let stem = RE_BRACKET_TAG.replace_all(&stem, "");
    clean_title(&stem)
}

/// Extract a trailing quality/release tag from a filename. Pure text
/// matching, no catalog lookup: the last bracketed segment wins, else a
/// recognized trailing token.
pub fn extract_quality_tag(filename: &str) -> Option<String> {
    if let Some(caps) = RE_BRACKET_TAG.captures_iter(filename).last() {
        return Some(caps[1].to_string());
    }

    let stem = RE_VIDEO_EXT.replace_all(filename, "");
    RE_TRAILING_TAG
        .captures(&stem)
        .map(|caps| caps[1].to_string())
}

/// The original container extension, wherever it sits in the name. Some
/// library files carry trailing tags after the extension.
fn extract_extension(filename: &str) -> Option<String> {
    RE_VIDEO_EXT
        .captures_iter(filename)
        .last()
        .map(|caps| caps[1].to_lowercase())
}

/// Replace characters no mainstream filesystem accepts. Never fails.
pub fn sanitize_filename(name: &str) -> String {
    RE_ILLEGAL.replace_all(name, "_").to_string()
}

fn clean_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(['-', ' '])
        .to_string()
}
