//! Pure transformation from Discogs release data into local record drafts.
//!
//! Classification is deliberately simple: the vinyl check takes the first
//! marker match while scanning formats in order, and the LP/Single/EP
//! decision looks at the first format entry only. Multi-format releases
//! (boxed sets, vinyl+CD bundles) can misclassify; callers accept that in
//! exchange for never importing an obvious CD or download code.

use crate::discogs::models::{FormatDescriptor, ReleaseSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format names/description tokens that mark a physical vinyl record
const VINYL_MARKERS: &[&str] = &["vinyl", "12\"", "7\"", "10\"", "lp", "single", "ep"];
/// Format names that rule a release out before any vinyl marker is seen
const NON_VINYL_MARKERS: &[&str] = &["cd", "cassette", "digital", "file", "mp3"];

/// Why an item was left out of an import, recorded per item rather than
/// thrown, so the orchestrator's continue-on-failure policy is visible in
/// the signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("not a vinyl release")]
    NotVinyl,
    #[error("release has no artist credits")]
    MissingArtist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    Lp,
    Single,
    Ep,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Lp => "LP",
            RecordType::Single => "Single",
            RecordType::Ep => "EP",
        }
    }

    pub fn from_str_or_lp(value: &str) -> Self {
        match value {
            "Single" => RecordType::Single,
            "EP" => RecordType::Ep,
            _ => RecordType::Lp,
        }
    }
}

/// The mapped, ready-to-persist form of one remote collection item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub artist: String,
    pub title: String,
    pub label: Option<String>,
    pub catalog_number: Option<String>,
    pub release_year: Option<u32>,
    pub genre: Option<String>,
    pub record_type: RecordType,
    pub image_url: Option<String>,
    pub discogs_release_id: String,
    pub discogs_master_id: Option<String>,
    pub discogs_instance_id: Option<String>,
    pub last_synced_at: DateTime<Utc>,
}

/// Decide whether a format list describes a vinyl record.
///
/// Scans formats in order. A format whose name matches a non-vinyl marker
/// rejects the release immediately; a name or description token matching a
/// vinyl marker accepts it. Nothing matching either way means non-vinyl -
/// ambiguity errs toward exclusion.
pub fn is_vinyl_format(formats: &[FormatDescriptor]) -> bool {
    for format in formats {
        let name = format.name.to_lowercase();

        if NON_VINYL_MARKERS.iter().any(|marker| name.contains(marker)) {
            return false;
        }

        if VINYL_MARKERS.iter().any(|marker| name.contains(marker)) {
            return true;
        }

        for description in &format.descriptions {
            let description = description.to_lowercase();
            if VINYL_MARKERS
                .iter()
                .any(|marker| description.contains(marker))
            {
                return true;
            }
        }
    }

    false
}

/// Classify a release as LP, Single, or EP from its first format entry.
pub fn classify_type(formats: &[FormatDescriptor]) -> RecordType {
    let Some(first) = formats.first() else {
        return RecordType::Lp;
    };

    let name = first.name.to_lowercase();
    let descriptions: Vec<String> = first
        .descriptions
        .iter()
        .map(|d| d.to_lowercase())
        .collect();

    let has_description =
        |needle: &str| descriptions.iter().any(|d| d.contains(needle));

    if name.contains("single") || has_description("7\"") || has_description("45 rpm") {
        return RecordType::Single;
    }

    if name.contains("ep") || has_description("ep") || has_description("extended play") {
        return RecordType::Ep;
    }

    RecordType::Lp
}

/// Map a release summary into a [`RecordDraft`], or say why it was skipped.
///
/// Non-vinyl releases are rejected before any field mapping happens, so a
/// CD can never slip into the library through a sync.
pub fn map_to_draft(
    summary: &ReleaseSummary,
    instance_id: Option<u64>,
) -> Result<RecordDraft, SkipReason> {
    if !is_vinyl_format(&summary.formats) {
        return Err(SkipReason::NotVinyl);
    }

    if summary.artists.is_empty() {
        return Err(SkipReason::MissingArtist);
    }

    let artist = summary
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let first_label = summary.labels.first();
    let label = first_label.map(|l| l.name.clone());
    let catalog_number = first_label.and_then(|l| l.catno.clone());

    let genre_parts: Vec<&str> = summary
        .genres
        .iter()
        .chain(summary.styles.iter())
        .map(String::as_str)
        .collect();
    let genre = if genre_parts.is_empty() {
        None
    } else {
        Some(genre_parts.join(", "))
    };

    Ok(RecordDraft {
        artist,
        title: summary.title.clone(),
        label,
        catalog_number,
        release_year: summary.year.filter(|&y| y != 0),
        genre,
        record_type: classify_type(&summary.formats),
        image_url: summary.thumb.clone(),
        discogs_release_id: summary.id.to_string(),
        discogs_master_id: summary.master_id.map(|id| id.to_string()),
        discogs_instance_id: instance_id.map(|id| id.to_string()),
        last_synced_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discogs::models::{ArtistCredit, LabelCredit};

    fn format(name: &str, descriptions: &[&str]) -> FormatDescriptor {
        FormatDescriptor {
            name: name.to_string(),
            descriptions: descriptions.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn summary(formats: Vec<FormatDescriptor>) -> ReleaseSummary {
        ReleaseSummary {
            id: 123,
            master_id: Some(55),
            title: "Blue Train".to_string(),
            year: Some(1957),
            artists: vec![ArtistCredit {
                name: "John Coltrane".to_string(),
            }],
            labels: vec![LabelCredit {
                name: "Blue Note".to_string(),
                catno: Some("BLP 1577".to_string()),
            }],
            genres: vec!["Jazz".to_string()],
            styles: vec!["Hard Bop".to_string()],
            formats,
            thumb: Some("https://img.discogs.com/thumb.jpg".to_string()),
        }
    }

    #[test]
    fn cd_only_is_not_vinyl() {
        assert!(!is_vinyl_format(&[format("CD", &[])]));
    }

    #[test]
    fn vinyl_lp_is_vinyl() {
        assert!(is_vinyl_format(&[format("Vinyl", &["LP"])]));
    }

    #[test]
    fn first_vinyl_match_wins_over_later_cd() {
        assert!(is_vinyl_format(&[format("Vinyl", &[]), format("CD", &[])]));
    }

    #[test]
    fn cd_before_vinyl_rejects() {
        // Scan order matters: a non-vinyl name seen first rejects the release
        assert!(!is_vinyl_format(&[format("CD", &[]), format("Vinyl", &[])]));
    }

    #[test]
    fn vinyl_marker_in_description_counts() {
        assert!(is_vinyl_format(&[format("Box Set", &["12\""])]));
    }

    #[test]
    fn ambiguous_formats_default_to_non_vinyl() {
        assert!(!is_vinyl_format(&[format("Box Set", &["Limited Edition"])]));
        assert!(!is_vinyl_format(&[]));
    }

    #[test]
    fn seven_inch_classifies_as_single() {
        assert_eq!(
            classify_type(&[format("Vinyl", &["7\""])]),
            RecordType::Single
        );
    }

    #[test]
    fn forty_five_rpm_classifies_as_single() {
        assert_eq!(
            classify_type(&[format("Vinyl", &["45 RPM"])]),
            RecordType::Single
        );
    }

    #[test]
    fn lp_description_classifies_as_lp() {
        assert_eq!(classify_type(&[format("Vinyl", &["LP"])]), RecordType::Lp);
    }

    #[test]
    fn ep_description_classifies_as_ep() {
        assert_eq!(classify_type(&[format("Vinyl", &["EP"])]), RecordType::Ep);
    }

    #[test]
    fn only_first_format_entry_is_inspected() {
        // Known simplification: the 7" in the second entry is ignored
        assert_eq!(
            classify_type(&[format("Vinyl", &["LP"]), format("Vinyl", &["7\""])]),
            RecordType::Lp
        );
    }

    #[test]
    fn empty_formats_classify_as_lp() {
        assert_eq!(classify_type(&[]), RecordType::Lp);
    }

    #[test]
    fn map_to_draft_fills_all_fields() {
        let draft = map_to_draft(&summary(vec![format("Vinyl", &["LP"])]), Some(901)).unwrap();

        assert_eq!(draft.artist, "John Coltrane");
        assert_eq!(draft.title, "Blue Train");
        assert_eq!(draft.label.as_deref(), Some("Blue Note"));
        assert_eq!(draft.catalog_number.as_deref(), Some("BLP 1577"));
        assert_eq!(draft.release_year, Some(1957));
        assert_eq!(draft.genre.as_deref(), Some("Jazz, Hard Bop"));
        assert_eq!(draft.record_type, RecordType::Lp);
        assert_eq!(draft.discogs_release_id, "123");
        assert_eq!(draft.discogs_master_id.as_deref(), Some("55"));
        assert_eq!(draft.discogs_instance_id.as_deref(), Some("901"));
    }

    #[test]
    fn map_to_draft_joins_multiple_artists() {
        let mut summary = summary(vec![format("Vinyl", &["LP"])]);
        summary.artists.push(ArtistCredit {
            name: "Lee Morgan".to_string(),
        });

        let draft = map_to_draft(&summary, None).unwrap();
        assert_eq!(draft.artist, "John Coltrane, Lee Morgan");
        assert_eq!(draft.discogs_instance_id, None);
    }

    #[test]
    fn map_to_draft_rejects_non_vinyl() {
        let result = map_to_draft(&summary(vec![format("CD", &[])]), Some(901));
        assert_eq!(result.unwrap_err(), SkipReason::NotVinyl);
    }

    #[test]
    fn map_to_draft_rejects_missing_artists() {
        let mut summary = summary(vec![format("Vinyl", &["LP"])]);
        summary.artists.clear();

        let result = map_to_draft(&summary, Some(901));
        assert_eq!(result.unwrap_err(), SkipReason::MissingArtist);
    }

    #[test]
    fn map_to_draft_is_null_safe_on_optional_fields() {
        let mut summary = summary(vec![format("Vinyl", &["LP"])]);
        summary.labels.clear();
        summary.genres.clear();
        summary.styles.clear();
        summary.year = Some(0);
        summary.thumb = None;
        summary.master_id = None;

        let draft = map_to_draft(&summary, None).unwrap();
        assert_eq!(draft.label, None);
        assert_eq!(draft.catalog_number, None);
        assert_eq!(draft.genre, None);
        // Discogs uses year 0 for "unknown"
        assert_eq!(draft.release_year, None);
        assert_eq!(draft.image_url, None);
        assert_eq!(draft.discogs_master_id, None);
    }
}
