//! Per-cat photo timeline.
//!
//! A cat's photos live in two places: the gallery table and the optional
//! image attached to each sighting. The two sources differ in what deleting a
//! photo means (a gallery row goes away, a sighting only loses its image), so
//! they stay distinct variants of [`CatPhoto`] rather than one merged record.

use std::cmp::Reverse;

use crate::dates;
use crate::db::{GalleryPhoto, Sighting};
use crate::images::StoredImage;

/// Where a photo is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSource {
    Gallery,
    Sighting,
}

impl PhotoSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoSource::Gallery => "gallery",
            PhotoSource::Sighting => "sighting",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gallery" => Some(PhotoSource::Gallery),
            "sighting" => Some(PhotoSource::Sighting),
            _ => None,
        }
    }
}

/// A photo of a cat from either source.
#[derive(Debug, Clone)]
pub enum CatPhoto {
    Gallery(GalleryPhoto),
    Sighting(Sighting),
}

impl CatPhoto {
    pub fn source(&self) -> PhotoSource {
        match self {
            CatPhoto::Gallery(_) => PhotoSource::Gallery,
            CatPhoto::Sighting(_) => PhotoSource::Sighting,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            CatPhoto::Gallery(p) => p.id,
            CatPhoto::Sighting(s) => s.id,
        }
    }

    /// Image payload. Sighting photos lose theirs when removed.
    pub fn image(&self) -> Option<&StoredImage> {
        match self {
            CatPhoto::Gallery(p) => Some(&p.image),
            CatPhoto::Sighting(s) => s.image.as_ref(),
        }
    }

    /// Gallery caption, or the sighting notes.
    pub fn caption(&self) -> Option<&str> {
        let caption = match self {
            CatPhoto::Gallery(p) => p.caption.as_deref(),
            CatPhoto::Sighting(s) => s.notes.as_deref(),
        };
        caption.filter(|c| !c.is_empty())
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            CatPhoto::Gallery(_) => None,
            CatPhoto::Sighting(s) => s.location.as_deref().filter(|l| !l.is_empty()),
        }
    }

    /// Best available date in canonical form.
    ///
    /// Gallery photos prefer the date the photo was taken over the upload
    /// time; sighting photos use the sighting timestamp.
    pub fn resolved_date(&self) -> Option<String> {
        match self {
            CatPhoto::Gallery(p) => dates::normalize_opt(p.photo_date.as_deref())
                .or_else(|| dates::normalize_opt(p.created_at.as_deref())),
            CatPhoto::Sighting(s) => dates::normalize(&s.date),
        }
    }
}

/// A photo together with its resolved date, ready for display.
#[derive(Debug, Clone)]
pub struct TimelinePhoto {
    pub photo: CatPhoto,
    pub iso_date: Option<String>,
}

/// Merge gallery and sighting photos into one newest-first list.
///
/// Sightings without an image are skipped. Photos with no usable date sort
/// last; equal dates keep gallery photos ahead of sighting photos.
pub fn aggregate(gallery: Vec<GalleryPhoto>, sightings: Vec<Sighting>) -> Vec<TimelinePhoto> {
    let mut timeline: Vec<TimelinePhoto> = gallery
        .into_iter()
        .map(CatPhoto::Gallery)
        .chain(
            sightings
                .into_iter()
                .filter(|s| s.image.is_some())
                .map(CatPhoto::Sighting),
        )
        .map(|photo| {
            let iso_date = photo.resolved_date();
            TimelinePhoto { photo, iso_date }
        })
        .collect();

    timeline.sort_by_cached_key(|p| Reverse(p.iso_date.clone().unwrap_or_default()));
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> StoredImage {
        StoredImage {
            data: "Y2F0".to_string(),
            mime_type: "image/png".to_string(),
        }
    }

    fn gallery(id: i64, photo_date: Option<&str>, created_at: Option<&str>) -> GalleryPhoto {
        GalleryPhoto {
            id,
            cat_id: 1,
            image: image(),
            caption: Some(format!("gallery {id}")),
            photo_date: photo_date.map(String::from),
            created_at: created_at.map(String::from),
        }
    }

    fn sighting(id: i64, date: &str, with_image: bool) -> Sighting {
        Sighting {
            id,
            cat_id: 1,
            date: date.to_string(),
            location: Some("Backyard".to_string()),
            notes: Some(String::new()),
            image: with_image.then(image),
        }
    }

    #[test]
    fn test_source_round_trip() {
        assert_eq!(PhotoSource::from_str("gallery"), Some(PhotoSource::Gallery));
        assert_eq!(PhotoSource::from_str("sighting"), Some(PhotoSource::Sighting));
        assert_eq!(PhotoSource::from_str("album"), None);
        assert_eq!(PhotoSource::Sighting.as_str(), "sighting");
    }

    #[test]
    fn test_empty_timeline() {
        assert!(aggregate(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn test_newest_first_across_sources() {
        let timeline = aggregate(
            vec![
                gallery(1, Some("2024-01-10T08:00:00Z"), None),
                gallery(2, None, Some("2024-03-01 12:00:00")),
            ],
            vec![
                sighting(7, "2024-02-01T09:00:00Z", true),
                sighting(8, "2024-05-01T09:00:00Z", false),
            ],
        );

        let order: Vec<(PhotoSource, i64)> =
            timeline.iter().map(|p| (p.photo.source(), p.photo.id())).collect();
        assert_eq!(
            order,
            vec![
                (PhotoSource::Gallery, 2),
                (PhotoSource::Sighting, 7),
                (PhotoSource::Gallery, 1),
            ]
        );
        assert_eq!(timeline[0].iso_date.as_deref(), Some("2024-03-01T12:00:00Z"));
    }

    #[test]
    fn test_photo_date_wins_over_upload_time() {
        let photo = CatPhoto::Gallery(gallery(1, Some("2023-06-01"), Some("2024-01-01 10:00:00")));
        assert_eq!(photo.resolved_date().as_deref(), Some("2023-06-01T00:00:00Z"));
    }

    #[test]
    fn test_undated_photos_sort_last() {
        let timeline = aggregate(
            vec![gallery(1, None, None), gallery(2, Some("2020-01-01"), None)],
            vec![sighting(3, "", true)],
        );
        assert_eq!(timeline[0].photo.id(), 2);
        assert!(timeline[1].iso_date.is_none());
        assert!(timeline[2].iso_date.is_none());

        for pair in timeline.windows(2) {
            let a = pair[0].iso_date.clone().unwrap_or_default();
            let b = pair[1].iso_date.clone().unwrap_or_default();
            assert!(a >= b);
        }
    }

    #[test]
    fn test_sighting_caption_and_location() {
        let mut s = sighting(1, "2024-01-01T00:00:00Z", true);
        s.notes = Some("sleeping on the shed".to_string());
        let photo = CatPhoto::Sighting(s);
        assert_eq!(photo.caption(), Some("sleeping on the shed"));
        assert_eq!(photo.location(), Some("Backyard"));

        let empty = CatPhoto::Sighting(sighting(2, "2024-01-01T00:00:00Z", true));
        assert_eq!(empty.caption(), None);
    }
}
