use super::{button_form, escape, img, layout, time_tag};
use crate::db::{Cat, Sighting};
use crate::photos::TimelinePhoto;

pub struct CatDetailView {
    pub cat: Cat,
    pub sightings: Vec<Sighting>,
    pub sighting_count: i64,
    pub photos: Vec<TimelinePhoto>,
    pub last_seen: Option<String>,
}

pub fn render(view: &CatDetailView) -> String {
    let cat = &view.cat;
    let base = format!("/cats/{}", cat.id);
    let mut body = String::new();

    // Profile
    body.push_str("<div class=\"card profile\">");
    body.push_str(&img(cat.image.as_ref(), "thumb", &cat.name));
    body.push_str(&format!("<h1>{}</h1>", escape(&cat.name)));
    if let Some(description) = cat.description.as_deref().filter(|d| !d.is_empty()) {
        body.push_str(&format!("<p>{}</p>", escape(description)));
    }
    body.push_str(&format!(
        "<p class=\"muted\">{} sightings, {} photos",
        view.sighting_count,
        view.photos.len()
    ));
    if view.last_seen.is_some() {
        body.push_str(&format!(
            ". Last seen {}",
            time_tag(view.last_seen.as_deref())
        ));
    }
    body.push_str("</p>");
    if cat.image.is_some() {
        body.push_str(&button_form(
            &format!("{base}/remove-profile-photo"),
            "Remove profile photo",
            None,
        ));
    }
    body.push_str(&button_form(
        &format!("{base}/delete"),
        "Delete cat",
        Some("Delete this cat and all of its sightings and photos?"),
    ));
    body.push_str("</div>");

    // Edit
    body.push_str(&format!(
        "<div class=\"card\"><h2>Edit</h2>\
<form method=\"post\" action=\"{base}/edit\" enctype=\"multipart/form-data\">\
<label>Name <input name=\"name\" value=\"{}\" required></label> \
<label>Description <input name=\"description\" value=\"{}\"></label> \
<label>New photo <input type=\"file\" name=\"image\" accept=\"image/*\"></label> \
<button type=\"submit\">Save</button></form></div>",
        escape(&cat.name),
        escape(cat.description.as_deref().unwrap_or(""))
    ));

    // Gallery
    body.push_str(&format!(
        "<div class=\"card\"><h2>Photos</h2>\
<form method=\"post\" action=\"{base}/photos/add\" enctype=\"multipart/form-data\">\
<input type=\"file\" name=\"photos\" accept=\"image/*\" multiple required> \
<label>Caption <input name=\"caption\"></label> \
<label>Taken on <input type=\"date\" name=\"photo_date\"></label> \
<label>at <input type=\"time\" name=\"photo_time\"></label> \
<button type=\"submit\">Upload</button></form>"
    ));
    if view.photos.is_empty() {
        body.push_str("<p class=\"muted\">No photos yet.</p>");
    }
    body.push_str("<div class=\"grid\">");
    for entry in &view.photos {
        let photo = &entry.photo;
        let photo_path = format!("{base}/photos/{}/{}", photo.source().as_str(), photo.id());
        body.push_str(&format!(
            "<div class=\"card photo\" data-source=\"{}\">",
            photo.source().as_str()
        ));
        body.push_str(&img(photo.image(), "thumb", photo.caption().unwrap_or(&cat.name)));
        if let Some(caption) = photo.caption() {
            body.push_str(&format!("<p>{}</p>", escape(caption)));
        }
        body.push_str(&format!("<p class=\"muted\">{}", time_tag(entry.iso_date.as_deref())));
        if let Some(location) = photo.location() {
            body.push_str(&format!(" at {}", escape(location)));
        }
        body.push_str("</p>");
        body.push_str(&button_form(&format!("{photo_path}/set-profile"), "Use as profile", None));
        body.push_str(&button_form(
            &format!("{photo_path}/delete"),
            "Delete",
            Some("Delete this photo?"),
        ));
        body.push_str("</div>");
    }
    body.push_str("</div></div>");

    // Sightings
    body.push_str("<div class=\"card\"><h2>Sightings</h2>");
    if view.sightings.is_empty() {
        body.push_str("<p class=\"muted\">Not spotted yet.</p>");
    }
    for s in &view.sightings {
        body.push_str(&format!("<div class=\"sighting\">{}", time_tag(Some(s.date.as_str()))));
        if let Some(location) = s.location.as_deref().filter(|l| !l.is_empty()) {
            body.push_str(&format!(" at {}", escape(location)));
        }
        if let Some(notes) = s.notes.as_deref().filter(|n| !n.is_empty()) {
            body.push_str(&format!("<p>{}</p>", escape(notes)));
        }
        body.push_str(&img(s.image.as_ref(), "thumb", &cat.name));
        body.push_str("</div>");
    }
    body.push_str("</div>");

    layout(&cat.name, "/cats", &body)
}
