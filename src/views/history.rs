use super::{escape, img, layout, time_tag};
use crate::db::SightingWithCat;

pub struct HistoryView {
    pub sightings: Vec<SightingWithCat>,
    pub total: i64,
}

pub fn render(view: &HistoryView) -> String {
    let mut body = format!(
        "<h2>Sighting history</h2><p class=\"muted\">Showing {} of {} sightings</p>",
        view.sightings.len(),
        view.total
    );

    for entry in &view.sightings {
        let s = &entry.sighting;
        body.push_str("<div class=\"card sighting\">");
        body.push_str(&img(entry.cat_image.as_ref(), "avatar", &entry.cat_name));
        body.push_str(&format!(
            " <a href=\"/cats/{}\"><strong>{}</strong></a> {}",
            s.cat_id,
            escape(&entry.cat_name),
            time_tag(Some(s.date.as_str()))
        ));
        if let Some(location) = s.location.as_deref().filter(|l| !l.is_empty()) {
            body.push_str(&format!(" at {}", escape(location)));
        }
        if let Some(notes) = s.notes.as_deref().filter(|n| !n.is_empty()) {
            body.push_str(&format!("<p>{}</p>", escape(notes)));
        }
        body.push_str(&img(s.image.as_ref(), "thumb", &entry.cat_name));
        body.push_str("</div>");
    }

    layout("History", "/history", &body)
}
