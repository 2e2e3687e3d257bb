use super::{button_form, escape, img, layout, time_tag};
use crate::db::{Cat, SightingWithCat};

pub struct HomeView {
    pub cats: Vec<Cat>,
    pub sightings: Vec<SightingWithCat>,
    pub utc_now: String,
}

pub fn render(view: &HomeView) -> String {
    let mut body = String::new();

    body.push_str("<div class=\"card\"><h2>Log a sighting</h2>");
    if view.cats.is_empty() {
        body.push_str("<p class=\"muted\">No cats yet. Add one below to start logging.</p>");
    } else {
        body.push_str(
            "<form method=\"post\" action=\"/log-sighting\" enctype=\"multipart/form-data\">\
<label>Cat <select name=\"cat_id\" required>",
        );
        for cat in &view.cats {
            body.push_str(&format!(
                "<option value=\"{}\">{}</option>",
                cat.id,
                escape(&cat.name)
            ));
        }
        body.push_str(
            "</select></label> \
<label>Where <input name=\"location\" placeholder=\"Backyard\"></label> \
<label>Notes <input name=\"notes\"></label> \
<label>Photo <input type=\"file\" name=\"image\" accept=\"image/*\"></label> \
<button type=\"submit\">Log sighting</button></form>",
        );
    }
    body.push_str(
        "<form method=\"post\" action=\"/quick-add-cat\">\
<label>New cat <input name=\"name\" required></label> <button type=\"submit\">Add</button></form>",
    );
    body.push_str(&format!(
        "<p class=\"muted\">Current time: {}</p></div>",
        time_tag(Some(view.utc_now.as_str()))
    ));

    body.push_str("<div class=\"card\"><h2>Recent sightings</h2>");
    if view.sightings.is_empty() {
        body.push_str("<p class=\"muted\">No sightings logged yet.</p>");
    }
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
        body.push_str(&button_form(
            &format!("/remove-sighting/{}", s.id),
            "Remove",
            Some("Remove this sighting?"),
        ));
        body.push_str("</div>");
    }
    body.push_str("</div>");

    layout("Home", "/", &body)
}
