use super::{escape, img, layout};
use crate::db::CatSummary;

pub fn render(cats: &[CatSummary]) -> String {
    let mut body = String::from(
        "<div class=\"card\"><h2>Add a cat</h2>\
<form method=\"post\" action=\"/add-cat\" enctype=\"multipart/form-data\">\
<label>Name <input name=\"name\" required></label> \
<label>Description <input name=\"description\"></label> \
<label>Photo <input type=\"file\" name=\"image\" accept=\"image/*\"></label> \
<button type=\"submit\">Add cat</button></form></div>",
    );

    body.push_str(&format!("<h2>Cats ({})</h2>", cats.len()));
    if cats.is_empty() {
        body.push_str("<p class=\"muted\">Nobody registered yet.</p>");
    }

    body.push_str("<div class=\"grid\">");
    for summary in cats {
        let cat = &summary.cat;
        body.push_str(&format!("<div class=\"card cat\" data-cat-id=\"{}\">", cat.id));
        body.push_str(&img(cat.image.as_ref(), "thumb", &cat.name));
        body.push_str(&format!(
            "<h3><a href=\"/cats/{}\">{}</a></h3>",
            cat.id,
            escape(&cat.name)
        ));
        if let Some(description) = cat.description.as_deref().filter(|d| !d.is_empty()) {
            body.push_str(&format!("<p>{}</p>", escape(description)));
        }
        body.push_str(&format!(
            "<p class=\"muted\"><span class=\"sighting-count\">{} sightings</span> \
<span class=\"photo-count\">{} photos</span></p></div>",
            summary.sighting_count, summary.photo_count
        ));
    }
    body.push_str("</div>");

    layout("Cats", "/cats", &body)
}
