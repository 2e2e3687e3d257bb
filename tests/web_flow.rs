use cattrack::config::DatabaseConfig;
use cattrack::db::{CatStore, Database};
use cattrack::http::{build_router, AppState};
use cattrack::images::StoredImage;
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const BOUNDARY: &str = "----cattrackTestBoundary";

struct Response {
    status: u16,
    head: String,
    body: String,
}

impl Response {
    fn location(&self) -> Option<&str> {
        self.head.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("location").then(|| value.trim())
        })
    }
}

async fn spawn_app() -> (TempDir, Database, std::net::SocketAddr) {
    let dir = tempdir().expect("tempdir");
    let config = DatabaseConfig {
        sqlite_path: dir.path().join("cats.db"),
        ..DatabaseConfig::default()
    };
    let db = Database::open(&config).expect("open database");
    db.initialize().expect("create schema");

    let app = build_router(AppState::new(db.clone()), 16 * 1024 * 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    (dir, db, addr)
}

async fn send_raw(addr: std::net::SocketAddr, method: &str, path: &str, body: Option<(&str, &[u8])>) -> Response {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n").into_bytes();
    match body {
        Some((content_type, bytes)) => {
            req.extend_from_slice(
                format!("Content-Type: {content_type}\r\nContent-Length: {}\r\n\r\n", bytes.len()).as_bytes(),
            );
            req.extend_from_slice(bytes);
        }
        None => req.extend_from_slice(b"Content-Length: 0\r\n\r\n"),
    }
    stream.write_all(&req).await.expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    Response {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

async fn get(addr: std::net::SocketAddr, path: &str) -> Response {
    send_raw(addr, "GET", path, None).await
}

async fn post_form(addr: std::net::SocketAddr, path: &str, form: &str) -> Response {
    send_raw(
        addr,
        "POST",
        path,
        Some(("application/x-www-form-urlencoded", form.as_bytes())),
    )
    .await
}

/// Multipart POST with text fields and `(field, file name, content)` files.
async fn post_multipart(
    addr: std::net::SocketAddr,
    path: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &str)],
) -> Response {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for (name, file_name, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    send_raw(addr, "POST", path, Some((content_type.as_str(), body.as_bytes()))).await
}

#[tokio::test]
async fn health_reports_backend() {
    let (_dir, _db, addr) = spawn_app().await;

    let res = get(addr, "/health").await;
    assert_eq!(res.status, 200);
    let json: Value = serde_json::from_str(&res.body).expect("health json");
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "sqlite");
}

#[tokio::test]
async fn whiskers_lifecycle() {
    let (_dir, db, addr) = spawn_app().await;

    let res = post_form(addr, "/add-cat", "name=Whiskers&description=Ginger+tabby").await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some("/cats"));

    let cats = get(addr, "/cats").await;
    assert_eq!(cats.status, 200);
    assert!(cats.body.contains("Whiskers"));
    assert!(cats.body.contains("<span class=\"photo-count\">0 photos</span>"));

    let cat_id = db.connect().expect("connect").list_cats().expect("cats")[0].id;

    let id = cat_id.to_string();
    let res = post_multipart(
        addr,
        "/log-sighting",
        &[("cat_id", id.as_str()), ("location", "Backyard"), ("notes", "")],
        &[("image", "whiskers.jpg", "jpeg-bytes")],
    )
    .await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some("/"));

    let home = get(addr, "/").await;
    assert!(home.body.contains("Backyard"));
    let history = get(addr, "/history").await;
    assert!(history.body.contains("Backyard"));
    assert!(history.body.contains("Showing 1 of 1 sightings"));

    let cats = get(addr, "/cats").await;
    assert!(cats.body.contains("<span class=\"photo-count\">1 photos</span>"));

    let sighting_id = db.connect().expect("connect").cat_sightings(cat_id, 50).expect("sightings")[0].id;
    let res = post_form(
        addr,
        &format!("/cats/{cat_id}/photos/sighting/{sighting_id}/set-profile"),
        "",
    )
    .await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location().map(String::from), Some(format!("/cats/{cat_id}")));

    let cat = db.connect().expect("connect").get_cat(cat_id).expect("get").expect("exists");
    assert_eq!(cat.image, StoredImage::from_upload("whiskers.jpg", b"jpeg-bytes"));

    let detail = get(addr, &format!("/cats/{cat_id}")).await;
    assert_eq!(detail.status, 200);
    assert!(detail.body.contains("data-source=\"sighting\""));

    let res = post_form(addr, &format!("/cats/{cat_id}/delete"), "").await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some("/cats"));

    let cats = get(addr, "/cats").await;
    assert!(!cats.body.contains("Whiskers"));
    assert_eq!(db.connect().expect("connect").count_sightings().expect("count"), 0);
}

#[tokio::test]
async fn invalid_input_is_ignored() {
    let (_dir, db, addr) = spawn_app().await;

    post_form(addr, "/add-cat", "name=Whiskers").await;
    let res = post_form(addr, "/add-cat", "name=Whiskers").await;
    assert_eq!(res.status, 303);
    let res = post_form(addr, "/quick-add-cat", "name=+++").await;
    assert_eq!(res.location(), Some("/"));
    assert_eq!(db.connect().expect("connect").count_cats().expect("count"), 1);

    // Unknown cat
    let res = get(addr, "/cats/999").await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some("/cats"));
    post_multipart(addr, "/log-sighting", &[("cat_id", "999")], &[]).await;
    assert_eq!(db.connect().expect("connect").count_sightings().expect("count"), 0);

    // Disallowed upload is dropped, the sighting is still logged
    let cat_id = db.connect().expect("connect").list_cats().expect("cats")[0].id;
    let id = cat_id.to_string();
    post_multipart(
        addr,
        "/log-sighting",
        &[("cat_id", id.as_str())],
        &[("image", "notes.txt", "not an image")],
    )
    .await;
    let sightings = db.connect().expect("connect").cat_sightings(cat_id, 50).expect("sightings");
    assert_eq!(sightings.len(), 1);
    assert!(sightings[0].image.is_none());
    assert_eq!(sightings[0].location.as_deref(), Some(""));

    let res = post_form(addr, &format!("/remove-sighting/{}", sightings[0].id), "").await;
    assert_eq!(res.location(), Some("/"));
    assert_eq!(db.connect().expect("connect").count_sightings().expect("count"), 0);
}

#[tokio::test]
async fn gallery_upload_and_delete() {
    let (_dir, db, addr) = spawn_app().await;
    post_form(addr, "/quick-add-cat", "name=Tom").await;
    let cat_id = db.connect().expect("connect").list_cats().expect("cats")[0].id;

    let res = post_multipart(
        addr,
        &format!("/cats/{cat_id}/photos/add"),
        &[("caption", "On the shed"), ("photo_date", "2024-05-01"), ("photo_time", "18:45")],
        &[
            ("photos", "a.png", "one"),
            ("photos", "b.bmp", "two"),
            ("photos", "c.GIF", "three"),
        ],
    )
    .await;
    assert_eq!(res.status, 303);

    let photos = db.connect().expect("connect").gallery_photos(cat_id).expect("photos");
    assert_eq!(photos.len(), 2);
    assert_eq!(photos[0].photo_date.as_deref(), Some("2024-05-01T18:45:00Z"));
    assert_eq!(photos[0].caption.as_deref(), Some("On the shed"));
    assert_eq!(photos[1].image.mime_type, "image/gif");

    // Unknown source leaves the photo alone
    post_form(addr, &format!("/cats/{cat_id}/photos/album/{}/delete", photos[0].id), "").await;
    assert_eq!(db.connect().expect("connect").gallery_photos(cat_id).expect("photos").len(), 2);

    post_form(addr, &format!("/cats/{cat_id}/photos/gallery/{}/delete", photos[0].id), "").await;
    assert_eq!(db.connect().expect("connect").gallery_photos(cat_id).expect("photos").len(), 1);

    let res = post_multipart(addr, "/cats/999/photos/add", &[], &[("photos", "a.png", "one")]).await;
    assert_eq!(res.location(), Some("/cats"));
}

#[tokio::test]
async fn edit_cat_and_profile_photo() {
    let (_dir, db, addr) = spawn_app().await;
    post_form(addr, "/quick-add-cat", "name=Tom").await;
    let cat_id = db.connect().expect("connect").list_cats().expect("cats")[0].id;
    let fetch = || db.connect().expect("connect").get_cat(cat_id).expect("get").expect("exists");
    let edit_path = format!("/cats/{cat_id}/edit");
    let cat_page = format!("/cats/{cat_id}");

    // Quick add leaves the description unset
    assert_eq!(fetch().description, None);

    let res = post_form(addr, &edit_path, "name=+++&description=changed").await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some(cat_page.as_str()));
    let cat = fetch();
    assert_eq!(cat.name, "Tom");
    assert_eq!(cat.description, None);

    let res = post_multipart(
        addr,
        &edit_path,
        &[("name", "Tom"), ("description", "")],
        &[("image", "new.png", "png-bytes")],
    )
    .await;
    assert_eq!(res.location(), Some(cat_page.as_str()));
    let new_image = StoredImage::from_upload("new.png", b"png-bytes");
    assert_eq!(fetch().image, new_image);

    post_multipart(
        addr,
        &edit_path,
        &[("name", " Tommy "), ("description", " grey ")],
        &[("image", "x.txt", "not an image")],
    )
    .await;
    let cat = fetch();
    assert_eq!(cat.name, "Tommy");
    assert_eq!(cat.description.as_deref(), Some("grey"));
    assert_eq!(cat.image, new_image);

    let res = post_form(addr, &format!("/cats/{cat_id}/remove-profile-photo"), "").await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some(cat_page.as_str()));
    assert!(fetch().image.is_none());
}

#[tokio::test]
async fn malformed_ids_redirect() {
    let (_dir, db, addr) = spawn_app().await;
    post_form(addr, "/quick-add-cat", "name=Tom").await;
    let cat_id = db.connect().expect("connect").list_cats().expect("cats")[0].id;

    let res = get(addr, "/cats/abc").await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some("/cats"));

    let res = post_form(addr, "/cats/abc/delete", "").await;
    assert_eq!(res.location(), Some("/cats"));
    let res = post_form(addr, "/cats/abc/edit", "name=Jerry").await;
    assert_eq!(res.location(), Some("/cats"));
    let res = post_form(addr, "/remove-sighting/abc", "").await;
    assert_eq!(res.location(), Some("/"));

    let res = post_form(addr, &format!("/cats/{cat_id}/photos/gallery/xyz/delete"), "").await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location().map(String::from), Some(format!("/cats/{cat_id}")));

    assert_eq!(db.connect().expect("connect").count_cats().expect("count"), 1);
}

#[tokio::test]
async fn body_without_content_type_is_ignored() {
    let (_dir, db, addr) = spawn_app().await;

    let res = send_raw(addr, "POST", "/add-cat", None).await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some("/cats"));

    let res = send_raw(addr, "POST", "/log-sighting", Some(("text/plain", &b"cat_id=1"[..]))).await;
    assert_eq!(res.status, 303);
    assert_eq!(res.location(), Some("/"));

    assert_eq!(db.connect().expect("connect").count_cats().expect("count"), 0);
}
