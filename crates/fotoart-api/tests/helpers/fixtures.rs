//! Image and upload fixtures

use std::io::Cursor;

use axum_test::multipart::{MultipartForm, Part};
use image::{ImageFormat, Rgb, RgbImage};

/// Small PNG whose pixels depend on `seed`, so different seeds hash differently.
pub fn png(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x as u8).wrapping_add(seed),
            (y as u8).wrapping_mul(3),
            seed,
        ])
    });
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

/// Upload form: `collection_id` followed by one `files` part per entry.
pub fn upload_form(collection_id: &str, files: &[(&str, Vec<u8>)]) -> MultipartForm {
    let mut form = MultipartForm::new().add_text("collection_id", collection_id.to_string());
    for (name, data) in files {
        form = form.add_part(
            "files",
            Part::bytes(data.clone())
                .file_name(name.to_string())
                .mime_type("image/png"),
        );
    }
    form
}
