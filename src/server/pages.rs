//! HTML pages for the upload form and the mosaic results.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::mosaic::MosaicResponse;

use super::handlers::{IMAGE_FIELD, TILE_SIZE_FIELD};

const STYLE: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2rem; color: #222; }
        h1 { font-size: 1.4rem; }
        form { display: flex; flex-direction: column; gap: 0.8rem; max-width: 24rem; }
        .images { display: flex; flex-wrap: wrap; gap: 1.5rem; }
        .images figure { margin: 0; }
        .images img { max-width: 45vw; height: auto; border: 1px solid #ccc; }
        .stats { color: #555; font-size: 0.9rem; }
"#;

/// Escape text for inclusion in HTML.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Build a `data:` URI embedding `data` with the given content type.
pub fn data_uri(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(data))
}

/// The upload form served at `/`.
pub fn upload_page(default_tile_size: u32) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Mosaic</title>
    <style>{style}</style>
</head>
<body>
    <h1>Make a photo mosaic</h1>
    <form action="/mosaic" method="post" enctype="multipart/form-data">
        <label>Image <input type="file" name="{image}" accept="image/jpeg,image/png,image/gif" required></label>
        <label>Tile size (px) <input type="number" name="{tile_size}" min="1" value="{default_tile_size}"></label>
        <button type="submit">Create mosaic</button>
    </form>
</body>
</html>"#,
        style = STYLE,
        image = IMAGE_FIELD,
        tile_size = TILE_SIZE_FIELD,
        default_tile_size = default_tile_size,
    )
}

/// The results page showing the original next to the mosaic.
pub fn results_page(response: &MosaicResponse) -> String {
    let mosaic = &response.mosaic;
    let content_type = mosaic.format.content_type();
    let summary = format!(
        "{}x{} px, {} px tiles, {} cells drawn, {} blank, built in {:.2?}",
        mosaic.width,
        mosaic.height,
        mosaic.tile_size,
        mosaic.stats.cells_drawn,
        mosaic.stats.cells_unmatched + mosaic.stats.cells_failed,
        response.elapsed,
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Mosaic results</title>
    <style>{style}</style>
</head>
<body>
    <h1>Mosaic results</h1>
    <p class="stats">{summary}</p>
    <div class="images">
        <figure>
            <img src="{original}" alt="Original image">
            <figcaption>Original</figcaption>
        </figure>
        <figure>
            <img src="{mosaic}" alt="Mosaic">
            <figcaption>Mosaic</figcaption>
        </figure>
    </div>
    <p><a href="/">Make another</a></p>
</body>
</html>"#,
        style = STYLE,
        summary = html_escape(&summary),
        original = data_uri(content_type, &response.original),
        mosaic = data_uri(content_type, &mosaic.data),
    )
}
