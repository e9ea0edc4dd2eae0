//! Generates an embrace from two photos.
//!
//! Run with: `cargo run --example embrace_pair -- <childhood.jpg> <recent.jpg>`
//!
//! Requires `API_KEY` (or `GEMINI_API_KEY` / `GOOGLE_API_KEY`) environment variable.

use embrace::{generate_embrace, read_image, GeminiProvider};

#[tokio::main]
async fn main() -> embrace::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(childhood), Some(recent)) = (args.next(), args.next()) else {
        eprintln!("Usage: embrace_pair <childhood.jpg> <recent.jpg>");
        std::process::exit(2);
    };

    let provider = GeminiProvider::builder().build()?;
    let childhood = read_image(childhood).await?;
    let recent = read_image(recent).await?;

    let image = generate_embrace(&provider, &childhood, &recent).await?;
    let size = image.save("embrace.png")?;
    println!("Saved embrace.png ({size} bytes, {})", image.mime_type);

    Ok(())
}
