use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lookbook::{Client, ImageAsset, SessionState, Studio};
use std::path::{Path, PathBuf};

fn output_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LOOKBOOK_OUTPUT_DIR") {
        return PathBuf::from(dir);
    }
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("examples")
        .join("output")
}

#[tokio::main]
async fn main() -> lookbook::Result<()> {
    let mut args = std::env::args().skip(1);
    let model_path = args.next().unwrap_or_else(|| "model.png".to_string());
    let product_path = args.next().unwrap_or_else(|| "product.png".to_string());

    let client = Client::from_env()?;
    let mut studio = Studio::new(client);

    studio.gate_mut().initialize().await;
    if !studio.gate().is_available() {
        eprintln!("no API key available; set GEMINI_API_KEY or API_KEY");
        return Ok(());
    }

    studio.set_model_photo(ImageAsset::from_path(&model_path).await?);
    studio.set_product_photo(ImageAsset::from_path(&product_path).await?);

    studio.generate().await?;
    assert_eq!(studio.state(), SessionState::Completed);

    let dir = output_dir();
    std::fs::create_dir_all(&dir)?;
    for result in studio.results() {
        let encoded = result
            .url
            .strip_prefix("data:image/png;base64,")
            .unwrap_or(&result.url);
        let bytes = STANDARD.decode(encoded).map_err(|e| {
            lookbook::Error::InvalidConfig {
                message: format!("Invalid data URL payload: {e}"),
            }
        })?;
        let filename = dir.join(result.download_file_name());
        std::fs::write(&filename, bytes)?;
        println!("saved {} ({})", filename.display(), result.variation);
    }

    Ok(())
}
