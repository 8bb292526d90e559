//! `socio recover`: Print the original text behind a log reference.

use super::load_engine;

pub async fn run(reference: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine()?;
    let recovered = engine.recover_content(reference).await?;
    println!("{}", recovered.original_text);
    Ok(())
}
