//! `socio history`: List processed texts or encryption records.

use super::load_engine;

pub async fn run(
    encrypted: bool,
    limit: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine()?;

    if encrypted {
        let mut files = engine.encryption_files().await?;
        files.truncate(limit);
        if json {
            println!("{}", serde_json::to_string_pretty(&files)?);
            return Ok(());
        }
        if files.is_empty() {
            println!("No encryption records yet.");
        }
        for file in &files {
            println!(
                "{}  {}",
                file.timestamp.format("%Y-%m-%d %H:%M:%S"),
                file.filename
            );
        }
        return Ok(());
    }

    let mut history = engine.history().await?;
    history.truncate(limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    if history.is_empty() {
        println!("No processed text yet.");
    }
    for entry in &history {
        let reasons = if entry.reasons.is_empty() {
            "-".to_string()
        } else {
            entry.reasons.join("; ")
        };
        println!(
            "{}  {:<8} {}  ({})",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action.as_str(),
            reasons,
            entry.id
        );
    }
    Ok(())
}
