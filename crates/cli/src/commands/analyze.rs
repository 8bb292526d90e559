//! `socio analyze`: Run text or an image through the engine.

use std::io::Read;

use socio_engine::{ImageOutcome, TextOutcome};

use super::load_engine;

pub struct Request {
    pub text: Option<String>,
    pub image: Option<String>,
    pub page: Option<String>,
    pub dry_run: bool,
    pub json: bool,
}

pub async fn run(request: Request) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine()?;

    if let Some(image_url) = request.image {
        let outcome = engine
            .analyze_image(&image_url, request.page.as_deref())
            .await?;
        if request.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print_image(&outcome);
        }
        return Ok(());
    }

    let text = match request.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if request.dry_run {
        let report = engine.test_detection(&text).await?;
        if request.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("Action:   {}", report.determined_action);
            print_reasons(&report.reasons);
            for category in report.detection_results.flagged_categories() {
                println!("  matched: {category}");
            }
        }
        return Ok(());
    }

    let outcome = engine.process_text(&text).await?;
    if request.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_text(&outcome);
    }
    Ok(())
}

fn print_text(outcome: &TextOutcome) {
    println!("Action:   {}", outcome.action);
    println!("Output:   {}", outcome.processed_text);
    print_reasons(&outcome.reasons);
    println!("Log:      {}", outcome.log_reference);
    if outcome.encryption_reference.is_some() {
        println!("\nRecover with: socio recover {}", outcome.log_reference);
    }
}

fn print_image(outcome: &ImageOutcome) {
    println!("Action:   {}", outcome.action);
    println!("Tier:     {}", outcome.severity_tier);
    println!("Blur:     {}px", outcome.blur_radius);
    print_reasons(&outcome.reasons);
    if !outcome.offensive_terms.is_empty() {
        println!("Terms:    {}", outcome.offensive_terms.join(", "));
    }
    println!("Log:      {}", outcome.log_reference);
}

fn print_reasons(reasons: &[String]) {
    if reasons.is_empty() {
        println!("Reasons:  none");
    }
    for reason in reasons {
        println!("Reason:   {reason}");
    }
}
