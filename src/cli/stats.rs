use anyhow::Result;

use babble::corpus::types::Lang;
use babble::CorpusStore;

/// Display store statistics in the terminal, or as JSON.
pub async fn stats(store: &CorpusStore, json: bool) -> Result<()> {
    let response = store.stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Corpus Statistics");
    println!("{}", "=".repeat(40));
    println!("  Tenants:             {}", response.tenants);
    println!("  Talking:             {}", response.talking_tenants);
    println!("  Fragments:           {}", response.fragments);
    println!();

    println!("By Language:");
    for lang in Lang::ALL {
        let count = response.by_lang.get(lang.as_str()).copied().unwrap_or(0);
        println!("  {:<12} {}", lang, count);
    }
    println!();

    if let Some(ref largest) = response.largest {
        println!(
            "Largest corpus:        {} ({} fragments)",
            largest.tenant, largest.fragments
        );
    }
    println!("Database size:         {}", format_bytes(response.db_size_bytes));

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
