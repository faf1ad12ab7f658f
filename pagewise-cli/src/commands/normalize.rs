//! Normalize command implementation

use anyhow::Result;
use pagewise_core::key::KeyVariants;

/// Print the addressing variants of each key
pub fn normalize(keys: &[String]) -> Result<()> {
    for raw in keys {
        match KeyVariants::of(raw) {
            Some(variants) => println!(
                "{}\t{}\t{}\t{}",
                raw, variants.normalized, variants.file_name, variants.stem
            ),
            None => println!("{}\t(empty)", raw),
        }
    }
    Ok(())
}
