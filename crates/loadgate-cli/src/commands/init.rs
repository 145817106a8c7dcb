use std::path::Path;

use loadgate_core::LoadgateConfig;

pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let config = LoadgateConfig::scaffold();
    std::fs::write(path, config.to_toml_string()?)?;
    println!("✓ Generated {}", path.display());
    println!("  Add patterns to [throttling].filtered_paths to start throttling.");
    Ok(())
}
