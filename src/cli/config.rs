use crate::error::{CashError, Result};
use crate::settings::{load_settings, save_settings, settings_file_exists, settings_path, Settings};

pub fn show() -> Result<()> {
    let settings = load_settings();
    let json = serde_json::to_string_pretty(&settings)
        .map_err(|e| CashError::Settings(e.to_string()))?;
    let source = if settings_file_exists() {
        settings_path().display().to_string()
    } else {
        format!("{} (not created, showing defaults)", settings_path().display())
    };
    println!("Settings: {source}\n{json}");
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let path = settings_path();
    if settings_file_exists() && !force {
        println!(
            "Settings already exist at {}. Use --force to overwrite.",
            path.display()
        );
        return Ok(());
    }
    save_settings(&Settings::default())?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
