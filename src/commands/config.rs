use anyhow::{Context as _, Result};

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Init { force } => init(ctx, force),
        ConfigCommand::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show(ctx: &Context) -> Result<()> {
    ui::header("Configuration");
    let location = if ctx.config_path.exists() {
        ctx.config_path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", ctx.config_path.display())
    };
    ui::kv("file", &location);
    println!();

    let rendered = toml::to_string_pretty(&ctx.config).context("Could not serialize config")?;
    for line in rendered.lines() {
        println!("  {line}");
    }
    Ok(())
}

fn init(ctx: &Context, force: bool) -> Result<()> {
    if ctx.config_path.exists() && !force {
        ui::warn(&format!(
            "{} already exists; pass --force to overwrite",
            ctx.config_path.display()
        ));
        return Ok(());
    }
    Config::default().save(&ctx.config_path)?;
    ui::success(&format!("Wrote {}", ctx.config_path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config_path: temp.path().join("catsync.toml"),
            config: Config::default(),
        }
    }

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        std::fs::write(&ctx.config_path, "[sync]\nbatch_size = 5\n").unwrap();

        init(&ctx, false).unwrap();
        assert_eq!(Config::load(&ctx.config_path).unwrap().sync.batch_size, 5);

        init(&ctx, true).unwrap();
        assert_eq!(Config::load(&ctx.config_path).unwrap(), Config::default());
    }
}
