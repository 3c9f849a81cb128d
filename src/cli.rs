use std::path::PathBuf;

use clap::Parser;

use crate::types::{Config, RendererKind};

/// Report the most expensive namespaces from OpenCost and post them to Slack
#[derive(Debug, Parser)]
#[command(name = "opencost-reporter", version, about, long_about = None)]
pub struct Cli {
    /// Renderer to use (overrides RENDERER)
    #[arg(long, value_enum)]
    pub renderer: Option<RendererKind>,

    /// Where to write the rendered image (overrides OUTPUT_PATH)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Cost window, e.g. 7d or 24h (overrides COST_WINDOW)
    #[arg(long)]
    pub window: Option<String>,

    /// Render without publishing; no Slack token is needed
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Layer command-line values over the environment configuration.
    pub fn apply(&self, mut cfg: Config) -> Config {
        if let Some(renderer) = self.renderer {
            cfg.renderer = renderer;
        }
        if let Some(output) = &self.output {
            cfg.output_path = Some(output.clone());
        }
        if let Some(window) = &self.window {
            cfg.window = window.clone();
        }
        cfg.dry_run = cfg.dry_run || self.dry_run;
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_with_env, MockEnvironment};

    #[test]
    fn test_cli_overrides_env() {
        let env = MockEnvironment::new()
            .with_var("RENDERER", "text")
            .with_var("COST_WINDOW", "7d");
        let cfg = load_config_with_env(&env).unwrap();

        let cli = Cli::parse_from([
            "opencost-reporter",
            "--renderer",
            "treemap",
            "--output",
            "/tmp/map.svg",
            "--window",
            "30d",
            "--dry-run",
        ]);
        let cfg = cli.apply(cfg);

        assert_eq!(cfg.renderer, RendererKind::Treemap);
        assert_eq!(cfg.output_path, Some(PathBuf::from("/tmp/map.svg")));
        assert_eq!(cfg.window, "30d");
        assert!(cfg.dry_run);
    }

    #[test]
    fn test_cli_defaults_keep_env() {
        let env = MockEnvironment::new().with_var("RENDERER", "text");
        let cfg = load_config_with_env(&env).unwrap();
        let cfg = Cli::parse_from(["opencost-reporter"]).apply(cfg);
        assert_eq!(cfg.renderer, RendererKind::Text);
        assert_eq!(cfg.window, "7d");
        assert!(!cfg.dry_run);
    }

    #[test]
    fn test_rejects_unknown_renderer() {
        assert!(Cli::try_parse_from(["opencost-reporter", "--renderer", "pie"]).is_err());
    }
}
