use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use mixsync_crypto::{is_protected, Keyring};
use mixsync_plugins::{HookOutcome, HookStatus, Suggestion};
use mixsync_project::{Profile, Project, ProjectConfig};

use crate::cli::*;
use crate::source::DirectorySource;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    if let Command::Keygen = cli.command {
        return cmd_keygen();
    }

    let config = load_config(cli.config.as_deref())?;
    let keyring = Keyring::from_env().context("cannot read the project key")?;
    match cli.command {
        Command::Keygen => cmd_keygen(),
        Command::Tree(args) => cmd_tree(&open(&args.dir, keyring, config).await?).await,
        Command::Cat(args) => cmd_cat(&open(&args.dir, keyring, config).await?, &args.path).await,
        Command::Lint(args) => {
            let project = open(&args.file.dir, keyring, config).await?;
            cmd_lint(&project, &args.file.path, args.profile, args.all).await
        }
        Command::Inspect(args) => {
            cmd_inspect(&open(&args.dir, keyring, config).await?, &args.path).await
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ProjectConfig> {
    let Some(path) = path else {
        return Ok(ProjectConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

async fn open(dir: &Path, keyring: Keyring, config: ProjectConfig) -> anyhow::Result<Project> {
    let project = Project::with_builtin(keyring, config);
    project
        .open(&DirectorySource::new(dir))
        .await
        .with_context(|| format!("cannot open project {}", dir.display()))?;
    Ok(project)
}

/// Accept both `src/main.ts` and `<root>/src/main.ts`.
fn resolve(root: &str, path: &str) -> String {
    let path = path.trim_start_matches("./");
    if path.starts_with(&format!("{root}/")) {
        path.to_string()
    } else {
        format!("{root}/{path}")
    }
}

fn cmd_keygen() -> anyhow::Result<()> {
    println!("{}", Keyring::generate().to_base64());
    Ok(())
}

async fn cmd_tree(project: &Project) -> anyhow::Result<()> {
    let tree = project.tree().await?;
    println!("{} {}", tree.name().bold(), tree.root().digest_hex()[..12].dimmed());
    for path in tree.file_paths() {
        let relative = path.strip_prefix(&format!("{}/", tree.name())).unwrap_or(&path);
        if is_protected(&path) {
            println!("  {} {}", relative.cyan(), "(sealed)".dimmed());
        } else {
            println!("  {relative}");
        }
    }
    Ok(())
}

async fn cmd_cat(project: &Project, path: &str) -> anyhow::Result<()> {
    let root = project.tree().await?.name().to_string();
    let path = resolve(&root, path);
    match project.read(&path).await? {
        Some(content) => {
            print!("{content}");
            Ok(())
        }
        None => anyhow::bail!("{path}: no such file or content not loaded"),
    }
}

async fn cmd_lint(
    project: &Project,
    path: &str,
    profile: Option<Profile>,
    all: bool,
) -> anyhow::Result<()> {
    let root = project.tree().await?.name().to_string();
    let path = resolve(&root, path);
    if let Some(profile) = profile {
        project.apply_profile(profile).await?;
    }
    if all {
        let names: Vec<String> = project
            .pipeline()
            .registry()
            .names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        for name in names {
            project.set_plugin_enabled(&name, true).await?;
        }
    }

    let content = project
        .read(&path)
        .await?
        .with_context(|| format!("{path}: no such file or content not loaded"))?;
    let pass = project.run_code_change(&path, &content).await?;
    print_failures(&pass.report.outcomes);

    if pass.report.suggestions.is_empty() {
        println!("{} {} no findings", "✓".green().bold(), path.bold());
        return Ok(());
    }
    for suggestion in &pass.report.suggestions {
        print_suggestion(&path, suggestion);
    }
    println!(
        "\n{} finding(s) in {}",
        pass.report.suggestions.len().to_string().yellow().bold(),
        path.bold()
    );
    Ok(())
}

async fn cmd_inspect(project: &Project, path: &str) -> anyhow::Result<()> {
    let root = project.tree().await?.name().to_string();
    let path = resolve(&root, path);
    let report = project.select(&path).await?;
    print_failures(&report.outcomes);
    match (report.prompt, report.source) {
        (Some(prompt), Some(source)) => {
            println!("{} {}", "Prompt from".dimmed(), source.cyan().bold());
            println!("{}", prompt.prompt);
        }
        _ => println!("No plugin has a prompt for {}.", path.bold()),
    }
    Ok(())
}

fn print_suggestion(path: &str, suggestion: &Suggestion) {
    let range = &suggestion.range;
    println!(
        "{}:{}:{} {}",
        path.bold(),
        range.start_line,
        range.start_col,
        suggestion.message.yellow()
    );
    println!("  {} {}", "fix:".dimmed(), suggestion.remediation.title);
}

fn print_failures(outcomes: &[HookOutcome]) {
    for outcome in outcomes {
        if let HookStatus::Failed { reason } = &outcome.status {
            eprintln!("{} {}: {}", "!".red().bold(), outcome.plugin.bold(), reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use mixsync_plugins::builtin::SECURITY_ANALYZER;

    use super::*;

    #[test]
    fn resolves_root_relative_paths() {
        assert_eq!(resolve("demo", "src/a.ts"), "demo/src/a.ts");
        assert_eq!(resolve("demo", "./src/a.ts"), "demo/src/a.ts");
        assert_eq!(resolve("demo", "demo/src/a.ts"), "demo/src/a.ts");
        assert_eq!(resolve("demo", "demonstration/a.ts"), "demo/demonstration/a.ts");
    }

    #[test]
    fn config_file_is_optional_and_parsed() {
        assert!(load_config(None).is_ok());

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("mixsync.toml");
        fs::write(&path, "[default_plugins]\n\"Security Analyzer\" = { enabled = true }\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert!(config.default_plugins.is_enabled(SECURITY_ANALYZER));

        fs::write(&path, "default_plugins = 3").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[tokio::test]
    async fn opens_a_directory_and_lints_with_all_plugins() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("demo");
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(
            dir.join("src/app.js"),
            "var x = 1;\nconst rows = db.query(`SELECT * FROM t WHERE id=${id}`);\n",
        )
        .unwrap();

        let project = open(&dir, Keyring::from_bytes([5; 32]), ProjectConfig::default())
            .await
            .unwrap();
        assert_eq!(project.tree().await.unwrap().name(), "demo");

        cmd_lint(&project, "src/app.js", None, true).await.unwrap();
        let found = project.diagnostics("demo/src/app.js").await;
        assert!(found.len() >= 2, "{found:?}");
        assert!(project.plugins_config().await.is_enabled(SECURITY_ANALYZER));
    }

    #[tokio::test]
    async fn lint_profile_replaces_enablement() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.js"), "var x = 1;\n").unwrap();
        let project = open(&dir, Keyring::from_bytes([5; 32]), ProjectConfig::default())
            .await
            .unwrap();

        let creative: Profile = "creative".parse().unwrap();
        cmd_lint(&project, "app.js", Some(creative), false).await.unwrap();
        assert_eq!(project.plugins_config().await, Profile::Creative.plugins());
        assert!(project.diagnostics("demo/app.js").await.is_empty());

        cmd_lint(&project, "app.js", Some(Profile::Agile), false).await.unwrap();
        assert_eq!(project.diagnostics("demo/app.js").await.len(), 1);
    }

    #[test]
    fn profile_flag_parses_by_name() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["mixsync", "lint", "demo", "a.js", "--profile", "Analytic"]).unwrap();
        let Command::Lint(args) = cli.command else {
            panic!("expected lint");
        };
        assert_eq!(args.profile, Some(Profile::Analytic));
        assert!(Cli::try_parse_from(["mixsync", "lint", "demo", "a.js", "--profile", "zen"]).is_err());
    }

    #[tokio::test]
    async fn cat_of_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.txt"), "a").unwrap();
        let project = open(&dir, Keyring::from_bytes([5; 32]), ProjectConfig::default())
            .await
            .unwrap();
        assert!(cmd_cat(&project, "a.txt").await.is_ok());
        assert!(cmd_cat(&project, "b.txt").await.is_err());
    }
}
